//! Location algebra (C2): canonical, totally ordered names for every scope
//! and fold in a compiled query.
//!
//! A [`Location`] is a non-empty sequence of [`Step`]s. The first step is
//! always [`Step::Root`]; every subsequent step is a [`Step::Edge`] carrying
//! a stable per-parent ordinal so that two traversals of the same edge from
//! the same scope still get distinct, deterministic locations.

use std::fmt;

/// Direction of an edge traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }

    pub fn reverse(self) -> Direction {
        match self {
            Direction::In => Direction::Out,
            Direction::Out => Direction::In,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single step in a [`Location`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    /// The scope created by the query's outermost selection.
    Root(String),
    /// The scope entered by traversing an edge; `ordinal` disambiguates
    /// repeated traversals of the same `(direction, edge_name)` pair from
    /// the same parent scope.
    Edge {
        direction: Direction,
        edge_name: String,
        ordinal: u32,
    },
}

impl Step {
    fn sort_key(&self) -> (u8, &str, u8, u32) {
        match self {
            Step::Root(name) => (0, name.as_str(), 0, 0),
            Step::Edge {
                direction,
                edge_name,
                ordinal,
            } => (
                1,
                edge_name.as_str(),
                if *direction == Direction::Out { 0 } else { 1 },
                *ordinal,
            ),
        }
    }
}

impl PartialOrd for Step {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Step {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Root(name) => write!(f, "{name}"),
            Step::Edge {
                direction,
                edge_name,
                ordinal,
            } => write!(f, "{direction}_{edge_name}#{ordinal}"),
        }
    }
}

/// Canonical identifier for a scope inside an IR query.
///
/// Locations are value types: two [`Location`]s built from the same step
/// sequence compare equal and hash equal, regardless of when or how they
/// were constructed. Ordering is lexicographic over the step encoding,
/// which is what makes emitted query text reproducible across runs (§8.1
/// determinism).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    steps: Vec<Step>,
}

impl Location {
    /// Build the root location for a query rooted at `type_name`.
    pub fn root(type_name: impl Into<String>) -> Self {
        Location {
            steps: vec![Step::Root(type_name.into())],
        }
    }

    /// Build a child location by appending an edge traversal step.
    pub fn child_edge(&self, direction: Direction, edge_name: impl Into<String>, ordinal: u32) -> Self {
        let mut steps = self.steps.clone();
        steps.push(Step::Edge {
            direction,
            edge_name: edge_name.into(),
            ordinal,
        });
        Location { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    /// `self` names the query root.
    pub fn is_root(&self) -> bool {
        self.steps.len() == 1
    }

    /// The type name the query was rooted at.
    pub fn root_type(&self) -> &str {
        match &self.steps[0] {
            Step::Root(name) => name,
            Step::Edge { .. } => unreachable!("first step is always Root"),
        }
    }

    /// The edge step that created this scope, if any (`None` for the root).
    pub fn last_edge(&self) -> Option<(Direction, &str, u32)> {
        match self.steps.last()? {
            Step::Root(_) => None,
            Step::Edge {
                direction,
                edge_name,
                ordinal,
            } => Some((*direction, edge_name.as_str(), *ordinal)),
        }
    }

    /// The location of the enclosing scope, or `None` if this is the root.
    pub fn parent(&self) -> Option<Location> {
        if self.steps.len() <= 1 {
            return None;
        }
        Some(Location {
            steps: self.steps[..self.steps.len() - 1].to_vec(),
        })
    }

    /// `self` is `other`, or an ancestor scope of `other`.
    pub fn is_prefix_of(&self, other: &Location) -> bool {
        self.steps.len() <= other.steps.len() && self.steps == other.steps[..self.steps.len()]
    }
}

impl PartialOrd for Location {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Location {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.steps.cmp(&other.steps)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

/// Per-parent-scope edge ordinal counter, used by the front-end to assign
/// the `#n` disambiguator in [`Step::Edge`] (§4.2): a single-pass numbering
/// over the surface AST, one counter per `(direction, edge_name)` pair,
/// incremented at first use under a given parent location.
#[derive(Debug, Default)]
pub struct OrdinalAllocator {
    counters: std::collections::HashMap<(Location, Direction, String), u32>,
}

impl OrdinalAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next ordinal for an edge traversal out of `parent`.
    pub fn next(&mut self, parent: &Location, direction: Direction, edge_name: &str) -> u32 {
        let key = (parent.clone(), direction, edge_name.to_string());
        let counter = self.counters.entry(key).or_insert(0);
        let ordinal = *counter;
        *counter += 1;
        ordinal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_depth_one() {
        let loc = Location::root("Animal");
        assert!(loc.is_root());
        assert_eq!(loc.depth(), 1);
        assert_eq!(loc.root_type(), "Animal");
    }

    #[test]
    fn prefix_relation() {
        let root = Location::root("Animal");
        let child = root.child_edge(Direction::Out, "Animal_ParentOf", 0);
        assert!(root.is_prefix_of(&child));
        assert!(!child.is_prefix_of(&root));
        assert_eq!(child.parent().as_ref(), Some(&root));
    }

    #[test]
    fn ordinal_allocator_disambiguates_repeated_edges() {
        let mut alloc = OrdinalAllocator::new();
        let root = Location::root("Animal");
        let a = alloc.next(&root, Direction::Out, "Animal_ParentOf");
        let b = alloc.next(&root, Direction::Out, "Animal_ParentOf");
        let c = alloc.next(&root, Direction::In, "Animal_ParentOf");
        assert_eq!((a, b, c), (0, 1, 0));
    }

    #[test]
    fn total_order_is_deterministic() {
        let root = Location::root("Animal");
        let l1 = root.child_edge(Direction::Out, "Animal_ParentOf", 0);
        let l2 = root.child_edge(Direction::Out, "Animal_ParentOf", 1);
        assert!(l1 < l2);
        assert_eq!(l1.clone(), l1.clone());
        assert!(root < l1);
    }
}
