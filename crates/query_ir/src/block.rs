//! The IR node set (C3): a block-structured tree of traversal/scope/filter
//! blocks, annotated with locations (C2).

use crate::expr::{Expr, MetaField};
use crate::location::{Direction, Location};
use crate::scalar::ScalarKind;

/// What a `ConstructResult` output slot projects.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutputField {
    Property(String),
    Meta(MetaField),
}

/// One `@output` slot, fully resolved by the validator/optimizer:
/// its source location and field, declared kind, and whether it is
/// list-valued (inside a fold) or nullable (inside an optional, or absent
/// in some union branch).
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSpec {
    pub name: String,
    pub location: Location,
    pub field: OutputField,
    pub kind: ScalarKind,
    pub list: bool,
    pub nullable: bool,
}

/// An IR block. Every block is either tagged with a [`Location`] or
/// introduces a new one (§3.3); `Fold` and `OptionalRegion` carry their
/// interior as a nested block sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// Open the root scope.
    Start { location: Location },
    /// Open a new child scope via an edge.
    Traverse {
        direction: Direction,
        edge_name: String,
        child_type: String,
        location: Location,
        optional: bool,
        within_fold: bool,
        within_optional: bool,
    },
    /// Narrow the current scope to `to_type` (schema guarantees it is a
    /// subtype of the current scope's static type).
    Coerce { to_type: String, location: Location },
    /// A predicate the current location must satisfy.
    Filter { location: Location, expr: Expr },
    /// Snapshot the current scope under its location (tag/output anchor).
    MarkLocation { location: Location },
    /// A region whose result set is collected as a list.
    Fold {
        begin: Location,
        end: Location,
        body: Vec<Block>,
    },
    /// Iterate 0..=depth edge hops at the current scope.
    Recurse {
        direction: Direction,
        edge_name: String,
        depth: u32,
        location: Location,
    },
    /// A region whose entry edge is optional.
    OptionalRegion {
        begin: Location,
        end: Location,
        body: Vec<Block>,
    },
    /// Marks the last vertex as the declared scan source (graph-traversal
    /// back-end only).
    OutputSource { location: Location },
    /// Terminal block assembling the row shape. Appears exactly once, as
    /// the last block of the query's top-level body.
    ConstructResult { outputs: Vec<OutputSpec> },
}

impl Block {
    /// The location this block is anchored at, if it is a single-location
    /// block (used by the optimizer's filter-pushdown pass and by the
    /// validator's placement checks).
    pub fn location(&self) -> Option<&Location> {
        match self {
            Block::Start { location }
            | Block::Traverse { location, .. }
            | Block::Coerce { location, .. }
            | Block::Filter { location, .. }
            | Block::MarkLocation { location }
            | Block::Recurse { location, .. }
            | Block::OutputSource { location } => Some(location),
            Block::Fold { begin, .. } | Block::OptionalRegion { begin, .. } => Some(begin),
            Block::ConstructResult { .. } => None,
        }
    }

    /// Property fields this block reads (supports the optimizer's
    /// filter-pushdown pass and the relational emitter's column pruning).
    pub fn property_fields_read(&self) -> Vec<(Location, String)> {
        let mut out = Vec::new();
        if let Block::Filter { expr, .. } = self {
            collect_field_names(expr, &mut out);
        }
        out
    }

    /// A stable string key for this block, independent of allocation
    /// order, suitable for snapshot testing of IR trees (§4.3).
    pub fn serialization_key(&self) -> String {
        match self {
            Block::Start { location } => format!("Start({location})"),
            Block::Traverse {
                direction,
                edge_name,
                child_type,
                location,
                optional,
                within_fold,
                within_optional,
            } => format!(
                "Traverse({direction} {edge_name} -> {child_type} @{location} optional={optional} fold={within_fold} opt_ctx={within_optional})"
            ),
            Block::Coerce { to_type, location } => format!("Coerce({to_type} @{location})"),
            Block::Filter { location, expr } => format!("Filter(@{location} {expr:?})"),
            Block::MarkLocation { location } => format!("MarkLocation({location})"),
            Block::Fold { begin, end, body } => format!(
                "Fold({begin}..{end} [{}])",
                body.iter().map(Block::serialization_key).collect::<Vec<_>>().join(", ")
            ),
            Block::Recurse {
                direction,
                edge_name,
                depth,
                location,
            } => format!("Recurse({direction} {edge_name} depth={depth} @{location})"),
            Block::OptionalRegion { begin, end, body } => format!(
                "OptionalRegion({begin}..{end} [{}])",
                body.iter().map(Block::serialization_key).collect::<Vec<_>>().join(", ")
            ),
            Block::OutputSource { location } => format!("OutputSource({location})"),
            Block::ConstructResult { outputs } => format!(
                "ConstructResult({})",
                outputs
                    .iter()
                    .map(|o| format!("{}={:?}@{}", o.name, o.field, o.location))
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
        }
    }
}

fn collect_field_names(expr: &Expr, out: &mut Vec<(Location, String)>) {
    match expr {
        Expr::Field { location, field } => out.push((location.clone(), field.clone())),
        Expr::Compare { left, right, .. } => {
            collect_field_names(left, out);
            collect_field_names(right, out);
        }
        Expr::Between { value, lower, upper } => {
            collect_field_names(value, out);
            collect_field_names(lower, out);
            collect_field_names(upper, out);
        }
        Expr::IsNull(inner) | Expr::IsNotNull(inner) | Expr::Not(inner) => collect_field_names(inner, out),
        Expr::And(items) | Expr::Or(items) => {
            for item in items {
                collect_field_names(item, out);
            }
        }
        _ => {}
    }
}

/// A fully validated, not-yet-optimized (or already-optimized) query IR.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub root_type: String,
    /// Top-level block sequence; the last element is always
    /// `Block::ConstructResult`.
    pub body: Vec<Block>,
}

impl Query {
    pub fn outputs(&self) -> &[OutputSpec] {
        match self.body.last() {
            Some(Block::ConstructResult { outputs }) => outputs,
            _ => &[],
        }
    }
}
