//! Finds the compound-optional regions a query contains (§4.6) and gives
//! each a stable index for the `2^n` union-rewrite bitmask.

use query_ir::{Block, Direction, Expr, Literal, Location};

/// One `OptionalRegion` that requires the union rewrite because it
/// expands further vertex fields, rather than being satisfiable by the
/// target dialect's plain optional-step construct.
#[derive(Debug, Clone)]
pub struct OptionalInfo {
    /// Assigned in document pre-order; this is the subset bitmask bit
    /// index used by the `$optional__k` enumeration (§4.6).
    pub index: usize,
    pub begin: Location,
    pub end: Location,
    pub direction: Direction,
    pub edge_name: String,
}

impl OptionalInfo {
    /// The scope whose edge this optional traverses — the location the
    /// "has no neighbors" guard filter (§4.6) is attached to when this
    /// optional's subtree is excluded from an alternative.
    pub fn parent_location(&self) -> Location {
        self.begin.parent().expect("optional begin location always has a parent scope")
    }
}

/// A region expands further vertex fields, beyond its entering
/// `Traverse`, if its body contains another traversal/recursion/optional.
fn expands_further(body: &[Block]) -> bool {
    body.iter().skip(1).any(|b| matches!(b, Block::Traverse { .. } | Block::Recurse { .. } | Block::OptionalRegion { .. }))
}

/// Walks `body` in document pre-order, recording every compound
/// `OptionalRegion` with a stable bitmask index. A region is compound
/// (needs the union rewrite) if it expands further vertex fields itself,
/// or if it is nested inside another optional region — the traversal
/// language's direct optional-step construct only applies "to the last
/// step in a chain" (§4.6), so an optional nested under another optional
/// can never qualify as simple even when it is a leaf by itself.
pub fn collect_optionals(body: &[Block]) -> Vec<OptionalInfo> {
    let mut out = Vec::new();
    walk(body, false, &mut out);
    out
}

fn walk(body: &[Block], nested_in_optional: bool, out: &mut Vec<OptionalInfo>) {
    for block in body {
        match block {
            Block::OptionalRegion { begin, end, body: inner } => {
                if nested_in_optional || expands_further(inner) {
                    let (direction, edge_name) = match inner.first() {
                        Some(Block::Traverse { direction, edge_name, .. }) => (*direction, edge_name.clone()),
                        _ => unreachable!("OptionalRegion body always opens with its entering Traverse"),
                    };
                    out.push(OptionalInfo {
                        index: out.len(),
                        begin: begin.clone(),
                        end: end.clone(),
                        direction,
                        edge_name,
                    });
                }
                walk(inner, true, out);
            }
            Block::Fold { body: inner, .. } => walk(inner, false, out),
            _ => {}
        }
    }
}

/// Builds the IR body for one alternative of the `2^n` union rewrite
/// (§4.6): for each compound optional with its bit set in `subset`, keeps
/// its subtree and turns its entering `Traverse` non-optional; for each
/// with its bit clear, discards the subtree and substitutes a filter
/// asserting that edge has no neighbors, at the optional's parent scope.
pub fn prune_for_subset(body: &[Block], optionals: &[OptionalInfo], subset: u32) -> Vec<Block> {
    let mut out = Vec::with_capacity(body.len());
    for block in body {
        match block {
            Block::OptionalRegion { begin, body: inner, .. } => {
                match optionals.iter().find(|o| &o.begin == begin) {
                    Some(info) if subset_includes(subset, info.index) => {
                        let mut pruned_inner = prune_for_subset(inner, optionals, subset);
                        if let Some(Block::Traverse { optional, .. }) = pruned_inner.first_mut() {
                            *optional = false;
                        }
                        out.extend(pruned_inner);
                    }
                    Some(info) => {
                        let parent = info.parent_location();
                        out.push(Block::Filter {
                            location: parent.clone(),
                            expr: Expr::HasEdgeDegree {
                                location: parent,
                                direction: info.direction,
                                edge_name: info.edge_name.clone(),
                                degree: Box::new(Expr::Literal(Literal::Int(0))),
                            },
                        });
                    }
                    // A simple (non-compound) optional is left untouched;
                    // the emitter lowers it via the direct optional-step
                    // construct instead of the union rewrite.
                    None => out.push(block.clone()),
                }
            }
            Block::Fold { begin, end, body: inner } => out.push(Block::Fold {
                begin: begin.clone(),
                end: end.clone(),
                body: prune_for_subset(inner, optionals, subset),
            }),
            other => out.push(other.clone()),
        }
    }
    out
}

fn subset_includes(subset: u32, index: usize) -> bool {
    (subset >> index) & 1 == 1
}

/// Whether `location` survives in the alternative selected by `subset` —
/// `false` iff it lies inside some optional whose bit is clear, in which
/// case the alternative projects `null` for any output rooted there.
pub fn output_is_live(location: &Location, optionals: &[OptionalInfo], subset: u32) -> bool {
    optionals
        .iter()
        .all(|info| subset_includes(subset, info.index) || !info.begin.is_prefix_of(location))
}

/// Builds a straight chain of `n` nested compound optionals rooted at
/// `Animal` (each one expands further, so every link in the chain is
/// itself compound per [`expands_further`]) and returns the body alongside
/// each link's `begin` location in index order.
#[cfg(test)]
fn chain_of_optionals(n: usize) -> (Vec<Block>, Vec<Location>) {
    fn wrap(depth: usize, n: usize, parent: &Location, begins: &mut Vec<Location>) -> Vec<Block> {
        let begin = parent.child_edge(Direction::Out, "Animal_ParentOf", 0);
        begins.push(begin.clone());
        let traverse = Block::Traverse {
            direction: Direction::Out,
            edge_name: "Animal_ParentOf".to_string(),
            child_type: "Animal".to_string(),
            location: begin.clone(),
            optional: true,
            within_fold: false,
            within_optional: true,
        };
        let inner = if depth + 1 < n {
            let mut body = vec![traverse];
            body.extend(wrap(depth + 1, n, &begin, begins));
            body
        } else {
            vec![traverse]
        };
        vec![Block::OptionalRegion { begin, end: begin_end(&inner), body: inner }]
    }

    fn begin_end(inner: &[Block]) -> Location {
        match inner.last() {
            Some(Block::OptionalRegion { end, .. }) => end.clone(),
            Some(Block::Traverse { location, .. }) => location.clone(),
            _ => unreachable!("chain link always ends in a Traverse or nested OptionalRegion"),
        }
    }

    let root = Location::root("Animal");
    let mut begins = Vec::new();
    let body = wrap(0, n, &root, &mut begins);
    (body, begins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_ir::Location;

    #[test]
    fn simple_optional_is_not_compound() {
        let root = Location::root("Animal");
        let child = root.child_edge(Direction::Out, "Animal_ParentOf", 0);
        let body = vec![Block::OptionalRegion {
            begin: child.clone(),
            end: child.clone(),
            body: vec![
                Block::Traverse {
                    direction: Direction::Out,
                    edge_name: "Animal_ParentOf".to_string(),
                    child_type: "Animal".to_string(),
                    location: child.clone(),
                    optional: true,
                    within_fold: false,
                    within_optional: true,
                },
                Block::Filter { location: child, expr: query_ir::Expr::True },
            ],
        }];
        assert!(collect_optionals(&body).is_empty());
    }

    #[test]
    fn nested_compound_optionals_get_distinct_indices() {
        let root = Location::root("Animal");
        let c1 = root.child_edge(Direction::Out, "Animal_ParentOf", 0);
        let c2 = c1.child_edge(Direction::In, "Animal_ParentOf", 0);
        let body = vec![Block::OptionalRegion {
            begin: c1.clone(),
            end: c2.clone(),
            body: vec![
                Block::Traverse {
                    direction: Direction::Out,
                    edge_name: "Animal_ParentOf".to_string(),
                    child_type: "Animal".to_string(),
                    location: c1.clone(),
                    optional: true,
                    within_fold: false,
                    within_optional: true,
                },
                Block::OptionalRegion {
                    begin: c2.clone(),
                    end: c2.clone(),
                    body: vec![Block::Traverse {
                        direction: Direction::In,
                        edge_name: "Animal_ParentOf".to_string(),
                        child_type: "Animal".to_string(),
                        location: c2.clone(),
                        optional: true,
                        within_fold: false,
                        within_optional: true,
                    }],
                },
            ],
        }];
        let optionals = collect_optionals(&body);
        assert_eq!(optionals.len(), 2);
        assert_eq!(optionals[0].begin, c1);
        assert_eq!(optionals[1].begin, c2);
    }

    proptest::proptest! {
        /// A link in the chain is live under `subset` iff every bit from 0
        /// up to and including its own index is set — absence of an outer
        /// optional always masks whatever its nested optionals would have
        /// contributed (§4.6: the union rewrite prunes the whole subtree,
        /// not just the entering step), so the liveness of each alternative
        /// is exactly the longest unbroken run of set bits starting at 0.
        #[test]
        fn chain_liveness_is_the_longest_unbroken_prefix_of_set_bits(n in 2usize..=4, raw_subset in 0u32..16) {
            let subset = raw_subset & ((1u32 << n) - 1);
            let (body, begin_locations) = chain_of_optionals(n);
            let optionals = collect_optionals(&body);
            proptest::prop_assert_eq!(optionals.len(), n);
            for (k, loc) in begin_locations.iter().enumerate() {
                let expected = (0..=k).all(|i| subset_includes(subset, i));
                proptest::prop_assert_eq!(output_is_live(loc, &optionals, subset), expected);
            }
        }

        /// Two alternatives that agree on every bit below `k` but disagree
        /// on bit `k` are genuinely disjoint at the `k`-th link: one
        /// projects it live, the other projects it absent.
        #[test]
        fn flipping_a_bit_after_an_unbroken_prefix_changes_that_links_liveness(n in 2usize..=4) {
            let (body, begin_locations) = chain_of_optionals(n);
            let optionals = collect_optionals(&body);
            for k in 0..n {
                let prefix_set: u32 = (1u32 << k) - 1;
                let with_bit = prefix_set | (1 << k);
                let without_bit = prefix_set;
                proptest::prop_assert!(output_is_live(&begin_locations[k], &optionals, with_bit));
                proptest::prop_assert!(!output_is_live(&begin_locations[k], &optionals, without_bit));
            }
        }
    }
}
