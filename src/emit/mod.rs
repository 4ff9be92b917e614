//! Back-ends (query emitters): lowering passes that specialize the
//! optimized IR for a target dialect and emit a query string (§4.6, §4.7).
//!
//! Both emitters share one concern factored out here: assigning stable
//! aliases to IR locations. The compound-optional region finder
//! (`optional_tree`) is only consumed by the graph-traversal emitter's
//! union rewrite — the relational emitter never needs it, since a
//! `LEFT JOIN` already produces "absent subtree projects null" for any
//! nesting depth of optionals (see DESIGN.md's note on this asymmetry).

pub mod graph_traversal;
pub mod relational;

mod alias;
mod optional_tree;

pub(crate) use alias::AliasMap;
pub(crate) use optional_tree::{collect_optionals, output_is_live, prune_for_subset, OptionalInfo};

use std::collections::HashMap;

use query_ir::{Block, Location, ScalarKind};

/// The static type name bound at every scope in a body, recursing into
/// `Fold`/`OptionalRegion` interiors. Shared by both emitters: each builds
/// its own alias strings on top of this plus [`AliasMap`]'s ordinals.
pub(crate) fn collect_type_names(body: &[Block], out: &mut HashMap<Location, String>) {
    for block in body {
        match block {
            Block::Start { location } => {
                out.insert(location.clone(), location.root_type().to_string());
            }
            Block::Traverse { location, child_type, .. } => {
                out.insert(location.clone(), child_type.clone());
            }
            Block::Recurse { location, .. } => {
                let type_name = location
                    .parent()
                    .and_then(|p| out.get(&p).cloned())
                    .unwrap_or_else(|| location.root_type().to_string());
                out.insert(location.clone(), type_name);
            }
            Block::Fold { body: inner, .. } | Block::OptionalRegion { body: inner, .. } => {
                collect_type_names(inner, out);
            }
            _ => {}
        }
    }
}

/// What a back-end produces: dialect query text plus the ordered runtime
/// parameter slots it references. The driver (C8) pairs this with the
/// `Query`'s own `outputs()` to build the public `CompileResult`.
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedQuery {
    pub text: String,
    pub parameters: Vec<(String, ScalarKind)>,
}
