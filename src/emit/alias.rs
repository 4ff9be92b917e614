//! Stable alias assignment from IR [`Location`]s, shared by both
//! emitters' "one alias per scope" needs (`Animal___1`-style aliases for
//! the graph-traversal emitter, `t0`/`t1`-style aliases for the relational
//! one build their own scheme on top of the same traversal order).

use indexmap::IndexMap;
use query_ir::{Block, Location};

/// Maps every scope [`Location`] reached while walking a block sequence to
/// a sequence number, assigned in IR document order (§8.1 determinism).
#[derive(Debug, Default)]
pub struct AliasMap {
    order: IndexMap<Location, usize>,
}

impl AliasMap {
    pub fn build(body: &[Block]) -> Self {
        let mut map = AliasMap::default();
        map.walk(body);
        map
    }

    fn walk(&mut self, body: &[Block]) {
        for block in body {
            match block {
                Block::Start { location } | Block::Traverse { location, .. } | Block::Recurse { location, .. } => {
                    self.insert(location.clone());
                }
                Block::Fold { body: inner, .. } | Block::OptionalRegion { body: inner, .. } => self.walk(inner),
                _ => {}
            }
        }
    }

    fn insert(&mut self, location: Location) {
        let next = self.order.len();
        self.order.entry(location).or_insert(next);
    }

    /// The 0-based sequence number assigned to `location`, or `None` if it
    /// was never visited by [`AliasMap::build`] (an internal-error
    /// condition — every location referenced by a filter/output must have
    /// been visited by a `Start`/`Traverse`/`Recurse` first).
    pub fn ordinal(&self, location: &Location) -> Option<usize> {
        self.order.get(location).copied()
    }
}
