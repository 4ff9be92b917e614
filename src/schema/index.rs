//! Index descriptors (§3.1): hints the relational emitter's join planner
//! and the graph-traversal emitter's cost model may consult, but which
//! never change compiled query semantics — every field here is read-only
//! metadata, never mutated after a `Schema` is constructed (§3.5).

use serde::{Deserialize, Serialize};

/// A declared index on one or more fields of a type (§3.1: "name, base
/// type, field set, unique?, ordered?, ignores-nulls?").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDescriptor {
    pub name: String,
    pub base_type: String,
    pub fields: Vec<String>,
    pub unique: bool,
    pub ordered: bool,
    pub ignores_nulls: bool,
}

impl IndexDescriptor {
    pub fn new(
        name: impl Into<String>,
        base_type: impl Into<String>,
        fields: Vec<impl Into<String>>,
        unique: bool,
        ordered: bool,
        ignores_nulls: bool,
    ) -> Self {
        IndexDescriptor {
            name: name.into(),
            base_type: base_type.into(),
            fields: fields.into_iter().map(Into::into).collect(),
            unique,
            ordered,
            ignores_nulls,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_declared_shape_verbatim() {
        let index = IndexDescriptor::new("animal_by_name", "Animal", vec!["name"], true, false, true);
        assert_eq!(index.name, "animal_by_name");
        assert_eq!(index.base_type, "Animal");
        assert_eq!(index.fields, vec!["name".to_string()]);
        assert!(index.unique);
        assert!(!index.ordered);
        assert!(index.ignores_nulls);
    }
}
