//! Schema deserialization (§6.2): "a schema-description value equivalent
//! to the GraphQL schema language, extended with" the custom directives,
//! scalars, equivalence map, and index list. Construction from live code
//! goes through [`Schema::new`] directly; this module is the
//! deserialize-from-a-structured-value path, used when a schema is loaded
//! from a file or a sidecar service rather than built programmatically.
//!
//! [`SchemaDocument`] mirrors `Schema::new`'s constructor arguments as a
//! `serde`-deserializable value — it performs no validation of its own,
//! deferring every invariant check in §3.1 to [`Schema::new`] so there is
//! exactly one place those rules live.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::SchemaError;

use super::{FieldDescriptor, IndexDescriptor, Schema, TypeDef, TypeKind};

/// The on-disk/over-the-wire shape of a schema (§6.2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaDocument {
    pub types: Vec<TypeDef>,
    pub root_types: Vec<String>,
    /// Object type name -> equivalent union type name (§3.1 "type
    /// equivalence hint").
    #[serde(default)]
    pub equivalent_unions: HashMap<String, String>,
    #[serde(default)]
    pub indexes: Vec<IndexDescriptor>,
}

impl SchemaDocument {
    /// Validates this document against every §3.1 invariant and builds a
    /// [`Schema`]. This is the only place a `SchemaDocument` is turned
    /// into a usable `Schema` — there is no "trust the wire format" path.
    pub fn into_schema(self) -> Result<Schema, SchemaError> {
        Schema::new(self.types, self.root_types, self.equivalent_unions, self.indexes)
    }
}

impl Schema {
    /// Deserializes and validates a schema from a JSON document shaped
    /// like [`SchemaDocument`] (§6.2). Parse failures and schema-invariant
    /// violations are both reported as [`SchemaError`]; the caller cannot
    /// observe a partially constructed `Schema` either way (§5: failures
    /// are total).
    pub fn from_json(json: &str) -> Result<Schema, SchemaError> {
        let doc: SchemaDocument =
            serde_json::from_str(json).map_err(|e| SchemaError::Deserialize(e.to_string()))?;
        doc.into_schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animal_schema_json() -> &'static str {
        r#"{
            "types": [
                {
                    "name": "Animal",
                    "kind": "object",
                    "fields": {
                        "name": { "property": { "kind": "string" } },
                        "out_Animal_ParentOf": {
                            "vertex": { "direction": "out", "edge_name": "Animal_ParentOf", "target_type": "Animal" }
                        }
                    }
                }
            ],
            "root_types": ["Animal"]
        }"#
    }

    #[test]
    fn rejects_malformed_json_as_schema_error() {
        let result = Schema::from_json("not json");
        assert!(matches!(result, Err(SchemaError::Deserialize(_))));
    }

    #[test]
    fn deserializes_real_schema_json_end_to_end() {
        let schema = Schema::from_json(animal_schema_json()).expect("valid schema JSON");
        assert!(schema.lookup_type("Animal").is_ok());
        assert!(matches!(
            schema.field("Animal", "name"),
            Ok(FieldDescriptor::Property { kind: query_ir::ScalarKind::String })
        ));
        let (target, _) = schema.resolve_edge("Animal", query_ir::Direction::Out, "out_Animal_ParentOf").unwrap();
        assert_eq!(target, "Animal");
    }

    #[test]
    fn deserializes_a_minimal_schema_and_enforces_invariants() {
        // A schema whose only type is named the same as a reserved
        // meta-field-style prefix should still be rejected the same way
        // as a programmatically constructed one — `into_schema` defers
        // to `Schema::new`, it does not special-case the wire path.
        let doc = SchemaDocument {
            types: vec![TypeDef {
                name: "Animal".to_string(),
                kind: TypeKind::Object,
                fields: {
                    let mut fields = indexmap::IndexMap::new();
                    fields.insert(
                        "___bad".to_string(),
                        FieldDescriptor::Property { kind: query_ir::ScalarKind::String },
                    );
                    fields
                },
                implements: vec![],
                members: vec![],
            }],
            root_types: vec!["Animal".to_string()],
            equivalent_unions: HashMap::new(),
            indexes: vec![],
        };
        let result = doc.into_schema();
        assert!(matches!(result, Err(SchemaError::ReservedName(_))));
    }

    #[test]
    fn round_trips_through_json_serialization() {
        use crate::schema::test_fixtures::animal_species_schema;

        let schema = animal_species_schema();
        let doc = SchemaDocument {
            types: schema.types.values().cloned().collect(),
            root_types: schema.root_types().to_vec(),
            equivalent_unions: HashMap::new(),
            indexes: schema.indexes().to_vec(),
        };
        let json = serde_json::to_string(&doc).expect("schema document serializes");
        let restored: SchemaDocument = serde_json::from_str(&json).expect("schema document deserializes");
        let rebuilt = restored.into_schema().expect("valid schema");
        assert_eq!(rebuilt.root_types(), schema.root_types());
    }
}
