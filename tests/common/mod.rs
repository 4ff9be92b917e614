//! Shared fixture schema for integration tests: the Animal/Species worked
//! example from the end-to-end scenarios.

use std::collections::HashMap;

use graphquery_compiler::schema::{FieldDescriptor, Schema, TypeDef, TypeKind};
use query_ir::{Direction, ScalarKind};

#[allow(dead_code)]
pub fn animal_species_schema() -> Schema {
    use indexmap::IndexMap;

    let mut animal_fields = IndexMap::new();
    animal_fields.insert("name".to_string(), FieldDescriptor::Property { kind: ScalarKind::String });
    animal_fields.insert("color".to_string(), FieldDescriptor::Property { kind: ScalarKind::String });
    animal_fields.insert(
        "net_worth".to_string(),
        FieldDescriptor::Property { kind: ScalarKind::Decimal },
    );
    animal_fields.insert("birthday".to_string(), FieldDescriptor::Property { kind: ScalarKind::Date });
    animal_fields.insert(
        "alias".to_string(),
        FieldDescriptor::Property { kind: ScalarKind::list_of(ScalarKind::String) },
    );
    animal_fields.insert(
        "out_Animal_ParentOf".to_string(),
        FieldDescriptor::Vertex {
            direction: Direction::Out,
            edge_name: "Animal_ParentOf".to_string(),
            target_type: "Animal".to_string(),
        },
    );
    animal_fields.insert(
        "in_Animal_ParentOf".to_string(),
        FieldDescriptor::Vertex {
            direction: Direction::In,
            edge_name: "Animal_ParentOf".to_string(),
            target_type: "Animal".to_string(),
        },
    );
    animal_fields.insert(
        "out_Animal_OfSpecies".to_string(),
        FieldDescriptor::Vertex {
            direction: Direction::Out,
            edge_name: "Animal_OfSpecies".to_string(),
            target_type: "Species".to_string(),
        },
    );

    let mut species_fields = IndexMap::new();
    species_fields.insert("name".to_string(), FieldDescriptor::Property { kind: ScalarKind::String });

    let types = vec![
        TypeDef {
            name: "Animal".to_string(),
            kind: TypeKind::Object,
            fields: animal_fields,
            implements: vec![],
            members: vec![],
        },
        TypeDef {
            name: "Species".to_string(),
            kind: TypeKind::Object,
            fields: species_fields,
            implements: vec![],
            members: vec![],
        },
    ];

    Schema::new(types, vec!["Animal".to_string(), "Species".to_string()], HashMap::new(), vec![])
        .expect("valid schema")
}
