//! Integration tests for the nine universal properties.

mod common;

use std::collections::HashMap;

use common::animal_species_schema;
use graphquery_compiler::driver::{compile, Dialect};
use graphquery_compiler::error::{CompileError, ValidationErrorKind};
use query_ast::builders::{document, PropertyBuilder, VertexBuilder};
use query_ir::ScalarKind;

fn simple_output_query() -> query_ast::Document {
    document(
        VertexBuilder::new("Animal")
            .property(PropertyBuilder::new("name").output("animal_name").build())
            .build(),
    )
}

#[test]
fn determinism_across_repeated_compilations() {
    let schema = animal_species_schema();
    let doc = simple_output_query();
    let first = compile(&schema, &doc, &HashMap::new(), Dialect::GraphTraversal).unwrap();
    let second = compile(&schema, &doc, &HashMap::new(), Dialect::GraphTraversal).unwrap();
    assert_eq!(first.text, second.text);
    assert_eq!(first.parameters, second.parameters);
    assert_eq!(first.outputs, second.outputs);
}

#[test]
fn duplicate_output_names_are_rejected() {
    let schema = animal_species_schema();
    let doc = document(
        VertexBuilder::new("Animal")
            .property(PropertyBuilder::new("name").output("n").build())
            .property(PropertyBuilder::new("color").output("n").build())
            .build(),
    );
    let err = compile(&schema, &doc, &HashMap::new(), Dialect::GraphTraversal).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Validation(e) if matches!(e.kind, ValidationErrorKind::DuplicateName(_))
    ));
}

#[test]
fn reserved_output_name_is_rejected() {
    let schema = animal_species_schema();
    let doc = document(
        VertexBuilder::new("Animal")
            .property(PropertyBuilder::new("name").output("___reserved").build())
            .build(),
    );
    let err = compile(&schema, &doc, &HashMap::new(), Dialect::GraphTraversal).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Validation(e) if matches!(e.kind, ValidationErrorKind::ReservedName(_))
    ));
}

#[test]
fn parameter_closure_every_parameter_appears_in_text_and_vice_versa() {
    let schema = animal_species_schema();
    let doc = document(
        VertexBuilder::new("Animal")
            .property(PropertyBuilder::new("name").output("n").build())
            .property(
                PropertyBuilder::new("net_worth")
                    .filter("=", vec!["$nw"])
                    .build(),
            )
            .build(),
    );
    let mut declared = HashMap::new();
    declared.insert("nw".to_string(), ScalarKind::Decimal);
    let result = compile(&schema, &doc, &declared, Dialect::GraphTraversal).unwrap();
    assert_eq!(result.parameters.len(), 1);
    assert_eq!(result.parameters[0].name, "nw");
    assert!(result.text.contains("nw"));
}

#[test]
fn output_closure_marks_fold_outputs_as_lists_and_optional_outputs_as_nullable() {
    let schema = animal_species_schema();
    let doc = document(
        VertexBuilder::new("Animal")
            .property(PropertyBuilder::new("name").output("a").build())
            .vertex(
                VertexBuilder::new("out_Animal_ParentOf")
                    .fold()
                    .property(PropertyBuilder::new("name").output("children").build())
                    .build(),
            )
            .vertex(
                VertexBuilder::new("in_Animal_ParentOf")
                    .optional()
                    .property(PropertyBuilder::new("name").output("parent").build())
                    .build(),
            )
            .build(),
    );
    let result = compile(&schema, &doc, &HashMap::new(), Dialect::GraphTraversal).unwrap();
    let children = result.outputs.iter().find(|o| o.name == "children").unwrap();
    assert!(children.list);
    let parent = result.outputs.iter().find(|o| o.name == "parent").unwrap();
    assert!(parent.nullable);
    let a = result.outputs.iter().find(|o| o.name == "a").unwrap();
    assert!(!a.list);
    assert!(!a.nullable);
}

#[test]
fn fold_count_equivalence_both_forms_compile_with_the_same_parameter() {
    let schema = animal_species_schema();

    let via_has_edge_degree = document(
        VertexBuilder::new("Animal")
            .property(PropertyBuilder::new("name").output("n").build())
            .vertex(
                VertexBuilder::new("out_Animal_ParentOf")
                    .filter("has_edge_degree", vec!["$k"])
                    .property(PropertyBuilder::new("name").output("p").build())
                    .build(),
            )
            .build(),
    );
    let via_fold_count = document(
        VertexBuilder::new("Animal")
            .property(PropertyBuilder::new("name").output("n").build())
            .vertex(
                VertexBuilder::new("out_Animal_ParentOf")
                    .fold()
                    .property(
                        PropertyBuilder::new("_x_count")
                            .filter("=", vec!["$k"])
                            .build(),
                    )
                    .build(),
            )
            .build(),
    );

    let mut declared = HashMap::new();
    declared.insert("k".to_string(), ScalarKind::Int);

    let left = compile(&schema, &via_has_edge_degree, &declared, Dialect::GraphTraversal);
    let right = compile(&schema, &via_fold_count, &declared, Dialect::GraphTraversal);
    assert!(left.is_ok());
    assert!(right.is_ok());
    assert_eq!(left.unwrap().parameters, right.unwrap().parameters);
}

#[test]
fn compound_optional_alternatives_are_disjoint_by_subset_bitmask() {
    let schema = animal_species_schema();
    let doc = document(
        VertexBuilder::new("Animal")
            .property(PropertyBuilder::new("name").output("a").build())
            .vertex(
                VertexBuilder::new("out_Animal_ParentOf")
                    .optional()
                    .property(PropertyBuilder::new("name").output("p").build())
                    .vertex(
                        VertexBuilder::new("in_Animal_ParentOf")
                            .optional()
                            .property(PropertyBuilder::new("name").output("c").build())
                            .build(),
                    )
                    .build(),
            )
            .build(),
    );
    let result = compile(&schema, &doc, &HashMap::new(), Dialect::GraphTraversal).unwrap();
    for k in 0..4 {
        assert!(
            result.text.contains(&format!("$optional__{k}")),
            "missing alternative {k} in {}",
            result.text
        );
    }
    assert!(result.text.contains("UNIONALL($optional__0, $optional__1, $optional__2, $optional__3)"));
}

#[test]
fn redundant_coercion_elimination_round_trips_to_the_uncoerced_text() {
    let schema = animal_species_schema();
    let with_coercion = document(
        VertexBuilder::new("Animal")
            .coerce_to("Animal")
            .property(PropertyBuilder::new("name").output("n").build())
            .build(),
    );
    let without_coercion = simple_output_query();
    let left = compile(&schema, &with_coercion, &HashMap::new(), Dialect::GraphTraversal).unwrap();
    let right = compile(&schema, &without_coercion, &HashMap::new(), Dialect::GraphTraversal).unwrap();
    assert_eq!(left.text, right.text);
}

#[test]
fn malformed_literal_value_is_rejected() {
    let schema = animal_species_schema();
    let doc = document(
        VertexBuilder::new("Animal")
            .property(
                PropertyBuilder::new("net_worth")
                    .filter("=", vec!["not-a-parameter"])
                    .build(),
            )
            .build(),
    );
    let err = compile(&schema, &doc, &HashMap::new(), Dialect::GraphTraversal).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Validation(e) if matches!(e.kind, ValidationErrorKind::BadLiteralValue(_))
    ));
}

#[test]
fn tag_referenced_before_its_source_is_rejected() {
    let schema = animal_species_schema();
    let doc = document(
        VertexBuilder::new("Animal")
            .property(
                PropertyBuilder::new("net_worth")
                    .filter("<", vec!["%later"])
                    .build(),
            )
            .property(PropertyBuilder::new("name").tag("later").build())
            .build(),
    );
    let err = compile(&schema, &doc, &HashMap::new(), Dialect::GraphTraversal).unwrap_err();
    assert!(matches!(
        err,
        CompileError::Validation(e) if matches!(e.kind, ValidationErrorKind::TagOrdering { .. })
    ));
}
