//! Golden snapshot tests for emitted query text (§A.5), using `insta`'s
//! inline form so the expected text lives next to the assertion instead of
//! in a separate `.snap` file.

mod common;

use std::collections::HashMap;

use common::animal_species_schema;
use graphquery_compiler::driver::{compile, Dialect};
use query_ast::builders::{document, PropertyBuilder, VertexBuilder};

fn simple_output_query() -> query_ast::Document {
    document(
        VertexBuilder::new("Animal")
            .property(PropertyBuilder::new("name").output("animal_name").build())
            .build(),
    )
}

#[test]
fn graph_traversal_text_for_a_single_projected_field() {
    let schema = animal_species_schema();
    let doc = simple_output_query();
    let result = compile(&schema, &doc, &HashMap::new(), Dialect::GraphTraversal).unwrap();
    insta::assert_snapshot!(result.text.trim_end(), @"SELECT Animal___1.name AS `animal_name` FROM (MATCH {class: Animal, as: Animal___1} RETURN $matches)");
}

#[test]
fn relational_text_for_a_single_projected_field() {
    let schema = animal_species_schema();
    let doc = simple_output_query();
    let result = compile(&schema, &doc, &HashMap::new(), Dialect::Relational).unwrap();
    insta::assert_snapshot!(result.text.trim_end(), @r#"SELECT t0.name AS "animal_name" FROM animal AS t0"#);
}
