//! Public API surface (C8): the driver wires the schema, validator (C4),
//! optimizer (C5), and a chosen back-end emitter (C6/C7) into one pure
//! function from `(schema, surface_ast, parameters_schema, dialect)` to a
//! [`CompileResult`] (§4.8, §5). `compile`/`compile_to` never mutate
//! `schema` or `config`, so both can be shared across concurrently running
//! compilations the way a read-only catalog is shared across queries.

use std::collections::HashMap;

use query_ast::Document;
use query_ir::ScalarKind;
use serde::{Deserialize, Serialize};

use crate::config::CompilerConfig;
use crate::emit::{graph_traversal, relational};
use crate::error::{CompileError, ValidationError, ValidationErrorKind};
use crate::schema::Schema;
use crate::validator;

/// Target dialect a query is lowered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// MATCH/Gremlin-style graph traversal (C6).
    GraphTraversal,
    /// SQL over a table model (C7).
    Relational,
}

/// One runtime substitution the emitted `text` expects (§6.3).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSlot {
    pub name: String,
    pub kind: ScalarKind,
}

/// One column of the result row shape (§6.3). `list` is true for a
/// `@fold`-collected output; `nullable` is true iff the output's source
/// location lies inside an optional region or is absent in some union
/// branch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputColumn {
    pub name: String,
    pub kind: ScalarKind,
    pub list: bool,
    pub nullable: bool,
}

/// The complete result of a compilation (§4.8). Serializable so golden
/// tests (§8.2) can snapshot it as structured data rather than just the
/// emitted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileResult {
    pub text: String,
    pub parameters: Vec<ParameterSlot>,
    pub outputs: Vec<OutputColumn>,
}

/// Compiles `surface_ast` against `schema` for the default configuration.
/// Equivalent to `compile_to` with `CompilerConfig::default()`.
pub fn compile(
    schema: &Schema,
    surface_ast: &Document,
    parameters_schema: &HashMap<String, ScalarKind>,
    dialect: Dialect,
) -> Result<CompileResult, CompileError> {
    compile_to(schema, surface_ast, parameters_schema, dialect, &CompilerConfig::default())
}

/// Compiles `surface_ast` against `schema` to `dialect`, with explicit
/// configuration. `parameters_schema` is the caller's declared shape for
/// every runtime parameter the query may reference (the surface parser
/// carries no type information of its own); every `$name` the validator
/// encounters is cross-checked against it.
#[tracing::instrument(skip_all, fields(root = %surface_ast.root.field_name, dialect = ?dialect))]
pub fn compile_to(
    schema: &Schema,
    surface_ast: &Document,
    parameters_schema: &HashMap<String, ScalarKind>,
    dialect: Dialect,
    config: &CompilerConfig,
) -> Result<CompileResult, CompileError> {
    let query = validator::validate(schema, surface_ast)?;
    let query = crate::optimizer::optimize(query, schema, config);

    let emitted = match dialect {
        Dialect::GraphTraversal => graph_traversal::emit(&query, config)?,
        Dialect::Relational => relational::emit(&query, schema, config)?,
    };

    let mut parameters = Vec::with_capacity(emitted.parameters.len());
    for (name, kind) in &emitted.parameters {
        if let Some(declared) = parameters_schema.get(name) {
            if declared != kind {
                return Err(CompileError::from(ValidationError::new(
                    ValidationErrorKind::TypeMismatch {
                        op: "$parameter".to_string(),
                        field: name.clone(),
                        expected: declared.name(),
                        found: kind.name(),
                    },
                    name.clone(),
                )));
            }
        }
        parameters.push(ParameterSlot { name: name.clone(), kind: kind.clone() });
    }

    let outputs = query
        .outputs()
        .iter()
        .map(|spec| OutputColumn {
            name: spec.name.clone(),
            kind: spec.kind.clone(),
            list: spec.list,
            nullable: spec.nullable,
        })
        .collect();

    Ok(CompileResult { text: emitted.text, parameters, outputs })
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_ast::builders::{document, PropertyBuilder, VertexBuilder};
    use query_ir::ScalarKind;

    use crate::schema::test_fixtures::animal_species_schema;

    #[test]
    fn compiles_simple_query_to_graph_traversal_text() {
        let schema = animal_species_schema();
        let doc = document(
            VertexBuilder::new("Animal")
                .property(PropertyBuilder::new("name").output("animal_name").build())
                .build(),
        );
        let result = compile(&schema, &doc, &HashMap::new(), Dialect::GraphTraversal).unwrap();
        assert!(result.text.contains("Animal"));
        assert_eq!(result.outputs.len(), 1);
        assert_eq!(result.outputs[0].name, "animal_name");
    }

    #[test]
    fn parameter_kind_mismatch_against_declared_schema_is_rejected() {
        let schema = animal_species_schema();
        let doc = document(
            VertexBuilder::new("Animal")
                .property(
                    PropertyBuilder::new("name")
                        .output("animal_name")
                        .filter("=", vec!["$name"])
                        .build(),
                )
                .build(),
        );
        let mut declared = HashMap::new();
        declared.insert("name".to_string(), ScalarKind::Int);
        let err = compile(&schema, &doc, &declared, Dialect::GraphTraversal).unwrap_err();
        assert!(matches!(err, CompileError::Validation(_)));
    }

    #[test]
    fn unsupported_relational_feature_is_reported() {
        let schema = animal_species_schema();
        let doc = document(
            VertexBuilder::new("Animal")
                .vertex(
                    VertexBuilder::new("out_Animal_ParentOf")
                        .recurse(2)
                        .property(PropertyBuilder::new("name").output("ancestor_name").build())
                        .build(),
                )
                .build(),
        );
        let err = compile(&schema, &doc, &HashMap::new(), Dialect::Relational).unwrap_err();
        assert!(matches!(err, CompileError::UnsupportedFeature(_)));
    }
}
