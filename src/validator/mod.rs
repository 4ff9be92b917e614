//! Validator / front-end (C4): a single pass over the surface AST that
//! enforces every directive rule from §4.4 and produces an IR [`Query`].
//! Errors are reported in AST-preorder order: whichever offending rule is
//! reached first during the walk is the one returned.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use query_ast::{Direction as AstDirection, Document, FilterDirective, PropertySelection, VertexSelection};
use query_ir::{
    Block, CompareOp, Direction, Expr, Location, MetaField, OrdinalAllocator, OutputField, OutputSpec, Query,
    ScalarKind,
};
use regex::Regex;

use crate::error::{SchemaError, ValidationError, ValidationErrorKind};
use crate::schema::{FieldDescriptor, Schema};

static NAME_GRAMMAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_]+$").expect("valid regex"));
static LITERAL_GRAMMAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[$%][A-Za-z_]+$").expect("valid regex"));

fn ir_direction(d: AstDirection) -> Direction {
    match d {
        AstDirection::In => Direction::In,
        AstDirection::Out => Direction::Out,
    }
}

#[derive(Clone)]
struct TagSource {
    location: Location,
    kind: ScalarKind,
    field: OutputField,
}

/// Runs the validator over `doc` against `schema`, producing an IR query.
#[tracing::instrument(skip_all, fields(root = %doc.root.field_name))]
pub fn validate(schema: &Schema, doc: &Document) -> Result<Query, ValidationError> {
    let root_type = doc.root.field_name.clone();
    if !schema.root_types().iter().any(|t| t == &root_type) {
        return Err(ValidationError::new(
            ValidationErrorKind::UnknownField {
                owner: "<root>".to_string(),
                field: root_type.clone(),
            },
            root_type,
        ));
    }

    let mut validator = Validator {
        schema,
        ordinals: OrdinalAllocator::new(),
        output_names: std::collections::HashSet::new(),
        tags: HashMap::new(),
        outputs: Vec::new(),
        output_source_seen: false,
    };

    let root_location = Location::root(root_type.clone());
    let mut body = vec![Block::Start { location: root_location.clone() }];
    validator.visit_scope(&mut body, &doc.root, root_location, root_type, false, false, false)?;
    body.push(Block::ConstructResult { outputs: validator.outputs });

    Ok(Query { root_type: doc.root.field_name.clone(), body })
}

struct Validator<'a> {
    schema: &'a Schema,
    ordinals: OrdinalAllocator,
    output_names: std::collections::HashSet<String>,
    tags: HashMap<String, TagSource>,
    outputs: Vec<OutputSpec>,
    output_source_seen: bool,
}

impl<'a> Validator<'a> {
    fn check_name(&self, name: &str) -> Result<(), ValidationErrorKind> {
        if name.starts_with("___") {
            return Err(ValidationErrorKind::ReservedName(name.to_string()));
        }
        if !NAME_GRAMMAR.is_match(name) {
            return Err(ValidationErrorKind::NameViolation { name: name.to_string() });
        }
        Ok(())
    }

    fn register_output(
        &mut self,
        out_name: &str,
        location: &Location,
        field: OutputField,
        kind: ScalarKind,
        list: bool,
        nullable: bool,
    ) -> Result<(), ValidationError> {
        self.check_name(out_name).map_err(|k| ValidationError::new(k, location.to_string()))?;
        if !self.output_names.insert(out_name.to_string()) {
            return Err(ValidationError::new(
                ValidationErrorKind::DuplicateName(out_name.to_string()),
                location.to_string(),
            ));
        }
        self.outputs.push(OutputSpec {
            name: out_name.to_string(),
            location: location.clone(),
            field,
            kind,
            list,
            nullable,
        });
        Ok(())
    }

    fn register_tag(
        &mut self,
        tag_name: &str,
        location: &Location,
        kind: ScalarKind,
        field: OutputField,
    ) -> Result<(), ValidationError> {
        self.check_name(tag_name).map_err(|k| ValidationError::new(k, location.to_string()))?;
        if self.tags.contains_key(tag_name) {
            return Err(ValidationError::new(
                ValidationErrorKind::DuplicateName(tag_name.to_string()),
                location.to_string(),
            ));
        }
        self.tags
            .insert(tag_name.to_string(), TagSource { location: location.clone(), kind, field });
        Ok(())
    }

    fn wrong_arity(&self, op: &str, expected: usize, found: usize, location: &Location) -> ValidationError {
        ValidationError::new(
            ValidationErrorKind::WrongArity { op: op.to_string(), expected, found },
            location.to_string(),
        )
    }

    /// Resolves one `@filter` value string (`$name` or `%name`) into an
    /// [`Expr`], checking the literal grammar (§8.1.8), tag ordering, and
    /// type compatibility against `expected_kind`.
    fn resolve_value(
        &self,
        raw: &str,
        expected_kind: &ScalarKind,
        op_name: &str,
        location: &Location,
    ) -> Result<Expr, ValidationError> {
        if !LITERAL_GRAMMAR.is_match(raw) {
            return Err(ValidationError::new(
                ValidationErrorKind::BadLiteralValue(raw.to_string()),
                location.to_string(),
            ));
        }
        if let Some(name) = raw.strip_prefix('$') {
            Ok(Expr::Parameter { name: name.to_string(), kind: expected_kind.clone() })
        } else {
            let tag_name = raw.strip_prefix('%').expect("checked by LITERAL_GRAMMAR");
            let source = self.tags.get(tag_name).cloned().ok_or_else(|| {
                ValidationError::new(ValidationErrorKind::TagOrdering { tag: tag_name.to_string() }, location.to_string())
            })?;
            if source.kind != *expected_kind {
                return Err(ValidationError::new(
                    ValidationErrorKind::TypeMismatch {
                        op: op_name.to_string(),
                        field: tag_name.to_string(),
                        expected: expected_kind.name(),
                        found: source.kind.name(),
                    },
                    location.to_string(),
                ));
            }
            Ok(Expr::TaggedParameter {
                name: tag_name.to_string(),
                kind: source.kind,
                source: source.location,
                field: source.field,
            })
        }
    }

    /// Builds the filter expression for one `@filter` directive whose
    /// left-hand side is `lhs` (a property field access or a meta access
    /// such as `_x_count`).
    fn build_filter_expr(
        &self,
        location: &Location,
        lhs_name: &str,
        lhs: Expr,
        field_kind: &ScalarKind,
        filter: &FilterDirective,
    ) -> Result<Expr, ValidationError> {
        let op_name = filter.op_name.as_str();
        match op_name {
            "between" => {
                if filter.values.len() != 2 {
                    return Err(self.wrong_arity(op_name, 2, filter.values.len(), location));
                }
                let lower = self.resolve_value(&filter.values[0], field_kind, op_name, location)?;
                let upper = self.resolve_value(&filter.values[1], field_kind, op_name, location)?;
                Ok(Expr::Between { value: Box::new(lhs), lower: Box::new(lower), upper: Box::new(upper) })
            }
            "is_null" => {
                if !filter.values.is_empty() {
                    return Err(self.wrong_arity(op_name, 0, filter.values.len(), location));
                }
                Ok(Expr::IsNull(Box::new(lhs)))
            }
            "is_not_null" => {
                if !filter.values.is_empty() {
                    return Err(self.wrong_arity(op_name, 0, filter.values.len(), location));
                }
                Ok(Expr::IsNotNull(Box::new(lhs)))
            }
            _ => {
                let op = CompareOp::parse(op_name)
                    .ok_or_else(|| ValidationError::new(ValidationErrorKind::UnknownOperator(op_name.to_string()), location.to_string()))?;
                if filter.values.len() != 1 {
                    return Err(self.wrong_arity(op_name, 1, filter.values.len(), location));
                }
                let expected_kind = match op {
                    CompareOp::In | CompareOp::NotIn => ScalarKind::list_of(field_kind.clone()),
                    CompareOp::Contains | CompareOp::NotContains => {
                        if !field_kind.is_list() {
                            return Err(ValidationError::new(
                                ValidationErrorKind::TypeMismatch {
                                    op: op_name.to_string(),
                                    field: lhs_name.to_string(),
                                    expected: "list".to_string(),
                                    found: field_kind.name(),
                                },
                                location.to_string(),
                            ));
                        }
                        field_kind.element_kind().clone()
                    }
                    CompareOp::Intersects => {
                        if !field_kind.is_list() {
                            return Err(ValidationError::new(
                                ValidationErrorKind::TypeMismatch {
                                    op: op_name.to_string(),
                                    field: lhs_name.to_string(),
                                    expected: "list".to_string(),
                                    found: field_kind.name(),
                                },
                                location.to_string(),
                            ));
                        }
                        field_kind.clone()
                    }
                    CompareOp::HasSubstring | CompareOp::StartsWith | CompareOp::EndsWith => {
                        if !matches!(field_kind, ScalarKind::String) {
                            return Err(ValidationError::new(
                                ValidationErrorKind::TypeMismatch {
                                    op: op_name.to_string(),
                                    field: lhs_name.to_string(),
                                    expected: "String".to_string(),
                                    found: field_kind.name(),
                                },
                                location.to_string(),
                            ));
                        }
                        ScalarKind::String
                    }
                    CompareOp::NameOrAlias => {
                        return Err(ValidationError::new(
                            ValidationErrorKind::UnknownOperator(op_name.to_string()),
                            location.to_string(),
                        ))
                    }
                    CompareOp::Eq | CompareOp::Ne | CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
                        field_kind.clone()
                    }
                };
                let value = self.resolve_value(&filter.values[0], &expected_kind, op_name, location)?;
                Ok(Expr::Compare { op, left: Box::new(lhs), right: Box::new(value) })
            }
        }
    }

    /// Filters declared directly on a vertex field, other than
    /// `has_edge_degree` (handled by the caller, which alone knows the
    /// parent scope and edge this field represents).
    fn visit_own_vertex_filters(
        &self,
        body: &mut Vec<Block>,
        location: &Location,
        current_type: &str,
        filters: &[FilterDirective],
    ) -> Result<(), ValidationError> {
        for filter in filters {
            if filter.op_name == "has_edge_degree" {
                continue;
            }
            match filter.op_name.as_str() {
                "name_or_alias" => {
                    if filter.values.len() != 1 {
                        return Err(self.wrong_arity("name_or_alias", 1, filter.values.len(), location));
                    }
                    self.schema
                        .field(current_type, "name")
                        .map_err(|e| ValidationError::new(ValidationErrorKind::Schema(e), location.to_string()))?;
                    self.schema
                        .field(current_type, "alias")
                        .map_err(|e| ValidationError::new(ValidationErrorKind::Schema(e), location.to_string()))?;
                    let value = self.resolve_value(&filter.values[0], &ScalarKind::String, "name_or_alias", location)?;
                    let expr = Expr::Or(vec![
                        Expr::Compare {
                            op: CompareOp::Eq,
                            left: Box::new(Expr::Field { location: location.clone(), field: "name".to_string() }),
                            right: Box::new(value.clone()),
                        },
                        Expr::Compare {
                            op: CompareOp::Contains,
                            left: Box::new(Expr::Field { location: location.clone(), field: "alias".to_string() }),
                            right: Box::new(value),
                        },
                    ]);
                    body.push(Block::Filter { location: location.clone(), expr });
                }
                other => {
                    return Err(ValidationError::new(
                        ValidationErrorKind::UnknownOperator(other.to_string()),
                        location.to_string(),
                    ))
                }
            }
        }
        Ok(())
    }

    fn visit_property(
        &mut self,
        body: &mut Vec<Block>,
        prop: &PropertySelection,
        location: &Location,
        current_type: &str,
        within_fold: bool,
        within_optional: bool,
        is_innermost: bool,
    ) -> Result<(), ValidationError> {
        if prop.field_name == "_x_count" {
            if !within_fold || !is_innermost {
                return Err(ValidationError::new(
                    ValidationErrorKind::PlacementViolation {
                        field: "_x_count".to_string(),
                        detail: "`_x_count` is only meaningful at a fold's innermost scope".to_string(),
                    },
                    location.to_string(),
                ));
            }
            if prop.directives.tag.is_some() {
                return Err(ValidationError::new(
                    ValidationErrorKind::PlacementViolation {
                        field: "_x_count".to_string(),
                        detail: "`@tag` may not appear inside `@fold`".to_string(),
                    },
                    location.to_string(),
                ));
            }
            for filter in &prop.directives.filters {
                let expr = self.build_filter_expr(
                    location,
                    "_x_count",
                    Expr::Meta { location: location.clone(), meta: MetaField::Count },
                    &ScalarKind::Int,
                    filter,
                )?;
                body.push(Block::Filter { location: location.clone(), expr });
            }
            if let Some(out_name) = &prop.directives.output {
                self.register_output(out_name, location, OutputField::Meta(MetaField::Count), ScalarKind::Int, false, within_optional)?;
            }
            return Ok(());
        }

        let descriptor = if prop.field_name == "__typename" {
            FieldDescriptor::Meta(MetaField::Typename)
        } else {
            self.schema
                .field(current_type, &prop.field_name)
                .map_err(|e| ValidationError::new(ValidationErrorKind::Schema(e), location.to_string()))?
        };

        let (output_field, kind) = match descriptor {
            FieldDescriptor::Property { kind } => (OutputField::Property(prop.field_name.clone()), kind),
            FieldDescriptor::Meta(MetaField::Typename) => (OutputField::Meta(MetaField::Typename), ScalarKind::String),
            FieldDescriptor::Meta(MetaField::Count) => unreachable!("_x_count handled above"),
            FieldDescriptor::Vertex { .. } => {
                return Err(ValidationError::new(
                    ValidationErrorKind::UnknownField { owner: current_type.to_string(), field: prop.field_name.clone() },
                    location.to_string(),
                ))
            }
        };

        if within_fold && !is_innermost && prop.directives.output.is_some() {
            return Err(ValidationError::new(
                ValidationErrorKind::PlacementViolation {
                    field: prop.field_name.clone(),
                    detail: "`@output`/`_x_count` inside a fold must be declared at the fold's innermost scope".to_string(),
                },
                location.to_string(),
            ));
        }

        if let Some(tag_name) = &prop.directives.tag {
            if within_fold {
                return Err(ValidationError::new(
                    ValidationErrorKind::PlacementViolation {
                        field: prop.field_name.clone(),
                        detail: "`@tag` may not appear inside `@fold`".to_string(),
                    },
                    location.to_string(),
                ));
            }
            self.register_tag(tag_name, location, kind.clone(), output_field.clone())?;
        }

        for filter in &prop.directives.filters {
            let expr = self.build_filter_expr(
                location,
                &prop.field_name,
                Expr::Field { location: location.clone(), field: prop.field_name.clone() },
                &kind,
                filter,
            )?;
            body.push(Block::Filter { location: location.clone(), expr });
        }

        if let Some(out_name) = &prop.directives.output {
            self.register_output(out_name, location, output_field, kind, within_fold, within_optional)?;
        }

        Ok(())
    }

    /// Visits one vertex scope: its coercion, its own filters, its
    /// property selections, and its nested vertex fields. Returns the
    /// deepest location reached while descending through this subtree.
    fn visit_scope(
        &mut self,
        body: &mut Vec<Block>,
        sel: &VertexSelection,
        location: Location,
        mut current_type: String,
        within_fold: bool,
        within_optional: bool,
        within_recurse: bool,
    ) -> Result<Location, ValidationError> {
        if let Some(to_type) = &sel.coerce_to {
            if !self.schema.is_subtype(to_type, &current_type) {
                return Err(ValidationError::new(
                    ValidationErrorKind::Schema(SchemaError::UnknownType(to_type.clone())),
                    location.to_string(),
                ));
            }
            body.push(Block::Coerce { to_type: to_type.clone(), location: location.clone() });
            current_type = to_type.clone();
        }

        self.visit_own_vertex_filters(body, &location, &current_type, &sel.directives.filters)?;

        if let Some(tag_name) = &sel.directives.tag {
            if within_fold {
                return Err(ValidationError::new(
                    ValidationErrorKind::PlacementViolation {
                        field: sel.field_name.clone(),
                        detail: "`@tag` may not appear inside `@fold`".to_string(),
                    },
                    location.to_string(),
                ));
            }
            self.register_tag(tag_name, &location, ScalarKind::String, OutputField::Meta(MetaField::Typename))?;
        }
        if let Some(out_name) = &sel.directives.output {
            self.register_output(out_name, &location, OutputField::Meta(MetaField::Typename), ScalarKind::String, within_fold, within_optional)?;
        }

        if within_fold && sel.vertices.len() > 1 {
            return Err(ValidationError::new(
                ValidationErrorKind::PlacementViolation {
                    field: sel.field_name.clone(),
                    detail: "a fold scope may contain at most one vertex expansion".to_string(),
                },
                location.to_string(),
            ));
        }

        let is_innermost = sel.vertices.is_empty();
        for prop in &sel.properties {
            self.visit_property(body, prop, &location, &current_type, within_fold, within_optional, is_innermost)?;
        }

        if within_fold && is_innermost {
            let has_output = self.outputs.iter().any(|o| o.location == location);
            let has_count_filter = body
                .iter()
                .any(|b| matches!(b, Block::Filter { location: loc, expr } if *loc == location && expr_references_count(expr)));
            if !has_output && !has_count_filter {
                return Err(ValidationError::new(
                    ValidationErrorKind::MissingOutputInFold { field: sel.field_name.clone() },
                    location.to_string(),
                ));
            }
        }

        let mut deepest = location.clone();
        for child in &sel.vertices {
            deepest = self.visit_vertex_field(body, child, &location, &current_type, within_fold, within_optional, within_recurse)?;
        }
        Ok(deepest)
    }

    fn visit_vertex_field(
        &mut self,
        body: &mut Vec<Block>,
        sel: &VertexSelection,
        parent_location: &Location,
        parent_type: &str,
        within_fold: bool,
        within_optional: bool,
        within_recurse: bool,
    ) -> Result<Location, ValidationError> {
        let (ast_direction, edge_name) = sel.parse_edge_name().ok_or_else(|| {
            ValidationError::new(
                ValidationErrorKind::UnknownField { owner: parent_type.to_string(), field: sel.field_name.clone() },
                parent_location.to_string(),
            )
        })?;
        let direction = ir_direction(ast_direction);
        let edge_name = edge_name.to_string();

        let d = &sel.directives;
        if d.optional && (d.recurse_depth.is_some() || d.fold || d.output_source) {
            return Err(ValidationError::new(
                ValidationErrorKind::PlacementViolation {
                    field: sel.field_name.clone(),
                    detail: "`@optional` may not coexist with `@recurse`, `@fold`, or `@output_source`".to_string(),
                },
                parent_location.to_string(),
            ));
        }
        if within_optional && (d.fold || d.output_source) {
            let feature = if d.fold { "@fold" } else { "@output_source" };
            return Err(ValidationError::new(
                ValidationErrorKind::PlacementViolation {
                    field: sel.field_name.clone(),
                    detail: format!("`{feature}` may not appear inside `@optional`"),
                },
                parent_location.to_string(),
            ));
        }
        if within_recurse && (d.optional || d.fold || d.output_source) {
            let feature = if d.optional {
                "@optional"
            } else if d.fold {
                "@fold"
            } else {
                "@output_source"
            };
            return Err(ValidationError::new(
                ValidationErrorKind::PlacementViolation {
                    field: sel.field_name.clone(),
                    detail: format!("`{feature}` may not appear inside `@recurse`"),
                },
                parent_location.to_string(),
            ));
        }
        if within_fold && (d.recurse_depth.is_some() || d.optional || d.fold || d.output_source) {
            let feature = if d.recurse_depth.is_some() {
                "@recurse"
            } else if d.optional {
                "@optional"
            } else if d.fold {
                "@fold"
            } else {
                "@output_source"
            };
            return Err(ValidationError::new(
                ValidationErrorKind::PlacementViolation {
                    field: sel.field_name.clone(),
                    detail: format!("`{feature}` may not appear inside `@fold`"),
                },
                parent_location.to_string(),
            ));
        }

        for filter in &sel.directives.filters {
            if filter.op_name == "has_edge_degree" {
                if filter.values.len() != 1 {
                    return Err(self.wrong_arity("has_edge_degree", 1, filter.values.len(), parent_location));
                }
                let degree = self.resolve_value(&filter.values[0], &ScalarKind::Int, "has_edge_degree", parent_location)?;
                let expr = Expr::HasEdgeDegree {
                    location: parent_location.clone(),
                    direction,
                    edge_name: edge_name.clone(),
                    degree: Box::new(degree),
                };
                body.push(Block::Filter { location: parent_location.clone(), expr });
            }
        }

        let (child_type, _edge_kind) = self
            .schema
            .resolve_edge(parent_type, direction, &sel.field_name)
            .map_err(|e| ValidationError::new(ValidationErrorKind::Schema(e), parent_location.to_string()))?;

        let ordinal = self.ordinals.next(parent_location, direction, &edge_name);
        let child_location = parent_location.child_edge(direction, edge_name.clone(), ordinal);

        if let Some(depth) = sel.directives.recurse_depth {
            if depth < 1 {
                return Err(ValidationError::new(
                    ValidationErrorKind::InvalidRecurseDepth { depth: i64::from(depth) },
                    child_location.to_string(),
                ));
            }
            let types_ok = self.schema.is_subtype(&child_type, parent_type) || self.schema.is_subtype(parent_type, &child_type);
            if !types_ok {
                return Err(ValidationError::new(
                    ValidationErrorKind::InvalidRecurseTypes { from: parent_type.to_string(), to: child_type.clone() },
                    child_location.to_string(),
                ));
            }
            body.push(Block::Recurse { direction, edge_name: edge_name.clone(), depth, location: child_location.clone() });
            return self.visit_scope(body, sel, child_location, child_type, within_fold, within_optional, true);
        }

        if sel.directives.fold {
            let mut fold_body = vec![Block::Traverse {
                direction,
                edge_name: edge_name.clone(),
                child_type: child_type.clone(),
                location: child_location.clone(),
                optional: false,
                within_fold: true,
                within_optional: false,
            }];
            let outputs_before = self.outputs.len();
            let deepest = self.visit_scope(&mut fold_body, sel, child_location.clone(), child_type, true, false, false)?;
            let has_output = self.outputs.len() > outputs_before;
            let has_count_filter = fold_body
                .iter()
                .any(|b| matches!(b, Block::Filter { expr, .. } if expr_references_count(expr)));
            if !has_output && !has_count_filter {
                return Err(ValidationError::new(
                    ValidationErrorKind::MissingOutputInFold { field: sel.field_name.clone() },
                    deepest.to_string(),
                ));
            }
            body.push(Block::Fold { begin: child_location, end: deepest.clone(), body: fold_body });
            return Ok(deepest);
        }

        if sel.directives.output_source {
            if self.output_source_seen {
                return Err(ValidationError::new(
                    ValidationErrorKind::PlacementViolation {
                        field: sel.field_name.clone(),
                        detail: "`@output_source` may appear at most once".to_string(),
                    },
                    child_location.to_string(),
                ));
            }
            if !sel.vertices.is_empty() {
                return Err(ValidationError::new(
                    ValidationErrorKind::PlacementViolation {
                        field: sel.field_name.clone(),
                        detail: "`@output_source` may only appear on the query's last vertex field".to_string(),
                    },
                    child_location.to_string(),
                ));
            }
            self.output_source_seen = true;
            body.push(Block::Traverse {
                direction,
                edge_name: edge_name.clone(),
                child_type: child_type.clone(),
                location: child_location.clone(),
                optional: false,
                within_fold,
                within_optional,
            });
            body.push(Block::OutputSource { location: child_location.clone() });
            return self.visit_scope(body, sel, child_location, child_type, within_fold, within_optional, within_recurse);
        }

        if sel.directives.optional {
            let mut opt_body = vec![Block::Traverse {
                direction,
                edge_name: edge_name.clone(),
                child_type: child_type.clone(),
                location: child_location.clone(),
                optional: true,
                within_fold,
                within_optional: true,
            }];
            let deepest = self.visit_scope(&mut opt_body, sel, child_location.clone(), child_type, within_fold, true, within_recurse)?;
            body.push(Block::OptionalRegion { begin: child_location, end: deepest.clone(), body: opt_body });
            return Ok(deepest);
        }

        body.push(Block::Traverse {
            direction,
            edge_name: edge_name.clone(),
            child_type: child_type.clone(),
            location: child_location.clone(),
            optional: false,
            within_fold,
            within_optional,
        });
        self.visit_scope(body, sel, child_location, child_type, within_fold, within_optional, within_recurse)
    }
}

fn expr_references_count(expr: &Expr) -> bool {
    match expr {
        Expr::Meta { meta: MetaField::Count, .. } => true,
        Expr::Compare { left, right, .. } => expr_references_count(left) || expr_references_count(right),
        Expr::Between { value, lower, upper } => {
            expr_references_count(value) || expr_references_count(lower) || expr_references_count(upper)
        }
        Expr::IsNull(inner) | Expr::IsNotNull(inner) | Expr::Not(inner) => expr_references_count(inner),
        Expr::And(items) | Expr::Or(items) => items.iter().any(expr_references_count),
        Expr::HasEdgeDegree { degree, .. } => expr_references_count(degree),
        _ => false,
    }
}
