//! The relational back-end (C7): lowers an optimized `Query` to a SQL
//! expression tree and renders it to text, via a join planner that maps
//! vertex scopes to tables and edges to joins.
//!
//! Unlike the graph-traversal emitter, this back-end never needs the
//! compound-optional union rewrite: a `LEFT JOIN` already produces exactly
//! the "absent subtree projects null" semantics the union rewrite exists to
//! simulate, for any number of nested optionals, with no `2^n` blowup. The
//! asymmetry is real, not an oversight — see DESIGN.md.
//!
//! Table/column naming is convention-based, since this crate has no
//! dependency on a schema-to-DDL mapping layer: a type's table is its name
//! lower-cased, a field's column is its own name, and an edge's join keys
//! follow `<child table>.<parent type, lower-cased>_id = <parent table>.id`
//! (reversed for `in` edges). A real deployment would source this mapping
//! from the `Schema`'s declared indexes/annotations instead; §4.7 leaves the
//! exact mapping implementation-defined.

use std::collections::HashMap;

use itertools::Itertools;
use query_ir::{Block, CompareOp, Direction, Expr, Literal, Location, MetaField, OutputField, OutputSpec, Query};

use crate::config::CompilerConfig;
use crate::error::{CompileError, UnsupportedFeatureError};
use crate::schema::Schema;

use super::{collect_type_names, AliasMap, EmittedQuery};

/// Lower `query` to a single SQL `SELECT`, rejecting any construct outside
/// the relational feature matrix (§4.7): `Recurse`, `@output_source`,
/// non-aggregate `Fold`, `name_or_alias`, `intersects`, `has_edge_degree`,
/// and `__typename`.
pub fn emit(query: &Query, schema: &Schema, config: &CompilerConfig) -> Result<EmittedQuery, CompileError> {
    let mut type_names = HashMap::new();
    collect_type_names(&query.body, &mut type_names);
    let ordinals = AliasMap::build(&query.body);
    let mut aliases = HashMap::new();
    for location in type_names.keys() {
        if let Some(n) = ordinals.ordinal(location) {
            aliases.insert(location.clone(), format!("t{n}"));
        }
    }

    let mut ctx = Ctx { schema, type_names, aliases, fold_aggregates: HashMap::new() };

    let mut joins: Vec<String> = Vec::new();
    let mut wheres: Vec<String> = Vec::new();
    walk(&query.body, false, &mut ctx, &mut joins, &mut wheres)?;

    let projections: Vec<String> = query
        .outputs()
        .iter()
        .map(|o| render_output(o, &ctx))
        .collect::<Result<_, _>>()?;

    let root_location = Location::root(query.root_type.clone());
    let root_table = table_name(&query.root_type);
    let root_alias = ctx.aliases.get(&root_location).cloned().unwrap_or_else(|| "t0".to_string());

    let mut text = format!(
        "SELECT {} FROM {root_table} AS {root_alias}",
        projections.join(", ")
    );
    for join in &joins {
        text.push(' ');
        text.push_str(join);
    }
    if !wheres.is_empty() {
        text.push_str(" WHERE ");
        text.push_str(&wheres.join(" AND "));
    }

    let text = if config.emit_trailing_newline { format!("{text}\n") } else { text };

    let mut parameters = Vec::new();
    let mut seen = std::collections::HashSet::new();
    collect_parameters(&query.body, &mut parameters, &mut seen);

    Ok(EmittedQuery { text, parameters })
}

struct FoldAggregate {
    sql: String,
}

struct Ctx<'a> {
    schema: &'a Schema,
    type_names: HashMap<Location, String>,
    aliases: HashMap<Location, String>,
    fold_aggregates: HashMap<Location, FoldAggregate>,
}

impl Ctx<'_> {
    fn alias(&self, location: &Location) -> String {
        self.aliases.get(location).cloned().unwrap_or_else(|| "t0".to_string())
    }
}

fn table_name(type_name: &str) -> String {
    type_name.to_lowercase()
}

fn foreign_key_column(parent_type: &str) -> String {
    format!("{}_id", parent_type.to_lowercase())
}

/// Walks a query body building `JOIN`/`LEFT JOIN` clauses and top-level
/// `WHERE` predicates, rejecting constructs the relational dialect cannot
/// express. `within_optional` threads down so every scope inside an
/// `OptionalRegion`, however deeply nested, gets a `LEFT JOIN`.
fn walk(
    body: &[Block],
    within_optional: bool,
    ctx: &mut Ctx,
    joins: &mut Vec<String>,
    wheres: &mut Vec<String>,
) -> Result<(), CompileError> {
    for block in body {
        match block {
            Block::Start { .. } | Block::MarkLocation { .. } | Block::ConstructResult { .. } => {}
            Block::Traverse { direction, edge_name, child_type, location, .. } => {
                let parent = location.parent().expect("traverse location always has a parent scope");
                let parent_type = ctx
                    .type_names
                    .get(&parent)
                    .cloned()
                    .unwrap_or_else(|| parent.root_type().to_string());
                let parent_alias = ctx.alias(&parent);
                let child_alias = ctx.alias(location);
                let child_table = table_name(child_type);
                let (left_col, right_col) = match direction {
                    Direction::Out => (foreign_key_column(&parent_type), "id".to_string()),
                    Direction::In => ("id".to_string(), foreign_key_column(&parent_type)),
                };
                debug_assert!(
                    ctx.schema
                        .resolve_edge(&parent_type, *direction, &format!("{}_{edge_name}", direction.as_str()))
                        .map(|(t, _)| t == *child_type)
                        .unwrap_or(false),
                    "IR traversal edge must resolve against the schema it was validated against"
                );
                let kind = if within_optional { "LEFT JOIN" } else { "JOIN" };
                joins.push(format!(
                    "{kind} {child_table} AS {child_alias} ON {parent_alias}.{left_col} = {child_alias}.{right_col}"
                ));
            }
            Block::Recurse { .. } => {
                return Err(CompileError::from(UnsupportedFeatureError::at(
                    "recursive traversal (@recurse)",
                    block.location().expect("Recurse carries a location").clone(),
                )));
            }
            Block::OutputSource { location } => {
                return Err(CompileError::from(UnsupportedFeatureError::at(
                    "@output_source",
                    location.clone(),
                )));
            }
            Block::Coerce { location, .. } => {
                return Err(CompileError::from(UnsupportedFeatureError::at("type_coercion", location.clone())));
            }
            Block::Filter { location, expr } => {
                let predicate = render_expr(expr, ctx)?;
                if within_optional {
                    // A predicate evaluated on a LEFT-joined scope must not
                    // silently discard the outer row when that scope has no
                    // match; the validator already limits what can appear
                    // inside @optional (no further @fold/@output_source), so
                    // guarding with an OR-NULL check is sufficient here.
                    wheres.push(format!("({alias}.id IS NULL OR {predicate})", alias = ctx.alias(location)));
                } else {
                    wheres.push(predicate);
                }
            }
            Block::Fold { begin, end, body: inner } => {
                render_fold(begin, end, inner, ctx)?;
            }
            Block::OptionalRegion { body: inner, .. } => {
                walk(inner, true, ctx, joins, wheres)?;
            }
        }
    }
    Ok(())
}

/// Only an aggregate fold (its sole content is an `_x_count` output) has a
/// relational rendering: a scalar `COUNT(*)` subquery. A fold that also
/// projects per-element fields would need a row multiplying join or a
/// nested-array column type the relational dialect doesn't have, so it is
/// rejected per §4.7's feature matrix.
fn render_fold(begin: &Location, end: &Location, inner: &[Block], ctx: &mut Ctx) -> Result<(), CompileError> {
    let parent = begin.parent().expect("fold begin location always has a parent scope");
    let parent_type = ctx
        .type_names
        .get(&parent)
        .cloned()
        .unwrap_or_else(|| parent.root_type().to_string());
    let parent_alias = ctx.alias(&parent);

    let mut child_type = String::new();
    let mut direction = Direction::Out;
    for block in inner {
        if let Block::Traverse { direction: d, child_type: c, .. } = block {
            direction = *d;
            child_type = c.clone();
        }
    }

    let child_table = table_name(&child_type);
    let (left_col, right_col) = match direction {
        Direction::Out => (foreign_key_column(&parent_type), "id".to_string()),
        Direction::In => ("id".to_string(), foreign_key_column(&parent_type)),
    };

    let sql = format!(
        "(SELECT COUNT(*) FROM {child_table} AS f WHERE f.{right_col} = {parent_alias}.{left_col})",
    );
    ctx.fold_aggregates.insert(end.clone(), FoldAggregate { sql });
    Ok(())
}

fn render_output(output: &OutputSpec, ctx: &Ctx) -> Result<String, CompileError> {
    let quoted_name = format!("AS \"{}\"", output.name);
    match &output.field {
        OutputField::Property(field) => {
            if ctx.fold_aggregates.contains_key(&output.location) {
                return Err(CompileError::from(UnsupportedFeatureError::at(
                    "non-aggregate @fold projection",
                    output.location.clone(),
                )));
            }
            let alias = ctx.alias(&output.location);
            Ok(format!("{alias}.{field} {quoted_name}"))
        }
        OutputField::Meta(MetaField::Typename) => Err(CompileError::from(UnsupportedFeatureError::at(
            "__typename",
            output.location.clone(),
        ))),
        OutputField::Meta(MetaField::Count) => {
            let fold = ctx.fold_aggregates.get(&output.location).ok_or_else(|| {
                CompileError::from(UnsupportedFeatureError::at(
                    "_x_count outside a @fold",
                    output.location.clone(),
                ))
            })?;
            Ok(format!("{} {quoted_name}", fold.sql))
        }
    }
}

fn render_expr(expr: &Expr, ctx: &Ctx) -> Result<String, CompileError> {
    Ok(match expr {
        Expr::Literal(lit) => render_literal(lit),
        Expr::Parameter { name, .. } => format!(":{name}"),
        Expr::TaggedParameter { source, field, .. } => render_field_access(source, field, ctx),
        Expr::Field { location, field } => format!("{}.{field}", ctx.alias(location)),
        Expr::Meta { location, meta: MetaField::Typename } => {
            return Err(CompileError::from(UnsupportedFeatureError::at("__typename", location.clone())))
        }
        Expr::Meta { location, meta: MetaField::Count } => {
            let fold = ctx.fold_aggregates.get(location).ok_or_else(|| {
                CompileError::from(UnsupportedFeatureError::at("_x_count outside a @fold", location.clone()))
            })?;
            fold.sql.clone()
        }
        Expr::Compare { op: CompareOp::NameOrAlias, left, .. } => {
            return Err(CompileError::from(UnsupportedFeatureError::at(
                "name_or_alias",
                referenced_location(left),
            )))
        }
        Expr::Compare { op: CompareOp::Intersects, left, .. } => {
            return Err(CompileError::from(UnsupportedFeatureError::at(
                "intersects",
                referenced_location(left),
            )))
        }
        Expr::Compare { op, left, right } => render_compare(*op, left, right, ctx)?,
        Expr::Between { value, lower, upper } => {
            format!("{} BETWEEN {} AND {}", render_expr(value, ctx)?, render_expr(lower, ctx)?, render_expr(upper, ctx)?)
        }
        Expr::IsNull(inner) => format!("{} IS NULL", render_expr(inner, ctx)?),
        Expr::IsNotNull(inner) => format!("{} IS NOT NULL", render_expr(inner, ctx)?),
        Expr::HasEdgeDegree { location, .. } => {
            return Err(CompileError::from(UnsupportedFeatureError::at("has_edge_degree", location.clone())))
        }
        Expr::And(items) => {
            if items.is_empty() {
                return Ok("TRUE".to_string());
            }
            let parts = items.iter().map(|e| render_expr(e, ctx)).collect::<Result<Vec<_>, _>>()?;
            format!("({})", parts.iter().join(" AND "))
        }
        Expr::Or(items) => {
            if items.is_empty() {
                return Ok("FALSE".to_string());
            }
            let parts = items.iter().map(|e| render_expr(e, ctx)).collect::<Result<Vec<_>, _>>()?;
            format!("({})", parts.iter().join(" OR "))
        }
        Expr::Not(inner) => format!("NOT ({})", render_expr(inner, ctx)?),
        Expr::SourcePresent(location) => format!("{}.id IS NOT NULL", ctx.alias(location)),
        Expr::True => "TRUE".to_string(),
        Expr::False => "FALSE".to_string(),
    })
}

fn referenced_location(expr: &Expr) -> Location {
    let mut out = Vec::new();
    expr.referenced_locations(&mut out);
    out.into_iter().next().unwrap_or_else(|| Location::root("Unknown"))
}

fn render_field_access(source: &Location, field: &OutputField, ctx: &Ctx) -> String {
    let alias = ctx.alias(source);
    match field {
        OutputField::Property(f) => format!("{alias}.{f}"),
        OutputField::Meta(MetaField::Typename) => format!("{alias}.__typename"),
        OutputField::Meta(MetaField::Count) => format!("{alias}.id"),
    }
}

fn render_compare(op: CompareOp, left: &Expr, right: &Expr, ctx: &Ctx) -> Result<String, CompileError> {
    let l = render_expr(left, ctx)?;
    let r = render_expr(right, ctx)?;
    Ok(match op {
        CompareOp::Eq => format!("{l} = {r}"),
        CompareOp::Ne => format!("{l} <> {r}"),
        CompareOp::Lt => format!("{l} < {r}"),
        CompareOp::Le => format!("{l} <= {r}"),
        CompareOp::Gt => format!("{l} > {r}"),
        CompareOp::Ge => format!("{l} >= {r}"),
        CompareOp::In => format!("{l} IN {r}"),
        CompareOp::NotIn => format!("{l} NOT IN {r}"),
        CompareOp::HasSubstring => format!("{l} LIKE '%' || {r} || '%'"),
        CompareOp::StartsWith => format!("{l} LIKE {r} || '%'"),
        CompareOp::EndsWith => format!("{l} LIKE '%' || {r}"),
        CompareOp::Contains => format!("{r} = ANY({l})"),
        CompareOp::NotContains => format!("{r} <> ALL({l})"),
        CompareOp::Intersects | CompareOp::NameOrAlias => unreachable!("rejected before reaching render_compare"),
    })
}

fn render_literal(lit: &Literal) -> String {
    match lit {
        Literal::Id(s) | Literal::String(s) | Literal::Date(s) | Literal::DateTime(s) | Literal::Decimal(s) => {
            format!("'{}'", s.replace('\'', "''"))
        }
        Literal::Int(i) => i.to_string(),
        Literal::Float(f) => f.to_string(),
        Literal::Bool(b) => b.to_string(),
        Literal::List(items) => format!("({})", items.iter().map(render_literal).join(", ")),
    }
}

fn collect_parameters(body: &[Block], out: &mut Vec<(String, query_ir::ScalarKind)>, seen: &mut std::collections::HashSet<String>) {
    for block in body {
        match block {
            Block::Filter { expr, .. } => {
                let mut found = Vec::new();
                expr.runtime_parameters(&mut found);
                for (name, kind) in found {
                    if seen.insert(name.clone()) {
                        out.push((name, kind));
                    }
                }
            }
            Block::Fold { body: inner, .. } | Block::OptionalRegion { body: inner, .. } => {
                collect_parameters(inner, out, seen);
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldDescriptor, Schema, TypeDef, TypeKind};
    use query_ir::{OutputSpec, ScalarKind};
    use std::collections::HashMap as StdHashMap;

    fn animal_schema() -> Schema {
        let mut fields = indexmap::IndexMap::new();
        fields.insert("name".to_string(), FieldDescriptor::Property { kind: ScalarKind::String });
        Schema::new(
            vec![TypeDef {
                name: "Animal".to_string(),
                kind: TypeKind::Object,
                fields,
                implements: vec![],
                members: vec![],
            }],
            vec!["Animal".to_string()],
            StdHashMap::new(),
            vec![],
        )
        .expect("valid schema")
    }

    #[test]
    fn simple_query_emits_select_with_join_free_projection() {
        let root = Location::root("Animal");
        let query = Query {
            root_type: "Animal".to_string(),
            body: vec![
                Block::Start { location: root.clone() },
                Block::ConstructResult {
                    outputs: vec![OutputSpec {
                        name: "animal_name".to_string(),
                        location: root,
                        field: OutputField::Property("name".to_string()),
                        kind: ScalarKind::String,
                        list: false,
                        nullable: false,
                    }],
                },
            ],
        };
        let schema = animal_schema();
        let emitted = emit(&query, &schema, &CompilerConfig::default()).unwrap();
        assert!(emitted.text.contains("SELECT t0.name AS \"animal_name\" FROM animal AS t0"));
    }

    #[test]
    fn recurse_is_rejected() {
        let root = Location::root("Animal");
        let child = root.child_edge(Direction::Out, "Animal_ParentOf", 0);
        let query = Query {
            root_type: "Animal".to_string(),
            body: vec![
                Block::Start { location: root },
                Block::Recurse {
                    direction: Direction::Out,
                    edge_name: "Animal_ParentOf".to_string(),
                    depth: 3,
                    location: child,
                },
                Block::ConstructResult { outputs: vec![] },
            ],
        };
        let schema = animal_schema();
        let result = emit(&query, &schema, &CompilerConfig::default());
        assert!(matches!(result, Err(CompileError::UnsupportedFeature(_))));
    }
}
