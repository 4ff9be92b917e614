//! The graph-traversal back-end (C6): lowers an optimized `Query` to a
//! MATCH-style query string.
//!
//! A plain (non-compound-optional) query becomes one
//! `SELECT <projections> FROM (MATCH <patterns> RETURN $matches)`. A query
//! with `n` compound optionals (§4.6) becomes `2^n` such alternatives, each
//! built by [`prune_for_subset`], bound to `$optional__0 .. $optional__{2^n-1}`
//! and unioned under `SELECT EXPAND($result)`.
//!
//! Folds never appear in the MATCH pattern itself: each is rendered as a
//! self-contained correlated sub-`SELECT` over its own linear traversal,
//! inlined wherever an output or filter references a location inside it.

use std::collections::{HashMap, HashSet};

use itertools::Itertools;
use query_ir::{
    Block, CompareOp, Expr, Literal, Location, MetaField, OutputField, OutputSpec, Query, Step,
};

use crate::config::CompilerConfig;
use crate::error::{CompileError, UnsupportedFeatureError};

use super::{collect_optionals, collect_type_names, output_is_live, prune_for_subset, AliasMap, EmittedQuery, OptionalInfo};

/// Lower `query` to MATCH-style text under `config`'s guard rails.
pub fn emit(query: &Query, config: &CompilerConfig) -> Result<EmittedQuery, CompileError> {
    let optionals = collect_optionals(&query.body);
    if optionals.len() > config.max_compound_optionals {
        return Err(CompileError::from(UnsupportedFeatureError::new(format!(
            "query requires {} compound-optional alternatives (2^{}), exceeding the configured limit of {}",
            1u64 << optionals.len(),
            optionals.len(),
            config.max_compound_optionals
        ))));
    }

    let mut parameters = Vec::new();
    let mut seen = HashSet::new();
    collect_parameters(&query.body, &mut parameters, &mut seen);

    let text = if optionals.is_empty() {
        render_alternative(&query.body, query.outputs(), &optionals, 0)
    } else {
        let alternative_count = 1u32 << optionals.len();
        let mut lets = Vec::with_capacity(alternative_count as usize);
        for subset in 0..alternative_count {
            let pruned = prune_for_subset(&query.body, &optionals, subset);
            let alt_text = render_alternative(&pruned, query.outputs(), &optionals, subset);
            lets.push(format!("$optional__{subset} = ({alt_text})"));
        }
        let union_args = (0..alternative_count)
            .map(|s| format!("$optional__{s}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "SELECT EXPAND($result) LET {}, $result = UNIONALL({union_args})",
            lets.join(", ")
        )
    };

    let text = if config.emit_trailing_newline { format!("{text}\n") } else { text };
    Ok(EmittedQuery { text, parameters })
}

fn collect_parameters(body: &[Block], out: &mut Vec<(String, query_ir::ScalarKind)>, seen: &mut HashSet<String>) {
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

/// Per-location bookkeeping shared by pattern and expression rendering:
/// stable aliases, the static type name bound at each location, and the
/// fold sub-selects discovered while walking the body.
struct Ctx {
    aliases: AliasTable,
    type_names: HashMap<Location, String>,
    fold_patterns: HashMap<Location, FoldPattern>,
}

struct FoldPattern {
    pattern: String,
    innermost_alias: String,
}

/// Maps every scope reached in a body to a `Type___N` alias, `N` being the
/// location's 1-based position in document order (§8.2 example: `Animal___1`).
struct AliasTable {
    alias: HashMap<Location, String>,
}

impl AliasTable {
    fn build(body: &[Block], type_names: &HashMap<Location, String>) -> Self {
        let ordinals = AliasMap::build(body);
        let mut alias = HashMap::new();
        for (location, type_name) in type_names {
            if let Some(n) = ordinals.ordinal(location) {
                alias.insert(location.clone(), format!("{type_name}___{}", n + 1));
            }
        }
        AliasTable { alias }
    }

    fn get(&self, location: &Location) -> String {
        self.alias
            .get(location)
            .cloned()
            .unwrap_or_else(|| "$this".to_string())
    }
}

fn render_alternative(body: &[Block], outputs: &[OutputSpec], optionals: &[OptionalInfo], subset: u32) -> String {
    let mut type_names = HashMap::new();
    collect_type_names(body, &mut type_names);
    let aliases = AliasTable::build(body, &type_names);
    let mut ctx = Ctx { aliases, type_names, fold_patterns: HashMap::new() };

    let mut filters: HashMap<Location, Vec<Expr>> = HashMap::new();
    let mut coercions: HashMap<Location, String> = HashMap::new();
    let mut optional_flag: HashSet<Location> = HashSet::new();
    let mut traverse_locations: Vec<Location> = Vec::new();
    let mut output_source: Option<Location> = None;

    collect_main(
        body,
        &mut filters,
        &mut coercions,
        &mut optional_flag,
        &mut traverse_locations,
        &mut output_source,
        &mut ctx,
    );

    let leaves = leaf_locations(&traverse_locations);
    let patterns: Vec<String> = leaves
        .iter()
        .map(|leaf| {
            if output_source.as_ref() == Some(leaf) {
                render_reversed(leaf, &ctx, &filters, &coercions, &optional_flag)
            } else {
                render_forward(leaf, &ctx, &filters, &coercions, &optional_flag)
            }
        })
        .collect();

    let projections: Vec<String> = outputs.iter().map(|o| render_output(o, &ctx, optionals, subset)).collect();

    format!(
        "SELECT {} FROM (MATCH {} RETURN $matches)",
        projections.join(", "),
        patterns.join(", ")
    )
}

fn collect_main(
    body: &[Block],
    filters: &mut HashMap<Location, Vec<Expr>>,
    coercions: &mut HashMap<Location, String>,
    optional_flag: &mut HashSet<Location>,
    traverse_locations: &mut Vec<Location>,
    output_source: &mut Option<Location>,
    ctx: &mut Ctx,
) {
    for block in body {
        match block {
            Block::Start { location } | Block::Traverse { location, .. } | Block::Recurse { location, .. } => {
                traverse_locations.push(location.clone());
            }
            Block::Coerce { to_type, location } => {
                coercions.insert(location.clone(), to_type.clone());
            }
            Block::Filter { location, expr } => {
                filters.entry(location.clone()).or_default().push(expr.clone());
            }
            Block::MarkLocation { .. } | Block::ConstructResult { .. } => {}
            Block::OutputSource { location } => {
                *output_source = Some(location.clone());
            }
            Block::OptionalRegion { begin, body: inner, .. } => {
                optional_flag.insert(begin.clone());
                collect_main(inner, filters, coercions, optional_flag, traverse_locations, output_source, ctx);
            }
            Block::Fold { begin, end, body: inner } => {
                render_fold(begin, end, inner, ctx);
            }
        }
    }
}

/// A fold's interior is a straight-line chain (at most one expansion per
/// scope), so it needs none of the leaf/union handling the main pattern
/// does — just walk it in order and splice the resulting pattern text into
/// whichever output/filter expression references it.
fn render_fold(begin: &Location, end: &Location, inner: &[Block], ctx: &mut Ctx) {
    let mut filters: HashMap<Location, Vec<Expr>> = HashMap::new();
    let mut coercions: HashMap<Location, String> = HashMap::new();
    let mut locations: Vec<Location> = Vec::new();
    for block in inner {
        match block {
            Block::Traverse { location, .. } => locations.push(location.clone()),
            Block::Coerce { to_type, location } => {
                coercions.insert(location.clone(), to_type.clone());
            }
            Block::Filter { location, expr } => {
                filters.entry(location.clone()).or_default().push(expr.clone());
            }
            _ => {}
        }
    }
    let parent = begin.parent().expect("fold begin location always has a parent scope");
    let pattern = render_linear_pattern(&parent, &locations, ctx, &filters, &coercions);
    let innermost_alias = ctx.aliases.get(end);
    ctx.fold_patterns.insert(end.clone(), FoldPattern { pattern, innermost_alias });
}

fn render_linear_pattern(
    root: &Location,
    locations: &[Location],
    ctx: &Ctx,
    filters: &HashMap<Location, Vec<Expr>>,
    coercions: &HashMap<Location, String>,
) -> String {
    let mut text = render_step_braces(root, ctx, filters, coercions, false);
    for location in locations {
        let (direction, edge_name, _) = location
            .last_edge()
            .expect("fold traversal location always has an incoming edge");
        text.push_str(&format!(
            ".{}('{}') {}",
            direction.as_str(),
            edge_name,
            render_step_braces(location, ctx, filters, coercions, false)
        ));
    }
    text
}

/// A location is a leaf in the main pattern if no other traversed location
/// continues past it — intermediate scopes are covered by the rendering of
/// whichever leaf path contains them.
fn leaf_locations(locations: &[Location]) -> Vec<Location> {
    locations
        .iter()
        .filter(|candidate| !locations.iter().any(|other| *other != **candidate && candidate.is_prefix_of(other)))
        .cloned()
        .collect()
}

fn render_forward(
    leaf: &Location,
    ctx: &Ctx,
    filters: &HashMap<Location, Vec<Expr>>,
    coercions: &HashMap<Location, String>,
    optional_flag: &HashSet<Location>,
) -> String {
    let mut cur = Location::root(leaf.root_type());
    let mut text = render_step_braces(&cur, ctx, filters, coercions, false);
    for step in &leaf.steps()[1..] {
        if let Step::Edge { direction, edge_name, ordinal } = step {
            cur = cur.child_edge(*direction, edge_name.clone(), *ordinal);
            let optional = optional_flag.contains(&cur);
            text.push_str(&format!(
                ".{}('{}') {}",
                direction.as_str(),
                edge_name,
                render_step_braces(&cur, ctx, filters, coercions, optional)
            ));
        }
    }
    text
}

/// The `@output_source` path (§4.4, §4.6): printed anchored at its own
/// vertex and walked back up to the root with every edge direction
/// reversed, re-rooting the scan at the declared source.
fn render_reversed(
    leaf: &Location,
    ctx: &Ctx,
    filters: &HashMap<Location, Vec<Expr>>,
    coercions: &HashMap<Location, String>,
    optional_flag: &HashSet<Location>,
) -> String {
    let mut text = render_step_braces(leaf, ctx, filters, coercions, optional_flag.contains(leaf));
    let mut cur = leaf.clone();
    while let Some(parent) = cur.parent() {
        let (direction, edge_name, _) = cur.last_edge().expect("non-root location has an incoming edge");
        text.push_str(&format!(
            ".{}('{}') {}",
            direction.reverse().as_str(),
            edge_name,
            render_step_braces(&parent, ctx, filters, coercions, false)
        ));
        cur = parent;
    }
    text
}

fn render_step_braces(
    location: &Location,
    ctx: &Ctx,
    filters: &HashMap<Location, Vec<Expr>>,
    coercions: &HashMap<Location, String>,
    optional: bool,
) -> String {
    let alias = ctx.aliases.get(location);
    let class = coercions
        .get(location)
        .cloned()
        .or_else(|| ctx.type_names.get(location).cloned())
        .unwrap_or_default();
    let mut parts = vec![format!("class: {class}"), format!("as: {alias}")];
    if optional {
        parts.push("optional: true".to_string());
    }
    if let Some(exprs) = filters.get(location) {
        if !exprs.is_empty() {
            let joined = exprs.iter().map(|e| render_expr(e, ctx)).join(" AND ");
            parts.push(format!("where: ({joined})"));
        }
    }
    format!("{{{}}}", parts.join(", "))
}

fn render_output(output: &OutputSpec, ctx: &Ctx, optionals: &[OptionalInfo], subset: u32) -> String {
    let quoted_name = format!("`{}`", output.name);
    if !output_is_live(&output.location, optionals, subset) {
        return format!("null AS {quoted_name}");
    }
    if let Some(fold) = ctx.fold_patterns.get(&output.location) {
        let expr = match &output.field {
            OutputField::Meta(MetaField::Count) => {
                format!("(SELECT count(*) AS value FROM (MATCH {} RETURN $matches)).value", fold.pattern)
            }
            OutputField::Property(field) => format!(
                "(SELECT {}.{field} AS value FROM (MATCH {} RETURN $matches))",
                fold.innermost_alias, fold.pattern
            ),
            OutputField::Meta(MetaField::Typename) => format!(
                "(SELECT {}.__typename AS value FROM (MATCH {} RETURN $matches))",
                fold.innermost_alias, fold.pattern
            ),
        };
        return format!("{expr} AS {quoted_name}");
    }
    let alias = ctx.aliases.get(&output.location);
    let expr = match &output.field {
        OutputField::Property(field) => format!("{alias}.{field}"),
        OutputField::Meta(MetaField::Typename) => format!("{alias}.__typename"),
        OutputField::Meta(MetaField::Count) => format!("{alias}.size()"),
    };
    format!("{expr} AS {quoted_name}")
}

fn render_expr(expr: &Expr, ctx: &Ctx) -> String {
    match expr {
        Expr::Literal(lit) => render_literal(lit),
        Expr::Parameter { name, .. } => format!(":{name}"),
        Expr::TaggedParameter { source, field, .. } => render_field_access(source, field, ctx),
        Expr::Field { location, field } => format!("{}.{field}", ctx.aliases.get(location)),
        Expr::Meta { location, meta } => render_meta_access(location, *meta, ctx),
        Expr::Compare { op, left, right } => render_compare(*op, left, right, ctx),
        Expr::Between { value, lower, upper } => format!(
            "{} BETWEEN {} AND {}",
            render_expr(value, ctx),
            render_expr(lower, ctx),
            render_expr(upper, ctx)
        ),
        Expr::IsNull(inner) => format!("{} IS NULL", render_expr(inner, ctx)),
        Expr::IsNotNull(inner) => format!("{} IS NOT NULL", render_expr(inner, ctx)),
        Expr::HasEdgeDegree { location, direction, edge_name, degree } => format!(
            "{}.{}('{}').size() = {}",
            ctx.aliases.get(location),
            direction.as_str(),
            edge_name,
            render_expr(degree, ctx)
        ),
        Expr::And(items) => {
            if items.is_empty() {
                return "true".to_string();
            }
            format!("({})", items.iter().map(|e| render_expr(e, ctx)).join(" AND "))
        }
        Expr::Or(items) => {
            if items.is_empty() {
                return "false".to_string();
            }
            format!("({})", items.iter().map(|e| render_expr(e, ctx)).join(" OR "))
        }
        Expr::Not(inner) => format!("NOT ({})", render_expr(inner, ctx)),
        Expr::SourcePresent(location) => format!("{} IS NOT NULL", ctx.aliases.get(location)),
        Expr::True => "true".to_string(),
        Expr::False => "false".to_string(),
    }
}

fn render_field_access(source: &Location, field: &OutputField, ctx: &Ctx) -> String {
    let alias = ctx.aliases.get(source);
    match field {
        OutputField::Property(f) => format!("{alias}.{f}"),
        OutputField::Meta(MetaField::Typename) => format!("{alias}.__typename"),
        OutputField::Meta(MetaField::Count) => format!("{alias}.size()"),
    }
}

fn render_meta_access(location: &Location, meta: MetaField, ctx: &Ctx) -> String {
    match meta {
        MetaField::Typename => format!("{}.__typename", ctx.aliases.get(location)),
        MetaField::Count => {
            if let Some(fold) = ctx.fold_patterns.get(location) {
                format!("(SELECT count(*) AS value FROM (MATCH {} RETURN $matches)).value", fold.pattern)
            } else {
                format!("{}.size()", ctx.aliases.get(location))
            }
        }
    }
}

fn render_compare(op: CompareOp, left: &Expr, right: &Expr, ctx: &Ctx) -> String {
    let l = render_expr(left, ctx);
    let r = render_expr(right, ctx);
    match op {
        CompareOp::Eq => format!("{l} = {r}"),
        CompareOp::Ne => format!("{l} <> {r}"),
        CompareOp::Lt => format!("{l} < {r}"),
        CompareOp::Le => format!("{l} <= {r}"),
        CompareOp::Gt => format!("{l} > {r}"),
        CompareOp::Ge => format!("{l} >= {r}"),
        CompareOp::In => format!("{l} IN {r}"),
        CompareOp::NotIn => format!("{l} NOT IN {r}"),
        CompareOp::HasSubstring => format!("{l}.toString().contains({r})"),
        CompareOp::StartsWith => format!("{l}.toString().startsWith({r})"),
        CompareOp::EndsWith => format!("{l}.toString().endsWith({r})"),
        CompareOp::Contains => format!("{l}.contains({r})"),
        CompareOp::NotContains => format!("NOT ({l}.contains({r}))"),
        CompareOp::Intersects => format!("{l}.intersects({r})"),
        // Desugared by the validator into a name/alias disjunction before
        // optimization; kept here only as a defensive fallback.
        CompareOp::NameOrAlias => format!("({l} = {r} OR {l}_alias.contains({r}))"),
    }
}

fn render_literal(lit: &Literal) -> String {
    match lit {
        Literal::Id(s) | Literal::String(s) | Literal::Date(s) | Literal::DateTime(s) | Literal::Decimal(s) => {
            format!("'{}'", s.replace('\'', "\\'"))
        }
        Literal::Int(i) => i.to_string(),
        Literal::Float(f) => f.to_string(),
        Literal::Bool(b) => b.to_string(),
        Literal::List(items) => format!("[{}]", items.iter().map(render_literal).join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use query_ir::{Direction, OutputSpec, ScalarKind};

    fn simple_output_query() -> Query {
        let root = Location::root("Animal");
        Query {
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
        }
    }

    #[test]
    fn simple_query_emits_expected_match_and_projection() {
        let query = simple_output_query();
        let emitted = emit(&query, &CompilerConfig::default()).unwrap();
        assert!(emitted.text.contains("MATCH {class: Animal, as: Animal___1}"));
        assert!(emitted.text.contains("SELECT Animal___1.name AS `animal_name`"));
        assert!(emitted.parameters.is_empty());
    }

    #[test]
    fn compound_optional_query_produces_four_alternatives() {
        let root = Location::root("Animal");
        let c1 = root.child_edge(Direction::Out, "Animal_ParentOf", 0);
        let c2 = c1.child_edge(Direction::In, "Animal_ParentOf", 0);
        let body = vec![
            Block::Start { location: root.clone() },
            Block::OptionalRegion {
                begin: c1.clone(),
                end: c2.clone(),
                body: vec![
                    Block::Traverse {
                        direction: Direction::Out,
                        edge_name: "Animal_ParentOf".to_string(),
                        child_type: "Animal".to_string(),
                        location: c1.clone(),
                        optional: true,
                        within_fold: false,
                        within_optional: true,
                    },
                    Block::OptionalRegion {
                        begin: c2.clone(),
                        end: c2.clone(),
                        body: vec![Block::Traverse {
                            direction: Direction::In,
                            edge_name: "Animal_ParentOf".to_string(),
                            child_type: "Animal".to_string(),
                            location: c2.clone(),
                            optional: true,
                            within_fold: false,
                            within_optional: true,
                        }],
                    },
                ],
            },
            Block::ConstructResult {
                outputs: vec![OutputSpec {
                    name: "a".to_string(),
                    location: root,
                    field: OutputField::Property("name".to_string()),
                    kind: ScalarKind::String,
                    list: false,
                    nullable: false,
                }],
            },
        ];
        let query = Query { root_type: "Animal".to_string(), body };
        let emitted = emit(&query, &CompilerConfig::default()).unwrap();
        for k in 0..4 {
            assert!(emitted.text.contains(&format!("$optional__{k}")));
        }
        assert!(emitted.text.contains("UNIONALL($optional__0, $optional__1, $optional__2, $optional__3)"));
    }

    #[test]
    fn compound_optional_count_over_limit_is_rejected() {
        let root = Location::root("Animal");
        let mut body = vec![Block::Start { location: root.clone() }];
        let mut parent = root.clone();
        for i in 0..4 {
            let child = parent.child_edge(Direction::Out, "Animal_ParentOf", i);
            body.push(Block::OptionalRegion {
                begin: child.clone(),
                end: child.clone(),
                body: vec![
                    Block::Traverse {
                        direction: Direction::Out,
                        edge_name: "Animal_ParentOf".to_string(),
                        child_type: "Animal".to_string(),
                        location: child.clone(),
                        optional: true,
                        within_fold: false,
                        within_optional: true,
                    },
                    Block::Traverse {
                        direction: Direction::Out,
                        edge_name: "Animal_OfSpecies".to_string(),
                        child_type: "Species".to_string(),
                        location: child.child_edge(Direction::Out, "Animal_OfSpecies", 0),
                        optional: false,
                        within_fold: false,
                        within_optional: true,
                    },
                ],
            });
            parent = child;
        }
        body.push(Block::ConstructResult { outputs: vec![] });
        let query = Query { root_type: "Animal".to_string(), body };
        let mut config = CompilerConfig::default();
        config.max_compound_optionals = 2;
        let result = emit(&query, &config);
        assert!(matches!(result, Err(CompileError::UnsupportedFeature(_))));
    }
}
