//! IR optimizer (C5, §4.5). Five semantics-preserving passes over a
//! validated [`Query`]; passes 1-2 are iterated to a fixpoint (bounded by
//! [`CompilerConfig::optimizer_max_passes`](crate::config::CompilerConfig)),
//! passes 3-5 are single rewrites that do not benefit from repetition.

use std::collections::HashSet;

use query_ir::{Block, CompareOp, Expr, Location, MetaField, Query};

use crate::config::CompilerConfig;
use crate::schema::Schema;

/// Runs every optimizer pass over `query` in the order given by §4.5.
#[tracing::instrument(skip_all)]
pub fn optimize(query: Query, schema: &Schema, config: &CompilerConfig) -> Query {
    let mut body = query.body;

    for _ in 0..config.optimizer_max_passes.max(1) {
        let mut changed = false;
        changed |= eliminate_coercions(&mut body, schema);
        changed |= remove_redundant_filters(&mut body);
        if !changed {
            break;
        }
    }

    guard_tagged_filters_under_optional(&mut body);
    reorder_fold_count_filters(&mut body);
    canonicalize_output_order(&mut body);

    Query { root_type: query.root_type, body }
}

/// Pass 1: drop `Coerce(ToType)` blocks that are already no-ops — the
/// current scope's static type is already a subtype of `ToType`, or
/// `ToType` is the union equivalent of the current type.
fn eliminate_coercions(body: &mut Vec<Block>, schema: &Schema) -> bool {
    let mut changed = false;
    let mut current_type: Option<String> = None;
    let mut i = 0;
    while i < body.len() {
        let remove = match &mut body[i] {
            Block::Start { location } => {
                current_type = Some(location.root_type().to_string());
                false
            }
            Block::Traverse { child_type, .. } => {
                current_type = Some(child_type.clone());
                false
            }
            Block::Coerce { to_type, .. } => {
                let is_noop = current_type.as_deref().is_some_and(|ct| {
                    schema.is_subtype(ct, to_type) || schema.equivalent_union_of(ct) == Some(to_type.as_str())
                });
                if !is_noop {
                    current_type = Some(to_type.clone());
                }
                is_noop
            }
            Block::Fold { body: inner, .. } => {
                changed |= eliminate_coercions(inner, schema);
                false
            }
            Block::OptionalRegion { body: inner, .. } => {
                changed |= eliminate_coercions(inner, schema);
                false
            }
            _ => false,
        };
        if remove {
            body.remove(i);
            changed = true;
        } else {
            i += 1;
        }
    }
    changed
}

/// Pass 2: constant-fold boolean connectives and drop filters that
/// simplify to `true`. A filter that simplifies to `false` is kept as-is —
/// it already makes the enclosing scope contribute no rows, and this IR
/// has no separate "empty query" marker block.
fn remove_redundant_filters(body: &mut Vec<Block>) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i < body.len() {
        let drop = match &mut body[i] {
            Block::Filter { expr, .. } => {
                let simplified = simplify_expr(expr.clone());
                if simplified != *expr {
                    changed = true;
                }
                *expr = simplified;
                expr.is_true()
            }
            Block::Fold { body: inner, .. } => {
                changed |= remove_redundant_filters(inner);
                false
            }
            Block::OptionalRegion { body: inner, .. } => {
                changed |= remove_redundant_filters(inner);
                false
            }
            _ => false,
        };
        if drop {
            body.remove(i);
            changed = true;
        } else {
            i += 1;
        }
    }
    changed
}

fn simplify_expr(expr: Expr) -> Expr {
    match expr {
        Expr::And(items) => {
            let mut simplified: Vec<Expr> = items.into_iter().map(simplify_expr).collect();
            if simplified.iter().any(Expr::is_false) {
                return Expr::False;
            }
            simplified.retain(|e| !e.is_true());
            match simplified.len() {
                0 => Expr::True,
                1 => simplified.into_iter().next().expect("len checked"),
                _ => Expr::And(simplified),
            }
        }
        Expr::Or(items) => {
            let mut simplified: Vec<Expr> = items.into_iter().map(simplify_expr).collect();
            if simplified.iter().any(Expr::is_true) {
                return Expr::True;
            }
            simplified.retain(|e| !e.is_false());
            match simplified.len() {
                0 => Expr::False,
                1 => simplified.into_iter().next().expect("len checked"),
                _ => Expr::Or(simplified),
            }
        }
        Expr::Not(inner) => match simplify_expr(*inner) {
            Expr::True => Expr::False,
            Expr::False => Expr::True,
            other => Expr::Not(Box::new(other)),
        },
        Expr::Compare { op, left, right } => Expr::Compare {
            op,
            left: Box::new(simplify_expr(*left)),
            right: Box::new(simplify_expr(*right)),
        },
        Expr::Between { value, lower, upper } => Expr::Between {
            value: Box::new(simplify_expr(*value)),
            lower: Box::new(simplify_expr(*lower)),
            upper: Box::new(simplify_expr(*upper)),
        },
        Expr::IsNull(inner) => Expr::IsNull(Box::new(simplify_expr(*inner))),
        Expr::IsNotNull(inner) => Expr::IsNotNull(Box::new(simplify_expr(*inner))),
        Expr::HasEdgeDegree { location, direction, edge_name, degree } => Expr::HasEdgeDegree {
            location,
            direction,
            edge_name,
            degree: Box::new(simplify_expr(*degree)),
        },
        other => other,
    }
}

/// Pass 3: a `%tag` whose source lies inside an `OptionalRegion` makes any
/// comparison against it vacuously true when the optional did not match.
fn guard_tagged_filters_under_optional(body: &mut Vec<Block>) {
    let mut optional_locations = HashSet::new();
    collect_optional_locations(body, &mut optional_locations);
    apply_guard(body, &optional_locations);
}

fn collect_locations(body: &[Block], out: &mut HashSet<Location>) {
    for block in body {
        match block {
            Block::Start { location }
            | Block::Traverse { location, .. }
            | Block::Coerce { location, .. }
            | Block::Filter { location, .. }
            | Block::MarkLocation { location }
            | Block::Recurse { location, .. }
            | Block::OutputSource { location } => {
                out.insert(location.clone());
            }
            Block::Fold { begin, end, body: inner } | Block::OptionalRegion { begin, end, body: inner } => {
                out.insert(begin.clone());
                out.insert(end.clone());
                collect_locations(inner, out);
            }
            Block::ConstructResult { .. } => {}
        }
    }
}

fn collect_optional_locations(body: &[Block], out: &mut HashSet<Location>) {
    for block in body {
        match block {
            Block::OptionalRegion { begin, end, body: inner } => {
                out.insert(begin.clone());
                out.insert(end.clone());
                collect_locations(inner, out);
                collect_optional_locations(inner, out);
            }
            Block::Fold { body: inner, .. } => collect_optional_locations(inner, out),
            _ => {}
        }
    }
}

fn apply_guard(body: &mut Vec<Block>, optional_locations: &HashSet<Location>) {
    for block in body.iter_mut() {
        match block {
            Block::Filter { expr, .. } => *expr = guard_expr(expr.clone(), optional_locations),
            Block::Fold { body: inner, .. } | Block::OptionalRegion { body: inner, .. } => {
                apply_guard(inner, optional_locations);
            }
            _ => {}
        }
    }
}

fn tagged_source_under_optional(expr: &Expr, optional_locations: &HashSet<Location>) -> Option<Location> {
    match expr {
        Expr::TaggedParameter { source, .. } if optional_locations.contains(source) => Some(source.clone()),
        _ => None,
    }
}

fn guard_expr(expr: Expr, optional_locations: &HashSet<Location>) -> Expr {
    match expr {
        Expr::Compare { op, left, right } => {
            let source = tagged_source_under_optional(&left, optional_locations)
                .or_else(|| tagged_source_under_optional(&right, optional_locations));
            let rebuilt = Expr::Compare {
                op,
                left: Box::new(guard_expr(*left, optional_locations)),
                right: Box::new(guard_expr(*right, optional_locations)),
            };
            match source {
                Some(loc) => Expr::Or(vec![Expr::Not(Box::new(Expr::SourcePresent(loc))), rebuilt]),
                None => rebuilt,
            }
        }
        Expr::Between { value, lower, upper } => {
            let lower_source = tagged_source_under_optional(&lower, optional_locations);
            let upper_source = tagged_source_under_optional(&upper, optional_locations);
            let value = guard_expr(*value, optional_locations);
            let lower_cmp = Expr::Compare {
                op: CompareOp::Ge,
                left: Box::new(value.clone()),
                right: Box::new(guard_expr(*lower, optional_locations)),
            };
            let upper_cmp = Expr::Compare {
                op: CompareOp::Le,
                left: Box::new(value),
                right: Box::new(guard_expr(*upper, optional_locations)),
            };
            let lower_expr = match lower_source {
                Some(loc) => Expr::Or(vec![Expr::Not(Box::new(Expr::SourcePresent(loc))), lower_cmp]),
                None => lower_cmp,
            };
            let upper_expr = match upper_source {
                Some(loc) => Expr::Or(vec![Expr::Not(Box::new(Expr::SourcePresent(loc))), upper_cmp]),
                None => upper_cmp,
            };
            Expr::And(vec![lower_expr, upper_expr])
        }
        Expr::And(items) => Expr::And(items.into_iter().map(|e| guard_expr(e, optional_locations)).collect()),
        Expr::Or(items) => Expr::Or(items.into_iter().map(|e| guard_expr(e, optional_locations)).collect()),
        Expr::Not(inner) => Expr::Not(Box::new(guard_expr(*inner, optional_locations))),
        Expr::IsNull(inner) => Expr::IsNull(Box::new(guard_expr(*inner, optional_locations))),
        Expr::IsNotNull(inner) => Expr::IsNotNull(Box::new(guard_expr(*inner, optional_locations))),
        Expr::HasEdgeDegree { location, direction, edge_name, degree } => Expr::HasEdgeDegree {
            location,
            direction,
            edge_name,
            degree: Box::new(guard_expr(*degree, optional_locations)),
        },
        other => other,
    }
}

/// Pass 4: move `_x_count`-referencing filters inside a fold to the end of
/// that fold's body, after every per-element filter, so emitters can treat
/// trailing filters of a fold as applying after the element set is
/// materialized.
fn reorder_fold_count_filters(body: &mut Vec<Block>) {
    for block in body.iter_mut() {
        match block {
            Block::Fold { body: inner, .. } => {
                reorder_fold_count_filters(inner);
                let (count, rest): (Vec<Block>, Vec<Block>) =
                    inner.drain(..).partition(|b| matches!(b, Block::Filter { expr, .. } if references_count(expr)));
                inner.extend(rest);
                inner.extend(count);
            }
            Block::OptionalRegion { body: inner, .. } => reorder_fold_count_filters(inner),
            _ => {}
        }
    }
}

fn references_count(expr: &Expr) -> bool {
    match expr {
        Expr::Meta { meta: MetaField::Count, .. } => true,
        Expr::Compare { left, right, .. } => references_count(left) || references_count(right),
        Expr::Between { value, lower, upper } => {
            references_count(value) || references_count(lower) || references_count(upper)
        }
        Expr::IsNull(inner) | Expr::IsNotNull(inner) | Expr::Not(inner) => references_count(inner),
        Expr::And(items) | Expr::Or(items) => items.iter().any(references_count),
        Expr::HasEdgeDegree { degree, .. } => references_count(degree),
        _ => false,
    }
}

/// Pass 5: outputs are assigned a stable lexicographic emission order.
fn canonicalize_output_order(body: &mut [Block]) {
    if let Some(Block::ConstructResult { outputs }) = body.last_mut() {
        outputs.sort_by(|a, b| a.name.cmp(&b.name));
    }
}
