//! The filter/output expression algebra (§3.3).

use crate::block::OutputField;
use crate::location::{Direction, Location};
use crate::scalar::{Literal, ScalarKind};

/// Meta-fields every type exposes (§3.1, §4.1 `list_meta_fields`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MetaField {
    /// `__typename`
    Typename,
    /// `_x_count`, only meaningful at the innermost scope of a `Fold`.
    Count,
}

impl MetaField {
    pub fn name(self) -> &'static str {
        match self {
            MetaField::Typename => "__typename",
            MetaField::Count => "_x_count",
        }
    }
}

/// Binary comparison/set operators (§3.3, operator signatures in §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    NotIn,
    HasSubstring,
    StartsWith,
    EndsWith,
    Contains,
    NotContains,
    Intersects,
    NameOrAlias,
}

impl CompareOp {
    /// Parse a `@filter(op_name: ...)` operator name.
    pub fn parse(name: &str) -> Option<CompareOp> {
        Some(match name {
            "=" => CompareOp::Eq,
            "!=" => CompareOp::Ne,
            "<" => CompareOp::Lt,
            "<=" => CompareOp::Le,
            ">" => CompareOp::Gt,
            ">=" => CompareOp::Ge,
            "in_collection" => CompareOp::In,
            "not_in_collection" => CompareOp::NotIn,
            "has_substring" => CompareOp::HasSubstring,
            "starts_with" => CompareOp::StartsWith,
            "ends_with" => CompareOp::EndsWith,
            "contains" => CompareOp::Contains,
            "not_contains" => CompareOp::NotContains,
            "intersects" => CompareOp::Intersects,
            "name_or_alias" => CompareOp::NameOrAlias,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::In => "in_collection",
            CompareOp::NotIn => "not_in_collection",
            CompareOp::HasSubstring => "has_substring",
            CompareOp::StartsWith => "starts_with",
            CompareOp::EndsWith => "ends_with",
            CompareOp::Contains => "contains",
            CompareOp::NotContains => "not_contains",
            CompareOp::Intersects => "intersects",
            CompareOp::NameOrAlias => "name_or_alias",
        }
    }

    /// Whether the right-hand operand is list-typed relative to the left.
    pub fn rhs_is_list(self) -> bool {
        matches!(self, CompareOp::In | CompareOp::NotIn)
    }
}

/// The expression tree used by both `@filter` predicates and
/// `ConstructResult` output projections.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Literal),
    /// A `$name` runtime parameter, typed by the filtered field's kind.
    Parameter { name: String, kind: ScalarKind },
    /// A `%name` tagged parameter; `source` is the `@tag`'s `MarkLocation`
    /// and `field` is the specific property (or meta field) that was
    /// tagged at that location.
    TaggedParameter {
        name: String,
        kind: ScalarKind,
        source: Location,
        field: OutputField,
    },
    /// `location.field`
    Field { location: Location, field: String },
    /// `location.__typename` / `fold_loc._x_count`
    Meta { location: Location, meta: MetaField },
    Compare {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// `between(lower, upper)`, i.e. `value >= lower && value <= upper`.
    Between {
        value: Box<Expr>,
        lower: Box<Expr>,
        upper: Box<Expr>,
    },
    IsNull(Box<Expr>),
    IsNotNull(Box<Expr>),
    /// `has_edge_degree`: the vertex field at `location` has exactly
    /// `degree` neighbors in `direction` over `edge_name`.
    HasEdgeDegree {
        location: Location,
        direction: Direction,
        edge_name: String,
        degree: Box<Expr>,
    },
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Not(Box<Expr>),
    /// Synthesized by optimizer pass 3 (tagged filter under optional):
    /// true iff the optional region rooted at `location` matched.
    SourcePresent(Location),
    True,
    False,
}

impl Expr {
    /// All locations referenced anywhere in this expression (used by the
    /// validator for tag-ordering checks and by emitters for dependency
    /// analysis).
    pub fn referenced_locations(&self, out: &mut Vec<Location>) {
        match self {
            Expr::Field { location, .. } | Expr::Meta { location, .. } => out.push(location.clone()),
            Expr::TaggedParameter { source, .. } => out.push(source.clone()),
            Expr::HasEdgeDegree { location, degree, .. } => {
                out.push(location.clone());
                degree.referenced_locations(out);
            }
            Expr::Compare { left, right, .. } => {
                left.referenced_locations(out);
                right.referenced_locations(out);
            }
            Expr::Between { value, lower, upper } => {
                value.referenced_locations(out);
                lower.referenced_locations(out);
                upper.referenced_locations(out);
            }
            Expr::IsNull(inner) | Expr::IsNotNull(inner) | Expr::Not(inner) => {
                inner.referenced_locations(out)
            }
            Expr::And(items) | Expr::Or(items) => {
                for item in items {
                    item.referenced_locations(out);
                }
            }
            Expr::SourcePresent(location) => out.push(location.clone()),
            Expr::Literal(_) | Expr::Parameter { .. } | Expr::True | Expr::False => {}
        }
    }

    /// All `$name` runtime parameters referenced in this expression, in
    /// left-to-right tree order.
    pub fn runtime_parameters(&self, out: &mut Vec<(String, ScalarKind)>) {
        match self {
            Expr::Parameter { name, kind } => out.push((name.clone(), kind.clone())),
            Expr::Compare { left, right, .. } => {
                left.runtime_parameters(out);
                right.runtime_parameters(out);
            }
            Expr::Between { value, lower, upper } => {
                value.runtime_parameters(out);
                lower.runtime_parameters(out);
                upper.runtime_parameters(out);
            }
            Expr::IsNull(inner) | Expr::IsNotNull(inner) | Expr::Not(inner) => {
                inner.runtime_parameters(out)
            }
            Expr::HasEdgeDegree { degree, .. } => degree.runtime_parameters(out),
            Expr::And(items) | Expr::Or(items) => {
                for item in items {
                    item.runtime_parameters(out);
                }
            }
            Expr::Field { .. }
            | Expr::Meta { .. }
            | Expr::TaggedParameter { .. }
            | Expr::SourcePresent(_)
            | Expr::Literal(_)
            | Expr::True
            | Expr::False => {}
        }
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Expr::True)
    }

    pub fn is_false(&self) -> bool {
        matches!(self, Expr::False)
    }
}
