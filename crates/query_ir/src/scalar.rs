//! Scalar kinds shared by the schema model, the IR, and both emitters.

use std::fmt;

/// The base scalar kinds recognized by the schema (§3.1), plus
/// `List(kind)` for list-of-scalar fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ScalarKind {
    Id,
    Int,
    Float,
    Bool,
    String,
    Date,
    DateTime,
    Decimal,
    List(Box<ScalarKind>),
}

impl ScalarKind {
    pub fn list_of(inner: ScalarKind) -> ScalarKind {
        ScalarKind::List(Box::new(inner))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ScalarKind::List(_))
    }

    /// The element kind, unwrapping one level of `List`.
    pub fn element_kind(&self) -> &ScalarKind {
        match self {
            ScalarKind::List(inner) => inner,
            other => other,
        }
    }

    pub fn name(&self) -> String {
        match self {
            ScalarKind::Id => "Id".to_string(),
            ScalarKind::Int => "Int".to_string(),
            ScalarKind::Float => "Float".to_string(),
            ScalarKind::Bool => "Bool".to_string(),
            ScalarKind::String => "String".to_string(),
            ScalarKind::Date => "Date".to_string(),
            ScalarKind::DateTime => "DateTime".to_string(),
            ScalarKind::Decimal => "Decimal".to_string(),
            ScalarKind::List(inner) => format!("[{}]", inner.name()),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Typed literal value, used internally by the optimizer (e.g. the
/// synthetic `true`/`false` markers produced by redundant-filter removal)
/// and wherever a constant needs to travel through the expression tree.
///
/// Date/DateTime/Decimal are carried as their normalized textual form:
/// this crate has no dependency on a calendar or bignum library, so the
/// root crate (which does depend on `chrono`) is responsible for
/// validating the text before it is wrapped here.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Id(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
    Date(String),
    DateTime(String),
    Decimal(String),
    List(Vec<Literal>),
}

impl Literal {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Literal::Id(_) => ScalarKind::Id,
            Literal::Int(_) => ScalarKind::Int,
            Literal::Float(_) => ScalarKind::Float,
            Literal::Bool(_) => ScalarKind::Bool,
            Literal::String(_) => ScalarKind::String,
            Literal::Date(_) => ScalarKind::Date,
            Literal::DateTime(_) => ScalarKind::DateTime,
            Literal::Decimal(_) => ScalarKind::Decimal,
            Literal::List(items) => {
                let elem = items.first().map(Literal::kind).unwrap_or(ScalarKind::String);
                ScalarKind::List(Box::new(elem))
            }
        }
    }
}
