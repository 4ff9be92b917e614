//! Error taxonomy (§7). Every public entry point returns `Result<_,
//! CompileError>`; failures are total (§5) — no partial `CompileResult` is
//! ever observable.

use query_ir::{Direction, Location};
use thiserror::Error;

/// Malformed schema (C1 construction-time checks).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SchemaError {
    #[error("unknown type `{0}`")]
    UnknownType(String),
    #[error("type `{owner}` has no field `{field}`")]
    UnknownField { owner: String, field: String },
    #[error("type `{owner}` has no {direction} edge `{edge_name}`")]
    UnknownEdge {
        owner: String,
        direction: Direction,
        edge_name: String,
    },
    #[error("field `{field}` on `{owner}` is inherited from multiple interfaces with conflicting scalar kinds")]
    AmbiguousField { owner: String, field: String },
    #[error("type `{0}` declares a field name more than once")]
    DuplicateFieldName(String),
    #[error("object `{object}` declares `implements {supertype}`, but `{supertype}` is not an interface")]
    ObjectImplementsNonInterface { object: String, supertype: String },
    #[error("union `{0}` contains the same member type more than once")]
    DuplicateUnionMember(String),
    #[error("union `{0}` has no member types")]
    EmptyUnion(String),
    #[error("`{0}` declares `implements {1}`, but no such interface is defined")]
    UnknownSupertype(String, String),
    #[error("reserved name `{0}` (prefixed with `___`) may not be used as a field, output, or tag name")]
    ReservedName(String),
    #[error("root type listing names unknown type `{0}`")]
    UnknownRootType(String),
    #[error("failed to deserialize schema: {0}")]
    Deserialize(String),
}

/// Surface-query validation failure (C4, §4.4). Each variant names the
/// §7 sub-kind and carries the offending surface location.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationErrorKind {
    /// A construct appears somewhere §4.4 forbids it: a property field
    /// following a vertex field at the same scope, `@optional` coexisting
    /// with `@recurse`/`@fold`/`@output_source`, a feature nested inside
    /// `@optional`/`@recurse`/`@fold` that may not be, more than one
    /// vertex expansion in a single fold scope, an `@output`/`_x_count`
    /// declared somewhere other than a fold's innermost scope, or a
    /// misplaced `@output_source`.
    #[error("{detail} (`{field}`)")]
    PlacementViolation { field: String, detail: String },
    #[error("name `{name}` does not match `^[A-Za-z_]+$`")]
    NameViolation { name: String },
    #[error("`{0}` is reserved and may not be used as an output or tag name")]
    ReservedName(String),
    #[error("runtime/tagged parameter type mismatch for operator `{op}` on field `{field}`: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        op: String,
        field: String,
        expected: String,
        found: String,
    },
    #[error("fold at `{field}` has no `@output` and no `_x_count` filter")]
    MissingOutputInFold { field: String },
    #[error("duplicate output or tag name `{0}`")]
    DuplicateName(String),
    #[error("unknown field `{field}` on type `{owner}`")]
    UnknownField { owner: String, field: String },
    #[error("unknown edge `{edge_name}` ({direction}) on type `{owner}`")]
    UnknownEdge {
        owner: String,
        direction: Direction,
        edge_name: String,
    },
    #[error("literal value `{0}` is not a `$parameter` or `%tag` reference")]
    BadLiteralValue(String),
    #[error("`%{tag}` is referenced before its `@tag` source location in query order")]
    TagOrdering { tag: String },
    #[error("`@recurse(depth: {depth})` requires depth >= 1")]
    InvalidRecurseDepth { depth: i64 },
    #[error("`@recurse` edge from `{from}` to `{to}` does not satisfy the recursion type rule (§4.4)")]
    InvalidRecurseTypes { from: String, to: String },
    #[error("unrecognized `@filter` operator `{0}`")]
    UnknownOperator(String),
    #[error("operator `{op}` expects {expected} argument(s), found {found}")]
    WrongArity { op: String, expected: usize, found: usize },
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),
}

/// A validation failure, carrying the surface location (vertex type chain
/// and directive name) it was found at (§6.4).
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{kind} (at {surface_path})")]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub surface_path: String,
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, surface_path: impl Into<String>) -> Self {
        ValidationError {
            kind,
            surface_path: surface_path.into(),
        }
    }
}

/// A dialect cannot express a construct the IR requires (§4.7).
#[derive(Debug, Error, Clone, PartialEq)]
#[error("unsupported in this dialect: {feature}")]
pub struct UnsupportedFeatureError {
    pub feature: String,
    pub location: Option<Location>,
}

impl UnsupportedFeatureError {
    pub fn new(feature: impl Into<String>) -> Self {
        UnsupportedFeatureError {
            feature: feature.into(),
            location: None,
        }
    }

    pub fn at(feature: impl Into<String>, location: Location) -> Self {
        UnsupportedFeatureError {
            feature: feature.into(),
            location: Some(location),
        }
    }
}

/// A bug in the compiler. Must never be triggered by well-formed input; a
/// caller that observes one should treat it like a crash (§7).
#[derive(Debug, Error, Clone, PartialEq)]
#[error("internal compiler error: {0}")]
pub struct InternalError(pub String);

impl InternalError {
    pub fn new(message: impl Into<String>) -> Self {
        InternalError(message.into())
    }
}

/// The top-level error returned by the driver (C8).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    UnsupportedFeature(#[from] UnsupportedFeatureError),
    #[error(transparent)]
    Internal(#[from] InternalError),
}
