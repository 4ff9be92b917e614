//! # query_ast — typed surface AST for the graph query compiler
//!
//! The real GraphQL parser/AST is an external collaborator (§1, out of
//! scope): this crate only defines the *shape* the validator (C4) expects
//! to receive once a surface query has been parsed — a tree of vertex
//! selections carrying property selections and the directives from §6.2
//! (`@filter`, `@tag`, `@output`, `@output_source`, `@optional`,
//! `@recurse`, `@fold`). [`builders`] provides a fluent API
//! for constructing these trees programmatically (used by every test and
//! doc example in this workspace, since there is no text parser here to
//! produce them from GraphQL source).

pub mod builders;

/// Direction encoded in a vertex field's name (`out_Animal_ParentOf`,
/// `in_Animal_ParentOf`). Kept independent of `query_ir::Direction` since
/// this crate models the externally-authored surface syntax, not the
/// compiler's internal algebra.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

/// A `@filter(op_name: "...", value: ["..."])` directive instance.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterDirective {
    pub op_name: String,
    /// Raw literal strings as written in the query; the validator checks
    /// each one matches `^[$%][A-Za-z_]+$` (§4.4, §8.1.8) before
    /// interpreting it as a runtime or tagged parameter name.
    pub values: Vec<String>,
}

impl FilterDirective {
    pub fn new(op_name: impl Into<String>, values: Vec<impl Into<String>>) -> Self {
        FilterDirective {
            op_name: op_name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Directives that can appear on a property field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDirectives {
    pub output: Option<String>,
    pub tag: Option<String>,
    pub filters: Vec<FilterDirective>,
}

/// A scalar (or list-of-scalar) field selection: `name @output(...)`, or a
/// meta field selection (`__typename`, `_x_count`).
#[derive(Debug, Clone, PartialEq)]
pub struct PropertySelection {
    pub field_name: String,
    pub directives: PropertyDirectives,
}

/// Directives that can appear on a vertex field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexDirectives {
    pub optional: bool,
    pub fold: bool,
    pub recurse_depth: Option<u32>,
    pub output_source: bool,
    /// `@filter`/`@tag`/`@output` directly on the vertex field itself
    /// (legal for meta-field style usage, e.g. tagging `__typename`).
    pub output: Option<String>,
    pub tag: Option<String>,
    pub filters: Vec<FilterDirective>,
}

/// One level of the query tree: a vertex scope with its property
/// selections (must precede vertex selections at the same scope, §4.4)
/// and nested vertex selections.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexSelection {
    /// The field name as written. For the root selection this is the
    /// root vertex type name; for a nested selection it encodes direction
    /// and edge name (`out_Animal_ParentOf`) the way the surface
    /// language's field names do.
    pub field_name: String,
    /// `... on SubType` inline fragment applied to this scope, if any.
    pub coerce_to: Option<String>,
    pub directives: VertexDirectives,
    pub properties: Vec<PropertySelection>,
    pub vertices: Vec<VertexSelection>,
}

impl VertexSelection {
    /// Split `field_name` into `(direction, edge_name)` for a non-root
    /// vertex selection, by stripping the `in_`/`out_` prefix the surface
    /// syntax uses to encode direction.
    pub fn parse_edge_name(&self) -> Option<(Direction, &str)> {
        if let Some(rest) = self.field_name.strip_prefix("out_") {
            Some((Direction::Out, rest))
        } else if let Some(rest) = self.field_name.strip_prefix("in_") {
            Some((Direction::In, rest))
        } else {
            None
        }
    }
}

/// A complete surface query: one selection rooted at a type from the
/// schema's root type listing (§3.1).
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: VertexSelection,
}
