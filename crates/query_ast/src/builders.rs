//! Fluent builders for constructing [`crate::Document`] trees without a
//! text parser.

use crate::{Document, FilterDirective, PropertyDirectives, PropertySelection, VertexDirectives, VertexSelection};

/// Builds a single property field selection.
#[derive(Debug, Clone)]
pub struct PropertyBuilder {
    field_name: String,
    directives: PropertyDirectives,
}

impl PropertyBuilder {
    pub fn new(field_name: impl Into<String>) -> Self {
        PropertyBuilder {
            field_name: field_name.into(),
            directives: PropertyDirectives::default(),
        }
    }

    pub fn output(mut self, out_name: impl Into<String>) -> Self {
        self.directives.output = Some(out_name.into());
        self
    }

    pub fn tag(mut self, tag_name: impl Into<String>) -> Self {
        self.directives.tag = Some(tag_name.into());
        self
    }

    pub fn filter(mut self, op_name: impl Into<String>, values: Vec<impl Into<String>>) -> Self {
        self.directives.filters.push(FilterDirective::new(op_name, values));
        self
    }

    pub fn build(self) -> PropertySelection {
        PropertySelection {
            field_name: self.field_name,
            directives: self.directives,
        }
    }
}

/// Builds a vertex field selection (root or nested).
#[derive(Debug, Clone)]
pub struct VertexBuilder {
    field_name: String,
    coerce_to: Option<String>,
    directives: VertexDirectives,
    properties: Vec<PropertySelection>,
    vertices: Vec<VertexSelection>,
}

impl VertexBuilder {
    pub fn new(field_name: impl Into<String>) -> Self {
        VertexBuilder {
            field_name: field_name.into(),
            coerce_to: None,
            directives: VertexDirectives::default(),
            properties: Vec::new(),
            vertices: Vec::new(),
        }
    }

    pub fn coerce_to(mut self, type_name: impl Into<String>) -> Self {
        self.coerce_to = Some(type_name.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.directives.optional = true;
        self
    }

    pub fn fold(mut self) -> Self {
        self.directives.fold = true;
        self
    }

    pub fn recurse(mut self, depth: u32) -> Self {
        self.directives.recurse_depth = Some(depth);
        self
    }

    pub fn output_source(mut self) -> Self {
        self.directives.output_source = true;
        self
    }

    pub fn tag(mut self, tag_name: impl Into<String>) -> Self {
        self.directives.tag = Some(tag_name.into());
        self
    }

    pub fn filter(mut self, op_name: impl Into<String>, values: Vec<impl Into<String>>) -> Self {
        self.directives.filters.push(FilterDirective::new(op_name, values));
        self
    }

    pub fn property(mut self, property: PropertySelection) -> Self {
        self.properties.push(property);
        self
    }

    pub fn vertex(mut self, vertex: VertexSelection) -> Self {
        self.vertices.push(vertex);
        self
    }

    pub fn build(self) -> VertexSelection {
        VertexSelection {
            field_name: self.field_name,
            coerce_to: self.coerce_to,
            directives: self.directives,
            properties: self.properties,
            vertices: self.vertices,
        }
    }
}

/// Builds a complete [`Document`] rooted at `root_type`.
pub fn document(root: VertexSelection) -> Document {
    Document { root }
}
