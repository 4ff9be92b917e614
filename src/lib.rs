//! # graphquery-compiler
//!
//! Compiles read-only graph queries written in a GraphQL-based surface
//! language into either of two target dialects: a graph-traversal language
//! (MATCH/Gremlin-style) or relational SQL.
//!
//! ## Pipeline
//!
//! ```text
//! Document (query_ast)
//!     |
//! [Validator (C4)]          -> Query (query_ir), against a Schema (C1)
//!     |
//! [Optimizer (C5)]          -> semantics-preserving rewrites
//!     |
//! [Emitter (C6 or C7)]      -> dialect text + runtime parameter slots
//!     |
//! CompileResult
//! ```
//!
//! The surface GraphQL parser, database drivers, and any CLI wrapper are
//! external collaborators: this crate consumes an already-parsed
//! [`query_ast::Document`] and a constructed [`schema::Schema`], and never
//! executes the queries it emits.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use graphquery_compiler::{driver, schema::Schema, config::CompilerConfig};
//! use std::collections::HashMap;
//!
//! let schema: Schema = /* constructed once per session */ unimplemented!();
//! let document: query_ast::Document = /* parsed by an external GraphQL front-end */ unimplemented!();
//!
//! let result = driver::compile_to(
//!     &schema,
//!     &document,
//!     &HashMap::new(),
//!     driver::Dialect::GraphTraversal,
//!     &CompilerConfig::default(),
//! )?;
//! println!("{}", result.text);
//! # Ok::<(), graphquery_compiler::error::CompileError>(())
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod schema;

mod emit;
mod optimizer;
mod validator;

pub use driver::{compile, compile_to, CompileResult, Dialect, OutputColumn, ParameterSlot};
