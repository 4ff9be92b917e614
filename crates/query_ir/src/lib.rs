//! # query_ir — Intermediate Representation types for the graph query compiler
//!
//! This crate holds the pure value types shared by every downstream
//! compiler stage: the [`Location`] algebra (C2), the IR block set and
//! filter/output expression tree (C3), and scalar kinds. It has no
//! required dependencies of its own: IR is a value type, not a service,
//! and every pass (validator, optimizer, both emitters) should be able
//! to depend on it without pulling in anything else. The `serde` feature
//! is opt-in, for crates that need to (de)serialize IR values (the root
//! crate's schema deserialization and `CompileResult` snapshots).

mod block;
mod expr;
mod location;
mod scalar;

pub use block::{Block, OutputField, OutputSpec, Query};
pub use expr::{CompareOp, Expr, MetaField};
pub use location::{Direction, Location, OrdinalAllocator, Step};
pub use scalar::{Literal, ScalarKind};
