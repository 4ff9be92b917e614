//! Compiler configuration: a compiled-in default, an optional
//! `compiler.toml`, and `GRAPHQUERY_*` environment overrides layered
//! with `figment`.
//!
//! ## Example
//!
//! ```toml
//! # compiler.toml
//! max_compound_optionals = 12
//! optimizer_max_passes = 8
//! emit_trailing_newline = true
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! GRAPHQUERY_MAX_COMPOUND_OPTIONALS=4
//! ```

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Implementation-defined knobs left as tunable constants rather than
/// fixed values. `compile`/`compile_to` take this by reference so a single
/// `CompilerConfig` can be shared across concurrently running
/// compilations (§5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Guard rail on the compound-optional `2^n` union rewrite (§4.6).
    /// Compiling a query whose compound-optional count exceeds this
    /// returns `UnsupportedFeature` rather than building an
    /// astronomically large union.
    #[serde(default = "default_max_compound_optionals")]
    pub max_compound_optionals: usize,

    /// Fixpoint iteration cap for the IR optimizer (C5). The optimizer is
    /// confluent in at most a handful of passes on any well-formed IR, so
    /// this cap firing is purely a termination guard and never observable
    /// in practice.
    #[serde(default = "default_optimizer_max_passes")]
    pub optimizer_max_passes: usize,

    /// Whether the graph-traversal emitter appends a trailing newline to
    /// its emitted query text.
    #[serde(default = "default_true")]
    pub emit_trailing_newline: bool,
}

fn default_max_compound_optionals() -> usize {
    10
}

fn default_optimizer_max_passes() -> usize {
    8
}

fn default_true() -> bool {
    true
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            max_compound_optionals: default_max_compound_optionals(),
            optimizer_max_passes: default_optimizer_max_passes(),
            emit_trailing_newline: default_true(),
        }
    }
}

impl CompilerConfig {
    /// Load configuration by merging, in order: the compiled-in default,
    /// `compiler.toml` if present, then `GRAPHQUERY_*` environment
    /// variables.
    pub fn load() -> Result<Self, figment::Error> {
        Figment::from(figment::providers::Serialized::defaults(CompilerConfig::default()))
            .merge(Toml::file("compiler.toml"))
            .merge(Env::prefixed("GRAPHQUERY_"))
            .extract()
    }

    /// Load configuration from a specific TOML file, layered over the
    /// compiled-in default and environment overrides.
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::from(figment::providers::Serialized::defaults(CompilerConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("GRAPHQUERY_"))
            .extract()
    }
}
