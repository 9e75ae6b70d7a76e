//! Core library for proofmark.
//!
//! Reconciles grammar, mechanics, and spelling diagnostics from independent
//! detectors into one non-overlapping view, and derives a reproducible score
//! from them.
//!
//! # Modules
//!
//! - [`tokenize`] and [`align`] - Tokenization and token-level diffing
//! - [`span`] and [`diagnostic`] - The common diagnostic shape
//! - [`promote`] - Punctuation-only edits as mechanics diagnostics
//! - [`registry`] - Overlap resolution
//! - [`aggregate`] - Normalization of detector output
//! - [`score`] - Step-table scoring
//! - [`services`] - External collaborators and their adapters
//! - [`mechanics`] and [`spelling`] - Offline detectors
//! - [`evaluate`] - The end-to-end pipeline
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```no_run
//! use proofmark_core::{ConfigLoader, Evaluator};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let (config, _sources) = ConfigLoader::new().with_user_config(true).load()?;
//! let evaluator = Evaluator::from_config(&config)?;
//!
//! let result = evaluator.evaluate("she go to school yesterday.").await?;
//! println!("grammar {} / spelling {}", result.score.grammar, result.score.spelling);
//! # Ok(())
//! # }
//! ```
#![deny(unsafe_code)]

pub mod aggregate;
pub mod align;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod evaluate;
pub mod mechanics;
pub mod promote;
pub mod registry;
pub mod score;
pub mod services;
pub mod span;
pub mod spelling;
pub mod tokenize;

pub use align::{AlignmentOp, EditKind};
pub use config::{Config, ConfigLoader, LogLevel};
pub use diagnostic::{Authority, Category, Diagnostic};
pub use error::{ConfigError, ConfigResult, EvalError, EvalResult, ServiceError, ServiceResult};
pub use evaluate::{EvaluationResult, Evaluator, NoteSource, NoteStatus, SourceNote};
pub use registry::{ResolutionPolicy, SpanRegistry};
pub use score::{ErrorCounts, Score};
pub use span::Span;
