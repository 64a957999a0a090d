//! # collection-stats
//!
//! Fetches publication metadata and usage statistics from a research
//! collection API and reshapes the nested JSON into flat, typed rows.
//!
//! ## Architecture
//!
//! - [`sources`]: the [`CollectionSource`] trait and its HTTP implementation
//! - [`normalize`]: search response → [`NormalizedRecord`] rows
//! - [`stats`]: usage reports → statistics tables, pivot and summary
//! - [`pipeline`]: fetch-then-normalize composition
//! - [`models`]: records, search requests, statistics rows
//! - [`config`]: configuration management
//! - [`utils`]: HTTP client and input validation
//! - [`ui`]: terminal output helpers

pub mod config;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod sources;
pub mod stats;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{FieldSpec, NormalizedRecord};
pub use normalize::{Normalizer, SchemaError};
pub use pipeline::PipelineError;
pub use sources::{CollectionSource, FetchError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
