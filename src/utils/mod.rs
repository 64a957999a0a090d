//! Utility modules supporting fetch operations.
//!
//! - [`HttpClient`]: shared reqwest client with timeouts and a crate user agent
//! - [`validate_uuid`], [`validate_group_id`], [`require_non_empty`],
//!   [`require_positive`]: checks applied before a request is built
//!
//! # HTTP Client
//!
//! ```rust,no_run
//! use collection_stats::utils::HttpClient;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpClient::new()?;
//! let response = client.get("https://api.example.com").send().await?;
//! # Ok(())
//! # }
//! ```

mod http;
mod validate;

pub use http::{HttpClient, DEFAULT_TIMEOUT_SECS};
pub use validate::{
    require_non_empty, require_positive, validate_group_id, validate_uuid, ValidationError,
};
