//! Collection API sources.
//!
//! The [`CollectionSource`] trait is the seam between the network and the
//! rest of the crate: it hands back response bodies as generic JSON trees and
//! leaves all interpretation to [`crate::normalize`] and [`crate::stats`].
//!
//! - [`ResearchCollectionSource`]: the HTTP implementation
//! - [`MockSource`]: canned responses for tests

mod mock;
mod research_collection;

pub use mock::MockSource;
pub use research_collection::{
    Endpoints, ResearchCollectionSource, ENTITY_BASE_URL, SEARCH_URL, STATISTICS_URL,
};

use crate::models::SearchRequest;
use crate::utils::ValidationError;
use async_trait::async_trait;
use serde_json::Value;

/// A research collection that can be searched and asked for usage reports.
///
/// Every call performs at most one outbound request and keeps no state
/// between calls.
#[async_trait]
pub trait CollectionSource: Send + Sync + std::fmt::Debug {
    /// Unique identifier for this source
    fn id(&self) -> &str;

    /// Search the discovery endpoint and return the raw response body
    async fn search_objects(&self, request: &SearchRequest) -> Result<Value, FetchError>;

    /// Fetch the usage report of one publication
    async fn usage_report(&self, _uuid: &str) -> Result<Value, FetchError> {
        Err(FetchError::NotImplemented)
    }
}

/// Errors that can occur while fetching from a source
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Request parameters rejected before any network call
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transport-level failure (DNS, connect, timeout, ...)
    #[error("Network error: {0}")]
    Network(String),

    /// Non-success HTTP status
    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body is not valid JSON
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The requested operation is not implemented for this source
    #[error("Operation not implemented for this source")]
    NotImplemented,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(format!("JSON: {}", err))
    }
}

impl From<ValidationError> for FetchError {
    fn from(err: ValidationError) -> Self {
        FetchError::InvalidRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = FetchError::Status {
            status: 401,
            body: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "API returned status 401: unauthorized");

        let err: FetchError = ValidationError::Empty("api key").into();
        assert!(matches!(err, FetchError::InvalidRequest(_)));
    }

    #[test]
    fn test_json_error_is_decode() {
        let err: FetchError = serde_json::from_str::<Value>("{not json")
            .unwrap_err()
            .into();
        assert!(matches!(err, FetchError::Decode(_)));
    }
}
