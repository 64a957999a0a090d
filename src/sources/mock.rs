//! Mock source for testing purposes.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::models::SearchRequest;
use crate::sources::{CollectionSource, FetchError};

/// A mock source for testing that returns predefined responses.
#[derive(Debug, Default)]
pub struct MockSource {
    search_response: Mutex<Option<Value>>,
    usage_reports: Mutex<HashMap<String, Value>>,
    calls: AtomicUsize,
}

impl MockSource {
    /// Create a new mock source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search response to return.
    pub fn set_search_response(&self, response: Value) {
        let mut guard = self.search_response.lock().unwrap();
        *guard = Some(response);
    }

    /// Register the usage report returned for `uuid`.
    pub fn set_usage_report(&self, uuid: &str, report: Value) {
        let mut guard = self.usage_reports.lock().unwrap();
        guard.insert(uuid.to_string(), report);
    }

    /// Number of calls made against this source so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CollectionSource for MockSource {
    fn id(&self) -> &str {
        "mock"
    }

    async fn search_objects(&self, _request: &SearchRequest) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let guard = self.search_response.lock().unwrap();
        match &*guard {
            Some(response) => Ok(response.clone()),
            None => Err(FetchError::Status {
                status: 503,
                body: "no search response configured".to_string(),
            }),
        }
    }

    async fn usage_report(&self, uuid: &str) -> Result<Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let guard = self.usage_reports.lock().unwrap();
        guard.get(uuid).cloned().ok_or_else(|| FetchError::Status {
            status: 404,
            body: format!("no usage report for {}", uuid),
        })
    }
}
