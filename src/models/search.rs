//! Search request model for the collection discovery endpoint.

use serde::{Deserialize, Serialize};

/// Default number of objects requested per search.
pub const DEFAULT_MAX_ITEMS: usize = 150;

/// Parameters for one search against the discovery endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Group (organisational unit) identifier, e.g. "09746"
    pub group_id: String,

    /// Maximum number of objects the server should return
    pub max_items: usize,
}

impl SearchRequest {
    /// Create a new search request with the default result size
    pub fn new(group_id: impl Into<String>) -> Self {
        Self {
            group_id: group_id.into(),
            max_items: DEFAULT_MAX_ITEMS,
        }
    }

    /// Set maximum results
    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = max;
        self
    }

    /// The discovery query string for this group
    pub fn query(&self) -> String {
        discovery_query(&self.group_id)
    }
}

/// Discovery query selecting every object of one group
pub fn discovery_query(group_id: &str) -> String {
    format!("leitzahlCode:{}", group_id)
}
