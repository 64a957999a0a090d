//! Research Collection source implementation.
//!
//! Talks to the DSpace-style REST API of the ETH Research Collection:
//! `discover/search/objects` for metadata and
//! `statistics/usagereports/search/object` for usage reports.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::models::{discovery_query, SearchRequest};
use crate::sources::{CollectionSource, FetchError};
use crate::utils::{require_non_empty, require_positive, validate_uuid, HttpClient};

pub const SEARCH_URL: &str =
    "https://api.library.ethz.ch/research-collection/v2/discover/search/objects";
pub const STATISTICS_URL: &str =
    "https://api.library.ethz.ch/research-collection/v2/statistics/usagereports/search/object";
pub const ENTITY_BASE_URL: &str = "https://www.research-collection.ethz.ch/entities/publication";

/// Base URLs used by [`ResearchCollectionSource`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    pub search_url: String,
    pub statistics_url: String,
    /// Prefix of the publication URI passed to the statistics endpoint
    pub entity_base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            search_url: SEARCH_URL.to_string(),
            statistics_url: STATISTICS_URL.to_string(),
            entity_base_url: ENTITY_BASE_URL.to_string(),
        }
    }
}

/// Research Collection source
///
/// Requires an API key, which is sent as the `apikey` query parameter.
#[derive(Debug, Clone)]
pub struct ResearchCollectionSource {
    client: Arc<HttpClient>,
    endpoints: Endpoints,
    api_key: String,
}

impl ResearchCollectionSource {
    pub fn new(api_key: impl Into<String>) -> Result<Self, FetchError> {
        Self::with_endpoints(api_key, Endpoints::default(), Duration::from_secs(30))
    }

    pub fn with_endpoints(
        api_key: impl Into<String>,
        endpoints: Endpoints,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let api_key = api_key.into();
        require_non_empty("api key", &api_key)?;

        Ok(Self {
            client: Arc::new(HttpClient::with_timeout(timeout)?),
            endpoints,
            api_key,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    async fn get_json(&self, url: &str, params: &[(&str, &str)]) -> Result<Value, FetchError> {
        tracing::debug!(url, "GET");

        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("Failed to reach {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(FetchError::from)
    }
}

#[async_trait]
impl CollectionSource for ResearchCollectionSource {
    fn id(&self) -> &str {
        "research-collection"
    }

    async fn search_objects(&self, request: &SearchRequest) -> Result<Value, FetchError> {
        let group_id = require_non_empty("group id", &request.group_id)?;
        let max_items = require_positive("max items", request.max_items)?;

        let query = discovery_query(group_id);
        let size = max_items.to_string();

        tracing::info!(group = %group_id, size = max_items, "Searching collection");

        self.get_json(
            &self.endpoints.search_url,
            &[
                ("query", query.as_str()),
                ("size", size.as_str()),
                ("apikey", self.api_key.as_str()),
            ],
        )
        .await
    }

    async fn usage_report(&self, uuid: &str) -> Result<Value, FetchError> {
        let uuid = validate_uuid(uuid)?;
        let uri = format!(
            "{}/{}",
            self.endpoints.entity_base_url.trim_end_matches('/'),
            uuid
        );

        self.get_json(
            &self.endpoints.statistics_url,
            &[("uri", uri.as_str()), ("apikey", self.api_key.as_str())],
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    const UUID: &str = "0c3e6c1e-7a2b-4d0b-9f5e-0123456789ab";

    fn source_for(server: &mockito::ServerGuard) -> ResearchCollectionSource {
        let endpoints = Endpoints {
            search_url: format!("{}/search", server.url()),
            statistics_url: format!("{}/stats", server.url()),
            entity_base_url: "https://repo.example.org/entities/publication".to_string(),
        };
        ResearchCollectionSource::with_endpoints("secret", endpoints, Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_source_creation() {
        assert!(ResearchCollectionSource::new("key").is_ok());
        assert!(matches!(
            ResearchCollectionSource::new(""),
            Err(FetchError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_search_sends_query_parameters() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("query".into(), "leitzahlCode:09746".into()),
                Matcher::UrlEncoded("size".into(), "5".into()),
                Matcher::UrlEncoded("apikey".into(), "secret".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"_embedded":{"searchResult":{}}}"#)
            .create_async()
            .await;

        let source = source_for(&server);
        let body = source
            .search_objects(&SearchRequest::new("09746").max_items(5))
            .await
            .unwrap();

        assert!(body["_embedded"]["searchResult"].is_object());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_trims_group_id() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::UrlEncoded("query".into(), "leitzahlCode:09746".into()))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let source = source_for(&server);
        source
            .search_objects(&SearchRequest::new("  09746 \n"))
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_search_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body("invalid api key")
            .create_async()
            .await;

        let source = source_for(&server);
        let err = source
            .search_objects(&SearchRequest::new("09746"))
            .await
            .unwrap_err();

        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "invalid api key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_search_malformed_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let source = source_for(&server);
        let err = source
            .search_objects(&SearchRequest::new("09746"))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn test_search_rejects_invalid_request_without_network() {
        let server = mockito::Server::new_async().await;
        let source = source_for(&server);

        let err = source
            .search_objects(&SearchRequest::new("  "))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest(_)));

        let err = source
            .search_objects(&SearchRequest::new("09746").max_items(0))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_usage_report_builds_publication_uri() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/stats")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "uri".into(),
                    format!("https://repo.example.org/entities/publication/{}", UUID),
                ),
                Matcher::UrlEncoded("apikey".into(), "secret".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"_embedded":{"usagereports":[]}}"#)
            .create_async()
            .await;

        let source = source_for(&server);
        let body = source.usage_report(UUID).await.unwrap();
        assert!(body["_embedded"]["usagereports"].is_array());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_usage_report_rejects_bad_uuid() {
        let server = mockito::Server::new_async().await;
        let source = source_for(&server);
        let err = source.usage_report("../admin").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidRequest(_)));
    }
}
