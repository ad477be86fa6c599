//! HTTP client for the analytics API.
//!
//! Every endpoint is a GET returning JSON. Errors are values: the
//! dashboard decides whether to keep the previous data or fall back to an
//! empty default, so nothing here panics on a bad response.

use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::models::{
    CustomerDetail, CustomerPage, DashboardSnapshot, IntelligenceReport, OverlapReport,
    SyncStatus, SyncTrigger, TargetingReport,
};
use crate::domain::{SortField, SortOrder};

/// Errors from the fetch layer.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, TLS).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.
    #[error("API error ({status}): {message}")]
    Status { status: u16, message: String },

    /// The body was not the JSON shape we expected.
    #[error("invalid JSON from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured base URL cannot carry the requested path.
    #[error("cannot build URL for {0}")]
    Url(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// Query parameters for `/api/customers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerQuery {
    pub limit: u32,
    pub offset: u32,
    pub sort: SortField,
    pub order: SortOrder,
    pub search: Option<String>,
    pub segment: Option<String>,
    pub city: Option<String>,
    pub event_type: Option<String>,
}

impl CustomerQuery {
    /// Flattens the query into URL pairs, omitting empty filters.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("limit", self.limit.to_string()),
            ("offset", self.offset.to_string()),
            ("sort", self.sort.as_str().to_string()),
            ("order", self.order.as_str().to_string()),
        ];

        let filters = [
            ("search", &self.search),
            ("segment", &self.segment),
            ("city", &self.city),
            ("event_type", &self.event_type),
        ];
        for (name, value) in filters {
            if let Some(value) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
                pairs.push((name, value.to_string()));
            }
        }

        pairs
    }
}

/// Client for a single analytics API origin.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub const fn with_client(client: reqwest::Client, base_url: Url) -> Self {
        Self { client, base_url }
    }

    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn dashboard(&self) -> Result<DashboardSnapshot, ApiError> {
        self.get_json(&["api", "dashboard"], &[]).await
    }

    pub async fn customers(&self, query: &CustomerQuery) -> Result<CustomerPage, ApiError> {
        self.get_json(&["api", "customers"], &query.to_pairs()).await
    }

    pub async fn customer(&self, email: &str) -> Result<CustomerDetail, ApiError> {
        self.get_json(&["api", "customers", email], &[]).await
    }

    pub async fn cities(&self) -> Result<Vec<String>, ApiError> {
        self.get_json(&["api", "customers", "cities"], &[]).await
    }

    pub async fn event_types(&self) -> Result<Vec<String>, ApiError> {
        self.get_json(&["api", "customers", "event-types"], &[])
            .await
    }

    pub async fn targeting(&self, event_id: &str) -> Result<TargetingReport, ApiError> {
        self.get_json(&["api", "targeting", event_id], &[]).await
    }

    pub async fn intelligence(&self, event_id: &str) -> Result<IntelligenceReport, ApiError> {
        self.get_json(&["api", "intelligence", event_id], &[]).await
    }

    pub async fn overlap(&self) -> Result<OverlapReport, ApiError> {
        self.get_json(&["api", "overlap"], &[]).await
    }

    /// Ask the server to start a sync job. Returns immediately; progress
    /// is reported by [`Self::sync_status`].
    pub async fn trigger_sync(&self) -> Result<SyncTrigger, ApiError> {
        match self.get_json::<SyncTrigger>(&["api", "sync"], &[]).await {
            // The server reports a missing sync credential as a 500 with a
            // JSON error body; surface it as a trigger acknowledgement.
            Err(ApiError::Status { message, .. }) => Ok(SyncTrigger {
                error: Some(message),
                ..SyncTrigger::default()
            }),
            other => other,
        }
    }

    pub async fn sync_status(&self) -> Result<SyncStatus, ApiError> {
        self.get_json(&["api", "sync-status"], &[]).await
    }

    /// Build `base/segments...?query`. Segments are percent-encoded
    /// individually so identifiers like emails stay a single segment.
    pub fn endpoint(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ApiError::Url(segments.join("/")))?;
            path.pop_if_empty();
            path.extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.endpoint(segments, query)?;
        let path = url.path().to_string();
        tracing::debug!(%url, "GET");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map_or_else(|_| truncate(&body, 200), |parsed| parsed.error);
            tracing::warn!(path = %path, status = status.as_u16(), message = %message, "API returned an error");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|source| {
            tracing::warn!(path = %path, error = %source, "failed to decode API response");
            ApiError::Decode { path, source }
        })
    }
}

fn truncate(body: &str, max: usize) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    trimmed.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve exactly one canned HTTP response on a random local port.
    async fn serve_once(status_line: &'static str, body: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0_u8; 4096];
            let mut request = Vec::new();
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                request.extend_from_slice(&buf[..n]);
                if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    fn client(base: Url) -> ApiClient {
        ApiClient::new(base, Duration::from_secs(5)).unwrap()
    }

    fn query() -> CustomerQuery {
        CustomerQuery {
            limit: 50,
            offset: 100,
            sort: SortField::TotalSpent,
            order: SortOrder::Asc,
            search: Some("  ".to_string()),
            segment: Some("champion".to_string()),
            city: None,
            event_type: Some("wine".to_string()),
        }
    }

    #[test]
    fn customer_query_omits_blank_filters() {
        let pairs = query().to_pairs();
        let names: Vec<_> = pairs.iter().map(|(name, _)| *name).collect();
        assert_eq!(
            names,
            ["limit", "offset", "sort", "order", "segment", "event_type"]
        );
        assert!(pairs.contains(&("order", "ASC".to_string())));
        assert!(pairs.contains(&("sort", "total_spent".to_string())));
    }

    #[test]
    fn endpoint_encodes_identifiers_as_single_segments() {
        let api = client(Url::parse("https://api.example.com/base/").unwrap());
        let url = api
            .endpoint(&["api", "customers", "jo/e+x@mail.com"], &[])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.example.com/base/api/customers/jo%2Fe+x@mail.com"
        );

        let url = api.endpoint(&["api", "customers"], &query().to_pairs()).unwrap();
        assert_eq!(url.path(), "/base/api/customers");
        assert!(url.query().unwrap().contains("segment=champion"));
    }

    #[tokio::test]
    async fn unreachable_server_is_an_error_not_a_panic() {
        let api = ApiClient::new(
            Url::parse("http://127.0.0.1:9/").unwrap(),
            Duration::from_secs(2),
        )
        .unwrap();
        let result = api.dashboard().await;
        assert!(matches!(result, Err(ApiError::Request(_))));
    }

    #[tokio::test]
    async fn decodes_successful_responses() {
        let base = serve_once("200 OK", r#"["Philadelphia","DC"]"#).await;
        let cities = client(base).cities().await.unwrap();
        assert_eq!(cities, ["Philadelphia", "DC"]);
    }

    #[tokio::test]
    async fn surfaces_server_error_messages() {
        let base = serve_once("404 Not Found", r#"{"error": "Customer not found"}"#).await;
        let err = client(base).customer("nobody@x.com").await.unwrap_err();
        match err {
            ApiError::Status { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Customer not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error() {
        let base = serve_once("200 OK", "<html>oops</html>").await;
        let err = client(base).overlap().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { ref path, .. } if path == "/api/overlap"));
    }

    #[tokio::test]
    async fn sync_trigger_failure_becomes_an_acknowledged_error() {
        let base = serve_once(
            "500 Internal Server Error",
            r#"{"error": "EVENTBRITE_API_KEY not set"}"#,
        )
        .await;
        let ack = client(base).trigger_sync().await.unwrap();
        assert_eq!(ack.error.as_deref(), Some("EVENTBRITE_API_KEY not set"));
    }
}
