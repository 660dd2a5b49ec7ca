use crate::error::CatalogError;
use crate::repo_fetch::*;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Clone)]
enum MockResponse {
    Body(String),
    /// Body released once the gate is notified
    Gated(String, Arc<Notify>),
    Status(u16),
    Failure(String),
}

#[derive(Clone)]
pub struct MockRepoClient {
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl MockRepoClient {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn mock_response(&self, url: &str, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), MockResponse::Body(body.to_string()));
    }

    pub fn mock_gated_response(&self, url: &str, body: &str, gate: Arc<Notify>) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), MockResponse::Gated(body.to_string(), gate));
    }

    pub fn mock_status(&self, url: &str, status: u16) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), MockResponse::Status(status));
    }

    pub fn mock_error(&self, url: &str, error: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), MockResponse::Failure(error.to_string()));
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.as_str() == url)
            .count()
    }
}

#[async_trait::async_trait]
impl RepoClient for MockRepoClient {
    async fn fetch_text(&self, url: &str) -> Result<String, CatalogError> {
        self.requests.lock().unwrap().push(url.to_string());
        let response = self.responses.lock().unwrap().get(url).cloned();
        match response {
            Some(MockResponse::Body(body)) => Ok(body),
            Some(MockResponse::Gated(body, gate)) => {
                gate.notified().await;
                Ok(body)
            }
            Some(MockResponse::Status(status)) => Err(CatalogError::Http {
                url: url.to_string(),
                status,
            }),
            Some(MockResponse::Failure(message)) => Err(CatalogError::Transport {
                url: url.to_string(),
                message,
            }),
            None => Err(CatalogError::Http {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const BASE: &str = "https://repos.example.com";

    #[tokio::test]
    async fn test_fetch_short_ref_uses_hosting_convention() {
        let mock = MockRepoClient::new();
        mock.mock_response("https://repos.example.com/quantum.json", r#"{"apps": []}"#);
        let fetcher = RepoFetcher::new(mock.clone(), BASE);

        let doc = fetcher.fetch("quantum").await.unwrap();
        assert_eq!(doc.url, "https://repos.example.com/quantum.json");
        assert_eq!(doc.data, json!({"apps": []}));
    }

    #[tokio::test]
    async fn test_fetch_is_cached_per_ref() {
        let mock = MockRepoClient::new();
        let url = "https://example.com/source.json";
        mock.mock_response(url, r#"{"apps": [{"name": "A"}]}"#);
        let fetcher = RepoFetcher::new(mock.clone(), BASE);

        let first = fetcher.fetch(url).await.unwrap();
        let second = fetcher.fetch(url).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(mock.request_count(url), 1);

        fetcher.clear_cache();
        fetcher.fetch(url).await.unwrap();
        assert_eq!(mock.request_count(url), 2);
    }

    #[tokio::test]
    async fn test_fetch_recovers_noisy_body() {
        let mock = MockRepoClient::new();
        let url = "https://example.com/noisy.json";
        mock.mock_response(url, "<!-- cdn -->\n{\"apps\": []}\n<!-- end -->");
        let fetcher = RepoFetcher::new(mock, BASE);

        let doc = fetcher.fetch(url).await.unwrap();
        assert_eq!(doc.data, json!({"apps": []}));
    }

    #[tokio::test]
    async fn test_fetch_parse_failure() {
        let mock = MockRepoClient::new();
        let url = "https://example.com/broken.json";
        mock.mock_response(url, "<html>Service Unavailable</html>");
        let fetcher = RepoFetcher::new(mock, BASE);

        let err = fetcher.fetch(url).await.unwrap_err();
        assert!(matches!(err, CatalogError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_fetch_http_and_transport_failures_not_cached() {
        let mock = MockRepoClient::new();
        let gone = "https://example.com/gone.json";
        let down = "https://example.com/down.json";
        mock.mock_status(gone, 500);
        mock.mock_error(down, "connection reset");
        let fetcher = RepoFetcher::new(mock.clone(), BASE);

        let err = fetcher.fetch(gone).await.unwrap_err();
        assert!(matches!(err, CatalogError::Http { status: 500, .. }));
        let err = fetcher.fetch(down).await.unwrap_err();
        assert!(err.to_string().contains("connection reset"));

        let _ = fetcher.fetch(gone).await;
        assert_eq!(mock.request_count(gone), 2);
    }
}
