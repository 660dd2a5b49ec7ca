use crate::config::CatalogConfig;
use crate::error::CatalogError;
use moka::future::Cache;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

static JSON_START: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\{\[]").expect("static regex"));

#[async_trait::async_trait]
pub trait RepoClient: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, CatalogError>;
}

pub struct RealRepoClient {
    client: Client,
}

impl RealRepoClient {
    pub fn new(config: &CatalogConfig) -> Self {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT,
                    reqwest::header::HeaderValue::from_static("application/json, text/plain, */*"),
                );
                headers
            })
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }
}

#[async_trait::async_trait]
impl RepoClient for RealRepoClient {
    async fn fetch_text(&self, url: &str) -> Result<String, CatalogError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CatalogError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(CatalogError::Http {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        resp.text().await.map_err(|e| CatalogError::Transport {
            url: url.to_string(),
            message: format!("body error: {}", e),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FetchedDocument {
    pub data: Value,
    /// Resolved URL the document was fetched from
    pub url: String,
}

/// References with a scheme are used as-is; short names resolve to
/// `<base>/<name>.json`.
pub fn resolve_source_url(source_ref: &str, base_url: &str) -> String {
    let source_ref = source_ref.trim();
    if source_ref.contains("://") {
        source_ref.to_string()
    } else {
        format!("{}/{}.json", base_url.trim_end_matches('/'), source_ref)
    }
}

/// Strict JSON first, then the first complete `{...}` or `[...]` value found
/// in the body. Some hosts wrap feeds in HTML error pages or comments.
pub fn parse_lenient_json(body: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return Some(value);
    }
    // Each candidate is read only up to the end of its own value, so stray
    // brackets before or after the feed do not matter.
    JSON_START.find_iter(body).find_map(|start| {
        serde_json::Deserializer::from_str(&body[start.start()..])
            .into_iter::<Value>()
            .next()?
            .ok()
    })
}

/// Fetches feed documents, caching each result by the reference it was
/// requested with for the lifetime of the fetcher.
pub struct RepoFetcher<C: RepoClient> {
    client: C,
    base_url: String,
    cache: Cache<String, Arc<FetchedDocument>>,
}

impl<C: RepoClient> RepoFetcher<C> {
    pub fn new(client: C, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            cache: Cache::builder().build(),
        }
    }

    pub async fn fetch(&self, source_ref: &str) -> Result<Arc<FetchedDocument>, CatalogError> {
        if let Some(cached) = self.cache.get(source_ref).await {
            log::debug!("Cache hit for {}", source_ref);
            return Ok(cached);
        }

        let url = resolve_source_url(source_ref, &self.base_url);
        log::debug!("Fetching {} from {}", source_ref, url);
        let body = self.client.fetch_text(&url).await?;
        let data = parse_lenient_json(&body).ok_or_else(|| CatalogError::Parse { url: url.clone() })?;

        let doc = Arc::new(FetchedDocument { data, url });
        self.cache
            .insert(source_ref.to_string(), Arc::clone(&doc))
            .await;
        Ok(doc)
    }

    pub fn clear_cache(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_absolute_and_short_refs() {
        let base = "https://repos.example.com/";
        assert_eq!(
            resolve_source_url("https://apps.altstore.io", base),
            "https://apps.altstore.io"
        );
        assert_eq!(
            resolve_source_url("quantum", base),
            "https://repos.example.com/quantum.json"
        );
    }

    #[test]
    fn test_strict_json() {
        assert_eq!(parse_lenient_json(r#"{"apps": []}"#), Some(json!({"apps": []})));
    }

    #[test]
    fn test_json_inside_html_noise() {
        let body = "<html><pre>{\"apps\": [{\"name\": \"X\"}]}</pre></html>";
        assert_eq!(
            parse_lenient_json(body),
            Some(json!({"apps": [{"name": "X"}]}))
        );
    }

    #[test]
    fn test_array_after_comment() {
        let body = "// generated feed\n[1, 2, 3]";
        assert_eq!(parse_lenient_json(body), Some(json!([1, 2, 3])));
    }

    #[test]
    fn test_braces_in_surrounding_markup() {
        let body = "<html><style>body{margin:0}</style><pre>{\"apps\": []}</pre></html>";
        assert_eq!(parse_lenient_json(body), Some(json!({"apps": []})));
    }

    #[test]
    fn test_trailing_comment_with_brace() {
        let body = "{\"apps\": []}\n// closing }";
        assert_eq!(parse_lenient_json(body), Some(json!({"apps": []})));
    }

    #[test]
    fn test_unrecoverable_body() {
        assert_eq!(parse_lenient_json("<html>502 Bad Gateway</html>"), None);
        assert_eq!(parse_lenient_json("{ broken"), None);
    }
}
