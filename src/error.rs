//! Error types for the catalog pipeline.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network error before a response arrived
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Response arrived with a non-success status
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    /// Body was neither strict JSON nor contained a recoverable JSON block
    #[error("response from {url} is not valid JSON")]
    Parse { url: String },

    /// Parsed JSON is not an object-shaped catalog
    #[error("invalid catalog document from {source_url}")]
    InvalidDocument { source_url: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CatalogError {
    /// True for failures that came from the network rather than the payload.
    pub fn is_transport(&self) -> bool {
        matches!(self, CatalogError::Transport { .. } | CatalogError::Http { .. })
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
