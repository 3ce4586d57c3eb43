use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Result type for HTTP operations
pub type HttpResult<T> = Result<T, HttpError>;

/// HTTP client errors
#[derive(Debug, thiserror::Error, Clone)]
pub enum HttpError {
    #[error("Request failed: {message}")]
    RequestFailed { message: String },

    #[error("HTTP error: {status}")]
    HttpStatus { status: u16 },

    #[error("Timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Network error: {message}")]
    Network { message: String },
}

/// HTTP response with a binary body
///
/// Tile payloads are PNG bytes, so the body is kept binary; [`HttpResponse::text`]
/// serves callers that expect text (the capabilities XML).
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub headers: HashMap<String, String>,
}

impl HttpResponse {
    /// Interpret the body as UTF-8 text, replacing invalid sequences
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Trait for HTTP clients that can be used in different environments
///
/// The crawler only ever issues GET requests; everything else about the
/// transport (pooling, keep-alive, TLS) is the implementation's concern.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Make a GET request
    async fn get(&self, url: &str) -> HttpResult<HttpResponse>;
}

/// Configuration for HTTP clients
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            user_agent: format!("wmts-pruner/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
