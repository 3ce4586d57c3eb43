use super::{HttpClient, HttpConfig, HttpError, HttpResponse, HttpResult};
use async_trait::async_trait;
use std::collections::HashMap;

/// Standard reqwest-based HTTP client
///
/// Connection pooling and keep-alive reuse come from the underlying
/// `reqwest::Client`, which matters here because a crawl issues one request
/// per candidate tile against the same host.
pub struct ReqwestClient {
    client: reqwest::Client,
    timeout_seconds: u64,
}

impl ReqwestClient {
    /// Create a new reqwest client with default configuration
    pub fn new() -> HttpResult<Self> {
        Self::with_config(HttpConfig::default())
    }

    /// Create a new reqwest client with custom configuration
    pub fn with_config(config: HttpConfig) -> HttpResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| HttpError::RequestFailed {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            timeout_seconds: config.timeout.as_secs(),
        })
    }

    /// Convert reqwest error to our error type
    fn convert_error(&self, err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout {
                seconds: self.timeout_seconds,
            }
        } else if err.is_connect() {
            HttpError::Network {
                message: format!("Connection failed: {}", err),
            }
        } else if let Some(status) = err.status() {
            HttpError::HttpStatus {
                status: status.as_u16(),
            }
        } else {
            HttpError::RequestFailed {
                message: err.to_string(),
            }
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> HttpResult<HttpResponse> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.convert_error(e))?;

        let status = response.status().as_u16();

        let mut headers = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(value_str) = value.to_str() {
                headers.insert(name.to_string(), value_str.to_string());
            }
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| self.convert_error(e))?
            .to_vec();

        Ok(HttpResponse {
            status,
            body,
            headers,
        })
    }
}
