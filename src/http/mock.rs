use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{HttpClient, HttpError, HttpResponse, HttpResult};

/// Scriptable mock client for testing and offline development
///
/// Responses are routed by substring match against the request URL, which is
/// enough to script per-tile bodies (`TileCol=3&TileRow=7` is unambiguous
/// within one crawl). Every request is logged so tests can assert exactly
/// which URLs were fetched, and in what order.
pub struct MockClient {
    routes: Vec<(String, HttpResponse)>,
    default_response: HttpResponse,
    simulate_failure: bool,
    requests: Mutex<Vec<String>>,
}

impl MockClient {
    /// Create a mock that answers every request with an empty 200 body
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            default_response: Self::ok(Vec::new()),
            simulate_failure: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Set the body returned for URLs that match no route
    pub fn with_default_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.default_response = Self::ok(body.into());
        self
    }

    /// Answer URLs containing `fragment` with a 200 response carrying `body`
    pub fn with_route(mut self, fragment: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.routes.push((fragment.into(), Self::ok(body.into())));
        self
    }

    /// Answer URLs containing `fragment` with the given status and no body
    pub fn with_status_route(mut self, fragment: impl Into<String>, status: u16) -> Self {
        self.routes.push((
            fragment.into(),
            HttpResponse {
                status,
                body: Vec::new(),
                headers: HashMap::new(),
            },
        ));
        self
    }

    /// Configure the client to fail every request with a network error
    pub fn with_failure(mut self) -> Self {
        self.simulate_failure = true;
        self
    }

    /// URLs requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests made so far
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn ok(body: Vec<u8>) -> HttpResponse {
        HttpResponse {
            status: 200,
            body,
            headers: HashMap::new(),
        }
    }
}

#[async_trait]
impl HttpClient for MockClient {
    async fn get(&self, url: &str) -> HttpResult<HttpResponse> {
        self.requests.lock().unwrap().push(url.to_string());

        if self.simulate_failure {
            return Err(HttpError::Network {
                message: "Simulated network failure".to_string(),
            });
        }

        let response = self
            .routes
            .iter()
            .find(|(fragment, _)| url.contains(fragment))
            .map(|(_, response)| response)
            .unwrap_or(&self.default_response);

        tracing::debug!(
            "Mock client answering {} with status {} ({} bytes)",
            url,
            response.status,
            response.body.len()
        );

        Ok(response.clone())
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_routes_match_by_substring() {
        let client = MockClient::new()
            .with_route("TileCol=1&TileRow=0", b"abc".to_vec())
            .with_default_body(b"default".to_vec());

        let hit = client.get("http://x/?TileCol=1&TileRow=0").await.unwrap();
        assert_eq!(hit.body, b"abc");

        let miss = client.get("http://x/?TileCol=9&TileRow=9").await.unwrap();
        assert_eq!(miss.body, b"default");

        assert_eq!(client.request_count(), 2);
    }

    #[tokio::test]
    async fn test_simulated_failure() {
        let client = MockClient::new().with_failure();
        let result = client.get("http://x/").await;
        assert!(matches!(result, Err(HttpError::Network { .. })));
    }
}
