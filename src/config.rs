use serde::{Deserialize, Serialize};

/// Policy applied when a tile fetch fails
///
/// The reference behavior aborts the whole crawl on the first failed tile
/// request; retries are opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchPolicy {
    /// Abort the crawl on the first transport failure or non-200 status
    FailFast,
    /// Retry a failed fetch up to `attempts` additional times, then abort
    Retry { attempts: u32 },
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self::FailFast
    }
}

/// Configuration for one crawl run
///
/// Passed explicitly into the parser and crawler at construction; there is no
/// global service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Base WMTS endpoint, without query parameters
    pub base_url: String,
    /// Identifier of the layer to crawl
    pub layer_id: String,
    /// Projection prefix whose tile matrix set drives the crawl
    pub projection: String,
    /// Projection prefixes the capabilities parser extracts matrix sets for
    pub projections: Vec<String>,
    /// Deepest zoom level to fetch; tiles beyond it are reported, not fetched
    pub stop_after_zoom: u32,
    /// Byte lengths of the service's canonical blank tile, classified empty
    /// without decoding
    pub blank_tile_lengths: Vec<usize>,
    /// What to do when a tile fetch fails
    pub fetch_policy: FetchPolicy,
    /// Maximum timeout for HTTP requests (in seconds)
    pub timeout_seconds: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_url: "https://julkinen.liikennevirasto.fi/rasteripalvelu/service/wmts"
                .to_string(),
            layer_id: "liikennevirasto:Merikarttasarjojen erikoiskartat public".to_string(),
            projection: "EPSG:3395".to_string(),
            projections: vec!["WGS84".to_string(), "EPSG:3395".to_string()],
            stop_after_zoom: 9,
            blank_tile_lengths: vec![662, 658],
            fetch_policy: FetchPolicy::default(),
            timeout_seconds: 30,
        }
    }
}

impl CrawlConfig {
    /// Create a configuration for a specific service endpoint and layer
    pub fn new(base_url: impl Into<String>, layer_id: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            layer_id: layer_id.into(),
            ..Default::default()
        }
    }

    /// Set the projection prefix used to pick the crawl's tile matrix set
    pub fn with_projection(mut self, projection: impl Into<String>) -> Self {
        self.projection = projection.into();
        if !self.projections.contains(&self.projection) {
            self.projections.push(self.projection.clone());
        }
        self
    }

    /// Set the zoom cutoff
    pub fn with_stop_after_zoom(mut self, zoom: u32) -> Self {
        self.stop_after_zoom = zoom;
        self
    }

    /// Set the known blank-tile byte lengths for the fast-path classifier
    pub fn with_blank_tile_lengths(mut self, lengths: Vec<usize>) -> Self {
        self.blank_tile_lengths = lengths;
        self
    }

    /// Set the fetch failure policy
    pub fn with_fetch_policy(mut self, policy: FetchPolicy) -> Self {
        self.fetch_policy = policy;
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    /// Validate that the configuration is internally consistent
    pub fn validate(&self) -> crate::Result<()> {
        if self.base_url.is_empty() {
            return Err(crate::WmtsPrunerError::Config(
                "base_url must not be empty".to_string(),
            ));
        }
        if self.layer_id.is_empty() {
            return Err(crate::WmtsPrunerError::Config(
                "layer_id must not be empty".to_string(),
            ));
        }
        if !self.projections.contains(&self.projection) {
            return Err(crate::WmtsPrunerError::Config(format!(
                "target projection '{}' is not among the parsed projections {:?}",
                self.projection, self.projections
            )));
        }
        Ok(())
    }
}
