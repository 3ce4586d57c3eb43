//! Breadth-first quadtree crawl of a WMTS tile pyramid
//!
//! The crawl is strictly sequential: one tile is fetched and classified at a
//! time, and only non-empty tiles have their four children enqueued. The work
//! queue is a plain FIFO owned by the crawl loop for the duration of one run.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

use crate::{
    CrawlConfig, FetchPolicy, HttpError, Layer, Result, TileMatrixSetDef, TileRequest,
    WmtsPrunerError, build_tile_url, http::HttpClient, is_empty_tile,
};

/// Upper bound on the queue capacity reserved while seeding; the declared
/// tile count comes from the remote document and must not size an
/// allocation unchecked
const MAX_SEED_PREALLOC: u64 = 1024;

/// One tile of the pyramid, identified by zoom, column and row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileCoordinate {
    pub zoom: u32,
    pub column: u32,
    pub row: u32,
}

impl TileCoordinate {
    pub fn new(zoom: u32, column: u32, row: u32) -> Self {
        Self { zoom, column, row }
    }

    /// The four quadtree children covering this tile at the next zoom level
    pub fn children(&self) -> [TileCoordinate; 4] {
        let (z, x, y) = (self.zoom + 1, self.column * 2, self.row * 2);
        [
            TileCoordinate::new(z, x, y),
            TileCoordinate::new(z, x + 1, y),
            TileCoordinate::new(z, x, y + 1),
            TileCoordinate::new(z, x + 1, y + 1),
        ]
    }
}

impl fmt::Display for TileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.column, self.row)
    }
}

/// Why a crawl run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HaltReason {
    /// The queue drained before the cutoff: the full non-empty extent up to
    /// the cutoff has been discovered
    QueueExhausted,
    /// The front of the queue reached a zoom beyond the configured cutoff
    ZoomCutoff,
}

/// Summary of one crawl run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlReport {
    pub halt: HaltReason,
    /// Tiles actually requested over the network
    pub tiles_fetched: u64,
    /// Tiles classified empty (including implicit out-of-range empties)
    pub tiles_pruned: u64,
    /// Tiles classified non-empty, whose children were enqueued
    pub tiles_expanded: u64,
    /// Queue contents at the cutoff: tiles known to need fetching one zoom
    /// deeper, left unexplored
    pub unexplored: Vec<TileCoordinate>,
    /// How many tiles a naive full-pyramid fetch would need at the zoom past
    /// the cutoff, when the capabilities declare a limit there
    pub naive_next_zoom_tiles: Option<u64>,
}

/// Sequential quadtree-pruning crawler over one WMTS layer
pub struct Crawler<'a> {
    client: &'a dyn HttpClient,
    config: &'a CrawlConfig,
}

impl<'a> Crawler<'a> {
    pub fn new(client: &'a dyn HttpClient, config: &'a CrawlConfig) -> Self {
        Self { client, config }
    }

    /// Walk the layer's pyramid for the configured projection, pruning empty
    /// branches, until the queue drains or the zoom cutoff is reached
    pub async fn crawl(&self, layer: &Layer) -> Result<CrawlReport> {
        self.config.validate()?;

        let layer_id = layer.id.clone().ok_or_else(|| {
            WmtsPrunerError::LayerResolution("target layer has no identifier".to_string())
        })?;
        let matrix_set = layer.matrix_set(&self.config.projection).ok_or_else(|| {
            WmtsPrunerError::LayerResolution(format!(
                "layer '{}' declares no {} tile matrix set",
                layer_id, self.config.projection
            ))
        })?;

        let mut queue = self.seed(matrix_set)?;
        let mut report = CrawlReport {
            halt: HaltReason::QueueExhausted,
            tiles_fetched: 0,
            tiles_pruned: 0,
            tiles_expanded: 0,
            unexplored: Vec::new(),
            naive_next_zoom_tiles: None,
        };

        loop {
            // Peek, so a coordinate past the cutoff stays in the queue and is
            // reported as unexplored instead of being silently dropped.
            let Some(tile) = queue.front().copied() else {
                tracing::info!(
                    "Queue exhausted: pyramid fully explored up to zoom {}",
                    self.config.stop_after_zoom
                );
                break;
            };

            if tile.zoom > self.config.stop_after_zoom {
                tracing::info!(
                    "Stopping search because next tile to reach is at level {}",
                    tile.zoom
                );
                report.halt = HaltReason::ZoomCutoff;
                report.naive_next_zoom_tiles = matrix_set
                    .limit_for_zoom(self.config.stop_after_zoom + 1)
                    .map(|limit| limit.tile_count);
                if let Some(naive) = report.naive_next_zoom_tiles {
                    tracing::info!(
                        "Naive getter would fetch {} tiles at zoom {}; this crawl left {} queued",
                        naive,
                        self.config.stop_after_zoom + 1,
                        queue.len()
                    );
                }
                report.unexplored = queue.into_iter().collect();
                return Ok(report);
            }
            queue.pop_front();

            // Tiles outside the declared matrix extent are assumed blank and
            // never requested.
            let bytes = match matrix_set.limit_for_zoom(tile.zoom) {
                Some(limit) if limit.contains(tile.column, tile.row) => {
                    let url = build_tile_url(
                        &self.config.base_url,
                        &TileRequest {
                            layer_id: layer_id.clone(),
                            matrix_set_id: matrix_set.id.clone(),
                            tile_set_id: limit.id.clone(),
                            row: tile.row,
                            column: tile.column,
                        },
                    );
                    report.tiles_fetched += 1;
                    self.fetch_with_policy(&url).await?
                }
                _ => Vec::new(),
            };

            if is_empty_tile(&bytes, &self.config.blank_tile_lengths)? {
                tracing::info!("pruning at {}", tile);
                report.tiles_pruned += 1;
            } else {
                report.tiles_expanded += 1;
                for child in tile.children() {
                    queue.push_back(child);
                }
            }
        }

        Ok(report)
    }

    /// Enqueue the full rectangle of the matrix set's shallowest limit
    fn seed(&self, matrix_set: &TileMatrixSetDef) -> Result<VecDeque<TileCoordinate>> {
        let start = matrix_set.tile_sets.first().ok_or_else(|| {
            WmtsPrunerError::LayerResolution(format!(
                "matrix set '{}' declares no tile matrix limits",
                matrix_set.id
            ))
        })?;

        let mut queue =
            VecDeque::with_capacity(start.tile_count.min(MAX_SEED_PREALLOC) as usize);
        for row in start.min_tile_row..=start.max_tile_row {
            for column in start.min_tile_col..=start.max_tile_col {
                let tile = TileCoordinate::new(start.zoom, column, row);
                tracing::info!("starting with {}", tile);
                queue.push_back(tile);
            }
        }
        Ok(queue)
    }

    /// Fetch one tile URL under the configured failure policy
    async fn fetch_with_policy(&self, url: &str) -> Result<Vec<u8>> {
        let mut attempts_left = match self.config.fetch_policy {
            FetchPolicy::FailFast => 0,
            FetchPolicy::Retry { attempts } => attempts,
        };
        loop {
            match self.fetch_once(url).await {
                Ok(bytes) => return Ok(bytes),
                Err(err) if attempts_left > 0 => {
                    attempts_left -= 1;
                    tracing::warn!(
                        "Tile fetch failed ({}), retrying ({} attempts left)",
                        err,
                        attempts_left
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).await?;
        if response.status != 200 {
            return Err(WmtsPrunerError::Network(HttpError::HttpStatus {
                status: response.status,
            }));
        }
        Ok(response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MockClient, TileMatrixLimit};
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::collections::HashMap;
    use std::io::Cursor;

    fn png(image: RgbaImage) -> Vec<u8> {
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    fn white_png() -> Vec<u8> {
        png(RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255])))
    }

    fn content_png() -> Vec<u8> {
        let mut image = RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]));
        image.put_pixel(1, 1, Rgba([20, 60, 180, 255]));
        png(image)
    }

    fn layer(limits: Vec<TileMatrixLimit>) -> Layer {
        let set = TileMatrixSetDef {
            id: "EPSG:3395_FTA".to_string(),
            tile_sets: limits,
        };
        Layer {
            title: Some("Test layer".to_string()),
            id: Some("test:layer".to_string()),
            format: Some("image/png".to_string()),
            matrix_sets: HashMap::from([("EPSG:3395".to_string(), set)]),
        }
    }

    fn config() -> CrawlConfig {
        CrawlConfig::new("http://example.com/wmts", "test:layer")
    }

    fn limit(zoom: u32, max_row: u32, max_col: u32) -> TileMatrixLimit {
        TileMatrixLimit::new(format!("EPSG:3395_FTA:{}", zoom), zoom, 0, max_row, 0, max_col)
    }

    #[tokio::test]
    async fn test_seeding_enqueues_full_rectangle_in_order() {
        // Cutoff below the seed zoom halts before any fetch, exposing the
        // freshly seeded queue as the unexplored set.
        let client = MockClient::new();
        let config = config().with_stop_after_zoom(4);
        let crawler = Crawler::new(&client, &config);

        let report = crawler.crawl(&layer(vec![limit(5, 1, 1)])).await.unwrap();

        assert_eq!(report.halt, HaltReason::ZoomCutoff);
        assert_eq!(report.tiles_fetched, 0);
        assert_eq!(client.request_count(), 0);
        assert_eq!(
            report.unexplored,
            vec![
                TileCoordinate::new(5, 0, 0),
                TileCoordinate::new(5, 1, 0),
                TileCoordinate::new(5, 0, 1),
                TileCoordinate::new(5, 1, 1),
            ]
        );
    }

    #[tokio::test]
    async fn test_seed_beyond_prealloc_cap_still_enqueues_every_tile() {
        // 40x40 = 1600 tiles, past the reserved capacity; the queue must
        // still grow to hold the full rectangle in order.
        let client = MockClient::new();
        let config = config().with_stop_after_zoom(4);
        let crawler = Crawler::new(&client, &config);

        let report = crawler.crawl(&layer(vec![limit(5, 39, 39)])).await.unwrap();

        assert_eq!(report.halt, HaltReason::ZoomCutoff);
        assert_eq!(report.unexplored.len(), 1600);
        assert_eq!(report.unexplored[0], TileCoordinate::new(5, 0, 0));
        assert_eq!(report.unexplored[40], TileCoordinate::new(5, 0, 1));
        assert_eq!(report.unexplored[1599], TileCoordinate::new(5, 39, 39));
        assert_eq!(client.request_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_tiles_prune_their_branch() {
        let client = MockClient::new().with_default_body(white_png());
        let config = config();
        let crawler = Crawler::new(&client, &config);

        let report = crawler.crawl(&layer(vec![limit(5, 1, 1)])).await.unwrap();

        assert_eq!(report.halt, HaltReason::QueueExhausted);
        assert_eq!(report.tiles_fetched, 4);
        assert_eq!(report.tiles_pruned, 4);
        assert_eq!(report.tiles_expanded, 0);
        assert!(report.unexplored.is_empty());
        assert_eq!(client.request_count(), 4);
    }

    #[tokio::test]
    async fn test_non_empty_tile_expands_four_children_until_cutoff() {
        let client = MockClient::new()
            .with_route("TileCol=0&TileRow=0", content_png())
            .with_default_body(white_png());
        let config = config().with_stop_after_zoom(5);
        let crawler = Crawler::new(&client, &config);

        let report = crawler
            .crawl(&layer(vec![limit(5, 1, 1), limit(6, 3, 3)]))
            .await
            .unwrap();

        assert_eq!(report.halt, HaltReason::ZoomCutoff);
        // All four zoom-5 tiles were fetched, none deeper.
        assert_eq!(report.tiles_fetched, 4);
        assert_eq!(client.request_count(), 4);
        assert_eq!(report.tiles_expanded, 1);
        assert_eq!(report.tiles_pruned, 3);
        assert_eq!(
            report.unexplored,
            vec![
                TileCoordinate::new(6, 0, 0),
                TileCoordinate::new(6, 1, 0),
                TileCoordinate::new(6, 0, 1),
                TileCoordinate::new(6, 1, 1),
            ]
        );
        assert_eq!(report.naive_next_zoom_tiles, Some(16));
    }

    #[tokio::test]
    async fn test_out_of_range_children_are_implicit_empties() {
        // Zoom 6 declares a single-tile extent, so three of the four children
        // of the non-empty seed fall outside it and must not hit the network.
        let client = MockClient::new()
            .with_route("TileMatrix=EPSG%3A3395_FTA%3A5", content_png())
            .with_default_body(white_png());
        let config = config();
        let crawler = Crawler::new(&client, &config);

        let report = crawler
            .crawl(&layer(vec![limit(5, 0, 0), limit(6, 0, 0)]))
            .await
            .unwrap();

        assert_eq!(report.halt, HaltReason::QueueExhausted);
        assert_eq!(report.tiles_fetched, 2);
        assert_eq!(client.request_count(), 2);
        assert_eq!(report.tiles_expanded, 1);
        assert_eq!(report.tiles_pruned, 4);
    }

    #[tokio::test]
    async fn test_zoom_without_declared_limit_is_implicit_empty() {
        // No zoom-6 limit at all: every child is skipped without a request.
        let client = MockClient::new()
            .with_route("TileMatrix=EPSG%3A3395_FTA%3A5", content_png());
        let config = config();
        let crawler = Crawler::new(&client, &config);

        let report = crawler.crawl(&layer(vec![limit(5, 0, 0)])).await.unwrap();

        assert_eq!(report.tiles_fetched, 1);
        assert_eq!(client.request_count(), 1);
        assert_eq!(report.tiles_pruned, 4);
    }

    #[tokio::test]
    async fn test_blank_length_bytes_prune_without_decoding() {
        // 662 bytes of garbage match the configured blank length, so the
        // classifier never attempts a PNG decode.
        let client = MockClient::new().with_default_body(vec![0xAB; 662]);
        let config = config();
        let crawler = Crawler::new(&client, &config);

        let report = crawler.crawl(&layer(vec![limit(5, 0, 0)])).await.unwrap();
        assert_eq!(report.tiles_pruned, 1);
        assert_eq!(report.tiles_expanded, 0);
    }

    #[tokio::test]
    async fn test_transport_failure_is_fatal_by_default() {
        let client = MockClient::new().with_failure();
        let config = config();
        let crawler = Crawler::new(&client, &config);

        let result = crawler.crawl(&layer(vec![limit(5, 0, 0)])).await;
        assert!(matches!(result, Err(WmtsPrunerError::Network(_))));
        assert_eq!(client.request_count(), 1);
    }

    #[tokio::test]
    async fn test_non_200_status_is_fatal() {
        let client = MockClient::new().with_status_route("Request=GetTile", 500);
        let config = config();
        let crawler = Crawler::new(&client, &config);

        let result = crawler.crawl(&layer(vec![limit(5, 0, 0)])).await;
        assert!(matches!(
            result,
            Err(WmtsPrunerError::Network(HttpError::HttpStatus { status: 500 }))
        ));
    }

    #[tokio::test]
    async fn test_retry_policy_retries_before_failing() {
        let client = MockClient::new().with_failure();
        let config = config().with_fetch_policy(FetchPolicy::Retry { attempts: 2 });
        let crawler = Crawler::new(&client, &config);

        let result = crawler.crawl(&layer(vec![limit(5, 0, 0)])).await;
        assert!(result.is_err());
        // One initial attempt plus two retries.
        assert_eq!(client.request_count(), 3);
    }

    #[tokio::test]
    async fn test_missing_projection_is_a_resolution_error() {
        let client = MockClient::new();
        let config = config().with_projection("EPSG:3067");
        let crawler = Crawler::new(&client, &config);

        let result = crawler.crawl(&layer(vec![limit(5, 0, 0)])).await;
        assert!(matches!(result, Err(WmtsPrunerError::LayerResolution(_))));
    }

    #[tokio::test]
    async fn test_empty_matrix_set_is_a_resolution_error() {
        let client = MockClient::new();
        let config = config();
        let crawler = Crawler::new(&client, &config);

        let result = crawler.crawl(&layer(vec![])).await;
        assert!(matches!(result, Err(WmtsPrunerError::LayerResolution(_))));
    }

    #[test]
    fn test_children_are_ordered_quadrants() {
        let tile = TileCoordinate::new(5, 3, 7);
        assert_eq!(
            tile.children(),
            [
                TileCoordinate::new(6, 6, 14),
                TileCoordinate::new(6, 7, 14),
                TileCoordinate::new(6, 6, 15),
                TileCoordinate::new(6, 7, 15),
            ]
        );
    }

    #[test]
    fn test_coordinate_display() {
        assert_eq!(TileCoordinate::new(5, 3, 7).to_string(), "5/3/7");
    }
}
