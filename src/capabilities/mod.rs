//! WMTS capabilities model
//!
//! Built once from a GetCapabilities parse and immutable afterwards. A layer
//! carries one [`TileMatrixSetDef`] per configured projection prefix; a
//! projection the service does not link is simply absent, which callers must
//! handle before seeding a crawl.

mod parser;

pub use parser::*;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::geometry::{tile_column_to_longitude, tile_row_to_latitude};

/// One layer from a WMTS capabilities document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Layer {
    /// Human-readable title; `None` when the document omits it
    pub title: Option<String>,
    /// Layer identifier, unique within one capabilities document
    pub id: Option<String>,
    /// Advertised tile format media type
    pub format: Option<String>,
    /// Tile matrix set definitions keyed by projection prefix
    pub matrix_sets: HashMap<String, TileMatrixSetDef>,
}

impl Layer {
    /// Matrix set definition for a projection prefix, if the layer links one
    pub fn matrix_set(&self, projection: &str) -> Option<&TileMatrixSetDef> {
        self.matrix_sets.get(projection)
    }
}

/// Find a layer by identifier
pub fn find_layer<'a>(layers: &'a [Layer], id: &str) -> Option<&'a Layer> {
    layers.iter().find(|layer| layer.id.as_deref() == Some(id))
}

/// One coordinate reference system's tile pyramid for a layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileMatrixSetDef {
    /// Full matrix set identifier as linked by the layer
    pub id: String,
    /// Per-zoom matrix limits, ascending by zoom, zooms unique
    pub tile_sets: Vec<TileMatrixLimit>,
}

impl TileMatrixSetDef {
    /// Limit entry for one zoom level
    pub fn limit_for_zoom(&self, zoom: u32) -> Option<&TileMatrixLimit> {
        self.tile_sets.iter().find(|limit| limit.zoom == zoom)
    }
}

/// The row/column range a layer declares content for at one zoom level
///
/// `tile_count` and `bounds` are derived from the extents at construction
/// and never set independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TileMatrixLimit {
    /// Tile matrix identifier, e.g. `EPSG:3395_FTA:5`
    pub id: String,
    pub zoom: u32,
    pub min_tile_row: u32,
    pub max_tile_row: u32,
    pub min_tile_col: u32,
    pub max_tile_col: u32,
    /// Number of tiles in the declared rectangle
    pub tile_count: u64,
    /// Geographic extent as `[west, south, east, north]` degrees
    pub bounds: [f64; 4],
}

impl TileMatrixLimit {
    /// Build a limit, deriving `tile_count` and `bounds` from the extents
    pub fn new(
        id: impl Into<String>,
        zoom: u32,
        min_tile_row: u32,
        max_tile_row: u32,
        min_tile_col: u32,
        max_tile_col: u32,
    ) -> Self {
        let tile_count = (max_tile_row - min_tile_row + 1) as u64
            * (max_tile_col - min_tile_col + 1) as u64;
        let bounds = [
            tile_column_to_longitude(min_tile_col, zoom),
            tile_row_to_latitude(max_tile_row + 1, zoom),
            tile_column_to_longitude(max_tile_col + 1, zoom),
            tile_row_to_latitude(min_tile_row, zoom),
        ];
        Self {
            id: id.into(),
            zoom,
            min_tile_row,
            max_tile_row,
            min_tile_col,
            max_tile_col,
            tile_count,
            bounds,
        }
    }

    /// Whether a tile index falls inside the declared rectangle
    pub fn contains(&self, column: u32, row: u32) -> bool {
        column >= self.min_tile_col
            && column <= self.max_tile_col
            && row >= self.min_tile_row
            && row <= self.max_tile_row
    }
}
