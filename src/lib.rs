//! A Rust library for discovering the non-empty extent of a WMTS raster tile pyramid.
//!
//! The crawler parses a WMTS GetCapabilities document into per-projection tile
//! matrix sets, then walks the tile pyramid breadth-first: each candidate tile
//! is fetched, classified as empty (fully transparent and/or pure white) or
//! non-empty, and only non-empty tiles have their four quadtree children
//! expanded at the next zoom level. Empty branches are pruned, which avoids
//! downloading the overwhelmingly blank majority of a sparse tile pyramid.

pub mod capabilities;
pub mod classify;
pub mod config;
pub mod crawler;
pub mod error;
pub mod geometry;
pub mod http;
pub mod tile_url;

pub use capabilities::*;
pub use classify::*;
pub use config::*;
pub use crawler::*;
pub use error::*;
pub use geometry::*;
pub use http::*;
pub use tile_url::*;
