use roxmltree::{Document, Node};

use super::{Layer, TileMatrixLimit, TileMatrixSetDef};
use crate::{CrawlConfig, HttpClient, HttpError, Result, WmtsPrunerError};

/// Deepest zoom a limit record may declare; tile indices at zoom `z` lie in
/// `[0, 2^z)`, so anything past 31 cannot be addressed with u32 indices.
const MAX_ZOOM: u32 = 31;

/// Fetch and parse a WMTS GetCapabilities document
///
/// Transport failures and malformed XML are fatal; individual malformed
/// matrix-limit records inside an otherwise valid document are skipped with
/// a diagnostic instead.
pub async fn get_capabilities(
    client: &dyn HttpClient,
    config: &CrawlConfig,
) -> Result<Vec<Layer>> {
    let url = format!("{}?request=getcapabilities", config.base_url);
    tracing::info!("Fetching capabilities from {}", url);

    let response = client.get(&url).await?;
    if response.status != 200 {
        return Err(WmtsPrunerError::Network(HttpError::HttpStatus {
            status: response.status,
        }));
    }

    parse_capabilities(&response.text(), &config.projections)
}

/// Parse a capabilities XML document into layer definitions
pub fn parse_capabilities(xml: &str, projections: &[String]) -> Result<Vec<Layer>> {
    let doc = Document::parse(xml)
        .map_err(|e| WmtsPrunerError::Capabilities(format!("invalid XML: {}", e)))?;

    let contents = doc
        .root_element()
        .descendants()
        .find(|node| node.is_element() && node.tag_name().name() == "Contents")
        .ok_or_else(|| {
            WmtsPrunerError::Capabilities("document has no Contents element".to_string())
        })?;

    let layers = contents
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "Layer")
        .map(|node| parse_layer(node, projections))
        .collect::<Vec<_>>();

    tracing::info!("Parsed {} layer(s) from capabilities", layers.len());
    Ok(layers)
}

fn parse_layer(node: Node<'_, '_>, projections: &[String]) -> Layer {
    let mut layer = Layer {
        title: child_text(node, "Title"),
        id: child_text(node, "Identifier"),
        format: child_text(node, "Format"),
        matrix_sets: Default::default(),
    };

    for projection in projections {
        match parse_matrix_set(node, projection) {
            Some(def) => {
                layer.matrix_sets.insert(projection.clone(), def);
            }
            None => {
                tracing::info!(
                    "No {} tileset for layer {:?}",
                    projection,
                    layer.id.as_deref().unwrap_or("<unnamed>")
                );
            }
        }
    }

    layer
}

/// Locate the layer's matrix-set link for a projection prefix and parse its
/// per-zoom limits; `None` when the layer links no matching set
fn parse_matrix_set(layer: Node<'_, '_>, projection: &str) -> Option<TileMatrixSetDef> {
    let link = layer
        .children()
        .filter(|node| node.is_element() && node.tag_name().name() == "TileMatrixSetLink")
        .find(|node| {
            child_text(*node, "TileMatrixSet")
                .map(|id| id.starts_with(projection))
                .unwrap_or(false)
        })?;

    let id = child_text(link, "TileMatrixSet")?;

    let mut tile_sets = Vec::new();
    if let Some(limits_node) = link
        .children()
        .find(|node| node.is_element() && node.tag_name().name() == "TileMatrixSetLimits")
    {
        for entry in limits_node
            .children()
            .filter(|node| node.is_element() && node.tag_name().name() == "TileMatrixLimits")
        {
            if let Some(limit) = parse_matrix_limit(entry) {
                tile_sets.push(limit);
            }
        }
    }
    tile_sets.sort_by_key(|limit| limit.zoom);

    Some(TileMatrixSetDef { id, tile_sets })
}

/// Parse one TileMatrixLimits record; malformed records are dropped wholesale
fn parse_matrix_limit(entry: Node<'_, '_>) -> Option<TileMatrixLimit> {
    let Some(id) = child_text(entry, "TileMatrix") else {
        tracing::warn!("Skipping matrix limit without a TileMatrix identifier");
        return None;
    };

    // The zoom is the integer after the identifier's last ':' separator,
    // e.g. "EPSG:3395_FTA:5" -> 5.
    let Some(zoom) = id.rsplit(':').next().and_then(|z| z.parse::<u32>().ok()) else {
        tracing::warn!("Skipping matrix limit {:?}: no numeric zoom suffix", id);
        return None;
    };
    if zoom > MAX_ZOOM {
        tracing::warn!("Skipping matrix limit {:?}: zoom {} out of range", id, zoom);
        return None;
    }

    let min_row = child_integer(entry, "MinTileRow");
    let max_row = child_integer(entry, "MaxTileRow");
    let min_col = child_integer(entry, "MinTileCol");
    let max_col = child_integer(entry, "MaxTileCol");

    // The pyramid has 2^zoom tiles per axis; extents past that are as
    // malformed as a non-numeric one.
    let axis_tiles = 1u64 << zoom;
    match (min_row, max_row, min_col, max_col) {
        (Some(min_row), Some(max_row), Some(min_col), Some(max_col))
            if min_row <= max_row
                && min_col <= max_col
                && (max_row as u64) < axis_tiles
                && (max_col as u64) < axis_tiles =>
        {
            Some(TileMatrixLimit::new(
                id, zoom, min_row, max_row, min_col, max_col,
            ))
        }
        _ => {
            tracing::warn!("Skipping matrix limit {:?}: unusable row/column range", id);
            None
        }
    }
}

/// First child element with the given local name, as trimmed non-empty text
fn child_text(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.children()
        .find(|child| child.is_element() && child.tag_name().name() == name)
        .and_then(|child| child.text())
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn child_integer(node: Node<'_, '_>, name: &str) -> Option<u32> {
    child_text(node, name).and_then(|text| text.parse().ok())
}
