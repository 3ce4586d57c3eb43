use urlencoding::encode;

/// PNG is the only raster format the crawler requests
pub const PNG_MEDIA_TYPE: &str = "image/png";

/// Identifies one tile of one layer for a GetTile request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRequest {
    pub layer_id: String,
    pub matrix_set_id: String,
    pub tile_set_id: String,
    pub row: u32,
    pub column: u32,
}

/// Build a WMTS GetTile URL for one tile
///
/// Deterministic and purely string-based; parameter names and casing follow
/// the service's accepted form.
pub fn build_tile_url(base_url: &str, request: &TileRequest) -> String {
    let params = [
        ("layer", request.layer_id.as_str()),
        ("style", ""),
        ("tilematrixset", request.matrix_set_id.as_str()),
        ("Service", "WMTS"),
        ("Request", "GetTile"),
        ("Version", "1.0.0"),
        ("Format", PNG_MEDIA_TYPE),
        ("TileMatrix", request.tile_set_id.as_str()),
    ];

    let mut url = String::from(base_url);
    url.push(if base_url.contains('?') { '&' } else { '?' });
    for (key, value) in params {
        url.push_str(key);
        url.push('=');
        url.push_str(&encode(value));
        url.push('&');
    }
    url.push_str(&format!("TileCol={}&TileRow={}", request.column, request.row));
    url
}
