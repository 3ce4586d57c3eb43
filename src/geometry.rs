//! Tile index to geographic degree mapping
//!
//! Standard slippy-map convention: at zoom `z` the world is a `2^z x 2^z`
//! grid, column 0 at longitude -180, row 0 at the northern edge.

use std::f64::consts::PI;

/// Longitude in degrees of the western edge of tile column `column` at `zoom`
///
/// Exact for integer columns in `[0, 2^zoom]`; `column = 2^zoom` yields the
/// antimeridian at +180.
pub fn tile_column_to_longitude(column: u32, zoom: u32) -> f64 {
    column as f64 / 2_f64.powi(zoom as i32) * 360.0 - 180.0
}

/// Latitude in degrees of the northern edge of tile row `row` at `zoom`
///
/// Latitude decreases as `row` grows; `row = 2^zoom` yields the southern
/// Web-Mercator limit.
pub fn tile_row_to_latitude(row: u32, zoom: u32) -> f64 {
    let n = PI - 2.0 * PI * row as f64 / 2_f64.powi(zoom as i32);
    180.0 / PI * (0.5 * (n.exp() - (-n).exp())).atan()
}
