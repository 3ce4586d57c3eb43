//! Tile emptiness classification
//!
//! The service renders "no data" as either fully transparent pixels or pure
//! white ones (white-on-transparent chart backgrounds). A tile counts as
//! empty only when every pixel is one of the two, which is the signal the
//! crawler uses to prune a whole quadtree branch.

use crate::Result;

/// Decide whether raw tile bytes represent an empty tile
///
/// Zero-length input is empty by definition (used for tiles outside the
/// declared matrix extent, which are never fetched). A byte length listed in
/// `blank_lengths` short-circuits as empty without decoding; that set is
/// observed per service and is an optimization, not a correctness
/// requirement. Everything else is decoded as PNG and scanned pixel by
/// pixel, stopping at the first pixel that is neither fully transparent nor
/// pure white.
pub fn is_empty_tile(bytes: &[u8], blank_lengths: &[usize]) -> Result<bool> {
    if bytes.is_empty() {
        return Ok(true);
    }
    if blank_lengths.contains(&bytes.len()) {
        tracing::debug!(
            "classified empty via known blank length {} without decoding",
            bytes.len()
        );
        return Ok(true);
    }

    let image = image::load_from_memory(bytes)?.into_rgba8();
    for pixel in image.pixels() {
        let [r, g, b, a] = pixel.0;
        if a == 0 {
            continue;
        }
        if r == 255 && g == 255 && b == 255 {
            continue;
        }
        return Ok(false);
    }
    Ok(true)
}
