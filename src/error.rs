use thiserror::Error;

/// Errors that can occur while crawling a WMTS tile pyramid
#[derive(Error, Debug)]
pub enum WmtsPrunerError {
    /// Network-related errors during capability or tile fetches
    #[error("Network error: {0}")]
    Network(#[from] crate::http::HttpError),

    /// Errors parsing the GetCapabilities document
    #[error("Capabilities parse error: {0}")]
    Capabilities(String),

    /// Errors decoding fetched tile bytes as an image
    #[error("Tile decode error: {0}")]
    TileDecode(#[from] image::ImageError),

    /// Configuration validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The requested layer or matrix set is absent from the capabilities
    #[error("Layer resolution error: {0}")]
    LayerResolution(String),
}

pub type Result<T> = std::result::Result<T, WmtsPrunerError>;
