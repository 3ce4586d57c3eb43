//! HTTP transport abstraction
//!
//! The crawler talks to the WMTS service exclusively through the [`HttpClient`]
//! trait, so tests can script responses and alternative transports can be
//! swapped in without touching the crawl logic.

mod mock;
#[cfg(feature = "reqwest-client")]
mod reqwest_client;
mod traits;

pub use mock::*;
#[cfg(feature = "reqwest-client")]
pub use reqwest_client::*;
pub use traits::*;
