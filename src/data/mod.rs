//! Data sources.
//!
//! The pipeline only sees the [`Fetch`] trait. Implementations:
//! - [`oecd::OecdClient`]: live OECD SDMX-JSON API over blocking HTTP
//! - [`crate::io::PayloadFile`]: a previously saved message on disk

use crate::domain::ExtractConfig;
use crate::error::FetchError;
use crate::sdmx::SdmxMessage;

pub mod oecd;

pub use oecd::{DEFAULT_BASE_URL, OecdClient};

/// One request against a dimension-indexed dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRequest {
    pub dataset: String,
    /// One code set per request axis, in axis order. Empty set = every code.
    pub dimensions: Vec<Vec<String>>,
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DataRequest {
    pub fn from_config(config: &ExtractConfig) -> Self {
        Self {
            dataset: config.dataset.clone(),
            dimensions: config.selectors.in_request_order(),
            start: config.start.clone(),
            end: config.end.clone(),
        }
    }

    /// Dimension filter path segment: `IND.PRINTO01+CCRETT01..M`.
    pub fn dimension_path(&self) -> String {
        self.dimensions
            .iter()
            .map(|codes| codes.join("+"))
            .collect::<Vec<_>>()
            .join(".")
    }
}

/// Anything that can answer a [`DataRequest`] with an SDMX-JSON message.
///
/// Implementations are shared across threads by batch runs. Retry and
/// backoff, if wanted, belong inside the implementation.
pub trait Fetch: Sync {
    fn fetch(&self, request: &DataRequest) -> Result<SdmxMessage, FetchError>;

    /// Human-readable location of the request, for logs.
    fn describe(&self, request: &DataRequest) -> String {
        format!("{}/{}", request.dataset, request.dimension_path())
    }
}

impl<F: Fetch + ?Sized> Fetch for &F {
    fn fetch(&self, request: &DataRequest) -> Result<SdmxMessage, FetchError> {
        (**self).fetch(request)
    }

    fn describe(&self, request: &DataRequest) -> String {
        (**self).describe(request)
    }
}
