//! OECD SDMX-JSON API client.
//!
//! Request shape: `{base}/{dataset}/{loc}.{subjects}.{measures}.{freq}/all`
//! with `startTime`/`endTime` bounds and `dimensionAtObservation=AllDimensions`
//! so every observation is keyed by the full axis tuple.

use reqwest::Url;
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::data::{DataRequest, Fetch};
use crate::error::FetchError;
use crate::sdmx::SdmxMessage;

pub const DEFAULT_BASE_URL: &str = "https://stats.oecd.org/SDMX-JSON/data";

/// Environment variable that overrides [`DEFAULT_BASE_URL`].
pub const BASE_URL_ENV: &str = "OECD_BASE_URL";

pub struct OecdClient {
    client: Client,
    base_url: String,
}

impl OecdClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Build a client, resolving the base URL from (in order) the explicit
    /// override, `OECD_BASE_URL` in the environment or `.env`, the default.
    pub fn from_env(base_url: Option<String>) -> Self {
        dotenvy::dotenv().ok();
        let base = base_url
            .or_else(|| std::env::var(BASE_URL_ENV).ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(base)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full request URL including query parameters.
    pub fn request_url(&self, request: &DataRequest) -> Result<Url, FetchError> {
        let path = format!(
            "{}/{}/{}/all",
            self.base_url,
            request.dataset,
            request.dimension_path()
        );
        Url::parse_with_params(&path, query_params(request))
            .map_err(|e| FetchError::Transport(format!("invalid request URL '{path}': {e}")))
    }
}

fn query_params(request: &DataRequest) -> Vec<(&'static str, String)> {
    let mut params = Vec::with_capacity(3);
    if let Some(start) = &request.start {
        params.push(("startTime", start.clone()));
    }
    if let Some(end) = &request.end {
        params.push(("endTime", end.clone()));
    }
    params.push(("dimensionAtObservation", "AllDimensions".to_string()));
    params
}

impl Fetch for OecdClient {
    fn fetch(&self, request: &DataRequest) -> Result<SdmxMessage, FetchError> {
        let url = self.request_url(request)?;
        info!(%url, "requesting SDMX-JSON data");

        let resp = self
            .client
            .get(url.clone())
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = resp
            .text()
            .map_err(|e| FetchError::Transport(format!("failed to read response body: {e}")))?;
        debug!(bytes = body.len(), "response received");

        SdmxMessage::from_json_str(&body)
    }

    fn describe(&self, request: &DataRequest) -> String {
        self.request_url(request)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}/{}", request.dataset, request.dimension_path()))
    }
}
