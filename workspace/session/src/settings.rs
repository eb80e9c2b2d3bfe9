use reqwest::Url;
use std::time::Duration;

use crate::error::ApiError;

/// Local development backend
pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Where and how to reach the forecasting backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    /// Scheme, host, port and optional path prefix
    base_url: Url,
    /// Per-request timeout
    pub timeout: Duration,
}

impl ApiSettings {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let parsed = Url::parse(base_url).map_err(|e| ApiError::Url(format!("{base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(ApiError::Url(format!("{base_url}: not a base URL")));
        }
        Ok(Self {
            base_url: parsed,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL for an endpoint given as path segments. Each segment is percent-encoded.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::Url(self.base_url.to_string()))?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }
}
