//! Default blocking HTTP fetcher for published key-set documents.

use crate::cache::KeySetFetcher;
use crate::errors::TransportError;
use std::time::Duration;
use url::Url;

/// Default request timeout for key-set fetches.
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking HTTP [`KeySetFetcher`] over `reqwest`.
///
/// One synchronous GET per fetch, no retries. Non-2xx responses and
/// transport-level failures are reported as [`TransportError`].
pub struct HttpKeySetFetcher {
    client: reqwest::blocking::Client,
}

impl HttpKeySetFetcher {
    /// Fetcher with the default timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    /// Fetcher with a custom request timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|error| {
                tracing::warn!(
                    target: "signet.fetch",
                    error = %error,
                    "failed to build HTTP client with custom config, using defaults"
                );
                reqwest::blocking::Client::new()
            });
        Self { client }
    }
}

impl Default for HttpKeySetFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl KeySetFetcher for HttpKeySetFetcher {
    fn fetch(&self, uri: &str) -> Result<Vec<u8>, TransportError> {
        let url = Url::parse(uri)
            .map_err(|e| TransportError(format!("invalid key set URI `{uri}`: {e}")))?;
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| TransportError(e.to_string()))?
            .error_for_status()
            .map_err(|e| TransportError(e.to_string()))?;
        response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|e| TransportError(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_uri_is_a_transport_error() {
        let fetcher = HttpKeySetFetcher::new();
        let result = fetcher.fetch("not a uri");
        assert!(result.is_err());
        let error = result.unwrap_err();
        assert!(error.to_string().contains("invalid key set URI"));
    }
}
