use reqwest::StatusCode;
use tracing::*;
use url::Url;

use super::config::FETCH_TIMEOUT;
use super::error::FetchError;
use super::key::SigningKeySet;

/// Retrieves the identity provider's signing keys with a single GET.
///
/// No retries happen here; the caller decides whether a failed fetch is
/// worth repeating.
#[derive(Debug, Clone)]
pub struct KeySetFetcher {
    client: reqwest::Client,
    url: Url,
}

impl KeySetFetcher {
    /// Builds a fetcher whose client times out after [`FETCH_TIMEOUT`].
    pub fn new(url: Url) -> Result<KeySetFetcher, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(FetchError::Client)?;
        Ok(KeySetFetcher::with_client(client, url))
    }

    pub fn with_client(client: reqwest::Client, url: Url) -> KeySetFetcher {
        KeySetFetcher { client, url }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub async fn fetch(&self) -> Result<SigningKeySet, FetchError> {
        debug!(url = %self.url, "Fetching signing key set");

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(FetchError::Network)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::UnexpectedStatus(status));
        }

        let body = response.bytes().await.map_err(FetchError::Network)?;
        serde_json::from_slice(&body).map_err(FetchError::Decode)
    }
}
