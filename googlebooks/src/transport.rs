//! The network seam of the client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{ClientBuilder, redirect::Policy};
use tracing::debug;
use url::Url;

use crate::error::{Error, FetchError};
use crate::query::redact;

/// The `User-Agent` header to send when issuing HTTP requests.
pub const HTTP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Performs GET requests on behalf of a [`Client`](crate::Client).
///
/// This is the only place the client suspends. Implementations must not include the request URL
/// in their errors, as it may carry the API key.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetches `url` and returns the response body of a successful response.
    async fn get(&self, url: &Url) -> Result<String, FetchError>;
}

/// A [`Transport`] backed by [`reqwest`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Constructs a transport with gzip support, no redirects and the given request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an [`Error::BuildClient`] if the underlying `reqwest` client fails to build.
    pub fn new(timeout: Duration) -> Result<HttpTransport, Error> {
        let client = ClientBuilder::new()
            .gzip(true)
            .redirect(Policy::none())
            .timeout(timeout)
            .user_agent(HTTP_USER_AGENT)
            .build()
            .map_err(Error::BuildClient)?;

        Ok(Self::with_client(client))
    }

    /// Constructs a transport using a pre-configured `reqwest::Client`.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> HttpTransport {
        HttpTransport { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, url: &Url) -> Result<String, FetchError> {
        debug!(url = %redact(url), "sending request");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(fetch_error)?;
        let status = response.status();

        if !status.is_success() {
            debug!(%status, "server responded with error status");

            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(fetch_error)
    }
}

/// Converts a [`reqwest::Error`] into a [`FetchError`], dropping the URL it carries.
fn fetch_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Cancelled
    } else if err.is_connect() {
        FetchError::NoConnection
    } else if let Some(status) = err.status() {
        FetchError::Status(status.as_u16())
    } else if err.is_decode() || err.is_body() {
        FetchError::Decode(err.without_url().to_string())
    } else {
        FetchError::Other(err.without_url().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_client() {
        let http_client = reqwest::Client::new();
        let _ = HttpTransport::with_client(http_client);
    }

    #[test]
    fn test_new() {
        assert!(HttpTransport::new(Duration::from_secs(10)).is_ok());
    }
}
