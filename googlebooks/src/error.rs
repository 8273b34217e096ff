//! Error types and classification of transport failures.

use thiserror::Error;
use tracing::warn;

/// A failure reported by a [`Transport`](crate::Transport) before it has been classified.
///
/// None of the variants carry request URLs, since those may contain the API key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The request was cancelled, either explicitly or because it timed out.
    #[error("request was cancelled")]
    Cancelled,
    /// No connection to the remote host could be established.
    #[error("could not connect to remote host")]
    NoConnection,
    /// The server responded with a non-success status code.
    #[error("server responded with status {0}")]
    Status(u16),
    /// The response body could not be decoded.
    #[error("could not decode response: {0}")]
    Decode(String),
    /// Any other transport failure.
    #[error("transport error: {0}")]
    Other(String),
}

/// User-facing errors.
///
/// Every variant renders a fixed, human-readable message that never includes the API key.
#[derive(Debug, Error)]
pub enum Error {
    /// The query, ISBN or volume id was rejected before any request was made.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// The request was cancelled or timed out.
    #[error("the request was cancelled")]
    Cancelled,
    /// There is no network connectivity.
    #[error("no internet connection, check your network and try again")]
    NoConnection,
    /// The server rejected the query (HTTP 400).
    #[error("invalid search query")]
    InvalidQuery,
    /// The API key is missing or invalid (HTTP 401).
    #[error("missing or invalid API key")]
    Unauthorized,
    /// The daily API quota has been exceeded (HTTP 403).
    #[error("API quota exceeded, try again tomorrow")]
    QuotaExceeded,
    /// Nothing matched the request (HTTP 404).
    #[error("no books found")]
    NotFound,
    /// Too many requests in a short period (HTTP 429).
    #[error("too many requests, wait a moment and try again")]
    RateLimited,
    /// The book service is temporarily unavailable (HTTP 500, 502 or 503).
    #[error("the book service is temporarily unavailable, try again later")]
    UpstreamUnavailable(u16),
    /// Any other non-success HTTP status.
    #[error("book service error (status {0})")]
    GenericApi(u16),
    /// The service could not be reached, or replied with something unreadable.
    #[error("could not reach the book service, check your connection and try again")]
    GenericConnectivityFailure,
    /// The configured base URL is not a valid absolute URL.
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),
    /// The HTTP client could not be constructed.
    #[error("could not construct http client: {0}")]
    BuildClient(#[source] reqwest::Error),
}

impl Error {
    /// Maps an HTTP status code to its error category.
    #[must_use]
    pub const fn from_status(status: u16) -> Error {
        match status {
            400 => Error::InvalidQuery,
            401 => Error::Unauthorized,
            403 => Error::QuotaExceeded,
            404 => Error::NotFound,
            429 => Error::RateLimited,
            500 | 502 | 503 => Error::UpstreamUnavailable(status),
            _ => Error::GenericApi(status),
        }
    }

    /// Returns the HTTP status code this error was derived from, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Error::InvalidQuery => Some(400),
            Error::Unauthorized => Some(401),
            Error::QuotaExceeded => Some(403),
            Error::NotFound => Some(404),
            Error::RateLimited => Some(429),
            Error::UpstreamUnavailable(status) | Error::GenericApi(status) => Some(*status),
            _ => None,
        }
    }

    /// Returns whether the caller may reasonably offer to retry the operation.
    ///
    /// No retries are ever performed by the client itself.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Error::RateLimited | Error::UpstreamUnavailable(_))
    }
}

/// Classifies a transport failure into a user-facing [`Error`].
///
/// `context` names the operation that failed and is only used for logging.
#[must_use]
pub fn classify(err: &FetchError, context: &str) -> Error {
    let classified = match err {
        FetchError::Cancelled => Error::Cancelled,
        FetchError::NoConnection => Error::NoConnection,
        FetchError::Status(status) => Error::from_status(*status),
        FetchError::Decode(_) | FetchError::Other(_) => Error::GenericConnectivityFailure,
    };

    warn!(%context, %err, error = %classified, "request failed");

    classified
}
