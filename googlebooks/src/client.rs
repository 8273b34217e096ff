//! The search client.
//!
//! Every operation checks the cache first. On a miss it builds a request URL, fetches it through
//! the [`Transport`] under a deadline, normalizes the response and caches the outcome. Failures
//! are classified into [`Error`]s and are never cached or retried.

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument};
use url::Url;

use crate::cache::{Cache, CacheConfig, now_millis};
use crate::error::{Error, FetchError, classify};
use crate::query::{BASE_URL, QueryBuilder, SearchOptions, redact};
use crate::transform;
use crate::transport::{HttpTransport, Transport};
use crate::types::{Book, SearchResult, Volume, VolumesResponse};

/// The environment variable the API key is read from by [`ClientConfig::from_env`].
pub const API_KEY_ENV: &str = "GOOGLE_BOOKS_API_KEY";
/// The duration before a request is cancelled.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client configuration.
#[derive(Clone)]
pub struct ClientConfig {
    /// The volumes endpoint.
    pub base_url: String,
    /// The API key. Without one, requests are sent unauthenticated and are rate limited harder.
    pub api_key: Option<String>,
    /// The deadline for each request.
    pub timeout: Duration,
    /// Result cache configuration.
    pub cache: CacheConfig,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: BASE_URL.to_string(),
            api_key: None,
            timeout: DEFAULT_TIMEOUT,
            cache: CacheConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Returns the default configuration with the API key read from `GOOGLE_BOOKS_API_KEY`.
    ///
    /// An unset or blank variable leaves the key unset.
    #[must_use]
    pub fn from_env() -> ClientConfig {
        ClientConfig::default().with_api_key(std::env::var(API_KEY_ENV).ok())
    }

    /// Sets the API key, treating a blank key as no key.
    #[must_use]
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());
        self
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("cache", &self.cache)
            .finish()
    }
}

/// A read-only snapshot of the client's configuration and cache occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health {
    /// Whether requests carry an API key.
    pub api_key_configured: bool,
    /// The number of entries currently cached.
    pub cache_entries: usize,
    /// The maximum number of cached entries.
    pub cache_capacity: usize,
    /// The time-to-live of cached entries.
    pub cache_ttl: Duration,
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let key = if self.api_key_configured {
            "configured"
        } else {
            "not configured (requests are rate limited)"
        };

        write!(
            f,
            "API key: {key}, cache: {}/{} entries (ttl {}s)",
            self.cache_entries,
            self.cache_capacity,
            self.cache_ttl.as_secs()
        )
    }
}

/// Cached outcomes of successful operations.
#[derive(Clone)]
enum Cached {
    Search(SearchResult),
    Volume(Book),
}

/// A caching client for the volumes API.
///
/// The client can be shared between tasks; the cache is the only state it mutates.
pub struct Client<T = HttpTransport> {
    query: QueryBuilder,
    transport: T,
    timeout: Duration,
    cache: Mutex<Cache<Cached>>,
}

impl Client<HttpTransport> {
    /// Constructs a client that talks to the service over HTTP.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBaseUrl`] if the configured base URL is invalid, or
    /// [`Error::BuildClient`] if the HTTP client cannot be constructed.
    pub fn new(config: ClientConfig) -> Result<Client<HttpTransport>, Error> {
        let transport = HttpTransport::new(config.timeout)?;

        Client::with_transport(config, transport)
    }
}

impl<T: Transport> Client<T> {
    /// Constructs a client that issues its requests through `transport`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBaseUrl`] if the configured base URL is invalid.
    pub fn with_transport(config: ClientConfig, transport: T) -> Result<Client<T>, Error> {
        let query = QueryBuilder::new(&config.base_url, config.api_key)?;

        if !query.has_api_key() {
            info!("no api key configured, requests will be sent unauthenticated");
        }

        Ok(Client {
            query,
            transport,
            timeout: config.timeout,
            cache: Mutex::new(Cache::new(config.cache)),
        })
    }

    /// Searches for volumes matching the free-text `query`.
    ///
    /// Identical searches within the cache's time-to-live are served from the cache.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] without issuing a request if `query` is blank, and a
    /// classified error if the request fails.
    #[instrument(skip(self, options))]
    pub async fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResult, Error> {
        let query = query.trim();

        if query.is_empty() {
            return Err(Error::InvalidInput("search query must not be empty"));
        }

        let key = format!("search:{query}?{}", options.signature());

        if let Some(Cached::Search(result)) = self.cache.lock().await.get(&key) {
            debug!(%key, "serving search from cache");

            return Ok(result);
        }

        let url = self.query.search_url(query, options);
        let response: VolumesResponse = self.fetch(&url, "search").await?;
        let result = SearchResult {
            items: transform::books(&response.items),
            total_items: response.total_items,
            query: query.to_string(),
            timestamp: now_millis(),
        };

        debug!(
            items = result.items.len(),
            total_items = result.total_items,
            "search completed"
        );

        self.cache
            .lock()
            .await
            .insert(key, Cached::Search(result.clone()));

        Ok(result)
    }

    /// Searches for volumes whose title contains `title`.
    ///
    /// # Errors
    ///
    /// See [`Client::search`].
    pub async fn search_by_title(
        &self,
        title: &str,
        options: &SearchOptions,
    ) -> Result<SearchResult, Error> {
        self.qualified_search("intitle", "title must not be empty", title, options)
            .await
    }

    /// Searches for volumes credited to `author`.
    ///
    /// # Errors
    ///
    /// See [`Client::search`].
    pub async fn search_by_author(
        &self,
        author: &str,
        options: &SearchOptions,
    ) -> Result<SearchResult, Error> {
        self.qualified_search("inauthor", "author must not be empty", author, options)
            .await
    }

    /// Searches for volumes with the given ISBN-10 or ISBN-13. Hyphens and spaces are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `isbn` is not 10 or 13 characters long once hyphens and
    /// spaces are removed, or contains anything but digits and a trailing check character `X`.
    /// Otherwise see [`Client::search`].
    pub async fn search_by_isbn(
        &self,
        isbn: &str,
        options: &SearchOptions,
    ) -> Result<SearchResult, Error> {
        let isbn: String = isbn
            .chars()
            .filter(|c| *c != '-' && !c.is_whitespace())
            .collect();

        if !is_isbn(&isbn) {
            return Err(Error::InvalidInput("ISBN must be 10 or 13 digits"));
        }

        self.search(&format!("isbn:{isbn}"), options).await
    }

    /// Fetches a single volume by its id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] without issuing a request if `id` is blank or a relative
    /// path segment (`.` or `..`), [`Error::NotFound`] if the service answers with a record
    /// that has no id, and a classified error if the request fails.
    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> Result<Book, Error> {
        let id = id.trim();

        if id.is_empty() {
            return Err(Error::InvalidInput("volume id must not be empty"));
        }

        if id == "." || id == ".." {
            return Err(Error::InvalidInput("volume id must not be `.` or `..`"));
        }

        let key = format!("volume:{id}");

        if let Some(Cached::Volume(book)) = self.cache.lock().await.get(&key) {
            debug!(%key, "serving volume from cache");

            return Ok(book);
        }

        let url = self.query.volume_url(id);
        let volume: Volume = self.fetch(&url, "volume").await?;

        if volume.id.is_empty() {
            info!(%id, "volume response has no id");

            return Err(Error::NotFound);
        }

        let book = Book::from(&volume);

        self.cache
            .lock()
            .await
            .insert(key, Cached::Volume(book.clone()));

        Ok(book)
    }

    /// Returns the transport requests are issued through.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Removes every cached result.
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();

        info!("cache cleared");
    }

    /// Returns whether an API key is configured along with the current cache occupancy.
    pub async fn health(&self) -> Health {
        let cache = self.cache.lock().await;

        Health {
            api_key_configured: self.query.has_api_key(),
            cache_entries: cache.len(),
            cache_capacity: cache.max_size(),
            cache_ttl: cache.ttl(),
        }
    }

    async fn qualified_search(
        &self,
        qualifier: &str,
        empty_message: &'static str,
        term: &str,
        options: &SearchOptions,
    ) -> Result<SearchResult, Error> {
        let term = term.trim();

        if term.is_empty() {
            return Err(Error::InvalidInput(empty_message));
        }

        self.search(&format!("{qualifier}:{term}"), options).await
    }

    /// Fetches `url` under the configured deadline and decodes the response body.
    async fn fetch<R: DeserializeOwned>(&self, url: &Url, context: &str) -> Result<R, Error> {
        debug!(url = %redact(url), %context, "cache miss, fetching");

        let body = match tokio::time::timeout(self.timeout, self.transport.get(url)).await {
            Ok(Ok(body)) => body,
            Ok(Err(err)) => return Err(classify(&err, context)),
            Err(_) => {
                debug!(timeout = ?self.timeout, "request timed out");

                return Err(classify(&FetchError::Cancelled, context));
            }
        };

        let jd = &mut serde_json::Deserializer::from_str(&body);

        serde_path_to_error::deserialize(jd)
            .inspect_err(|err| error!(?err, %context, "could not parse response"))
            .map_err(|err| classify(&FetchError::Decode(err.to_string()), context))
    }
}

/// Returns whether `s` looks like a bare ISBN-10 or ISBN-13.
fn is_isbn(s: &str) -> bool {
    match s.len() {
        10 => {
            let (body, check) = s.split_at(9);

            body.bytes().all(|b| b.is_ascii_digit())
                && check.bytes().all(|b| b.is_ascii_digit() || b == b'X' || b == b'x')
        }
        13 => s.bytes().all(|b| b.is_ascii_digit()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_isbn() {
        assert!(is_isbn("0441013597"));
        assert!(is_isbn("080442957X"));
        assert!(is_isbn("9780441013593"));
        assert!(!is_isbn("978044101359"));
        assert!(!is_isbn("X441013597"));
        assert!(!is_isbn("97804410135ab"));
        assert!(!is_isbn(""));
    }

    #[test]
    fn it_should_ignore_blank_api_keys() {
        let config = ClientConfig::default().with_api_key(Some("   ".into()));

        assert_eq!(config.api_key, None);

        let config = ClientConfig::default().with_api_key(Some(" secret ".into()));

        assert_eq!(config.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn it_should_not_leak_api_key_in_debug_output() {
        let config = ClientConfig::default().with_api_key(Some("secret".into()));
        let debug = format!("{config:?}");

        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_health_display() {
        let health = Health {
            api_key_configured: false,
            cache_entries: 3,
            cache_capacity: 100,
            cache_ttl: Duration::from_secs(300),
        };

        assert_eq!(
            health.to_string(),
            "API key: not configured (requests are rate limited), cache: 3/100 entries (ttl 300s)"
        );
    }
}
