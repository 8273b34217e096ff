//! Construction of volume search and lookup URLs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use url::Url;

/// The base URL of the volumes endpoint.
pub const BASE_URL: &str = "https://www.googleapis.com/books/v1/volumes";
/// The largest page size the service accepts.
pub const MAX_RESULTS_LIMIT: u32 = 40;
/// The page size used when none is requested.
pub const DEFAULT_MAX_RESULTS: u32 = 20;
/// The language restriction used when none is requested.
pub const DEFAULT_LANGUAGE: &str = "en";

/// The sort order of search results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderBy {
    /// Most relevant results first.
    #[default]
    Relevance,
    /// Most recently published first.
    Newest,
}

/// Restricts results to a kind of publication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrintType {
    /// Books and magazines.
    All,
    /// Books only.
    #[default]
    Books,
    /// Magazines only.
    Magazines,
}

impl OrderBy {
    /// Returns the value sent as the `orderBy` parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OrderBy::Relevance => "relevance",
            OrderBy::Newest => "newest",
        }
    }
}

impl PrintType {
    /// Returns the value sent as the `printType` parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PrintType::All => "all",
            PrintType::Books => "books",
            PrintType::Magazines => "magazines",
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for PrintType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "relevance" => Ok(OrderBy::Relevance),
            "newest" => Ok(OrderBy::Newest),
            other => Err(format!("unknown sort order `{other}`, expected relevance or newest")),
        }
    }
}

impl FromStr for PrintType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "all" => Ok(PrintType::All),
            "books" => Ok(PrintType::Books),
            "magazines" => Ok(PrintType::Magazines),
            other => Err(format!(
                "unknown print type `{other}`, expected all, books or magazines"
            )),
        }
    }
}

/// Options for a volume search.
///
/// Fields left out when deserializing take their default values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    /// Zero-based index of the first result.
    pub start_index: u32,
    /// Requested page size. Clamped into `1..=40` when sent.
    pub max_results: u32,
    /// Sort order.
    pub order_by: OrderBy,
    /// Two-letter language code to restrict results to, or `None` for any language.
    ///
    /// A blank code is treated like `None`.
    #[serde(deserialize_with = "blank_as_none")]
    pub lang_restrict: Option<String>,
    /// Kind of publication.
    pub print_type: PrintType,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            start_index: 0,
            max_results: DEFAULT_MAX_RESULTS,
            order_by: OrderBy::default(),
            lang_restrict: Some(DEFAULT_LANGUAGE.to_string()),
            print_type: PrintType::default(),
        }
    }
}

impl SearchOptions {
    /// Sets the index of the first result.
    #[must_use]
    pub const fn with_start_index(mut self, start_index: u32) -> Self {
        self.start_index = start_index;
        self
    }

    /// Sets the requested page size.
    #[must_use]
    pub const fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results;
        self
    }

    /// Sets the sort order.
    #[must_use]
    pub const fn with_order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    /// Sets the language restriction. `None` searches all languages.
    #[must_use]
    pub fn with_lang_restrict(mut self, lang: Option<&str>) -> Self {
        self.lang_restrict = lang
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .map(str::to_string);
        self
    }

    /// Returns the language restriction that is actually sent, if any.
    #[must_use]
    pub fn effective_lang_restrict(&self) -> Option<&str> {
        self.lang_restrict
            .as_deref()
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
    }

    /// Sets the kind of publication.
    #[must_use]
    pub const fn with_print_type(mut self, print_type: PrintType) -> Self {
        self.print_type = print_type;
        self
    }

    /// Returns the page size that is actually sent, clamped into `1..=40`.
    #[must_use]
    pub const fn effective_max_results(&self) -> u32 {
        if self.max_results < 1 {
            1
        } else if self.max_results > MAX_RESULTS_LIMIT {
            MAX_RESULTS_LIMIT
        } else {
            self.max_results
        }
    }

    /// Returns a stable textual signature of the options, for use in cache keys.
    ///
    /// Two option sets that produce the same request produce the same signature.
    #[must_use]
    pub fn signature(&self) -> String {
        format!(
            "start={}&max={}&order={}&lang={}&print={}",
            self.start_index,
            self.effective_max_results(),
            self.order_by,
            self.effective_lang_restrict().unwrap_or("*"),
            self.print_type
        )
    }
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let lang: Option<String> = Option::deserialize(deserializer)?;

    Ok(lang
        .map(|lang| lang.trim().to_string())
        .filter(|lang| !lang.is_empty()))
}

/// Builds request URLs against a base volumes endpoint.
#[derive(Clone)]
pub struct QueryBuilder {
    base_url: Url,
    api_key: Option<String>,
}

impl QueryBuilder {
    /// Creates a builder for the given base URL, appending `api_key` to every URL if one is set.
    ///
    /// # Errors
    ///
    /// Returns an [`url::ParseError`] if `base_url` is not an absolute URL that can carry path
    /// segments.
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<QueryBuilder, url::ParseError> {
        let base_url = Url::parse(base_url)?;

        if base_url.cannot_be_a_base() {
            return Err(url::ParseError::RelativeUrlWithCannotBeABaseBase);
        }

        Ok(QueryBuilder { base_url, api_key })
    }

    /// Returns whether an API key is appended to requests.
    #[must_use]
    pub const fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Builds the URL for a free-text search.
    ///
    /// The query is used as given; callers are expected to have rejected empty queries.
    #[must_use]
    pub fn search_url(&self, query: &str, options: &SearchOptions) -> Url {
        let mut url = self.base_url.clone();

        {
            let mut pairs = url.query_pairs_mut();

            pairs
                .append_pair("q", query)
                .append_pair("startIndex", &options.start_index.to_string())
                .append_pair("maxResults", &options.effective_max_results().to_string())
                .append_pair("orderBy", options.order_by.as_str());

            if let Some(lang) = options.effective_lang_restrict() {
                pairs.append_pair("langRestrict", lang);
            }

            pairs.append_pair("printType", options.print_type.as_str());

            if let Some(key) = self.api_key.as_deref() {
                pairs.append_pair("key", key);
            }
        }

        url
    }

    /// Builds the URL for fetching a single volume by its id.
    #[must_use]
    pub fn volume_url(&self, id: &str) -> Url {
        let mut url = self.base_url.clone();

        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(id);
        }

        if let Some(key) = self.api_key.as_deref() {
            url.query_pairs_mut().append_pair("key", key);
        }

        url
    }
}

impl fmt::Debug for QueryBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("base_url", &self.base_url.as_str())
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Returns `url` as a string with the value of any `key` parameter replaced, for logging.
#[must_use]
pub fn redact(url: &Url) -> String {
    if !url.query_pairs().any(|(name, _)| name == "key") {
        return url.to_string();
    }

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(name, value)| {
            let value = if name == "key" {
                "REDACTED".to_string()
            } else {
                value.into_owned()
            };

            (name.into_owned(), value)
        })
        .collect();
    let mut redacted = url.clone();

    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}
