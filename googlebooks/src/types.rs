//! Structured types
//!
//! The `Volume*` types mirror the upstream JSON schema and are lenient: every field may be
//! missing. [`Book`] and [`SearchResult`] are the normalized records handed to callers.
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// The response of a volume search.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VolumesResponse {
    /// The total number of matches, which may exceed the number of returned items.
    #[serde(deserialize_with = "null_as_default")]
    pub total_items: u32,
    /// The volumes on the requested page. Absent when nothing matched.
    ///
    /// Entries that can't be decoded are skipped rather than failing the whole page.
    #[serde(deserialize_with = "lenient_volumes")]
    pub items: Vec<Volume>,
}

/// A single volume record as returned by the service.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Volume {
    /// The unique volume id, e.g. `zyTCAlFPjgYC`.
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    /// The canonical API URL of the volume.
    pub self_link: Option<String>,
    /// Bibliographic information.
    pub volume_info: Option<VolumeInfo>,
}

/// Bibliographic information about a volume.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VolumeInfo {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub authors: Option<Vec<String>>,
    pub publisher: Option<String>,
    /// Publication date as given by the publisher, e.g. `1965`, `1965-08` or `1965-08-01`.
    pub published_date: Option<String>,
    pub description: Option<String>,
    pub industry_identifiers: Option<Vec<IndustryIdentifier>>,
    pub page_count: Option<u32>,
    pub categories: Option<Vec<String>>,
    pub average_rating: Option<f64>,
    pub ratings_count: Option<u32>,
    pub maturity_rating: Option<String>,
    pub image_links: Option<VolumeImageLinks>,
    pub language: Option<String>,
    pub preview_link: Option<String>,
    pub info_link: Option<String>,
    pub canonical_volume_link: Option<String>,
}

/// Cover image URLs in the sizes the service may provide.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VolumeImageLinks {
    pub small_thumbnail: Option<String>,
    pub thumbnail: Option<String>,
    pub small: Option<String>,
    pub medium: Option<String>,
    pub large: Option<String>,
    pub extra_large: Option<String>,
}

/// An industry standard identifier, such as an ISBN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndustryIdentifier {
    /// The identifier scheme, e.g. `ISBN_13`, `ISBN_10` or `OTHER`.
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub identifier: String,
}

/// Cover images after fallbacks have been applied.
///
/// A size is only `None` if neither it nor any smaller size was available.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageLinks {
    pub thumbnail: Option<String>,
    pub small: Option<String>,
    pub medium: Option<String>,
    pub large: Option<String>,
}

/// A normalized book record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// The volume id assigned by the service.
    pub id: String,
    /// The title, or `Unknown Title`.
    pub title: String,
    pub subtitle: Option<String>,
    /// The authors in credited order, or a single `Unknown Author`.
    pub authors: Vec<String>,
    pub description: Option<String>,
    pub published_date: Option<String>,
    /// The number of pages, or 0 if unknown.
    pub page_count: u32,
    pub categories: Vec<String>,
    pub publisher: Option<String>,
    pub language: Option<String>,
    pub image_links: ImageLinks,
    pub industry_identifiers: Vec<IndustryIdentifier>,
    pub average_rating: f64,
    pub ratings_count: u32,
    /// Either `NOT_MATURE` or `MATURE`.
    pub maturity_rating: String,
    pub preview_link: Option<String>,
    pub info_link: Option<String>,
    pub canonical_volume_link: Option<String>,
}

impl Book {
    /// Returns the ISBN-13 of the book, if known.
    #[must_use]
    pub fn isbn_13(&self) -> Option<&str> {
        self.identifier("ISBN_13")
    }

    /// Returns the ISBN-10 of the book, if known.
    #[must_use]
    pub fn isbn_10(&self) -> Option<&str> {
        self.identifier("ISBN_10")
    }

    /// Returns the URL of the largest available cover image.
    #[must_use]
    pub fn cover_url(&self) -> Option<&str> {
        self.image_links.large.as_deref()
    }

    fn identifier(&self, kind: &str) -> Option<&str> {
        self.industry_identifiers
            .iter()
            .find(|id| id.kind == kind)
            .map(|id| id.identifier.as_str())
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    /// The books on this page, in the order the service returned them.
    pub items: Vec<Book>,
    /// The total number of matches reported by the service.
    pub total_items: u32,
    /// The trimmed query that produced this result.
    pub query: String,
    /// When the result was fetched, in milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Deserializes `null` as the type's default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserializes a list of volumes one entry at a time, skipping entries that don't decode.
///
/// `null` is treated as an empty list.
fn lenient_volumes<'de, D>(deserializer: D) -> Result<Vec<Volume>, D::Error>
where
    D: Deserializer<'de>,
{
    let values: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;

    Ok(values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|value| {
            serde_json::from_value(value)
                .inspect_err(|err| warn!(%err, "skipping malformed volume"))
                .ok()
        })
        .collect())
}
