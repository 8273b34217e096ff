//! A caching client for the Google Books volumes API.
//!
//! The [`Client`] composes a query builder, a response transformer, a bounded time-to-live cache
//! and an error classifier behind two operations: [`Client::search`] and [`Client::get_by_id`].
//!
//! ```no_run
//! # async fn run() -> Result<(), googlebooks::Error> {
//! use googlebooks::{Client, ClientConfig, SearchOptions};
//!
//! let client = Client::new(ClientConfig::from_env())?;
//! let result = client.search("dune", &SearchOptions::default()).await?;
//!
//! for book in &result.items {
//!     println!("{} by {}", book.title, book.authors.join(", "));
//! }
//! # Ok(())
//! # }
//! ```

// Allow repetition of structure name instead of replacing with self as the output from
// rust-analyzer becomes more readable
#![allow(clippy::use_self)]

pub mod cache;
pub mod client;
mod error;
pub mod query;
mod transform;
pub mod transport;
pub mod types;

pub use cache::{Cache, CacheConfig};
pub use client::{Client, ClientConfig, Health};
pub use error::{Error, FetchError, classify};
pub use query::{OrderBy, PrintType, QueryBuilder, SearchOptions};
pub use transport::{HttpTransport, Transport};
pub use types::{Book, ImageLinks, IndustryIdentifier, SearchResult};
