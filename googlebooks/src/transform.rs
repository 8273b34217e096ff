//! Normalization of upstream volume records.

use std::collections::HashSet;

use crate::types::{Book, ImageLinks, Volume, VolumeImageLinks, VolumeInfo};

/// Title used when a volume has none.
pub const UNKNOWN_TITLE: &str = "Unknown Title";
/// Author used when a volume credits nobody.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
/// Maturity rating used when a volume has none.
pub const DEFAULT_MATURITY_RATING: &str = "NOT_MATURE";

impl From<&Volume> for Book {
    fn from(volume: &Volume) -> Book {
        let default_info = VolumeInfo::default();
        let info = volume.volume_info.as_ref().unwrap_or(&default_info);

        let authors = match &info.authors {
            Some(authors) if !authors.is_empty() => authors.clone(),
            _ => vec![UNKNOWN_AUTHOR.to_string()],
        };

        Book {
            id: volume.id.clone(),
            title: info
                .title
                .clone()
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            subtitle: info.subtitle.clone(),
            authors,
            description: info.description.clone(),
            published_date: info.published_date.clone(),
            page_count: info.page_count.unwrap_or(0),
            categories: info.categories.clone().unwrap_or_default(),
            publisher: info.publisher.clone(),
            language: info.language.clone(),
            image_links: info
                .image_links
                .as_ref()
                .map(ImageLinks::from)
                .unwrap_or_default(),
            industry_identifiers: info.industry_identifiers.clone().unwrap_or_default(),
            average_rating: info.average_rating.unwrap_or(0.0),
            ratings_count: info.ratings_count.unwrap_or(0),
            maturity_rating: info
                .maturity_rating
                .clone()
                .unwrap_or_else(|| DEFAULT_MATURITY_RATING.to_string()),
            preview_link: info.preview_link.clone(),
            info_link: info.info_link.clone(),
            canonical_volume_link: info.canonical_volume_link.clone(),
        }
    }
}

impl From<&VolumeImageLinks> for ImageLinks {
    /// Each size falls back to the next smaller one: `thumbnail` to `smallThumbnail`, `small` to
    /// `thumbnail`, `medium` to `small` and `large` to `medium`.
    fn from(links: &VolumeImageLinks) -> ImageLinks {
        let thumbnail = links
            .thumbnail
            .clone()
            .or_else(|| links.small_thumbnail.clone());
        let small = links.small.clone().or_else(|| thumbnail.clone());
        let medium = links.medium.clone().or_else(|| small.clone());
        let large = links.large.clone().or_else(|| medium.clone());

        ImageLinks {
            thumbnail,
            small,
            medium,
            large,
        }
    }
}

/// Normalizes a page of volumes, preserving their order.
///
/// Volumes without an id, or repeating an id already seen on the page, are dropped.
pub(crate) fn books(volumes: &[Volume]) -> Vec<Book> {
    let mut seen = HashSet::with_capacity(volumes.len());

    volumes
        .iter()
        .filter(|volume| !volume.id.is_empty() && seen.insert(volume.id.as_str()))
        .map(Book::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::VolumesResponse;

    fn volume(json: &str) -> Volume {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn it_should_apply_defaults_to_sparse_records() {
        let book = Book::from(&volume(r#"{"id": "abc", "volumeInfo": {"title": "Dune"}}"#));

        assert_eq!(book.id, "abc");
        assert_eq!(book.title, "Dune");
        assert_eq!(book.authors, vec!["Unknown Author"]);
        assert_eq!(book.page_count, 0);
        assert_eq!(book.image_links, ImageLinks::default());
        assert!(book.categories.is_empty());
        assert_eq!(book.average_rating, 0.0);
        assert_eq!(book.ratings_count, 0);
        assert_eq!(book.maturity_rating, "NOT_MATURE");
        assert_eq!(book.description, None);
    }

    #[test]
    fn it_should_survive_missing_volume_info() {
        let book = Book::from(&volume(r#"{"id": "abc"}"#));

        assert_eq!(book.title, "Unknown Title");
        assert_eq!(book.authors, vec!["Unknown Author"]);
        assert!(book.industry_identifiers.is_empty());
    }

    #[test]
    fn it_should_treat_empty_author_lists_as_unknown() {
        let book = Book::from(&volume(r#"{"id": "abc", "volumeInfo": {"authors": []}}"#));

        assert_eq!(book.authors, vec!["Unknown Author"]);
    }

    #[test]
    fn it_should_preserve_present_fields() {
        let book = Book::from(&volume(
            r#"{
                "id": "B1hSG45JCX4C",
                "volumeInfo": {
                    "title": "Dune",
                    "subtitle": "Deluxe Edition",
                    "authors": ["Frank Herbert", "Brian Herbert"],
                    "publisher": "Penguin",
                    "publishedDate": "2005-08-02",
                    "description": "Set on the desert planet Arrakis.",
                    "industryIdentifiers": [
                        {"type": "ISBN_10", "identifier": "0441013597"},
                        {"type": "ISBN_13", "identifier": "9780441013593"}
                    ],
                    "pageCount": 528,
                    "categories": ["Fiction"],
                    "averageRating": 4.5,
                    "ratingsCount": 112,
                    "maturityRating": "MATURE",
                    "imageLinks": {
                        "smallThumbnail": "https://books.example/st.jpg",
                        "thumbnail": "https://books.example/t.jpg",
                        "small": "https://books.example/s.jpg",
                        "medium": "https://books.example/m.jpg",
                        "large": "https://books.example/l.jpg"
                    },
                    "language": "en",
                    "previewLink": "https://books.example/preview",
                    "infoLink": "https://books.example/info",
                    "canonicalVolumeLink": "https://books.example/canonical"
                }
            }"#,
        ));

        assert_eq!(book.id, "B1hSG45JCX4C");
        assert_eq!(book.title, "Dune");
        assert_eq!(book.subtitle.as_deref(), Some("Deluxe Edition"));
        assert_eq!(book.authors, vec!["Frank Herbert", "Brian Herbert"]);
        assert_eq!(book.publisher.as_deref(), Some("Penguin"));
        assert_eq!(book.published_date.as_deref(), Some("2005-08-02"));
        assert_eq!(
            book.description.as_deref(),
            Some("Set on the desert planet Arrakis.")
        );
        assert_eq!(book.page_count, 528);
        assert_eq!(book.categories, vec!["Fiction"]);
        assert_eq!(book.average_rating, 4.5);
        assert_eq!(book.ratings_count, 112);
        assert_eq!(book.maturity_rating, "MATURE");
        assert_eq!(book.language.as_deref(), Some("en"));
        assert_eq!(book.isbn_10(), Some("0441013597"));
        assert_eq!(book.isbn_13(), Some("9780441013593"));
        assert_eq!(
            book.image_links,
            ImageLinks {
                thumbnail: Some("https://books.example/t.jpg".into()),
                small: Some("https://books.example/s.jpg".into()),
                medium: Some("https://books.example/m.jpg".into()),
                large: Some("https://books.example/l.jpg".into()),
            }
        );
        assert_eq!(book.cover_url(), Some("https://books.example/l.jpg"));
        assert_eq!(
            book.preview_link.as_deref(),
            Some("https://books.example/preview")
        );
        assert_eq!(book.info_link.as_deref(), Some("https://books.example/info"));
        assert_eq!(
            book.canonical_volume_link.as_deref(),
            Some("https://books.example/canonical")
        );
    }

    #[test]
    fn it_should_chain_image_fallbacks() {
        let links = ImageLinks::from(&VolumeImageLinks {
            small_thumbnail: Some("st".into()),
            ..Default::default()
        });

        assert_eq!(links.thumbnail.as_deref(), Some("st"));
        assert_eq!(links.small.as_deref(), Some("st"));
        assert_eq!(links.medium.as_deref(), Some("st"));
        assert_eq!(links.large.as_deref(), Some("st"));

        let links = ImageLinks::from(&VolumeImageLinks {
            thumbnail: Some("t".into()),
            medium: Some("m".into()),
            ..Default::default()
        });

        assert_eq!(links.thumbnail.as_deref(), Some("t"));
        assert_eq!(links.small.as_deref(), Some("t"));
        assert_eq!(links.medium.as_deref(), Some("m"));
        assert_eq!(links.large.as_deref(), Some("m"));
    }

    #[test]
    fn it_should_not_fall_back_to_larger_images() {
        let links = ImageLinks::from(&VolumeImageLinks {
            large: Some("l".into()),
            ..Default::default()
        });

        assert_eq!(links.thumbnail, None);
        assert_eq!(links.small, None);
        assert_eq!(links.medium, None);
        assert_eq!(links.large.as_deref(), Some("l"));
    }

    #[test]
    fn it_should_preserve_order_and_drop_repeated_ids() {
        let response: VolumesResponse = serde_json::from_str(
            r#"{
                "totalItems": 4,
                "items": [
                    {"id": "c", "volumeInfo": {"title": "Children of Dune"}},
                    {"id": "a", "volumeInfo": {"title": "Dune"}},
                    {"id": "c", "volumeInfo": {"title": "Duplicate"}},
                    {"id": "b", "volumeInfo": {"title": "Dune Messiah"}}
                ]
            }"#,
        )
        .unwrap();
        let books = books(&response.items);
        let titles: Vec<&str> = books.iter().map(|b| b.title.as_str()).collect();

        assert_eq!(titles, ["Children of Dune", "Dune", "Dune Messiah"]);
    }

    #[test]
    fn it_should_keep_good_volumes_next_to_partial_ones() {
        let response: VolumesResponse = serde_json::from_str(
            r#"{
                "totalItems": 4,
                "items": [
                    {"id": "a", "volumeInfo": {"title": "Dune"}},
                    {"id": "b", "volumeInfo": {"industryIdentifiers": [{"type": "OTHER"}]}},
                    {"id": "c", "volumeInfo": {"title": 42}},
                    {"id": null, "volumeInfo": {"title": "Anonymous"}}
                ]
            }"#,
        )
        .unwrap();
        let books = books(&response.items);
        let ids: Vec<&str> = books.iter().map(|b| b.id.as_str()).collect();

        assert_eq!(ids, ["a", "b"]);
        assert_eq!(books[1].title, "Unknown Title");
        assert_eq!(books[1].industry_identifiers[0].kind, "OTHER");
        assert_eq!(books[1].industry_identifiers[0].identifier, "");
    }

    #[test]
    fn it_should_treat_null_items_as_empty() {
        let response: VolumesResponse =
            serde_json::from_str(r#"{"totalItems": null, "items": null}"#).unwrap();

        assert_eq!(response.total_items, 0);
        assert!(response.items.is_empty());
    }

    #[test]
    fn it_should_accept_responses_without_items() {
        let response: VolumesResponse =
            serde_json::from_str(r#"{"kind": "books#volumes", "totalItems": 0}"#).unwrap();

        assert!(response.items.is_empty());
        assert!(books(&response.items).is_empty());
    }
}
