//! Data models for MyMovies
//!
//! Defines the two shapes a movie takes:
//! - [`MovieRepresentation`]: the wire form exchanged with the search API and
//!   the remote document store
//! - [`Movie`]: the persisted entity owned by the local store
//!
//! Conversions between them live in [`crate::mapper`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Wire representation of a movie
///
/// Search results never carry an `identifier`; documents in the remote store
/// always should. Equality is defined in [`crate::mapper`] and only looks at
/// `identifier`, `title` and `has_watched`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRepresentation {
    /// Search-provider id, unrelated to `identifier`
    #[serde(default, rename = "id", skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<u64>,
    /// Local identifier, absent until the movie is first persisted
    #[serde(default)]
    pub identifier: Option<Uuid>,
    pub title: String,
    /// Poster path as returned by the search provider
    #[serde(default, alias = "poster_path", skip_serializing_if = "Option::is_none")]
    pub image_path: Option<String>,
    #[serde(default)]
    pub has_watched: Option<bool>,
    #[serde(default, alias = "release_date", skip_serializing_if = "Option::is_none")]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
}

impl MovieRepresentation {
    /// Create a representation with only a title (like a bare search hit)
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the identifier
    pub fn with_identifier(mut self, identifier: Uuid) -> Self {
        self.identifier = Some(identifier);
        self
    }

    /// Set the watched state
    pub fn with_has_watched(mut self, has_watched: bool) -> Self {
        self.has_watched = Some(has_watched);
        self
    }

    /// Set the image path
    pub fn with_image_path(mut self, image_path: impl Into<String>) -> Self {
        self.image_path = Some(image_path.into());
        self
    }

    /// Release year, when the provider sent a usable date
    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .filter(|year| year.bytes().all(|b| b.is_ascii_digit()))
    }
}

/// A movie in the local collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    /// Unique identifier, also the remote document key
    pub id: Uuid,
    pub title: String,
    pub has_watched: bool,
    pub image_path: Option<String>,
    /// Set when a local change has not yet been mirrored to the remote store
    #[serde(default)]
    pub needs_push: bool,
    /// When this movie was added locally
    pub created_at: DateTime<Utc>,
    /// When this movie was last changed locally
    pub updated_at: DateTime<Utc>,
}

impl Movie {
    /// Create a new, unwatched movie with a fresh identifier
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title)
    }

    /// Create a movie with a specific ID
    pub fn with_id(id: Uuid, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            has_watched: false,
            image_path: None,
            needs_push: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the watched state
    ///
    /// Returns `true` if the value changed.
    pub fn set_has_watched(&mut self, has_watched: bool) -> bool {
        if self.has_watched == has_watched {
            return false;
        }
        self.has_watched = has_watched;
        self.updated_at = Utc::now();
        true
    }

    /// Short form of the id for display
    pub fn short_id(&self) -> String {
        self.id.to_string()[..8].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_movie_new() {
        let movie = Movie::new("Heat");
        assert_eq!(movie.title, "Heat");
        assert!(!movie.has_watched);
        assert!(movie.image_path.is_none());
        assert!(!movie.needs_push);
        assert_eq!(movie.short_id().len(), 8);
    }

    #[test]
    fn test_movie_with_id() {
        let id = Uuid::new_v4();
        let movie = Movie::with_id(id, "Heat");
        assert_eq!(movie.id, id);
    }

    #[test]
    fn test_set_has_watched_reports_change() {
        let mut movie = Movie::new("Heat");
        let original_updated = movie.updated_at;
        std::thread::sleep(std::time::Duration::from_millis(10));

        assert!(movie.set_has_watched(true));
        assert!(movie.has_watched);
        assert!(movie.updated_at > original_updated);

        assert!(!movie.set_has_watched(true));
    }

    #[test]
    fn test_representation_decodes_search_result() {
        let value = json!({
            "id": 949,
            "title": "Heat",
            "poster_path": "/heat.jpg",
            "release_date": "1995-12-15",
            "overview": "Obsessive master thief...",
            "vote_average": 7.9
        });

        let rep: MovieRepresentation = serde_json::from_value(value).unwrap();
        assert_eq!(rep.provider_id, Some(949));
        assert!(rep.identifier.is_none());
        assert!(rep.has_watched.is_none());
        assert_eq!(rep.image_path.as_deref(), Some("/heat.jpg"));
        assert_eq!(rep.release_year(), Some("1995"));
    }

    #[test]
    fn test_representation_decodes_remote_document() {
        let id = Uuid::new_v4();
        let value = json!({
            "identifier": id.to_string().to_uppercase(),
            "title": "Heat",
            "hasWatched": true
        });

        let rep: MovieRepresentation = serde_json::from_value(value).unwrap();
        assert_eq!(rep.identifier, Some(id));
        assert_eq!(rep.has_watched, Some(true));
    }

    #[test]
    fn test_representation_encodes_wire_names() {
        let id = Uuid::new_v4();
        let rep = MovieRepresentation::new("Heat")
            .with_identifier(id)
            .with_has_watched(false)
            .with_image_path("/heat.jpg");

        let value = serde_json::to_value(&rep).unwrap();
        assert_eq!(value["identifier"], json!(id.to_string()));
        assert_eq!(value["hasWatched"], json!(false));
        assert_eq!(value["imagePath"], json!("/heat.jpg"));
        assert!(value.get("id").is_none());
        assert!(value.get("overview").is_none());
    }

    #[test]
    fn test_unassigned_identifier_encodes_as_null() {
        let value = serde_json::to_value(MovieRepresentation::new("Heat")).unwrap();
        assert!(value["identifier"].is_null());
        assert!(value["hasWatched"].is_null());
    }

    #[test]
    fn test_release_year_ignores_blank_dates() {
        let mut rep = MovieRepresentation::new("Unknown");
        rep.release_date = Some(String::new());
        assert!(rep.release_year().is_none());
    }

    #[test]
    fn test_release_year_rejects_malformed_dates() {
        let mut rep = MovieRepresentation::new("Unknown");
        for date in ["199é", "é1995", "19", "abcd-01-01"] {
            rep.release_date = Some(date.to_string());
            assert!(rep.release_year().is_none(), "{date}");
        }

        rep.release_date = Some("2001".to_string());
        assert_eq!(rep.release_year(), Some("2001"));
    }
}
