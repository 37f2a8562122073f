//! Conversion between [`MovieRepresentation`] and [`Movie`]
//!
//! Also owns the change-detection rules used when merging a remote snapshot:
//! the equality rule (`PartialEq` on representations) and the update rule
//! ([`apply_remote`]).

use uuid::Uuid;

use crate::models::{Movie, MovieRepresentation};

/// Two representations are equal iff identifier, title and watched state
/// match. Image path and display metadata are ignored.
impl PartialEq for MovieRepresentation {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
            && self.title == other.title
            && self.has_watched == other.has_watched
    }
}

impl Eq for MovieRepresentation {}

impl Movie {
    /// Build a new entity from a representation
    ///
    /// All fields are copied; an identifier is generated when the
    /// representation has none. A missing watched state means unwatched.
    pub fn from_representation(rep: &MovieRepresentation) -> Self {
        let mut movie = Movie::with_id(rep.identifier.unwrap_or_else(Uuid::new_v4), &rep.title);
        movie.has_watched = rep.has_watched.unwrap_or(false);
        movie.image_path = rep.image_path.clone();
        movie
    }

    /// Project this entity to its wire form
    pub fn representation(&self) -> MovieRepresentation {
        MovieRepresentation {
            provider_id: None,
            identifier: Some(self.id),
            title: self.title.clone(),
            image_path: self.image_path.clone(),
            has_watched: Some(self.has_watched),
            release_date: None,
            overview: None,
        }
    }
}

impl From<&MovieRepresentation> for Movie {
    fn from(rep: &MovieRepresentation) -> Self {
        Movie::from_representation(rep)
    }
}

impl From<&Movie> for MovieRepresentation {
    fn from(movie: &Movie) -> Self {
        movie.representation()
    }
}

/// Apply the pull-side update rule to a local entity
///
/// Only the watched state is taken from the remote; title and image path stay
/// as persisted locally. The caller guarantees `rep.identifier == Some(movie.id)`.
///
/// Returns `true` if the entity changed.
pub fn apply_remote(movie: &mut Movie, rep: &MovieRepresentation) -> bool {
    match rep.has_watched {
        Some(has_watched) => movie.set_has_watched(has_watched),
        None => false,
    }
}
