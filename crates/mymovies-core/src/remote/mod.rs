//! Remote document store
//!
//! The remote store keeps one JSON document per movie, keyed by the movie's
//! identifier. It is pure networking: no retries and no business logic.
//!
//! ## Protocol
//!
//! - `PUT {base}/{identifier}.json` replaces a document
//! - `DELETE {base}/{identifier}.json` removes a document
//! - `GET {base}.json` returns every document as a JSON object (or `null`)

mod http;

use std::collections::HashMap;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::NetworkError;
use crate::models::{Movie, MovieRepresentation};

pub use http::HttpRemoteStore;
pub(crate) use http::{ensure_success, parse_url};

/// CRUD operations against the remote document store
///
/// Each call is one network round trip. Implementations must not retry.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Replace the movie's document with its current representation
    async fn put(&self, movie: &Movie) -> Result<(), NetworkError>;

    /// Remove the document for this identifier
    async fn delete(&self, id: Uuid) -> Result<(), NetworkError>;

    /// Fetch every document
    ///
    /// Keys are the store's own document keys and are not interpreted; each
    /// representation's `identifier` is authoritative.
    async fn fetch_all(&self) -> Result<HashMap<String, MovieRepresentation>, NetworkError>;
}

/// Stand-in used when no remote store is configured
///
/// Every call fails with [`NetworkError::Offline`], so local changes keep
/// their pending-push flag until a real remote is set up.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRemote;

#[async_trait]
impl RemoteStore for OfflineRemote {
    async fn put(&self, _movie: &Movie) -> Result<(), NetworkError> {
        Err(NetworkError::Offline)
    }

    async fn delete(&self, _id: Uuid) -> Result<(), NetworkError> {
        Err(NetworkError::Offline)
    }

    async fn fetch_all(&self) -> Result<HashMap<String, MovieRepresentation>, NetworkError> {
        Err(NetworkError::Offline)
    }
}
