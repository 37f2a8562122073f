//! Storage layer
//!
//! The local store is a single SQLite database holding the movie collection.
//! It is the source of truth for the running session; the remote document
//! store is a mirror.

pub mod error;
pub mod local;
pub mod schema;

pub use error::{StoreError, StoreResult};
pub use local::{LocalStore, StoreTransaction};
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
