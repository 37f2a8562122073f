//! Sync between the local store and the remote document store
//!
//! The local store is authoritative for what the user does on this device;
//! the remote store is a mirror that other devices also write to.
//!
//! ## Pull
//!
//! 1. Fetch every remote document
//! 2. Insert movies whose identifier is unknown locally
//! 3. Copy the remote watched state onto known movies
//! 4. Commit once; leave local-only movies alone
//!
//! ## Push
//!
//! - Create and update commit locally first, then `PUT` the full document
//! - Delete removes the remote document first, then the local movie
//! - Movies whose push failed stay flagged until [`SyncEngine::push_pending`]
//!
//! ## Usage
//!
//! ```ignore
//! let engine = SyncEngine::new(local, Arc::new(HttpRemoteStore::new(url, timeout)?));
//! engine.pull_and_merge().await?;
//! let pushed = engine.push_create(&search_result).await?;
//! ```

mod engine;

pub use engine::{MergeReport, PushReport, Pushed, SyncEngine};
