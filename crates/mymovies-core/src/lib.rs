//! MyMovies Core Library
//!
//! This crate provides the core functionality for MyMovies, a local-first
//! watch list that mirrors itself to a remote document store.
//!
//! # Architecture
//!
//! - **SQLite**: Source of truth for the watch list on this device
//! - **Remote store**: One JSON document per movie, shared across devices
//! - **Search API**: Ephemeral results, persisted only when added
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let local = Arc::new(Mutex::new(LocalStore::open(&config)?));
//! let engine = SyncEngine::new(local, Arc::new(OfflineRemote));
//!
//! let mut search = SearchClient::from_config(&config)?;
//! let hit = search.search("Heat").await?[0].clone();
//! let pushed = engine.push_create(&hit).await?;
//! engine.push_update(&pushed.item, true).await?;
//! ```
//!
//! # Modules
//!
//! - `sync`: Pull, merge and push (main entry point)
//! - `models`: Movie entity and its wire representation
//! - `mapper`: Conversion and equality between the two
//! - `storage`: SQLite local store
//! - `remote`: Remote document store client
//! - `search`: Movie search API client
//! - `config`: Application configuration

pub mod config;
pub mod error;
pub mod mapper;
pub mod models;
pub mod remote;
pub mod search;
pub mod storage;
pub mod sync;

pub use config::Config;
pub use error::{NetworkError, SyncError};
pub use models::{Movie, MovieRepresentation};
pub use remote::{HttpRemoteStore, OfflineRemote, RemoteStore};
pub use search::SearchClient;
pub use storage::{LocalStore, StoreError, StoreResult, StoreTransaction};
pub use sync::{MergeReport, PushReport, Pushed, SyncEngine};
