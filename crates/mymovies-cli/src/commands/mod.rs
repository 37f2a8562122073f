//! Command handlers

pub mod config;
pub mod movie;
pub mod status;
pub mod sync;

use mymovies_core::{RemoteStore, StoreError, SyncEngine};

/// Engine over whichever remote the configuration selects
pub type Engine = SyncEngine<dyn RemoteStore>;

/// Wrap a local store error, adding its recovery suggestion when there is one
pub fn store_failure(action: &str, err: StoreError) -> anyhow::Error {
    let context = match err.recovery_suggestion() {
        Some(hint) => format!("{}. {}", action, hint),
        None => action.to_string(),
    };
    anyhow::Error::new(err).context(context)
}
