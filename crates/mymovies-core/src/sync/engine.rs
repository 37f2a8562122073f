//! Reconciliation between the local store and the remote document store

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{NetworkError, SyncError};
use crate::mapper::apply_remote;
use crate::models::{Movie, MovieRepresentation};
use crate::remote::RemoteStore;
use crate::storage::{LocalStore, StoreError, StoreResult, StoreTransaction};

/// Outcome of merging one remote snapshot
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    /// Remote movies that were unknown locally
    pub inserted: usize,
    /// Local movies whose watched state was taken from the remote
    pub updated: usize,
    /// Movies that needed no write
    pub unchanged: usize,
    /// Remote documents without an identifier
    pub skipped: usize,
}

impl MergeReport {
    /// Number of local rows written
    pub fn writes(&self) -> usize {
        self.inserted + self.updated
    }
}

/// A committed local change and the result of mirroring it
///
/// `remote_error` is the completion signal for the remote half: `None` when
/// the remote store accepted the change.
#[derive(Debug)]
pub struct Pushed<T> {
    pub item: T,
    pub remote_error: Option<NetworkError>,
}

impl<T> Pushed<T> {
    /// True when the remote store accepted the change
    pub fn is_mirrored(&self) -> bool {
        self.remote_error.is_none()
    }
}

/// Outcome of [`SyncEngine::push_pending`]
#[derive(Debug, Default)]
pub struct PushReport {
    pub pushed: usize,
    pub failed: Vec<(Uuid, NetworkError)>,
}

/// Sync engine
///
/// Holds the local store and the remote store it mirrors to. Cloning is
/// cheap and shares both, so pushes can be spawned as independent tasks.
///
/// Every operation takes the local store lock for exactly one transaction and
/// releases it before any network call. Two operations on the same movie are
/// not serialized against each other and may race.
pub struct SyncEngine<R: RemoteStore + ?Sized> {
    local: Arc<Mutex<LocalStore>>,
    remote: Arc<R>,
}

impl<R: RemoteStore + ?Sized> Clone for SyncEngine<R> {
    fn clone(&self) -> Self {
        Self {
            local: Arc::clone(&self.local),
            remote: Arc::clone(&self.remote),
        }
    }
}

impl<R: RemoteStore + ?Sized> SyncEngine<R> {
    pub fn new(local: Arc<Mutex<LocalStore>>, remote: Arc<R>) -> Self {
        Self { local, remote }
    }

    /// The local store
    pub fn local(&self) -> &Arc<Mutex<LocalStore>> {
        &self.local
    }

    /// The remote store
    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    // ==================== Pull ====================

    /// Fetch the full remote snapshot and merge it into the local store
    pub async fn pull_and_merge(&self) -> Result<MergeReport, SyncError> {
        let snapshot = match self.remote.fetch_all().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log_remote_failure("fetch", None, &e);
                return Err(e.into());
            }
        };

        Ok(self.merge_snapshot(&snapshot).await?)
    }

    /// Merge a remote snapshot into the local store
    ///
    /// Unknown identifiers are inserted, known ones take the remote watched
    /// state, and movies missing from the snapshot are left alone. All
    /// changes are committed together; on failure none are applied.
    pub async fn merge_snapshot(
        &self,
        snapshot: &HashMap<String, MovieRepresentation>,
    ) -> Result<MergeReport, StoreError> {
        let result = {
            let mut store = self.local.lock().await;
            merge_into_store(&mut store, snapshot)
        };

        match result {
            Ok(report) => {
                info!(
                    inserted = report.inserted,
                    updated = report.updated,
                    unchanged = report.unchanged,
                    skipped = report.skipped,
                    "merged remote snapshot"
                );
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, "failed to merge remote snapshot, no changes applied");
                Err(e)
            }
        }
    }

    // ==================== Push ====================

    /// Add a movie locally, then mirror it to the remote store
    ///
    /// The local insert is committed first. A remote failure is logged and
    /// returned in the outcome; the local movie stays either way.
    pub async fn push_create(&self, rep: &MovieRepresentation) -> StoreResult<Pushed<Movie>> {
        let result = {
            let mut store = self.local.lock().await;
            commit_create(&mut store, rep)
        };
        let mut movie = result.inspect_err(|e| warn!(error = %e, "failed to add movie"))?;
        info!(id = %movie.id, title = %movie.title, "added movie");

        let remote_error = self.mirror(&mut movie).await;
        Ok(Pushed {
            item: movie,
            remote_error,
        })
    }

    /// Set the watched state locally, then mirror the full movie
    ///
    /// The remote document is overwritten, not patched.
    pub async fn push_update(&self, movie: &Movie, has_watched: bool) -> StoreResult<Pushed<Movie>> {
        let result = {
            let mut store = self.local.lock().await;
            commit_watched(&mut store, movie.id, has_watched)
        };
        let mut movie = result
            .inspect_err(|e| warn!(id = %movie.id, error = %e, "failed to update movie"))?;
        info!(id = %movie.id, has_watched, "updated movie");

        let remote_error = self.mirror(&mut movie).await;
        Ok(Pushed {
            item: movie,
            remote_error,
        })
    }

    /// Delete a movie remotely, then locally
    ///
    /// The remote delete is attempted first and a failure there does not stop
    /// the local delete. If the process stops between the two, the local
    /// movie survives and a later pull cannot remove it.
    pub async fn push_delete(&self, movie: &Movie) -> StoreResult<Pushed<()>> {
        let remote_error = match self.remote.delete(movie.id).await {
            Ok(()) => {
                debug!(id = %movie.id, "remote document deleted");
                None
            }
            Err(e) => {
                log_remote_failure("delete", Some(movie.id), &e);
                Some(e)
            }
        };

        let result = {
            let mut store = self.local.lock().await;
            commit_delete(&mut store, movie)
        };
        result.inspect_err(|e| warn!(id = %movie.id, error = %e, "failed to delete movie"))?;
        info!(id = %movie.id, "deleted movie");

        Ok(Pushed {
            item: (),
            remote_error,
        })
    }

    /// Mirror every movie whose last change did not reach the remote store
    ///
    /// Only runs when called; nothing retries failed pushes automatically.
    pub async fn push_pending(&self) -> StoreResult<PushReport> {
        let pending = self.local.lock().await.pending()?;
        if pending.is_empty() {
            return Ok(PushReport::default());
        }
        debug!(count = pending.len(), "pushing pending movies");

        let results = join_all(pending.iter().map(|movie| async move {
            (movie.id, self.remote.put(movie).await)
        }))
        .await;

        let mut report = PushReport::default();
        let mut pushed = Vec::new();
        for (id, result) in results {
            match result {
                Ok(()) => pushed.push(id),
                Err(e) => {
                    log_remote_failure("put", Some(id), &e);
                    report.failed.push((id, e));
                }
            }
        }

        let result = {
            let mut store = self.local.lock().await;
            commit_pushed(&mut store, &pushed)
        };
        result.inspect_err(|e| warn!(error = %e, "failed to clear pending flags"))?;

        report.pushed = pushed.len();
        info!(
            pushed = report.pushed,
            failed = report.failed.len(),
            "pushed pending movies"
        );
        Ok(report)
    }

    /// Put the movie's current representation and clear its pending flag
    async fn mirror(&self, movie: &mut Movie) -> Option<NetworkError> {
        if let Err(e) = self.remote.put(movie).await {
            log_remote_failure("put", Some(movie.id), &e);
            return Some(e);
        }
        debug!(id = %movie.id, "remote document written");

        let result = {
            let mut store = self.local.lock().await;
            commit_pushed(&mut store, &[movie.id])
        };
        match result {
            Ok(()) => movie.needs_push = false,
            // The flag stays set; the next push_pending sends it again
            Err(e) => warn!(id = %movie.id, error = %e, "failed to clear pending flag"),
        }
        None
    }
}

fn merge_into_store(
    store: &mut LocalStore,
    snapshot: &HashMap<String, MovieRepresentation>,
) -> StoreResult<MergeReport> {
    let mut tx = store.transaction()?;
    let report = merge_into(&mut tx, snapshot)?;
    tx.save()?;
    Ok(report)
}

fn merge_into(
    tx: &mut StoreTransaction<'_>,
    snapshot: &HashMap<String, MovieRepresentation>,
) -> StoreResult<MergeReport> {
    let mut report = MergeReport::default();

    for (key, rep) in snapshot {
        let Some(id) = rep.identifier else {
            debug!(key = %key, "skipping remote document without identifier");
            report.skipped += 1;
            continue;
        };

        match tx.find(id)? {
            None => {
                tx.upsert(rep)?;
                report.inserted += 1;
            }
            Some(movie) if movie.representation() == *rep => report.unchanged += 1,
            Some(mut movie) => {
                // Title divergence alone leaves nothing to write
                if apply_remote(&mut movie, rep) {
                    tx.update(&movie)?;
                    report.updated += 1;
                } else {
                    report.unchanged += 1;
                }
            }
        }
    }

    Ok(report)
}

fn commit_create(store: &mut LocalStore, rep: &MovieRepresentation) -> StoreResult<Movie> {
    let mut tx = store.transaction()?;
    let mut movie = tx.upsert(rep)?;
    movie.needs_push = true;
    tx.update(&movie)?;
    tx.save()?;
    Ok(movie)
}

fn commit_watched(store: &mut LocalStore, id: Uuid, has_watched: bool) -> StoreResult<Movie> {
    let mut tx = store.transaction()?;
    let mut movie = tx.find(id)?.ok_or(StoreError::NotFound(id))?;
    movie.set_has_watched(has_watched);
    movie.needs_push = true;
    tx.update(&movie)?;
    tx.save()?;
    Ok(movie)
}

fn commit_delete(store: &mut LocalStore, movie: &Movie) -> StoreResult<()> {
    let mut tx = store.transaction()?;
    tx.delete(movie)?;
    tx.save()
}

fn commit_pushed(store: &mut LocalStore, ids: &[Uuid]) -> StoreResult<()> {
    let mut tx = store.transaction()?;
    for id in ids {
        tx.mark_pushed(*id)?;
    }
    tx.save()
}

fn log_remote_failure(operation: &str, id: Option<Uuid>, error: &NetworkError) {
    let id = id.map(|id| id.to_string()).unwrap_or_default();
    if error.is_offline() {
        debug!(operation, id = %id, "remote store not configured, skipping");
    } else {
        warn!(operation, id = %id, error = %error, "remote operation failed");
    }
}
