//! SQLite-backed local movie store
//!
//! The local store owns the canonical on-device state. Every logical
//! operation runs inside one [`StoreTransaction`], acquired from
//! [`LocalStore::transaction`] and released when it is saved or dropped.
//! Dropping a transaction without saving discards its changes, and a failed
//! [`StoreTransaction::save`] discards them as well, so the database only
//! ever holds what was durably committed.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::models::{Movie, MovieRepresentation};
use crate::storage::error::{StoreError, StoreResult};
use crate::storage::schema::{init_schema, needs_init};

const MOVIE_COLUMNS: &str =
    "id, title, has_watched, image_path, needs_push, created_at, updated_at";

/// Local movie store
pub struct LocalStore {
    conn: Connection,
}

impl LocalStore {
    /// Open or create the store in the configured data directory
    pub fn open(config: &Config) -> StoreResult<Self> {
        Self::open_path(&config.sqlite_path())
    }

    /// Open or create the store at a specific database path
    pub fn open_path(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        if needs_init(&conn) {
            debug!(path = %path.display(), "initializing movie store schema");
            init_schema(&conn)?;
        }

        Ok(Self { conn })
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Get the underlying connection
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Begin a scoped transaction
    pub fn transaction(&mut self) -> StoreResult<StoreTransaction<'_>> {
        Ok(StoreTransaction {
            tx: self.conn.transaction()?,
            writes: 0,
        })
    }

    /// Get a movie by identifier
    pub fn get(&self, id: Uuid) -> StoreResult<Option<Movie>> {
        find_movie(&self.conn, id)
    }

    /// Get all movies, newest first
    pub fn all(&self) -> StoreResult<Vec<Movie>> {
        query_movies(
            &self.conn,
            &format!("SELECT {MOVIE_COLUMNS} FROM movies ORDER BY created_at DESC"),
        )
    }

    /// Get movies whose last local change has not reached the remote store
    pub fn pending(&self) -> StoreResult<Vec<Movie>> {
        query_movies(
            &self.conn,
            &format!(
                "SELECT {MOVIE_COLUMNS} FROM movies WHERE needs_push = 1 ORDER BY created_at"
            ),
        )
    }

    /// Count all movies
    pub fn count(&self) -> StoreResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM movies", [], |row| row.get(0))?)
    }

    /// Count watched movies
    pub fn watched_count(&self) -> StoreResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM movies WHERE has_watched = 1",
            [],
            |row| row.get(0),
        )?)
    }
}

/// A scoped unit of work against the local store
///
/// Changes become durable only through [`save`](Self::save).
pub struct StoreTransaction<'a> {
    tx: Transaction<'a>,
    writes: usize,
}

impl StoreTransaction<'_> {
    /// Look up a movie by identifier
    pub fn find(&self, id: Uuid) -> StoreResult<Option<Movie>> {
        find_movie(&self.tx, id)
    }

    /// Insert a movie for this representation unless its identifier exists
    ///
    /// An existing movie is returned unchanged; callers update fields
    /// explicitly.
    pub fn upsert(&mut self, rep: &MovieRepresentation) -> StoreResult<Movie> {
        if let Some(id) = rep.identifier {
            if let Some(existing) = self.find(id)? {
                return Ok(existing);
            }
        }

        let movie = Movie::from_representation(rep);
        self.insert(&movie)?;
        Ok(movie)
    }

    /// Insert a new movie
    pub fn insert(&mut self, movie: &Movie) -> StoreResult<()> {
        self.tx.execute(
            &format!("INSERT INTO movies ({MOVIE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"),
            params![
                movie.id.to_string(),
                movie.title,
                movie.has_watched,
                movie.image_path,
                movie.needs_push,
                movie.created_at.timestamp_millis(),
                movie.updated_at.timestamp_millis(),
            ],
        )?;
        self.writes += 1;
        Ok(())
    }

    /// Write all mutable fields of an existing movie
    pub fn update(&mut self, movie: &Movie) -> StoreResult<()> {
        let changed = self.tx.execute(
            "UPDATE movies SET title = ?2, has_watched = ?3, image_path = ?4, needs_push = ?5, updated_at = ?6 WHERE id = ?1",
            params![
                movie.id.to_string(),
                movie.title,
                movie.has_watched,
                movie.image_path,
                movie.needs_push,
                movie.updated_at.timestamp_millis(),
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(movie.id));
        }
        self.writes += 1;
        Ok(())
    }

    /// Delete a movie
    ///
    /// Deleting a movie that is already gone is not an error.
    pub fn delete(&mut self, movie: &Movie) -> StoreResult<()> {
        let changed = self
            .tx
            .execute("DELETE FROM movies WHERE id = ?1", params![movie.id.to_string()])?;
        if changed > 0 {
            self.writes += 1;
        }
        Ok(())
    }

    /// Clear the pending-push flag after a successful remote mirror
    pub fn mark_pushed(&mut self, id: Uuid) -> StoreResult<()> {
        let changed = self.tx.execute(
            "UPDATE movies SET needs_push = 0 WHERE id = ?1 AND needs_push = 1",
            params![id.to_string()],
        )?;
        self.writes += changed;
        Ok(())
    }

    /// Number of rows written so far in this transaction
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Commit all changes
    ///
    /// On failure the transaction is rolled back, leaving the store as it was
    /// before the transaction began.
    pub fn save(self) -> StoreResult<()> {
        let writes = self.writes;
        self.tx.commit().map_err(|e| {
            warn!(error = %e, writes, "commit failed, discarding local changes");
            StoreError::Commit(e)
        })?;
        debug!(writes, "local changes saved");
        Ok(())
    }
}

struct MovieRow {
    id: String,
    title: String,
    has_watched: bool,
    image_path: Option<String>,
    needs_push: bool,
    created_at: i64,
    updated_at: i64,
}

impl MovieRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            has_watched: row.get(2)?,
            image_path: row.get(3)?,
            needs_push: row.get(4)?,
            created_at: row.get(5)?,
            updated_at: row.get(6)?,
        })
    }

    fn hydrate(self) -> StoreResult<Movie> {
        let id = Uuid::parse_str(&self.id).map_err(|e| StoreError::InvalidRow {
            id: self.id.clone(),
            details: e.to_string(),
        })?;

        Ok(Movie {
            id,
            title: self.title,
            has_watched: self.has_watched,
            image_path: self.image_path,
            needs_push: self.needs_push,
            created_at: DateTime::from_timestamp_millis(self.created_at).unwrap_or_else(Utc::now),
            updated_at: DateTime::from_timestamp_millis(self.updated_at).unwrap_or_else(Utc::now),
        })
    }
}

fn find_movie(conn: &Connection, id: Uuid) -> StoreResult<Option<Movie>> {
    let row = conn
        .query_row(
            &format!("SELECT {MOVIE_COLUMNS} FROM movies WHERE id = ?1"),
            params![id.to_string()],
            MovieRow::from_row,
        )
        .optional()?;

    row.map(MovieRow::hydrate).transpose()
}

fn query_movies(conn: &Connection, sql: &str) -> StoreResult<Vec<Movie>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], MovieRow::from_row)?;

    let mut movies = Vec::new();
    for row in rows {
        movies.push(row?.hydrate()?);
    }
    Ok(movies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> LocalStore {
        LocalStore::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_find() {
        let mut store = store();
        let mut movie = Movie::new("Heat");
        movie.image_path = Some("/heat.jpg".to_string());

        let mut tx = store.transaction().unwrap();
        tx.insert(&movie).unwrap();
        assert_eq!(tx.find(movie.id).unwrap().unwrap().title, "Heat");
        tx.save().unwrap();

        let found = store.get(movie.id).unwrap().unwrap();
        assert_eq!(found.title, "Heat");
        assert!(!found.has_watched);
        assert_eq!(found.image_path.as_deref(), Some("/heat.jpg"));
        assert_eq!(
            found.created_at.timestamp_millis(),
            movie.created_at.timestamp_millis()
        );
    }

    #[test]
    fn test_find_missing_returns_none() {
        let mut store = store();
        let tx = store.transaction().unwrap();
        assert!(tx.find(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_upsert_inserts_new_representation() {
        let mut store = store();
        let rep = MovieRepresentation::new("Heat").with_image_path("/heat.jpg");

        let mut tx = store.transaction().unwrap();
        let movie = tx.upsert(&rep).unwrap();
        assert_eq!(tx.writes(), 1);
        tx.save().unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get(movie.id).unwrap().unwrap().title, "Heat");
    }

    #[test]
    fn test_upsert_existing_is_noop() {
        let mut store = store();
        let movie = Movie::new("Heat");
        {
            let mut tx = store.transaction().unwrap();
            tx.insert(&movie).unwrap();
            tx.save().unwrap();
        }

        let rep = MovieRepresentation::new("Different Title")
            .with_identifier(movie.id)
            .with_has_watched(true);

        let mut tx = store.transaction().unwrap();
        let existing = tx.upsert(&rep).unwrap();
        assert_eq!(tx.writes(), 0);
        assert_eq!(existing.title, "Heat");
        assert!(!existing.has_watched);
    }

    #[test]
    fn test_update_writes_fields() {
        let mut store = store();
        let mut movie = Movie::new("Heat");
        {
            let mut tx = store.transaction().unwrap();
            tx.insert(&movie).unwrap();
            tx.save().unwrap();
        }

        movie.set_has_watched(true);
        movie.needs_push = true;
        let mut tx = store.transaction().unwrap();
        tx.update(&movie).unwrap();
        tx.save().unwrap();

        let found = store.get(movie.id).unwrap().unwrap();
        assert!(found.has_watched);
        assert!(found.needs_push);
        assert_eq!(store.watched_count().unwrap(), 1);
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let mut store = store();
        let movie = Movie::new("Ghost");

        let mut tx = store.transaction().unwrap();
        let err = tx.update(&movie).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == movie.id));
    }

    #[test]
    fn test_delete() {
        let mut store = store();
        let movie = Movie::new("Heat");
        {
            let mut tx = store.transaction().unwrap();
            tx.insert(&movie).unwrap();
            tx.save().unwrap();
        }

        let mut tx = store.transaction().unwrap();
        tx.delete(&movie).unwrap();
        // Deleting again is harmless
        tx.delete(&movie).unwrap();
        assert_eq!(tx.writes(), 1);
        tx.save().unwrap();

        assert!(store.get(movie.id).unwrap().is_none());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_dropped_transaction_discards_changes() {
        let mut store = store();
        {
            let mut tx = store.transaction().unwrap();
            tx.insert(&Movie::new("Heat")).unwrap();
            tx.insert(&Movie::new("Ronin")).unwrap();
            // dropped without save
        }

        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_duplicate_insert_fails_and_discards_transaction() {
        let mut store = store();
        let movie = Movie::new("Heat");
        {
            let mut tx = store.transaction().unwrap();
            tx.insert(&movie).unwrap();
            tx.save().unwrap();
        }

        {
            let mut tx = store.transaction().unwrap();
            tx.insert(&Movie::new("Ronin")).unwrap();
            assert!(matches!(
                tx.insert(&movie).unwrap_err(),
                StoreError::Database(_)
            ));
        }

        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_pending_and_mark_pushed() {
        let mut store = store();
        let mut dirty = Movie::new("Heat");
        dirty.needs_push = true;
        let clean = Movie::new("Ronin");
        {
            let mut tx = store.transaction().unwrap();
            tx.insert(&dirty).unwrap();
            tx.insert(&clean).unwrap();
            tx.save().unwrap();
        }

        let pending = store.pending().unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, dirty.id);

        let mut tx = store.transaction().unwrap();
        tx.mark_pushed(dirty.id).unwrap();
        tx.mark_pushed(clean.id).unwrap();
        assert_eq!(tx.writes(), 1);
        tx.save().unwrap();

        assert!(store.pending().unwrap().is_empty());
    }

    #[test]
    fn test_all_returns_every_movie() {
        let mut store = store();
        let mut tx = store.transaction().unwrap();
        for title in ["Heat", "Ronin", "Collateral"] {
            tx.insert(&Movie::new(title)).unwrap();
        }
        tx.save().unwrap();

        let movies = store.all().unwrap();
        assert_eq!(movies.len(), 3);
        assert!(movies.iter().any(|m| m.title == "Collateral"));
    }

    #[test]
    fn test_data_persists_across_reopens() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("movies.db");
        let movie = Movie::new("Heat");

        {
            let mut store = LocalStore::open_path(&path).unwrap();
            let mut tx = store.transaction().unwrap();
            tx.insert(&movie).unwrap();
            tx.save().unwrap();
        }

        let store = LocalStore::open_path(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get(movie.id).unwrap().unwrap().title, "Heat");
    }

    #[test]
    fn test_open_with_config() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };

        LocalStore::open(&config).unwrap();
        assert!(config.sqlite_path().exists());
    }
}
