//! Movie command handlers

use anyhow::{anyhow, bail, Context, Result};
use uuid::Uuid;

use mymovies_core::{Config, LocalStore, MovieRepresentation, NetworkError, SearchClient};

use super::{store_failure, Engine};
use crate::output::Output;
use crate::prompt::confirm;

/// Search for movies without saving anything
pub async fn search(config: &Config, term: String, output: &Output) -> Result<()> {
    let mut client = SearchClient::from_config(config).context("Invalid search configuration")?;
    let results = client.search(&term).await.context("Search failed")?;

    output.print_search_results(results);
    Ok(())
}

/// Search and add one of the results to the watch list
pub async fn add(
    engine: &Engine,
    config: &Config,
    term: String,
    pick: usize,
    output: &Output,
) -> Result<()> {
    let mut client = SearchClient::from_config(config).context("Invalid search configuration")?;
    let results = client.search(&term).await.context("Search failed")?;
    let rep = pick_result(results, pick)?.clone();

    let pushed = engine
        .push_create(&rep)
        .await
        .map_err(|e| store_failure("Failed to add movie", e))?;
    report_remote_error(pushed.remote_error.as_ref(), output);

    output.success(&format!("Added movie: {}", pushed.item.id));
    output.print_movie(&pushed.item);

    Ok(())
}

/// List the watch list, optionally filtered by watched state
pub async fn list(engine: &Engine, watched: Option<bool>, output: &Output) -> Result<()> {
    let movies = engine.local().lock().await.all()?;
    let movies: Vec<_> = match watched {
        Some(state) => movies.into_iter().filter(|m| m.has_watched == state).collect(),
        None => movies,
    };

    output.print_movies(&movies);
    Ok(())
}

/// Show a single movie
pub async fn show(engine: &Engine, id: String, output: &Output) -> Result<()> {
    let store = engine.local().lock().await;
    let uuid = parse_movie_id(&id, &store)?;

    let movie = store
        .get(uuid)?
        .ok_or_else(|| anyhow!("Movie not found: {}", id))?;

    output.print_movie(&movie);
    Ok(())
}

/// Mark a movie as watched or unwatched
pub async fn set_watched(
    engine: &Engine,
    id: String,
    has_watched: bool,
    output: &Output,
) -> Result<()> {
    let movie = {
        let store = engine.local().lock().await;
        let uuid = parse_movie_id(&id, &store)?;
        store
            .get(uuid)?
            .ok_or_else(|| anyhow!("Movie not found: {}", id))?
    };

    let pushed = engine
        .push_update(&movie, has_watched)
        .await
        .map_err(|e| store_failure("Failed to update movie", e))?;
    report_remote_error(pushed.remote_error.as_ref(), output);

    let state = if has_watched { "watched" } else { "unwatched" };
    output.success(&format!("Marked as {}: {}", state, pushed.item.title));

    Ok(())
}

/// Delete a movie
pub async fn delete(engine: &Engine, id: String, output: &Output) -> Result<()> {
    let movie = {
        let store = engine.local().lock().await;
        let uuid = parse_movie_id(&id, &store)?;
        store
            .get(uuid)?
            .ok_or_else(|| anyhow!("Movie not found: {}", id))?
    };

    // Confirm deletion
    if output.should_prompt() {
        println!("Delete movie: {} - {}", movie.short_id(), movie.title);
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    let pushed = engine
        .push_delete(&movie)
        .await
        .map_err(|e| store_failure("Failed to delete movie", e))?;
    report_remote_error(pushed.remote_error.as_ref(), output);

    output.success(&format!("Deleted movie: {}", movie.id));

    Ok(())
}

/// Select a search result by its 1-based position
fn pick_result(results: &[MovieRepresentation], pick: usize) -> Result<&MovieRepresentation> {
    if results.is_empty() {
        bail!("No movies found");
    }
    pick.checked_sub(1)
        .and_then(|index| results.get(index))
        .ok_or_else(|| {
            anyhow!(
                "No result #{}; the search returned {} result(s)",
                pick,
                results.len()
            )
        })
}

/// Parse a movie ID (supports full UUID or prefix)
fn parse_movie_id(id: &str, store: &LocalStore) -> Result<Uuid> {
    // Try full UUID first
    if let Ok(uuid) = Uuid::parse_str(id) {
        return Ok(uuid);
    }

    // Try prefix match
    let movies = store.all()?;
    let matches: Vec<_> = movies
        .iter()
        .filter(|m| m.id.to_string().starts_with(id))
        .collect();

    match matches.len() {
        0 => bail!("No movie found matching: {}", id),
        1 => Ok(matches[0].id),
        _ => {
            eprintln!("Multiple movies match '{}':", id);
            for movie in &matches {
                eprintln!("  {} - {}", movie.id, movie.title);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

/// The local change stands; tell the user the mirror is behind
fn report_remote_error(error: Option<&NetworkError>, output: &Output) {
    match error {
        None => {}
        Some(e) if e.is_offline() => {}
        Some(e) => output.warning(&format!(
            "Saved locally, but the remote store was not updated: {}",
            e
        )),
    }
}
