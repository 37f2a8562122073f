//! MyMovies CLI
//!
//! Command-line interface for MyMovies - a watch list that syncs across devices.

use std::fs::OpenOptions;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::Mutex;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use mymovies_core::{Config, HttpRemoteStore, LocalStore, OfflineRemote, RemoteStore};

mod commands;
mod output;
mod prompt;

use commands::Engine;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "mymovies")]
#[command(about = "MyMovies - A watch list that syncs across devices")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for movies (nothing is saved)
    Search {
        /// Search term
        term: String,
    },
    /// Search and add a result to the watch list
    Add {
        /// Search term
        term: String,
        /// Which result to add (1 = first)
        #[arg(short, long, default_value_t = 1)]
        pick: usize,
    },
    /// List the watch list
    #[command(alias = "ls")]
    List {
        /// Only watched movies
        #[arg(long, conflicts_with = "unwatched")]
        watched: bool,
        /// Only unwatched movies
        #[arg(long)]
        unwatched: bool,
    },
    /// Show movie details
    Show {
        /// Movie ID (full UUID or prefix)
        id: String,
    },
    /// Mark a movie as watched
    Watch {
        /// Movie ID (full UUID or prefix)
        id: String,
    },
    /// Mark a movie as not watched
    Unwatch {
        /// Movie ID (full UUID or prefix)
        id: String,
    },
    /// Delete a movie
    #[command(alias = "rm")]
    Delete {
        /// Movie ID (full UUID or prefix)
        id: String,
    },
    /// Show status (sync state, counts)
    Status,
    /// Pull from the remote store and push pending changes
    Sync,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, remote_url, sync_enabled, search_url,
        /// search_api_key, request_timeout_secs, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Commands that don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), &output);
    }

    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config);

    if let Commands::Search { term } = &cli.command {
        return commands::movie::search(&config, term.clone(), &output).await;
    }

    let engine = open_engine(&config)?;
    run(cli.command, &engine, &config, &output).await
}

/// Run a command that works on the movie store
///
/// Read commands pull first. Write commands mirror only their own change;
/// earlier failed pushes are sent again only by `sync`.
async fn run(command: Commands, engine: &Engine, config: &Config, output: &Output) -> Result<()> {
    let is_write = matches!(
        &command,
        Commands::Add { .. }
            | Commands::Watch { .. }
            | Commands::Unwatch { .. }
            | Commands::Delete { .. }
    );
    let is_manual_sync = matches!(&command, Commands::Sync);

    // Pull before read commands (to get latest data)
    if !is_write && !is_manual_sync {
        auto_pull(engine, config, output).await;
    }

    match command {
        Commands::Search { term } => commands::movie::search(config, term, output).await,
        Commands::Config { .. } => unreachable!(), // Handled in main
        Commands::Add { term, pick } => commands::movie::add(engine, config, term, pick, output).await,
        Commands::List { watched, unwatched } => {
            commands::movie::list(engine, watched_filter(watched, unwatched), output).await
        }
        Commands::Show { id } => commands::movie::show(engine, id, output).await,
        Commands::Watch { id } => commands::movie::set_watched(engine, id, true, output).await,
        Commands::Unwatch { id } => commands::movie::set_watched(engine, id, false, output).await,
        Commands::Delete { id } => commands::movie::delete(engine, id, output).await,
        Commands::Status => commands::status::show(engine, config, output).await,
        Commands::Sync => commands::sync::sync(engine, config, output).await,
    }
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}

/// Open the local store and pick the remote it mirrors to
fn open_engine(config: &Config) -> Result<Engine> {
    let store = LocalStore::open(config)
        .map_err(|e| commands::store_failure("Failed to open movie store", e))?;

    let remote: Arc<dyn RemoteStore> = match HttpRemoteStore::from_config(config)
        .context("Invalid remote store configuration")?
    {
        Some(http) => Arc::new(http),
        None => {
            debug!("remote store not active, working offline");
            Arc::new(OfflineRemote)
        }
    };

    Ok(Engine::new(Arc::new(Mutex::new(store)), remote))
}

fn watched_filter(watched: bool, unwatched: bool) -> Option<bool> {
    match (watched, unwatched) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Auto-pull if sync is enabled, silently handles errors
async fn auto_pull(engine: &Engine, config: &Config, output: &Output) {
    if let Err(e) = commands::sync::pull_quiet(engine, config).await {
        output.warning(&format!("Auto-sync failed: {:#}", e));
    }
}

/// Initialize logging
///
/// Level comes from MYMOVIES_LOG (default "warn"). Logs go to
/// config.log_file when set, stderr otherwise.
fn init_logging(config: &Config) {
    let log_level = std::env::var("MYMOVIES_LOG").unwrap_or_else(|_| "warn".to_string());
    let env_filter = EnvFilter::new(format!(
        "mymovies_core={},mymovies_cli={}",
        log_level, log_level
    ));

    match config.log_file {
        Some(ref log_path) => {
            let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
                    return;
                }
            };

            // Ignore error if already initialized
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_ansi(false)
                .with_writer(log_file)
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }

    debug!("logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use httpmock::prelude::*;
    use mymovies_core::Movie;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_watched_filter() {
        assert_eq!(watched_filter(false, false), None);
        assert_eq!(watched_filter(true, false), Some(true));
        assert_eq!(watched_filter(false, true), Some(false));
    }

    #[test]
    fn test_parse_add_with_pick() {
        let cli = Cli::try_parse_from(["mymovies", "add", "heat", "--pick", "3"]).unwrap();
        match cli.command {
            Commands::Add { term, pick } => {
                assert_eq!(term, "heat");
                assert_eq!(pick, 3);
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_watched_and_unwatched_conflict() {
        assert!(Cli::try_parse_from(["mymovies", "list", "--watched", "--unwatched"]).is_err());
    }

    #[test]
    fn test_open_engine_offline_by_default() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };

        let engine = open_engine(&config).unwrap();
        assert!(config.sqlite_path().exists());
        drop(engine);
    }

    fn remote_config(server: &MockServer, data_dir: &std::path::Path) -> Config {
        Config {
            data_dir: data_dir.to_path_buf(),
            remote_url: Some(server.url("/movies")),
            sync_enabled: true,
            ..Config::default()
        }
    }

    async fn seed(engine: &Engine, movies: &[Movie]) {
        let mut store = engine.local().lock().await;
        let mut tx = store.transaction().unwrap();
        for movie in movies {
            tx.insert(movie).unwrap();
        }
        tx.save().unwrap();
    }

    #[tokio::test]
    async fn test_write_command_sends_one_put_when_remote_fails() {
        let server = MockServer::start_async().await;
        let put = server
            .mock_async(|when, then| {
                when.method(PUT);
                then.status(500);
            })
            .await;

        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = remote_config(&server, temp_dir.path());
        let engine = open_engine(&config).unwrap();

        let movie = Movie::new("Heat");
        let mut earlier_failure = Movie::new("Ronin");
        earlier_failure.needs_push = true;
        seed(&engine, &[movie.clone(), earlier_failure]).await;

        let output = Output::new(OutputFormat::Quiet);
        run(Commands::Watch { id: movie.id.to_string() }, &engine, &config, &output)
            .await
            .unwrap();

        // Only the watched change is sent, once
        assert_eq!(put.hits_async().await, 1);
        let store = engine.local().lock().await;
        assert!(store.get(movie.id).unwrap().unwrap().has_watched);
        assert_eq!(store.pending().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_sync_command_pushes_pending_changes() {
        let server = MockServer::start_async().await;
        let fetch = server
            .mock_async(|when, then| {
                when.method(GET).path("/movies.json");
                then.status(200).body("null");
            })
            .await;
        let put = server
            .mock_async(|when, then| {
                when.method(PUT);
                then.status(200).body("{}");
            })
            .await;

        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = remote_config(&server, temp_dir.path());
        let engine = open_engine(&config).unwrap();

        let mut pending = Movie::new("Ronin");
        pending.needs_push = true;
        seed(&engine, &[pending, Movie::new("Heat")]).await;

        let output = Output::new(OutputFormat::Quiet);
        run(Commands::Sync, &engine, &config, &output).await.unwrap();

        assert_eq!(fetch.hits_async().await, 1);
        assert_eq!(put.hits_async().await, 1);
        assert!(engine.local().lock().await.pending().unwrap().is_empty());
    }
}
