//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;

use mymovies_core::{Movie, MovieRepresentation};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Check if output is in quiet mode
    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    /// Check if output is JSON
    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single movie
    pub fn print_movie(&self, movie: &Movie) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", movie.id);
                println!("Title:    {}", movie.title);
                println!("Watched:  {}", if movie.has_watched { "yes" } else { "no" });
                if let Some(ref image) = movie.image_path {
                    println!("Poster:   {}", image);
                }
                if movie.needs_push {
                    println!("Sync:     pending");
                }
                println!("Added:    {}", movie.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated:  {}", movie.updated_at.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => print_json(movie),
            OutputFormat::Quiet => {
                println!("{}", movie.id);
            }
        }
    }

    /// Print a list of movies
    pub fn print_movies(&self, movies: &[Movie]) {
        match self.format {
            OutputFormat::Human => {
                if movies.is_empty() {
                    println!("No movies found.");
                    return;
                }
                for movie in movies {
                    let pending = if movie.needs_push { " *" } else { "" };
                    println!(
                        "{} | {} | {}{}",
                        movie.short_id(),
                        watched_marker(movie.has_watched),
                        truncate(&movie.title, 50),
                        pending
                    );
                }
                println!("\n{} movie(s)", movies.len());
            }
            OutputFormat::Json => print_json(&movies),
            OutputFormat::Quiet => {
                for movie in movies {
                    println!("{}", movie.id);
                }
            }
        }
    }

    /// Print search results, numbered from 1
    pub fn print_search_results(&self, results: &[MovieRepresentation]) {
        match self.format {
            OutputFormat::Human => {
                if results.is_empty() {
                    println!("No results.");
                    return;
                }
                for (i, rep) in results.iter().enumerate() {
                    let year = rep
                        .release_year()
                        .map(|y| format!(" ({})", y))
                        .unwrap_or_default();
                    println!("{:>3}. {}{}", i + 1, truncate(&rep.title, 60), year);
                }
                println!("\n{} result(s)", results.len());
            }
            OutputFormat::Json => print_json(&results),
            OutputFormat::Quiet => {
                for rep in results {
                    println!("{}", rep.title);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a warning to stderr
    pub fn warning(&self, message: &str) {
        if !self.is_quiet() {
            eprintln!("⚠ {}", message);
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

fn watched_marker(has_watched: bool) -> &'static str {
    if has_watched {
        "[x]"
    } else {
        "[ ]"
    }
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
