//! Status command handler

use anyhow::Result;

use mymovies_core::Config;

use super::Engine;
use crate::output::{Output, OutputFormat};

/// Show status information
pub async fn show(engine: &Engine, config: &Config, output: &Output) -> Result<()> {
    let (total, watched, pending) = {
        let store = engine.local().lock().await;
        (
            store.count()?,
            store.watched_count()?,
            store.pending()?.len(),
        )
    };
    let database_size = std::fs::metadata(config.sqlite_path())
        .map(|m| m.len())
        .unwrap_or(0);

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "sync_enabled": config.sync_enabled,
                    "remote_url": config.remote_url,
                    "storage": {
                        "location": config.data_dir,
                        "database_size": database_size
                    },
                    "counts": {
                        "movies": total,
                        "watched": watched,
                        "pending_push": pending
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", total);
        }
        OutputFormat::Human => {
            println!("MyMovies Status");
            println!("===============");
            println!();
            println!("Sync:");
            println!(
                "  Status: {}",
                if config.remote_active() {
                    "enabled"
                } else {
                    "disabled"
                }
            );
            if let Some(ref url) = config.remote_url {
                println!("  Remote: {}", url);
            }
            if pending > 0 {
                println!("  Pending: {} change(s) not yet pushed", pending);
            }
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
            println!("  Size:     {}", human_size(database_size));
            println!();
            println!("Watch list:");
            println!("  Movies:    {}", total);
            println!("  Watched:   {}", watched);
            println!("  Unwatched: {}", total - watched);
        }
    }

    Ok(())
}

fn human_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }
}
