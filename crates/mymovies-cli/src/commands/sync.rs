//! Sync command handler

use anyhow::{bail, Context, Result};

use mymovies_core::Config;

use super::Engine;
use crate::output::{Output, OutputFormat};

/// Pull the remote snapshot, then push every pending change
pub async fn sync(engine: &Engine, config: &Config, output: &Output) -> Result<()> {
    if !config.sync_enabled {
        bail!(
            "Sync is not enabled. Enable it with:\n  \
             mymovies config set sync_enabled true\n  \
             mymovies config set remote_url https://your-store.example.com/movies"
        );
    }

    let Some(ref remote_url) = config.remote_url else {
        bail!(
            "Remote URL not configured. Set it with:\n  \
             mymovies config set remote_url https://your-store.example.com/movies"
        );
    };

    output.message(&format!("Pulling from {}...", remote_url));
    let merged = engine
        .pull_and_merge()
        .await
        .context("Failed to pull from remote store")?;

    let pushed = engine
        .push_pending()
        .await
        .context("Failed to push pending changes")?;

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "merged": merged,
                    "pushed": pushed.pushed,
                    "failed": pushed
                        .failed
                        .iter()
                        .map(|(id, e)| serde_json::json!({"id": id, "error": e.to_string()}))
                        .collect::<Vec<_>>()
                })
            );
        }
        OutputFormat::Quiet => {}
        OutputFormat::Human => {
            if merged.writes() == 0 && pushed.pushed == 0 {
                output.success("Sync complete - already up to date");
            } else {
                output.success("Sync complete");
                output.message(&format!(
                    "  Pulled: {} new, {} updated  Pushed: {}",
                    merged.inserted, merged.updated, pushed.pushed
                ));
            }
            if merged.skipped > 0 {
                output.message(&format!(
                    "  Ignored {} remote document(s) without an identifier",
                    merged.skipped
                ));
            }
        }
    }

    for (id, e) in &pushed.failed {
        output.warning(&format!("Could not push {}: {}", id, e));
    }

    Ok(())
}

/// Pull quietly (for auto-sync) - no output on success
pub async fn pull_quiet(engine: &Engine, config: &Config) -> Result<()> {
    if !config.remote_active() {
        return Ok(());
    }

    engine.pull_and_merge().await?;
    Ok(())
}
