//! Scans the search results and updates the link table without visiting postings.

use anyhow::{Context, Result};
use linkedin_jobs::pipeline::{self, RunSettings};
use linkedin_jobs::{logging, ChromeSession, Config, TableStore};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let settings = RunSettings::from_config(&config);
    let store = TableStore::new(&config.data_dir);

    let session = ChromeSession::launch(&config.browser).context("Failed to start browser")?;
    let report = pipeline::run_links_only(&session, &settings, &store)
        .await
        .context("Link scan failed")?;

    if let Some(failure) = &report.links.stopped {
        tracing::warn!(page = failure.page, reason = %failure.reason, "scan ended early");
    }
    tracing::info!(links = %store.links_path().display(), new = report.links.new_links, "done");
    Ok(())
}
