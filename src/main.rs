use anyhow::{Context, Result};
use linkedin_jobs::pipeline::{self, RunSettings};
use linkedin_jobs::{logging, ChromeSession, Config, TableStore};

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let config = Config::from_env().context("Failed to load configuration")?;
    let settings = RunSettings::from_config(&config);
    let store = TableStore::new(&config.data_dir);

    //Closed on drop, including the error paths below
    let session = ChromeSession::launch(&config.browser).context("Failed to start browser")?;

    let report = pipeline::run(&session, &settings, &store)
        .await
        .context("Scraping run failed")?;

    tracing::info!(
        report = %store.report_path().display(),
        skipped = report.details.as_ref().map_or(0, |d| d.skipped.len()),
        "done"
    );
    Ok(())
}
