//! The two stages glued together through the saved tables.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::auth::{login, Credentials};
use crate::browser::Page;
use crate::collector::{LinkCollector, PageFailure, SearchQuery};
use crate::config::Config;
use crate::error::ScrapeError;
use crate::extractor::{DetailExtractor, FieldFailure, SkippedLink};
use crate::records::{known_ids, merge_new_first, timestamp, JobLinkRecord};
use crate::selectors::Selectors;
use crate::store::TableStore;
use crate::wait::Pacing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkSource {
    /// Scan the search results for new links.
    Scan,
    /// Reuse the saved link table.
    Saved,
}

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub credentials: Credentials,
    pub query: SearchQuery,
    pub link_source: LinkSource,
    pub selectors: Selectors,
    pub pacing: Pacing,
    pub page_timeout: std::time::Duration,
    pub max_detail_pages: Option<usize>,
}

impl RunSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            credentials: config.credentials.clone(),
            query: config.query.clone(),
            link_source: if config.read_linkedin {
                LinkSource::Scan
            } else {
                LinkSource::Saved
            },
            selectors: Selectors::default(),
            pacing: config.pacing,
            page_timeout: config.browser.wait_timeout,
            max_detail_pages: config.max_detail_pages,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkStageReport {
    pub new_links: usize,
    pub total_links: usize,
    pub pages_total: u32,
    pub pages_scanned: u32,
    pub duplicates: usize,
    pub stopped: Option<PageFailure>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DetailStageReport {
    pub extracted: usize,
    pub total_records: usize,
    pub already_known: usize,
    pub duplicates: usize,
    pub deferred: usize,
    pub blank_fields: usize,
    pub skipped: Vec<SkippedLink>,
    pub failed_fields: Vec<FieldFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub query: SearchQuery,
    pub link_source: LinkSource,
    pub links: LinkStageReport,
    pub details: Option<DetailStageReport>,
    #[serde(with = "timestamp")]
    pub started_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    fn new(settings: &RunSettings) -> Self {
        let now = Utc::now();
        Self {
            query: settings.query.clone(),
            link_source: settings.link_source,
            links: LinkStageReport::default(),
            details: None,
            started_at: now,
            finished_at: now,
        }
    }

    fn finish(mut self, store: &TableStore) -> Result<Self, ScrapeError> {
        self.finished_at = Utc::now();
        store.save_report(&self)?;
        self.log_summary();
        Ok(self)
    }

    pub fn log_summary(&self) {
        info!(
            new_links = self.links.new_links,
            total_links = self.links.total_links,
            stopped_at_page = self.links.stopped.as_ref().map(|f| f.page),
            "link stage"
        );
        if let Some(details) = &self.details {
            info!(
                extracted = details.extracted,
                total_records = details.total_records,
                already_known = details.already_known,
                skipped = details.skipped.len(),
                failed_fields = details.failed_fields.len(),
                "detail stage"
            );
        }
    }
}

/// Scans the search results and saves the merged link table.
///
/// Returns the merged table, new links first.
pub async fn collect_stage<P: Page + ?Sized>(
    page: &P,
    settings: &RunSettings,
    store: &TableStore,
    report: &mut LinkStageReport,
) -> Result<Vec<JobLinkRecord>, ScrapeError> {
    let prior = store.load_links()?;
    let collector = LinkCollector::new(
        settings.selectors.clone(),
        settings.pacing,
        settings.page_timeout,
    );
    let outcome = collector
        .collect(page, &settings.query, &known_ids(&prior))
        .await;

    report.new_links = outcome.records.len();
    report.pages_total = outcome.pages_total;
    report.pages_scanned = outcome.pages_scanned;
    report.duplicates = outcome.duplicates;
    report.stopped = outcome.stopped;

    let merged = merge_new_first(outcome.records, prior);
    store.save_links(&merged)?;
    report.total_links = merged.len();
    Ok(merged)
}

/// Reads every link not yet in the detail table and saves the merged table.
pub async fn extract_stage<P: Page + ?Sized>(
    page: &P,
    settings: &RunSettings,
    store: &TableStore,
    links: &[JobLinkRecord],
) -> Result<DetailStageReport, ScrapeError> {
    let prior = store.load_details()?;
    let extractor = DetailExtractor::new(settings.selectors.clone(), settings.pacing)
        .with_max_pages(settings.max_detail_pages);
    let outcome = extractor.extract(page, links, &known_ids(&prior)).await;

    let extracted = outcome.records.len();
    let merged = merge_new_first(outcome.records, prior);
    store.save_details(&merged)?;

    Ok(DetailStageReport {
        extracted,
        total_records: merged.len(),
        already_known: outcome.already_known,
        duplicates: outcome.duplicates,
        deferred: outcome.deferred,
        blank_fields: outcome.blank_fields,
        skipped: outcome.skipped,
        failed_fields: outcome.failed_fields,
    })
}

/// Logs in, scans for links (or reuses the saved ones) and reads the new postings.
pub async fn run<P: Page + ?Sized>(
    page: &P,
    settings: &RunSettings,
    store: &TableStore,
) -> Result<RunReport, ScrapeError> {
    let mut report = RunReport::new(settings);
    login(page, &settings.credentials, &settings.selectors)?;

    let links = match settings.link_source {
        LinkSource::Scan => collect_stage(page, settings, store, &mut report.links).await?,
        LinkSource::Saved => {
            let links = store.load_links()?;
            info!(links = links.len(), "reusing saved links");
            report.links.total_links = links.len();
            links
        }
    };

    report.details = Some(extract_stage(page, settings, store, &links).await?);
    report.finish(store)
}

/// Logs in and runs only the link stage.
pub async fn run_links_only<P: Page + ?Sized>(
    page: &P,
    settings: &RunSettings,
    store: &TableStore,
) -> Result<RunReport, ScrapeError> {
    let mut report = RunReport::new(settings);
    login(page, &settings.credentials, &settings.selectors)?;
    collect_stage(page, settings, store, &mut report.links).await?;
    report.finish(store)
}
