use std::collections::HashSet;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::browser::Page;
use crate::error::PageError;
use crate::records::{normalize_description, JobDetailRecord, JobLinkRecord};
use crate::selectors::Selectors;
use crate::wait::Pacing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    PostedDate,
    Company,
    Title,
    Location,
    Description,
    WorkMethod,
    WorkTime,
}

impl Field {
    fn selector(self, selectors: &Selectors) -> &str {
        match self {
            Field::PostedDate => &selectors.posted_date,
            Field::Company => &selectors.company,
            Field::Title => &selectors.title,
            Field::Location => &selectors.location,
            Field::Description => &selectors.description,
            Field::WorkMethod => &selectors.work_method,
            Field::WorkTime => &selectors.work_time,
        }
    }
}

/// Result of looking up one field on a posting.
#[derive(Debug)]
pub enum FieldLookup {
    Found(String),
    Absent,
    Failed(PageError),
}

impl FieldLookup {
    pub fn of<P: Page + ?Sized>(page: &P, selector: &str) -> Self {
        match page.text_of(selector) {
            Ok(Some(text)) => FieldLookup::Found(text.trim().to_string()),
            Ok(None) => FieldLookup::Absent,
            Err(e) => FieldLookup::Failed(e),
        }
    }
}

/// Why a link produced no record.
#[derive(Debug, thiserror::Error)]
pub enum SkipReason {
    #[error("could not open page: {0}")]
    Navigation(PageError),
    #[error("posting did not render: {0}")]
    NotRendered(PageError),
    #[error("could not expand description: {0}")]
    ExpandDescription(PageError),
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedLink {
    pub job_id: String,
    pub link: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldFailure {
    pub job_id: String,
    pub field: Field,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ExtractOutcome {
    pub records: Vec<JobDetailRecord>,
    pub already_known: usize,
    pub duplicates: usize,
    /// Links left for a later run because of `max_pages`.
    pub deferred: usize,
    pub blank_fields: usize,
    pub skipped: Vec<SkippedLink>,
    pub failed_fields: Vec<FieldFailure>,
}

pub struct DetailExtractor {
    selectors: Selectors,
    pacing: Pacing,
    max_pages: Option<usize>,
}

impl DetailExtractor {
    pub fn new(selectors: Selectors, pacing: Pacing) -> Self {
        Self {
            selectors,
            pacing,
            max_pages: None,
        }
    }

    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Visits every link whose job id is not in `known` and reads the posting.
    ///
    /// A link that cannot be opened is skipped and recorded in the outcome;
    /// the remaining links are still visited.
    pub async fn extract<P: Page + ?Sized>(
        &self,
        page: &P,
        links: &[JobLinkRecord],
        known: &HashSet<String>,
    ) -> ExtractOutcome {
        let mut outcome = ExtractOutcome::default();
        let mut seen = HashSet::new();
        let mut visited = 0usize;

        info!(links = links.len(), "reading job postings");
        for (index, link) in links.iter().enumerate() {
            if known.contains(&link.job_id) {
                outcome.already_known += 1;
                continue;
            }
            if !seen.insert(link.job_id.as_str()) {
                outcome.duplicates += 1;
                continue;
            }
            if self.max_pages.is_some_and(|max| visited >= max) {
                outcome.deferred += 1;
                continue;
            }
            if visited > 0 {
                self.pacing.pause().await;
            }
            visited += 1;

            debug!(index = index + 1, job_id = %link.job_id, "visiting posting");
            match self.read_posting(page, link, &mut outcome) {
                Ok(record) => outcome.records.push(record),
                Err(reason) => {
                    warn!(job_id = %link.job_id, %reason, "skipping posting");
                    outcome.skipped.push(SkippedLink {
                        job_id: link.job_id.clone(),
                        link: link.job_link.clone(),
                        reason: reason.to_string(),
                    });
                }
            }
        }

        info!(
            extracted = outcome.records.len(),
            skipped = outcome.skipped.len(),
            already_known = outcome.already_known,
            "finished reading postings"
        );
        outcome
    }

    fn read_posting<P: Page + ?Sized>(
        &self,
        page: &P,
        link: &JobLinkRecord,
        outcome: &mut ExtractOutcome,
    ) -> Result<JobDetailRecord, SkipReason> {
        page.navigate(&link.job_link).map_err(SkipReason::Navigation)?;
        page.wait_for(&self.selectors.top_card)
            .map_err(SkipReason::NotRendered)?;
        page.click(&self.selectors.see_more)
            .map_err(SkipReason::ExpandDescription)?;

        let mut read = |field: Field| match FieldLookup::of(page, field.selector(&self.selectors)) {
            FieldLookup::Found(text) => text,
            FieldLookup::Absent => {
                debug!(job_id = %link.job_id, ?field, "field not on page");
                outcome.blank_fields += 1;
                String::new()
            }
            FieldLookup::Failed(e) => {
                warn!(job_id = %link.job_id, ?field, error = %e, "field lookup failed");
                outcome.failed_fields.push(FieldFailure {
                    job_id: link.job_id.clone(),
                    field,
                    reason: e.to_string(),
                });
                String::new()
            }
        };

        Ok(JobDetailRecord {
            title: read(Field::Title),
            company: read(Field::Company),
            location: read(Field::Location),
            work_time: read(Field::WorkTime),
            work_method: read(Field::WorkMethod),
            posted_date: read(Field::PostedDate),
            description: normalize_description(&read(Field::Description)),
            job_id: link.job_id.clone(),
            link: link.job_link.clone(),
            read_at: Utc::now(),
        })
    }
}
