use std::collections::HashSet;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::browser::Page;
use crate::error::PageError;
use crate::records::{is_job_id, job_id_from_href, JobLinkRecord};
use crate::selectors::Selectors;
use crate::wait::{poll_until, Pacing};

const SEARCH_URL: &str = "https://www.linkedin.com/jobs/search/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub position: String,
    pub location: String,
}

impl SearchQuery {
    pub fn new(position: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            position: position.into(),
            location: location.into(),
        }
    }

    pub fn url(&self) -> String {
        format!(
            "{SEARCH_URL}?keywords={}&location={}",
            urlencoding::encode(&self.position),
            urlencoding::encode(&self.location)
        )
    }
}

/// Highest page number listed in the pagination control ("1\n2\n3\n…\n22" → 22).
pub fn parse_page_count(text: &str) -> Option<u32> {
    text.lines()
        .filter_map(|line| line.trim().parse::<u32>().ok())
        .max()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageFailure {
    pub page: u32,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct CollectOutcome {
    /// Links not seen before, in discovery order.
    pub records: Vec<JobLinkRecord>,
    pub pages_total: u32,
    pub pages_scanned: u32,
    /// Ids dropped because they were already known or repeated in this run.
    pub duplicates: usize,
    /// Set when pagination stopped before the last page.
    pub stopped: Option<PageFailure>,
}

pub struct LinkCollector {
    selectors: Selectors,
    pacing: Pacing,
    page_timeout: Duration,
    poll_interval: Duration,
}

impl LinkCollector {
    pub fn new(selectors: Selectors, pacing: Pacing, page_timeout: Duration) -> Self {
        Self {
            selectors,
            pacing,
            page_timeout,
            poll_interval: Duration::from_millis(250),
        }
    }

    /// Walks every result page of `query` and returns the job links whose
    /// ids are not in `known`.
    ///
    /// A failing page ends pagination; whatever was collected up to that
    /// point is kept and the failure is reported in the outcome.
    pub async fn collect<P: Page + ?Sized>(
        &self,
        page: &P,
        query: &SearchQuery,
        known: &HashSet<String>,
    ) -> CollectOutcome {
        let mut outcome = CollectOutcome::default();

        let total = match self.open_search(page, query) {
            Ok(total) => total,
            Err(e) => {
                warn!(error = %e, "search results did not load");
                outcome.stopped = Some(PageFailure {
                    page: 1,
                    reason: e.to_string(),
                });
                return outcome;
            }
        };
        outcome.pages_total = total;
        info!(pages = total, position = %query.position, location = %query.location, "scanning search results");

        let mut seen = HashSet::new();
        for number in 1..=total {
            debug!(page = number, "scanning page");
            match self.scan_page(page, number).await {
                Ok(ids) => {
                    let read_at = Utc::now();
                    let found = ids.len();
                    for id in ids {
                        if known.contains(&id) || !seen.insert(id.clone()) {
                            outcome.duplicates += 1;
                            continue;
                        }
                        outcome.records.push(JobLinkRecord::new(id, read_at));
                    }
                    outcome.pages_scanned = number;
                    debug!(page = number, found, "page scanned");
                }
                Err(e) => {
                    warn!(page = number, error = %e, "stopping pagination");
                    outcome.stopped = Some(PageFailure {
                        page: number,
                        reason: e.to_string(),
                    });
                    break;
                }
            }
            if number < total {
                self.pacing.pause().await;
            }
        }

        info!(
            new = outcome.records.len(),
            skipped = outcome.duplicates,
            "link scan complete"
        );
        outcome
    }

    fn open_search<P: Page + ?Sized>(&self, page: &P, query: &SearchQuery) -> Result<u32, PageError> {
        page.navigate(&query.url())?;
        page.wait_for(&self.selectors.results_list)?;

        //No pagination control means a single page of results
        let total = page
            .text_of(&self.selectors.pagination)?
            .and_then(|text| parse_page_count(&text))
            .unwrap_or(1);
        Ok(total)
    }

    async fn scan_page<P: Page + ?Sized>(&self, page: &P, number: u32) -> Result<Vec<String>, PageError> {
        if number > 1 {
            page.click(&self.selectors.page_button(number))?;
            self.wait_until_active(page, number).await?;
        }
        page.wait_for(&self.selectors.result_item)?;

        // Entries render lazily as they scroll into view.
        page.run_script(&scroll_script(&self.selectors.result_item))?;

        let ids: Vec<String> = page
            .attributes(&self.selectors.result_item, &self.selectors.job_id_attribute)?
            .iter()
            .map(|value| value.trim())
            .filter(|value| is_job_id(value))
            .map(str::to_owned)
            .collect();
        if !ids.is_empty() {
            return Ok(ids);
        }

        let hrefs = page.attributes(&self.selectors.result_anchor, "href")?;
        Ok(hrefs.iter().filter_map(|href| job_id_from_href(href)).collect())
    }

    async fn wait_until_active<P: Page + ?Sized>(&self, page: &P, number: u32) -> Result<(), PageError> {
        let label = number.to_string();
        poll_until(
            &format!("result page {number}"),
            self.page_timeout,
            self.poll_interval,
            || {
                Ok(page
                    .text_of(&self.selectors.active_page)?
                    .is_some_and(|text| text.trim() == label))
            },
        )
        .await
    }
}

fn scroll_script(selector: &str) -> String {
    // serde_json quotes the selector as a valid JS string literal
    let literal = serde_json::to_string(selector).unwrap_or_else(|_| "\"\"".to_string());
    format!("document.querySelectorAll({literal}).forEach(e => e.scrollIntoView()); true")
}
