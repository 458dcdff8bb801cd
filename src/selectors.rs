//! CSS selectors for the LinkedIn pages the scraper drives.

/// Every element lookup the scraper performs, in one place so a site
/// redesign is a one-file change.
#[derive(Debug, Clone)]
pub struct Selectors {
    // Login page
    pub username: String,
    pub password: String,
    pub cookie_accept: String,
    pub signed_in: String,

    // Search results
    pub results_list: String,
    pub pagination: String,
    pub active_page: String,
    pub result_item: String,
    pub result_anchor: String,
    pub job_id_attribute: String,

    // Job posting
    pub top_card: String,
    pub see_more: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub work_time: String,
    pub work_method: String,
    pub posted_date: String,
    pub description: String,
}

impl Selectors {
    /// Pagination control for a result page, selected by its ordinal label.
    pub fn page_button(&self, number: u32) -> String {
        format!(r#"button[aria-label="Page {number}"]"#)
    }
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            username: "#username".to_string(),
            password: "#password".to_string(),
            cookie_accept: r#"button[action-type="ACCEPT"]"#.to_string(),
            signed_in: "#global-nav".to_string(),

            results_list: ".jobs-search-results-list".to_string(),
            pagination: ".jobs-search-results-list__pagination".to_string(),
            active_page: r#".jobs-search-results-list__pagination button[aria-current="true"]"#
                .to_string(),
            result_item: ".jobs-search-results__list-item".to_string(),
            result_anchor: r#".jobs-search-results__list-item a[href*="/jobs/view/"]"#.to_string(),
            job_id_attribute: "data-occludable-job-id".to_string(),

            top_card: ".p5".to_string(),
            see_more: ".artdeco-card__actions".to_string(),
            title: ".p5 h1".to_string(),
            company: ".p5 .jobs-unified-top-card__company-name".to_string(),
            location: ".p5 .jobs-unified-top-card__bullet".to_string(),
            work_time: ".p5 .jobs-unified-top-card__job-insight".to_string(),
            work_method: ".p5 .jobs-unified-top-card__workplace-type".to_string(),
            posted_date: ".p5 .jobs-unified-top-card__posted-date".to_string(),
            description: ".jobs-description__content .jobs-box__html-content".to_string(),
        }
    }
}
