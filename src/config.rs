use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::auth::Credentials;
use crate::browser::BrowserOptions;
use crate::collector::SearchQuery;
use crate::wait::Pacing;

/// Run configuration loaded from environment variables (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub query: SearchQuery,
    /// Scan the site for links, or reuse the saved link table.
    pub read_linkedin: bool,
    pub data_dir: PathBuf,
    pub browser: BrowserOptions,
    pub pacing: Pacing,
    pub max_detail_pages: Option<usize>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let defaults = BrowserOptions::default();
        let browser = BrowserOptions {
            headless: parse_bool(&var("HEADLESS", "false")).context("HEADLESS must be true or false")?,
            window_size: (
                var("WINDOW_WIDTH", &defaults.window_size.0.to_string())
                    .parse::<u32>()
                    .context("WINDOW_WIDTH must be a number")?,
                var("WINDOW_HEIGHT", &defaults.window_size.1.to_string())
                    .parse::<u32>()
                    .context("WINDOW_HEIGHT must be a number")?,
            ),
            wait_timeout: Duration::from_secs(
                var("WAIT_TIMEOUT_SECS", "30")
                    .parse::<u64>()
                    .context("WAIT_TIMEOUT_SECS must be a number of seconds")?,
            ),
            ..defaults
        };

        let pacing = Pacing::new(
            Duration::from_millis(
                var("PACING_MIN_MS", "650")
                    .parse::<u64>()
                    .context("PACING_MIN_MS must be a number of milliseconds")?,
            ),
            Duration::from_millis(
                var("PACING_MAX_MS", "930")
                    .parse::<u64>()
                    .context("PACING_MAX_MS must be a number of milliseconds")?,
            ),
        );

        let max_detail_pages = match lookup("MAX_DETAIL_PAGES") {
            Some(raw) => Some(raw.parse::<usize>().context("MAX_DETAIL_PAGES must be a number")?),
            None => None,
        };

        Ok(Self {
            credentials: Credentials {
                email: lookup("LINKEDIN_EMAIL").context("LINKEDIN_EMAIL must be set")?,
                password: lookup("LINKEDIN_PASSWORD").context("LINKEDIN_PASSWORD must be set")?,
            },
            query: SearchQuery::new(
                var("SEARCH_POSITION", "data scientist"),
                var("SEARCH_LOCATION", "lithuania"),
            ),
            read_linkedin: parse_bool(&var("READ_LINKEDIN", "true"))
                .context("READ_LINKEDIN must be true or false")?,
            data_dir: PathBuf::from(var("DATA_DIR", ".")),
            browser,
            pacing,
            max_detail_pages,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
