//! Collects LinkedIn job postings for a search and keeps two flat tables
//! (links and details) that grow incrementally across runs.

pub mod auth;
pub mod browser;
pub mod collector;
pub mod config;
pub mod error;
pub mod extractor;
pub mod logging;
pub mod pipeline;
pub mod records;
pub mod selectors;
pub mod store;
pub mod wait;

pub use browser::{ChromeSession, Page};
pub use config::Config;
pub use error::{PageError, ScrapeError};
pub use records::{JobDetailRecord, JobLinkRecord};
pub use store::TableStore;
