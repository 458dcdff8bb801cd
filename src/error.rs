use std::time::Duration;

/// Failures of a single browser interaction.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("no element matches `{selector}`")]
    NotFound { selector: String },

    #[error("timed out after {waited:?} waiting for {what}")]
    Timeout { what: String, waited: Duration },

    #[error("browser driver error: {0}")]
    Driver(String),

    #[error("failed to launch browser: {0}")]
    Launch(String),
}

impl PageError {
    pub fn driver(err: impl std::fmt::Display) -> Self {
        PageError::Driver(err.to_string())
    }
}

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Page(#[from] PageError),

    #[error("login failed: {0}")]
    Login(String),

    #[error("CSV error in {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
