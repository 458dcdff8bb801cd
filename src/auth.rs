use std::fmt;

use tracing::{debug, info};

use crate::browser::Page;
use crate::error::{PageError, ScrapeError};
use crate::selectors::Selectors;

pub const LOGIN_URL: &str = "https://www.linkedin.com/login";

#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Signs in and waits until the logged-in navigation bar is rendered.
pub fn login<P: Page + ?Sized>(
    page: &P,
    credentials: &Credentials,
    selectors: &Selectors,
) -> Result<(), ScrapeError> {
    info!(email = %credentials.email, "logging in");
    page.navigate(LOGIN_URL)?;
    page.wait_for(&selectors.username)?;

    match page.click(&selectors.cookie_accept) {
        Ok(()) => debug!("accepted cookies"),
        Err(PageError::NotFound { .. }) => debug!("no cookie banner"),
        Err(e) => return Err(e.into()),
    }

    page.type_into(&selectors.username, &credentials.email)?;
    page.type_into(&selectors.password, &credentials.password)?;
    page.press_key("Enter")?;

    page.wait_for(&selectors.signed_in)
        .map_err(|e| ScrapeError::Login(format!("signed-in page never appeared ({e})")))?;
    info!("logged in");
    Ok(())
}
