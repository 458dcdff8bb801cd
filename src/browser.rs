use std::sync::Arc;
use std::time::Duration;

use headless_chrome::browser::tab::NoElementFound;
use headless_chrome::util::Timeout;
use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::PageError;

/// The browser operations the scraper needs.
///
/// `text_of` separates "nothing matches" (`Ok(None)`) from a failed lookup
/// (`Err`), so callers can tell a blank field from a broken page.
pub trait Page {
    fn navigate(&self, url: &str) -> Result<(), PageError>;

    /// Blocks until `selector` matches, bounded by the session timeout.
    fn wait_for(&self, selector: &str) -> Result<(), PageError>;

    fn click(&self, selector: &str) -> Result<(), PageError>;

    fn type_into(&self, selector: &str, text: &str) -> Result<(), PageError>;

    fn press_key(&self, key: &str) -> Result<(), PageError>;

    /// Inner text of the first match.
    fn text_of(&self, selector: &str) -> Result<Option<String>, PageError>;

    /// Values of `name` on every match that carries it.
    fn attributes(&self, selector: &str, name: &str) -> Result<Vec<String>, PageError>;

    fn run_script(&self, script: &str) -> Result<Value, PageError>;
}

#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub window_size: (u32, u32),
    pub wait_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: false,
            window_size: (1920, 1080),
            wait_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(300),
        }
    }
}

/// One Chrome process with one tab.
///
/// Dropping the session closes the tab and then the browser process, so the
/// browser is released on every exit path.
pub struct ChromeSession {
    // Field order matters: the tab goes before the browser that owns it.
    tab: Arc<Tab>,
    _browser: Browser,
    wait_timeout: Duration,
}

impl ChromeSession {
    pub fn launch(options: &BrowserOptions) -> Result<Self, PageError> {
        let launch = LaunchOptionsBuilder::default()
            .headless(options.headless)
            .window_size(Some(options.window_size))
            .idle_browser_timeout(options.idle_timeout)
            .build()
            .map_err(|e| PageError::Launch(e.to_string()))?;

        let browser = Browser::new(launch).map_err(|e| PageError::Launch(e.to_string()))?;
        let tab = browser.new_tab().map_err(PageError::driver)?;
        tab.set_default_timeout(options.wait_timeout);

        debug!(headless = options.headless, "browser session started");
        Ok(Self {
            tab,
            _browser: browser,
            wait_timeout: options.wait_timeout,
        })
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        match self.tab.close_target() {
            Ok(_) => debug!("browser session closed"),
            Err(e) => warn!(error = %e, "failed to close browser tab"),
        }
    }
}

fn is_absent(err: &anyhow::Error) -> bool {
    err.downcast_ref::<NoElementFound>().is_some()
}

fn lookup_error(err: anyhow::Error, selector: &str) -> PageError {
    if is_absent(&err) {
        PageError::NotFound {
            selector: selector.to_string(),
        }
    } else {
        PageError::driver(err)
    }
}

// Only the driver's own timeout counts as a timeout; a crashed tab stays a driver error.
fn wait_error(err: anyhow::Error, selector: &str, waited: Duration) -> PageError {
    if err.downcast_ref::<Timeout>().is_some() {
        PageError::Timeout {
            what: format!("`{selector}`"),
            waited,
        }
    } else {
        debug!(selector, error = %err, "wait for element failed");
        PageError::driver(err)
    }
}

impl Page for ChromeSession {
    fn navigate(&self, url: &str) -> Result<(), PageError> {
        self.tab
            .navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(PageError::driver)?;
        Ok(())
    }

    fn wait_for(&self, selector: &str) -> Result<(), PageError> {
        self.tab
            .wait_for_element_with_custom_timeout(selector, self.wait_timeout)
            .map(|_| ())
            .map_err(|e| wait_error(e, selector, self.wait_timeout))
    }

    fn click(&self, selector: &str) -> Result<(), PageError> {
        let element = self
            .tab
            .find_element(selector)
            .map_err(|e| lookup_error(e, selector))?;
        element.click().map_err(PageError::driver)?;
        Ok(())
    }

    fn type_into(&self, selector: &str, text: &str) -> Result<(), PageError> {
        let element = self
            .tab
            .find_element(selector)
            .map_err(|e| lookup_error(e, selector))?;
        element.type_into(text).map_err(PageError::driver)?;
        Ok(())
    }

    fn press_key(&self, key: &str) -> Result<(), PageError> {
        self.tab.press_key(key).map_err(PageError::driver)?;
        Ok(())
    }

    fn text_of(&self, selector: &str) -> Result<Option<String>, PageError> {
        match self.tab.find_element(selector) {
            Ok(element) => element
                .get_inner_text()
                .map(Some)
                .map_err(PageError::driver),
            Err(e) if is_absent(&e) => Ok(None),
            Err(e) => Err(PageError::driver(e)),
        }
    }

    fn attributes(&self, selector: &str, name: &str) -> Result<Vec<String>, PageError> {
        let elements = match self.tab.find_elements(selector) {
            Ok(elements) => elements,
            Err(e) if is_absent(&e) => return Ok(Vec::new()),
            Err(e) => return Err(PageError::driver(e)),
        };

        let mut values = Vec::with_capacity(elements.len());
        for element in &elements {
            if let Some(value) = element
                .get_attribute_value(name)
                .map_err(PageError::driver)?
            {
                values.push(value);
            }
        }
        Ok(values)
    }

    fn run_script(&self, script: &str) -> Result<Value, PageError> {
        let result = self
            .tab
            .evaluate(script, false)
            .map_err(PageError::driver)?;
        Ok(result.value.unwrap_or(Value::Null))
    }
}


/// Scripted pages for tests: documents keyed by URL, clicks that lead to
/// other documents, and selectors that fail on purpose.
#[cfg(test)]
pub(crate) mod fake {
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::time::Duration;

    use serde_json::Value;

    use super::Page;
    use crate::error::PageError;

    #[derive(Debug, Default, Clone)]
    pub(crate) struct FakeDocument {
        texts: HashMap<String, String>,
        attributes: HashMap<(String, String), Vec<String>>,
        clickable: HashSet<String>,
        transitions: HashMap<String, String>,
        broken: HashSet<String>,
    }

    impl FakeDocument {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn text(mut self, selector: &str, value: &str) -> Self {
            self.texts.insert(selector.to_string(), value.to_string());
            self
        }

        pub(crate) fn attrs(mut self, selector: &str, name: &str, values: &[&str]) -> Self {
            self.attributes.insert(
                (selector.to_string(), name.to_string()),
                values.iter().map(|v| v.to_string()).collect(),
            );
            self
        }

        pub(crate) fn clickable(mut self, selector: &str) -> Self {
            self.clickable.insert(selector.to_string());
            self
        }

        /// Clicking `selector` loads the document registered under `url`.
        pub(crate) fn link(mut self, selector: &str, url: &str) -> Self {
            self.transitions.insert(selector.to_string(), url.to_string());
            self
        }

        /// Any lookup of `selector` fails with a driver error.
        pub(crate) fn broken(mut self, selector: &str) -> Self {
            self.broken.insert(selector.to_string());
            self
        }

        fn has(&self, selector: &str) -> bool {
            self.texts.contains_key(selector)
                || self.clickable.contains(selector)
                || self.transitions.contains_key(selector)
                || self.attributes.keys().any(|(s, _)| s == selector)
        }

        fn check(&self, selector: &str) -> Result<(), PageError> {
            if self.broken.contains(selector) {
                return Err(PageError::driver(format!("lookup of `{selector}` crashed")));
            }
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    pub(crate) struct FakePage {
        documents: HashMap<String, FakeDocument>,
        current: RefCell<Option<String>>,
        pub(crate) visited: RefCell<Vec<String>>,
        pub(crate) typed: RefCell<Vec<(String, String)>>,
        pub(crate) keys: RefCell<Vec<String>>,
        pub(crate) scripts: RefCell<Vec<String>>,
    }

    impl FakePage {
        pub(crate) fn new() -> Self {
            Self::default()
        }

        pub(crate) fn with(mut self, url: &str, document: FakeDocument) -> Self {
            self.documents.insert(url.to_string(), document);
            self
        }

        fn document(&self) -> Result<FakeDocument, PageError> {
            let current = self.current.borrow();
            current
                .as_ref()
                .and_then(|url| self.documents.get(url))
                .cloned()
                .ok_or_else(|| PageError::driver("no page loaded"))
        }

        fn load(&self, url: &str) -> Result<(), PageError> {
            if !self.documents.contains_key(url) {
                return Err(PageError::driver(format!("net::ERR_CONNECTION_RESET at {url}")));
            }
            *self.current.borrow_mut() = Some(url.to_string());
            Ok(())
        }
    }

    impl Page for FakePage {
        fn navigate(&self, url: &str) -> Result<(), PageError> {
            self.visited.borrow_mut().push(url.to_string());
            self.load(url)
        }

        fn wait_for(&self, selector: &str) -> Result<(), PageError> {
            let document = self.document()?;
            document.check(selector)?;
            if document.has(selector) {
                Ok(())
            } else {
                Err(PageError::Timeout {
                    what: format!("`{selector}`"),
                    waited: Duration::ZERO,
                })
            }
        }

        fn click(&self, selector: &str) -> Result<(), PageError> {
            let document = self.document()?;
            document.check(selector)?;
            if let Some(url) = document.transitions.get(selector) {
                return self.load(url);
            }
            if document.clickable.contains(selector) {
                return Ok(());
            }
            Err(PageError::NotFound {
                selector: selector.to_string(),
            })
        }

        fn type_into(&self, selector: &str, text: &str) -> Result<(), PageError> {
            let document = self.document()?;
            document.check(selector)?;
            if !document.has(selector) {
                return Err(PageError::NotFound {
                    selector: selector.to_string(),
                });
            }
            self.typed
                .borrow_mut()
                .push((selector.to_string(), text.to_string()));
            Ok(())
        }

        fn press_key(&self, key: &str) -> Result<(), PageError> {
            self.keys.borrow_mut().push(key.to_string());
            Ok(())
        }

        fn text_of(&self, selector: &str) -> Result<Option<String>, PageError> {
            let document = self.document()?;
            document.check(selector)?;
            Ok(document.texts.get(selector).cloned())
        }

        fn attributes(&self, selector: &str, name: &str) -> Result<Vec<String>, PageError> {
            let document = self.document()?;
            document.check(selector)?;
            Ok(document
                .attributes
                .get(&(selector.to_string(), name.to_string()))
                .cloned()
                .unwrap_or_default())
        }

        fn run_script(&self, script: &str) -> Result<Value, PageError> {
            self.document()?;
            self.scripts.borrow_mut().push(script.to_string());
            Ok(Value::Null)
        }
    }
}
