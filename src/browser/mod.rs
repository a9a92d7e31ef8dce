mod wait;
mod webdriver;

use anyhow::Result;

pub use wait::{WaitPolicy, wait_until};
pub use webdriver::{DEFAULT_WEBDRIVER_URL, WebDriverOptions, WebDriverSession};

/// How to find elements on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Css(String),
    XPath(String),
}

impl Selector {
    pub fn css(value: impl Into<String>) -> Self {
        Selector::Css(value.into())
    }

    pub fn xpath(value: impl Into<String>) -> Self {
        Selector::XPath(value.into())
    }
}

/// Opaque handle to an element on the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRef(pub String);

/// The handful of page interactions the UI driver needs.
pub trait Browser {
    /// Loads `url` and returns once the document `load` event has fired.
    ///
    /// Requests the page starts afterwards may still be in flight; callers
    /// wait for the elements they need instead of for the network to go idle.
    fn navigate(&mut self, url: &str) -> Result<()>;

    fn find_all(&mut self, selector: &Selector) -> Result<Vec<ElementRef>>;

    fn text(&mut self, element: &ElementRef) -> Result<String>;

    fn click(&mut self, element: &ElementRef) -> Result<()>;

    /// Attaches `name: value` to every subsequent page request. Returns
    /// `Ok(false)` if the browser cannot do that.
    fn set_extra_header(&mut self, name: &str, value: &str) -> Result<bool>;
}
