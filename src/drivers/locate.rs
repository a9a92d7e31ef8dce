use anyhow::Result;

use crate::browser::{Browser, ElementRef, Selector};

/// One independent way of finding an element. Strategies are tried in order
/// and the first hit wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// Closest `div` around an `<h3>` whose text is exactly `heading`.
    HeadingAncestor { heading: &'static str },
    /// First button-like element whose text contains any of `needles`,
    /// compared case-insensitively.
    ButtonText { needles: &'static [&'static str] },
}

pub const PRIORITY_CONTROL: &[Locator] = &[
    Locator::HeadingAncestor {
        heading: "Priority",
    },
    Locator::ButtonText {
        needles: &["priority", "no"],
    },
];

pub const SIDEBAR: &str = "aside";
pub const MENU_OPTIONS: &str = r#"[role="option"], [role="menuitem"], li"#;
pub const OPEN_MENU: &str = r#"[role="option"], [role="menuitem"]"#;
const BUTTONS: &str = r#"button, [role="button"]"#;

impl Locator {
    pub fn locate<B: Browser>(&self, browser: &mut B) -> Result<Option<ElementRef>> {
        match self {
            Locator::HeadingAncestor { heading } => {
                let xpath = format!("//h3[normalize-space(.)='{heading}']/ancestor::div[1]");
                Ok(browser.find_all(&Selector::xpath(xpath))?.into_iter().next())
            }
            Locator::ButtonText { needles } => {
                for button in browser.find_all(&Selector::css(BUTTONS))? {
                    let text = browser.text(&button)?.to_lowercase();
                    if needles.iter().any(|needle| text.contains(needle)) {
                        return Ok(Some(button));
                    }
                }
                Ok(None)
            }
        }
    }
}

/// Runs `strategies` in order. A strategy that errors is skipped.
pub fn locate_first<B: Browser>(browser: &mut B, strategies: &[Locator]) -> Option<ElementRef> {
    for strategy in strategies {
        match strategy.locate(browser) {
            Ok(Some(element)) => {
                tracing::debug!(?strategy, "located element");
                return Some(element);
            }
            Ok(None) => {}
            Err(err) => tracing::debug!(?strategy, error = %format!("{err:#}"), "locator failed"),
        }
    }
    None
}

/// First option whose text contains `label`.
pub fn find_option<B: Browser>(browser: &mut B, label: &str) -> Result<Option<ElementRef>> {
    for item in browser.find_all(&Selector::css(MENU_OPTIONS))? {
        if browser.text(&item)?.contains(label) {
            return Ok(Some(item));
        }
    }
    Ok(None)
}
