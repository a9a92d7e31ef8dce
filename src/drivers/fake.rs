//! Scripted in-memory browser used by the driver tests.

use std::collections::HashMap;

use anyhow::{Result, anyhow, bail};

use super::locate::{MENU_OPTIONS, OPEN_MENU, SIDEBAR};
use crate::browser::{Browser, ElementRef, Selector};

const HEADING_CONTROL: &str = "priority-heading-div";

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub sidebar: bool,
    pub heading_control: bool,
    /// `(element id, text)` of button-like elements.
    pub buttons: Vec<(String, String)>,
    /// `(element id, text)` of entries shown once a control is clicked.
    pub options: Vec<(String, String)>,
    /// Keep the menu open after an option is clicked.
    pub sticky_menu: bool,
}

impl FakePage {
    pub fn with_heading(options: &[&str]) -> Self {
        Self {
            sidebar: true,
            heading_control: true,
            options: options
                .iter()
                .enumerate()
                .map(|(idx, text)| (format!("opt-{idx}"), text.to_string()))
                .collect(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeBrowser {
    pub pages: HashMap<String, FakePage>,
    pub supports_headers: bool,
    pub visited: Vec<String>,
    pub clicks: Vec<String>,
    pub headers: Vec<(String, String)>,
    current: Option<String>,
    menu_open: bool,
}

impl FakeBrowser {
    pub fn with_header_support(mut self) -> Self {
        self.supports_headers = true;
        self
    }

    pub fn page(mut self, url: &str, page: FakePage) -> Self {
        self.pages.insert(url.to_string(), page);
        self
    }

    fn current_page(&self) -> Result<&FakePage> {
        let url = self.current.as_deref().ok_or_else(|| anyhow!("no page loaded"))?;
        self.pages
            .get(url)
            .ok_or_else(|| anyhow!("no page scripted for {url}"))
    }

    fn ids(entries: &[(String, String)]) -> Vec<ElementRef> {
        entries.iter().map(|(id, _)| ElementRef(id.clone())).collect()
    }
}

impl Browser for FakeBrowser {
    fn navigate(&mut self, url: &str) -> Result<()> {
        self.visited.push(url.to_string());
        if !self.pages.contains_key(url) {
            bail!("net::ERR_NAME_NOT_RESOLVED at {url}");
        }
        self.current = Some(url.to_string());
        self.menu_open = false;
        Ok(())
    }

    fn find_all(&mut self, selector: &Selector) -> Result<Vec<ElementRef>> {
        let menu_open = self.menu_open;
        let page = self.current_page()?;
        let found = match selector {
            Selector::XPath(_) if page.heading_control => {
                vec![ElementRef(HEADING_CONTROL.to_string())]
            }
            Selector::XPath(_) => vec![],
            Selector::Css(css) if css == SIDEBAR => {
                if page.sidebar {
                    vec![ElementRef("aside".to_string())]
                } else {
                    vec![]
                }
            }
            Selector::Css(css) if css == MENU_OPTIONS || css == OPEN_MENU => {
                if menu_open {
                    Self::ids(&page.options)
                } else {
                    vec![]
                }
            }
            Selector::Css(_) => Self::ids(&page.buttons),
        };
        Ok(found)
    }

    fn text(&mut self, element: &ElementRef) -> Result<String> {
        let page = self.current_page()?;
        page.buttons
            .iter()
            .chain(page.options.iter())
            .find(|(id, _)| *id == element.0)
            .map(|(_, text)| text.clone())
            .ok_or_else(|| anyhow!("stale element reference: {}", element.0))
    }

    fn click(&mut self, element: &ElementRef) -> Result<()> {
        let page = self.current_page()?;
        let is_option = page.options.iter().any(|(id, _)| *id == element.0);
        let sticky = page.sticky_menu;
        self.clicks.push(element.0.clone());
        self.menu_open = if is_option { sticky } else { true };
        Ok(())
    }

    fn set_extra_header(&mut self, name: &str, value: &str) -> Result<bool> {
        if self.supports_headers {
            self.headers.push((name.to_string(), value.to_string()));
        }
        Ok(self.supports_headers)
    }
}
