//! Sets priorities by clicking through the issue sidebar in a browser.

use std::io::Write;
use std::time::Duration;

use anyhow::Result;

use super::locate::{self, OPEN_MENU, PRIORITY_CONTROL, SIDEBAR};
use crate::browser::{Browser, Selector, WaitPolicy, wait_until};
use crate::config::ProjectConfig;
use crate::priority::Priority;
use crate::report::{self, ItemFailure, Outcome, RunReport};

#[derive(Debug, Clone, Copy)]
pub struct UiOptions {
    /// How long to wait for the issue sidebar after navigation.
    pub sidebar: WaitPolicy,
    /// How long to wait for the menu to open, and to close after a choice.
    pub menu: WaitPolicy,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            sidebar: WaitPolicy::new(Duration::from_secs(10)),
            menu: WaitPolicy::new(Duration::from_secs(5)),
        }
    }
}

pub fn run<B: Browser>(
    browser: &mut B,
    config: &ProjectConfig,
    token: &str,
    options: &UiOptions,
    out: &mut dyn Write,
) -> Result<RunReport> {
    writeln!(out, "🚀 Setting GitHub Issue Priorities with a browser\n")?;

    if !browser.set_extra_header("Authorization", &format!("token {token}"))? {
        tracing::warn!("browser cannot attach request headers; relying on the browser profile's session");
    }

    let last_issue = config.priorities.last_issue().unwrap_or_default();
    let mut report = RunReport::default();
    for (issue, priority) in config.priorities.iter() {
        report::write_progress_start(out, issue, last_issue, priority)?;
        let outcome = set_issue_priority(browser, &config.issue_url(issue), priority, options);
        report::write_progress_end(out, &outcome)?;
        report.record(&outcome);
    }

    report.write_summary(out)?;
    Ok(report)
}

fn set_issue_priority<B: Browser>(
    browser: &mut B,
    url: &str,
    priority: Priority,
    options: &UiOptions,
) -> Outcome {
    match attempt(browser, url, priority, options) {
        Ok(outcome) => outcome,
        Err(err) => Err(ItemFailure::Unexpected(err)),
    }
}

fn attempt<B: Browser>(
    browser: &mut B,
    url: &str,
    priority: Priority,
    options: &UiOptions,
) -> Result<Outcome> {
    browser.navigate(url)?;

    let sidebar = Selector::css(SIDEBAR);
    let has_sidebar = wait_until(options.sidebar, || {
        Ok(browser.find_all(&sidebar)?.into_iter().next())
    })?;
    if has_sidebar.is_none() {
        return Ok(Err(ItemFailure::FieldNotFound));
    }

    let Some(control) = locate::locate_first(browser, PRIORITY_CONTROL) else {
        return Ok(Err(ItemFailure::FieldNotFound));
    };
    browser.click(&control)?;

    let open_menu = Selector::css(locate::MENU_OPTIONS);
    wait_until(options.menu, || {
        Ok(browser.find_all(&open_menu)?.into_iter().next())
    })?;

    let Some(option) = locate::find_option(browser, priority.label())? else {
        return Ok(Err(ItemFailure::OptionNotFound));
    };
    browser.click(&option)?;

    let menu = Selector::css(OPEN_MENU);
    let closed = wait_until(options.menu, || {
        Ok(browser.find_all(&menu)?.is_empty().then_some(()))
    })?;
    if closed.is_none() {
        tracing::warn!(url, "priority menu still open after selecting an option");
    }

    Ok(Ok(()))
}
