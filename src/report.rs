use std::io::{self, Write};

use thiserror::Error;

use crate::priority::Priority;

/// Why a single issue could not be updated. Never aborts the run.
#[derive(Debug, Error)]
pub enum ItemFailure {
    #[error("Could not find priority field")]
    FieldNotFound,
    #[error("Could not find priority option")]
    OptionNotFound,
    #[error("No project item id registered for issue #{0}")]
    MissingItem(u64),
    #[error("No option id registered for priority '{0}'")]
    MissingOption(Priority),
    #[error("GraphQL Error: {0}")]
    GraphQl(String),
    #[error("Network Error: {0:#}")]
    Transport(anyhow::Error),
    #[error("Error: {0:#}")]
    Unexpected(anyhow::Error),
}

pub type Outcome = Result<(), ItemFailure>;

/// Running tally of a driver pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    pub successes: usize,
    pub failures: usize,
}

impl RunReport {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Ok(()) => self.successes += 1,
            Err(_) => self.failures += 1,
        }
    }

    pub fn exit_code(&self) -> i32 {
        if self.failures == 0 { 0 } else { 1 }
    }

    pub fn write_summary(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "{}", "=".repeat(50))?;
        writeln!(
            out,
            "Results: {} successful, {} failed",
            self.successes, self.failures
        )?;
        if self.failures == 0 {
            writeln!(out, "✨ All priorities updated successfully!")
        } else {
            writeln!(out, "⚠️  {} updates failed", self.failures)
        }
    }
}

/// Writes the `[24/31] Issue #24: Setting priority to 'Medium'...` prefix
/// and flushes so the line is visible while the request is in flight.
pub fn write_progress_start(
    out: &mut dyn Write,
    issue: u64,
    last_issue: u64,
    priority: Priority,
) -> io::Result<()> {
    write!(
        out,
        "[{issue}/{last_issue}] Issue #{issue}: Setting priority to '{priority}'... "
    )?;
    out.flush()
}

pub fn write_progress_end(out: &mut dyn Write, outcome: &Outcome) -> io::Result<()> {
    match outcome {
        Ok(()) => writeln!(out, "✅"),
        Err(failure) => writeln!(out, "❌ {failure}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(outcomes: Vec<(u64, Priority, Outcome)>) -> (RunReport, String) {
        let mut out = Vec::new();
        let mut report = RunReport::default();
        for (issue, priority, outcome) in outcomes {
            write_progress_start(&mut out, issue, 27, priority).expect("write");
            write_progress_end(&mut out, &outcome).expect("write");
            report.record(&outcome);
        }
        report.write_summary(&mut out).expect("write");
        (report, String::from_utf8(out).expect("utf8"))
    }

    #[test]
    fn all_success_summary() {
        let (report, text) = render(vec![
            (24, Priority::Medium, Ok(())),
            (27, Priority::High, Ok(())),
        ]);
        assert_eq!(report.exit_code(), 0);
        insta::assert_snapshot!(text, @r"
        [24/27] Issue #24: Setting priority to 'Medium'... ✅
        [27/27] Issue #27: Setting priority to 'High'... ✅

        ==================================================
        Results: 2 successful, 0 failed
        ✨ All priorities updated successfully!
        ");
    }

    #[test]
    fn failure_reason_is_shown_and_counted() {
        let (report, text) = render(vec![
            (24, Priority::Medium, Ok(())),
            (
                27,
                Priority::High,
                Err(ItemFailure::GraphQl("Could not resolve to a node".to_string())),
            ),
        ]);
        assert_eq!(report, RunReport { successes: 1, failures: 1 });
        assert_eq!(report.exit_code(), 1);
        assert!(text.contains("[27/27] Issue #27: Setting priority to 'High'... ❌ GraphQL Error: Could not resolve to a node"));
        assert!(text.contains("Results: 1 successful, 1 failed"));
        assert!(text.contains("⚠️  1 updates failed"));
    }

    #[test]
    fn transport_failure_renders_context_chain() {
        let err = anyhow::anyhow!("connection refused").context("sending mutation");
        let failure = ItemFailure::Transport(err);
        assert_eq!(
            failure.to_string(),
            "Network Error: sending mutation: connection refused"
        );
    }
}
