//! Sets priorities with one `updateProjectV2ItemFieldValue` mutation per issue.

use std::io::Write;

use anyhow::Result;

use crate::config::ProjectConfig;
use crate::github::{FieldValueInput, GraphqlError, ProjectApi};
use crate::priority::Priority;
use crate::report::{self, ItemFailure, Outcome, RunReport};

pub fn run(
    api: &impl ProjectApi,
    config: &ProjectConfig,
    dry_run: bool,
    out: &mut dyn Write,
) -> Result<RunReport> {
    writeln!(out, "🚀 Setting GitHub Project Priorities\n")?;
    writeln!(
        out,
        "Project: {} (ID: {})",
        config.repository_url, config.project_id
    )?;
    writeln!(out, "Field: {} (ID: {})\n", config.field_name, config.field_id)?;

    let last_issue = config.priorities.last_issue().unwrap_or_default();
    let mut report = RunReport::default();
    for (issue, priority) in config.priorities.iter() {
        report::write_progress_start(out, issue, last_issue, priority)?;
        let outcome = match prepare(config, issue, priority) {
            Ok(input) if dry_run => {
                writeln!(out, "(dry run) {}", input.variables())?;
                report.record(&Ok(()));
                continue;
            }
            Ok(input) => send(api, &input),
            Err(failure) => Err(failure),
        };
        report::write_progress_end(out, &outcome)?;
        report.record(&outcome);
    }

    report.write_summary(out)?;
    Ok(report)
}

fn prepare(
    config: &ProjectConfig,
    issue: u64,
    priority: Priority,
) -> Result<FieldValueInput<'_>, ItemFailure> {
    let item_id = config
        .item_id(issue)
        .ok_or(ItemFailure::MissingItem(issue))?;
    let option_id = config
        .option_id(priority)
        .ok_or(ItemFailure::MissingOption(priority))?;
    Ok(FieldValueInput::new(
        &config.project_id,
        item_id,
        &config.field_id,
        option_id,
    ))
}

fn send(api: &impl ProjectApi, input: &FieldValueInput<'_>) -> Outcome {
    api.update_single_select(input).map_err(|err| match err {
        GraphqlError::Errors(messages) => ItemFailure::GraphQl(messages.join("; ")),
        GraphqlError::Transport(err) => ItemFailure::Transport(err),
    })
}
