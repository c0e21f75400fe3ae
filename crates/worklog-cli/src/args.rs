//! Positional argument validation

use anyhow::{bail, Context, Result};
use worklog_core::DateRange;

/// Split a comma-separated project list, ignoring empty segments
pub fn parse_projects(raw: &str) -> Result<Vec<String>> {
    let projects: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if projects.is_empty() {
        bail!("No project keys given in '{raw}'");
    }
    Ok(projects)
}

pub fn parse_range(from: &str, to: &str) -> Result<DateRange> {
    DateRange::parse(from, to).context("Invalid report dates")
}
