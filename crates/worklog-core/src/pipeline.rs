//! Per-project fetch → aggregate loop
//!
//! Projects are processed strictly one after another, in the order they were
//! requested. The first error of any kind stops the run.

use crate::{
    aggregate, DateRange, IssueSummarySource, PipelineError, Project, Roster, TimeEntrySource,
    Worklog,
};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Builds a [`Worklog`] from a time-entry source and an issue-summary source
pub struct WorklogPipeline<'a, T, I> {
    time_entries: &'a T,
    summaries: &'a I,
}

impl<'a, T, I> WorklogPipeline<'a, T, I>
where
    T: TimeEntrySource,
    I: IssueSummarySource,
{
    pub fn new(time_entries: &'a T, summaries: &'a I) -> Self {
        Self {
            time_entries,
            summaries,
        }
    }

    /// Fetch and aggregate every project of `project_keys`
    pub fn build(
        &self,
        project_keys: &[String],
        range: &DateRange,
        roster: &Roster,
    ) -> Result<Worklog, PipelineError> {
        info!(
            projects = project_keys.len(),
            from = %range.from,
            to = %range.to,
            "Fetching worklogs"
        );

        let projects = project_keys
            .iter()
            .map(|key| self.build_project(key, range, roster))
            .collect::<Result<Vec<_>, _>>()?;

        let worklog = Worklog::new(projects);
        info!(users = worklog.user_count(), "Worklogs fetched");
        debug!("worklog: {}", worklog.to_pretty_json());

        Ok(worklog)
    }

    fn build_project(
        &self,
        project_key: &str,
        range: &DateRange,
        roster: &Roster,
    ) -> Result<Project, PipelineError> {
        let fetch_err = |source| PipelineError::Fetch {
            project: project_key.to_string(),
            source,
        };

        let entries = self
            .time_entries
            .fetch_time_entries(project_key, range)
            .map_err(fetch_err)?;
        info!(project = project_key, records = entries.len(), "Fetched time entries");

        let issue_keys: BTreeSet<String> = entries
            .iter()
            .map(|e| e.issue.key.clone())
            .filter(|key| !key.trim().is_empty())
            .collect();
        let summaries = self
            .summaries
            .resolve_summaries(&issue_keys)
            .map_err(fetch_err)?;
        debug!(
            project = project_key,
            requested = issue_keys.len(),
            resolved = summaries.len(),
            "Resolved issue summaries"
        );

        aggregate(project_key, &entries, &summaries, roster.project(project_key)).map_err(
            |source| PipelineError::Validation {
                project: project_key.to_string(),
                source,
            },
        )
    }
}
