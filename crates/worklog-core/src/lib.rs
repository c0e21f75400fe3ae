//! # worklog-core
//!
//! Core domain model and traits for the worklog cost report.
//!
//! This crate provides:
//! - Domain types: `Worklog`, `Project`, `User`, `Issue`, `Effort`
//! - Raw records as delivered by the time-tracking service: `TimeEntry`
//! - Source traits: `TimeEntrySource`, `IssueSummarySource`, and the
//!   `ReportRenderer` output trait
//! - The aggregation step (`aggregate`), the persisted rate roster
//!   (`roster`), the per-project fetch loop (`pipeline`) and atomic file
//!   output (`output`)
//! - Error types
//!
//! ## Example
//!
//! ```rust
//! use std::collections::HashMap;
//! use worklog_core::{aggregate, Author, IssueRef, TimeEntry};
//!
//! let entries = vec![
//!     TimeEntry::new(Author::new("a-1", "Alice"), IssueRef::new("PRJ-1"), "2024-01-02", 3600),
//!     TimeEntry::new(Author::new("a-1", "Alice"), IssueRef::new("PRJ-1"), "2024-01-02", 1800),
//! ];
//! let project = aggregate("PRJ", &entries, &HashMap::new(), None).unwrap();
//! assert_eq!(project.users[0].issues[0].efforts[0].seconds, 5400);
//! ```

pub mod aggregate;
pub mod output;
pub mod pipeline;
pub mod roster;

pub use aggregate::aggregate;
pub use output::write_atomically;
pub use pipeline::WorklogPipeline;
pub use roster::{ProjectRoster, Roster, RosterEntry};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use thiserror::Error;

// ============================================================================
// Type Aliases
// ============================================================================

/// Unique key of a tracked project (e.g. `PRJ`)
pub type ProjectKey = String;

/// Unique key of an issue (e.g. `PRJ-42`)
pub type IssueKey = String;

/// Account identifier of a worklog author
pub type AccountId = String;

/// Date format accepted on the command line and sent to the services
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| ValidationError::InvalidDate {
        value: value.to_string(),
        reason: e.to_string(),
    })
}

// ============================================================================
// Date Range
// ============================================================================

/// Inclusive range of calendar days covered by one report run
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, ValidationError> {
        if from > to {
            return Err(ValidationError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    /// Parse both bounds from `YYYY-MM-DD` strings
    pub fn parse(from: &str, to: &str) -> Result<Self, ValidationError> {
        Self::new(parse_date(from)?, parse_date(to)?)
    }

    /// Every day of the range, in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let to = self.to;
        self.from.iter_days().take_while(move |day| *day <= to)
    }

    /// Number of days in the range (always at least 1)
    pub fn len_days(&self) -> usize {
        (self.to - self.from).num_days() as usize + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    /// Zero-based position of `date` inside the range
    pub fn offset_of(&self, date: NaiveDate) -> Option<usize> {
        self.contains(date)
            .then(|| (date - self.from).num_days() as usize)
    }

    pub fn from_str_param(&self) -> String {
        self.from.format(DATE_FORMAT).to_string()
    }

    pub fn to_str_param(&self) -> String {
        self.to.format(DATE_FORMAT).to_string()
    }
}

/// Saturday or Sunday
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

// ============================================================================
// Raw Records
// ============================================================================

/// One raw worklog record as returned by the time-tracking service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub author: Author,
    pub issue: IssueRef,
    /// Day the work was logged on, `YYYY-MM-DD`
    pub start_date: String,
    pub time_spent_seconds: i64,
}

impl TimeEntry {
    pub fn new(
        author: Author,
        issue: IssueRef,
        start_date: impl Into<String>,
        time_spent_seconds: i64,
    ) -> Self {
        Self {
            author,
            issue,
            start_date: start_date.into(),
            time_spent_seconds,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub account_id: AccountId,
    #[serde(default)]
    pub display_name: String,
}

impl Author {
    pub fn new(account_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
            display_name: display_name.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub key: IssueKey,
}

impl IssueRef {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

// ============================================================================
// Worklog Model
// ============================================================================

/// Aggregated worklog: projects in the order they were requested
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Worklog {
    pub projects: Vec<Project>,
}

impl Worklog {
    pub fn new(projects: Vec<Project>) -> Self {
        Self { projects }
    }

    pub fn is_empty(&self) -> bool {
        self.projects.iter().all(|p| p.users.is_empty())
    }

    /// Number of user rows across all projects
    pub fn user_count(&self) -> usize {
        self.projects.iter().map(|p| p.users.len()).sum()
    }

    pub fn project(&self, key: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.key == key)
    }

    /// Pretty JSON dump, used for debug logging
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("<unserializable: {e}>"))
    }
}

/// A project and the users who logged time on it
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Project {
    pub key: ProjectKey,
    /// Sorted case-insensitively by display name
    pub users: Vec<User>,
}

impl Project {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            users: Vec::new(),
        }
    }
}

/// A worklog author within one project
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct User {
    pub account_id: AccountId,
    pub display_name: String,
    pub position: String,
    /// Hourly rate, 0 when unknown
    pub rate: i64,
    pub issues: Vec<Issue>,
}

impl User {
    pub fn total_seconds(&self) -> i64 {
        self.issues.iter().map(Issue::total_seconds).sum()
    }

    /// True when any issue of this user has effort on `date`
    pub fn has_effort_on(&self, date: NaiveDate) -> bool {
        self.issues
            .iter()
            .any(|issue| issue.efforts.iter().any(|e| e.date == date))
    }
}

/// An issue a user worked on, with per-day effort
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Issue {
    pub key: IssueKey,
    /// Empty when the issue tracker did not return the key
    pub summary: String,
    /// At most one effort per date, ascending
    pub efforts: Vec<Effort>,
}

impl Issue {
    pub fn total_seconds(&self) -> i64 {
        self.efforts.iter().map(|e| e.seconds).sum()
    }

    /// `"KEY: summary"` as shown in the report task column
    pub fn title(&self) -> String {
        format!("{}: {}", self.key, self.summary)
    }
}

/// Time spent on one issue on one day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Effort {
    pub date: NaiveDate,
    pub seconds: i64,
}

impl Effort {
    pub fn new(date: NaiveDate, seconds: i64) -> Self {
        Self { date, seconds }
    }

    /// Hours rounded to two decimals
    pub fn hours(&self) -> f64 {
        seconds_to_hours(self.seconds)
    }
}

/// Convert seconds to hours, rounded to two decimals
pub fn seconds_to_hours(seconds: i64) -> f64 {
    let hours = seconds as f64 / 3600.0;
    (hours * 100.0).round() / 100.0
}

// ============================================================================
// Traits
// ============================================================================

/// Source of raw worklog records (the time-tracking service)
pub trait TimeEntrySource {
    /// Fetch every record of `project_key` logged within `range`
    fn fetch_time_entries(
        &self,
        project_key: &str,
        range: &DateRange,
    ) -> Result<Vec<TimeEntry>, FetchError>;
}

/// Bulk lookup of issue summaries (the issue-tracking service)
pub trait IssueSummarySource {
    /// Resolve summaries for `issue_keys`. Keys the service does not know
    /// are simply absent from the result.
    fn resolve_summaries(
        &self,
        issue_keys: &BTreeSet<IssueKey>,
    ) -> Result<HashMap<IssueKey, String>, FetchError>;
}

/// Output backend for an aggregated worklog
pub trait ReportRenderer {
    type Output;

    fn render(&self, worklog: &Worklog, range: &DateRange) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Bad input: arguments, dates, or records missing required data
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid date '{value}': {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("Date range is reversed: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },

    #[error("Missing required field '{field}' in {context}")]
    MissingField { field: &'static str, context: String },
}

/// Failure talking to an external service
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {status} from {url}: {body}")]
    Http { status: u16, url: String, body: String },

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Failure while building the worklog
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Fetching project {project}: {source}")]
    Fetch {
        project: ProjectKey,
        #[source]
        source: FetchError,
    },

    #[error("Aggregating project {project}: {source}")]
    Validation {
        project: ProjectKey,
        #[source]
        source: ValidationError,
    },
}

/// Roster file error
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot read roster {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("Invalid rate '{value}' for {user} in sheet {project} (row {row})")]
    InvalidRate {
        project: ProjectKey,
        user: String,
        row: u32,
        value: String,
    },

    #[error("Format error: {0}")]
    Format(String),
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn date_range_days_are_inclusive() {
        let range = DateRange::parse("2024-01-01", "2024-01-07").unwrap();
        let days: Vec<_> = range.days().collect();
        assert_eq!(days.len(), 7);
        assert_eq!(range.len_days(), 7);
        assert_eq!(days[0], date(2024, 1, 1));
        assert_eq!(days[6], date(2024, 1, 7));
    }

    #[test]
    fn date_range_single_day() {
        let range = DateRange::parse("2024-02-29", "2024-02-29").unwrap();
        assert_eq!(range.days().count(), 1);
        assert_eq!(range.offset_of(date(2024, 2, 29)), Some(0));
    }

    #[test]
    fn date_range_rejects_reversed_bounds() {
        let err = DateRange::parse("2024-01-07", "2024-01-01").unwrap_err();
        assert!(matches!(err, ValidationError::InvalidRange { .. }));
    }

    #[test]
    fn date_range_offsets() {
        let range = DateRange::parse("2023-12-30", "2024-01-02").unwrap();
        assert_eq!(range.offset_of(date(2023, 12, 30)), Some(0));
        assert_eq!(range.offset_of(date(2024, 1, 2)), Some(3));
        assert_eq!(range.offset_of(date(2024, 1, 3)), None);
        assert_eq!(range.offset_of(date(2023, 12, 29)), None);
    }

    #[test]
    fn parse_date_reports_value() {
        let err = parse_date("2024/01/01").unwrap_err();
        assert!(err.to_string().contains("2024/01/01"));
    }

    #[test]
    fn weekend_detection() {
        assert!(!is_weekend(date(2024, 1, 5))); // Friday
        assert!(is_weekend(date(2024, 1, 6)));
        assert!(is_weekend(date(2024, 1, 7)));
        assert!(!is_weekend(date(2024, 1, 8)));
    }

    #[test]
    fn hours_are_rounded_to_two_decimals() {
        assert_eq!(seconds_to_hours(5400), 1.5);
        assert_eq!(seconds_to_hours(60), 0.02);
        assert_eq!(seconds_to_hours(1000), 0.28);
        assert_eq!(Effort::new(date(2024, 1, 1), 3600).hours(), 1.0);
    }

    #[test]
    fn time_entry_decodes_from_service_json() {
        let json = r#"{
            "author": {"accountId": "a-1", "displayName": "Alice"},
            "issue": {"key": "PRJ-1", "id": 10001},
            "startDate": "2024-01-02",
            "timeSpentSeconds": 3600,
            "description": "ignored"
        }"#;
        let entry: TimeEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.author.account_id, "a-1");
        assert_eq!(entry.issue.key, "PRJ-1");
        assert_eq!(entry.time_spent_seconds, 3600);
    }

    #[test]
    fn time_entry_missing_issue_fails_to_decode() {
        let json = r#"{
            "author": {"accountId": "a-1"},
            "startDate": "2024-01-02",
            "timeSpentSeconds": 3600
        }"#;
        assert!(serde_json::from_str::<TimeEntry>(json).is_err());
    }

    #[test]
    fn issue_title_joins_key_and_summary() {
        let issue = Issue {
            key: "PRJ-7".into(),
            summary: "Fix login".into(),
            efforts: vec![],
        };
        assert_eq!(issue.title(), "PRJ-7: Fix login");
    }
}
