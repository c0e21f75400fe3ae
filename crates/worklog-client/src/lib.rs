//! # worklog-client
//!
//! Blocking HTTP clients for the two services the report is built from:
//! - [`TempoClient`]: paginated worklog records per project (bearer token)
//! - [`JiraClient`]: paginated issue-summary lookup by key (basic auth)
//!
//! Both implement the source traits of `worklog-core`, so the pipeline never
//! sees HTTP. Every request uses a fixed timeout; there are no retries and
//! every failure is returned to the caller as a [`FetchError`].
//!
//! [`FetchError`]: worklog_core::FetchError

pub mod config;
mod http;
pub mod jira;
pub mod tempo;

pub use config::{JiraConfig, TempoConfig};
pub use jira::{collect_summaries, JiraClient, SearchPage};
pub use tempo::{collect_time_entries, PageMetadata, TempoClient, TimeEntryPage};
