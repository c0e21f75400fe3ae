//! Jira issue-summary lookup
//!
//! One JQL filter `key in (A-1,A-2,...)` is paged with `startAt`/`maxResults`
//! until the echoed `startAt` plus the issues returned reaches `total`.

use crate::config::JiraConfig;
use crate::http::{build_http_client, get_json};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, warn};
use worklog_core::{FetchError, IssueSummarySource};

/// One page of `/rest/api/2/search`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub total: u32,
    #[serde(default)]
    pub start_at: u32,
    #[serde(default)]
    pub max_results: u32,
    #[serde(default)]
    pub issues: Vec<SearchIssue>,
}

#[derive(Debug, Deserialize)]
pub struct SearchIssue {
    pub key: String,
    pub fields: SearchFields,
}

#[derive(Debug, Deserialize)]
pub struct SearchFields {
    #[serde(default)]
    pub summary: String,
}

/// Drain a startAt/maxResults paginated search into `key -> summary`.
///
/// An empty page that has not reached `total` also ends the loop.
pub fn collect_summaries<F>(
    limit: u32,
    mut fetch_page: F,
) -> Result<HashMap<String, String>, FetchError>
where
    F: FnMut(u32, u32) -> Result<SearchPage, FetchError>,
{
    let mut summaries = HashMap::new();
    let mut start_at = 0u32;

    loop {
        let page = fetch_page(start_at, limit)?;
        let returned = page.issues.len() as u32;
        let reached = page.start_at + returned;

        for issue in page.issues {
            summaries.insert(issue.key, issue.fields.summary);
        }

        if reached >= page.total {
            break;
        }
        if returned == 0 {
            warn!(
                start_at = page.start_at,
                total = page.total,
                "Issue search returned an empty page before reaching total"
            );
            break;
        }
        start_at = reached;
    }

    Ok(summaries)
}

/// Build the JQL filter for a set of issue keys
pub fn keys_filter(issue_keys: &BTreeSet<String>) -> String {
    let keys: Vec<&str> = issue_keys.iter().map(String::as_str).collect();
    format!("key in ({})", keys.join(","))
}

/// Jira REST client
pub struct JiraClient {
    http: Client,
    config: JiraConfig,
}

impl JiraClient {
    pub fn new(config: JiraConfig) -> Result<Self, FetchError> {
        let http = build_http_client(config.timeout, &config.user_agent)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &JiraConfig {
        &self.config
    }

    /// Fetch a single search page for `jql`
    pub fn search_page(&self, jql: &str, start_at: u32, max_results: u32) -> Result<SearchPage, FetchError> {
        let request = self.http.get(self.config.search_url()).query(&[
            ("fields", "summary".to_string()),
            ("jql", jql.to_string()),
            ("startAt", start_at.to_string()),
            ("maxResults", max_results.to_string()),
            // Unknown or deleted keys become warnings instead of a 400
            ("validateQuery", "warn".to_string()),
        ]);
        let page: SearchPage = get_json(request, &self.config.authorization())?;
        debug!(
            start_at,
            returned = page.issues.len(),
            total = page.total,
            "Fetched issue search page"
        );
        Ok(page)
    }
}

impl IssueSummarySource for JiraClient {
    fn resolve_summaries(
        &self,
        issue_keys: &BTreeSet<String>,
    ) -> Result<HashMap<String, String>, FetchError> {
        if issue_keys.is_empty() {
            return Ok(HashMap::new());
        }

        let jql = keys_filter(issue_keys);
        collect_summaries(self.config.page_limit, |start_at, limit| {
            self.search_page(&jql, start_at, limit)
        })
    }
}
