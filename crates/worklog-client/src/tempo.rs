//! Tempo worklog client
//!
//! `GET {base}/worklogs?project=&from=&to=&offset=&limit=` returns
//! `{metadata: {count, offset, limit}, results: [...]}`. Pages are requested
//! until one comes back shorter than the requested limit; the total count is
//! never consulted.

use crate::config::TempoConfig;
use crate::http::{build_http_client, get_json};
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::debug;
use worklog_core::{DateRange, FetchError, TimeEntry, TimeEntrySource};

/// One page of the worklog listing
#[derive(Debug, Deserialize)]
pub struct TimeEntryPage {
    pub metadata: PageMetadata,
    #[serde(default)]
    pub results: Vec<TimeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct PageMetadata {
    pub count: u32,
    /// Offset echoed by the server
    #[serde(default)]
    pub offset: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
}

/// Drain an offset/limit paginated listing.
///
/// `fetch_page(offset, limit)` is called until a page returns fewer than
/// `limit` records. The next offset is the page's echoed offset (or the
/// requested one) plus its count.
pub fn collect_time_entries<F>(limit: u32, mut fetch_page: F) -> Result<Vec<TimeEntry>, FetchError>
where
    F: FnMut(u32, u32) -> Result<TimeEntryPage, FetchError>,
{
    let mut entries = Vec::new();
    let mut offset = 0u32;

    loop {
        let page = fetch_page(offset, limit)?;
        let count = page.metadata.count;
        entries.extend(page.results);

        if count < limit {
            break;
        }
        offset = page.metadata.offset.unwrap_or(offset) + count;
    }

    Ok(entries)
}

/// Tempo REST client
pub struct TempoClient {
    http: Client,
    config: TempoConfig,
}

impl TempoClient {
    pub fn new(config: TempoConfig) -> Result<Self, FetchError> {
        let http = build_http_client(config.timeout, &config.user_agent)?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &TempoConfig {
        &self.config
    }

    /// Fetch a single page
    pub fn fetch_page(
        &self,
        project_key: &str,
        range: &DateRange,
        offset: u32,
        limit: u32,
    ) -> Result<TimeEntryPage, FetchError> {
        let request = self.http.get(self.config.worklogs_url()).query(&[
            ("project", project_key.to_string()),
            ("from", range.from_str_param()),
            ("to", range.to_str_param()),
            ("offset", offset.to_string()),
            ("limit", limit.to_string()),
        ]);
        let page: TimeEntryPage = get_json(request, &self.config.authorization())?;
        debug!(
            project = project_key,
            offset,
            count = page.metadata.count,
            "Fetched worklog page"
        );
        Ok(page)
    }
}

impl TimeEntrySource for TempoClient {
    fn fetch_time_entries(
        &self,
        project_key: &str,
        range: &DateRange,
    ) -> Result<Vec<TimeEntry>, FetchError> {
        collect_time_entries(self.config.page_limit, |offset, limit| {
            self.fetch_page(project_key, range, offset, limit)
        })
    }
}
