use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::time::Duration;

pub const DEFAULT_TEMPO_URL: &str = "https://api.tempo.io/core/3";
pub const DEFAULT_PAGE_LIMIT: u32 = 100;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_USER_AGENT: &str = "worklog-report";

/// Connection settings for the Tempo worklog API
#[derive(Clone, Debug)]
pub struct TempoConfig {
    pub base_url: String,
    pub token: String,
    pub page_limit: u32,
    pub timeout: Duration,
    pub user_agent: String,
}

impl TempoConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_TEMPO_URL.to_string(),
            token: token.into(),
            page_limit: DEFAULT_PAGE_LIMIT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    pub fn worklogs_url(&self) -> String {
        format!("{}/worklogs", self.base_url.trim_end_matches('/'))
    }

    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Connection settings for the Jira REST API
#[derive(Clone, Debug)]
pub struct JiraConfig {
    pub base_url: String,
    pub user_email: String,
    pub user_token: String,
    pub page_limit: u32,
    pub timeout: Duration,
    pub user_agent: String,
}

impl JiraConfig {
    pub fn new(
        base_url: impl Into<String>,
        user_email: impl Into<String>,
        user_token: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            user_email: user_email.into(),
            user_token: user_token.into(),
            page_limit: DEFAULT_PAGE_LIMIT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_page_limit(mut self, limit: u32) -> Self {
        self.page_limit = limit.max(1);
        self
    }

    pub fn with_timeout(mut self, duration: Duration) -> Self {
        self.timeout = duration;
        self
    }

    pub fn search_url(&self) -> String {
        format!("{}/rest/api/2/search", self.base_url.trim_end_matches('/'))
    }

    /// `Basic base64(email:token)`
    pub fn authorization(&self) -> String {
        let credentials = format!("{}:{}", self.user_email, self.user_token);
        format!("Basic {}", STANDARD.encode(credentials))
    }
}
