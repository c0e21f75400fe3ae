//! YAML run configuration

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use worklog_client::{JiraConfig, TempoConfig};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct AppConfig {
    pub jira: JiraSection,
    pub files: FilesSection,
}

/// Service endpoints and credentials
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct JiraSection {
    pub url: String,
    pub user_email: String,
    pub user_token: String,
    pub tempo_token: String,
    /// Overrides the public Tempo API base
    #[serde(default)]
    pub tempo_url: Option<String>,
}

impl std::fmt::Debug for JiraSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraSection")
            .field("url", &self.url)
            .field("user_email", &self.user_email)
            .field("user_token", &"***")
            .field("tempo_token", &"***")
            .field("tempo_url", &self.tempo_url)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FilesSection {
    /// Roster spreadsheet, created on first run
    pub project_config: PathBuf,
    /// Report output path
    pub report: PathBuf,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let required = [
            ("jira.url", self.jira.url.as_str()),
            ("jira.user_email", self.jira.user_email.as_str()),
            ("jira.user_token", self.jira.user_token.as_str()),
            ("jira.tempo_token", self.jira.tempo_token.as_str()),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                bail!("Config key '{key}' is empty");
            }
        }
        if self.files.project_config.as_os_str().is_empty() {
            bail!("Config key 'files.project_config' is empty");
        }
        if self.files.report.as_os_str().is_empty() {
            bail!("Config key 'files.report' is empty");
        }
        Ok(())
    }

    pub fn tempo_config(&self) -> TempoConfig {
        let config = TempoConfig::new(&self.jira.tempo_token);
        match &self.jira.tempo_url {
            Some(url) if !url.trim().is_empty() => config.with_base_url(url.trim()),
            _ => config,
        }
    }

    pub fn jira_config(&self) -> JiraConfig {
        JiraConfig::new(&self.jira.url, &self.jira.user_email, &self.jira.user_token)
    }
}
