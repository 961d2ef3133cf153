//! Client settings
//!
//! Resolved in layers, later layers winning: built-in defaults, an optional
//! YAML file, `.env` plus process environment, then command-line flags
//! (applied by the caller).

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5000;

const MIN_POLL_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the generation API
    pub api_url: String,
    /// Status polling period
    pub poll_interval_ms: u64,
    /// Per-request timeout
    pub request_timeout_secs: u64,
    /// Deepest file tree accepted from the server
    pub max_tree_depth: usize,
    /// Number of recently created projects remembered
    pub history_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            request_timeout_secs: 30,
            max_tree_depth: 64,
            history_limit: 20,
        }
    }
}

impl Settings {
    /// Load defaults, the YAML file (explicit path or the platform default)
    /// and the environment.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file is not.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut settings = match config_path {
            Some(path) => Self::from_yaml_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_yaml_file(&path)?,
                _ => Self::default(),
            },
        };

        dotenv::dotenv().ok();
        settings.apply_env(|key| std::env::var(key).ok())?;
        Ok(settings)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("Failed to parse YAML settings")
    }

    /// Overlay environment variables read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        // The web front-end's variable is honoured for shared .env files
        if let Some(url) = lookup("AUTOPILOT_API_URL").or_else(|| lookup("NEXT_PUBLIC_API_URL")) {
            self.api_url = url;
        }
        if let Some(raw) = lookup("AUTOPILOT_POLL_INTERVAL_MS") {
            self.poll_interval_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("AUTOPILOT_POLL_INTERVAL_MS is not a number: {}", raw))?;
        }
        if let Some(raw) = lookup("AUTOPILOT_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = raw.trim().parse().with_context(|| {
                format!("AUTOPILOT_REQUEST_TIMEOUT_SECS is not a number: {}", raw)
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.api_url)
            .with_context(|| format!("Invalid API URL: {}", self.api_url))?;
        if url.cannot_be_a_base() {
            bail!("API URL cannot be used as a base: {}", self.api_url);
        }
        if self.poll_interval_ms < MIN_POLL_INTERVAL_MS {
            bail!(
                "Poll interval must be at least {} ms (got {})",
                MIN_POLL_INTERVAL_MS,
                self.poll_interval_ms
            );
        }
        if self.max_tree_depth == 0 {
            bail!("max_tree_depth must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            bail!("Request timeout must be at least 1 second");
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "autopilot", "autopilot")
}

/// Platform location of `config.yaml`
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join("config.yaml"))
}

/// Directory for history and log files
pub fn data_dir() -> PathBuf {
    match project_dirs() {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => PathBuf::from(".autopilot"),
    }
}
