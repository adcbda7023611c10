use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::controller::{ControllerSettings, ReconcilePolicy};

/// Environment variable overriding the backend base URL
pub const URL_ENV: &str = "RAGCHAT_URL";

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the RAG backend, without a trailing path
    pub base_url: String,

    /// How a successful chat response is folded into local history
    pub reconcile_policy: ReconcilePolicy,

    /// Ask the backend to evaluate every answer
    pub evaluate: bool,

    /// Sent as `ground_truth_source` with every chat request when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ground_truth_source: Option<String>,

    /// Start every conversation with an empty system message
    pub seed_system_message: bool,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// ragchat home directory
    #[serde(skip)]
    pub ragchat_home: PathBuf,

    /// UI preferences
    pub ui: UiConfig,
}

/// UI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Name shown in the typing indicator and conversation title
    pub assistant_name: String,
    pub show_metrics: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            assistant_name: "RAG".to_string(),
            show_metrics: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("~"));

        Config {
            base_url: "http://localhost:8000".to_string(),
            reconcile_policy: ReconcilePolicy::default(),
            evaluate: false,
            ground_truth_source: None,
            seed_system_message: true,
            request_timeout_secs: 60,
            ragchat_home: home.join(".ragchat"),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// Load `~/.ragchat/config.toml` and apply environment overrides
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir().context("Could not find home directory")?;
        let ragchat_home = home.join(".ragchat");

        fs::create_dir_all(&ragchat_home).context("Failed to create .ragchat directory")?;

        let mut config = Self::load_from(&ragchat_home.join("config.toml"))?;
        config.ragchat_home = ragchat_home;
        config.apply_env_overrides(|key| std::env::var(key).ok());

        Ok(config)
    }

    /// Read a config file, falling back to defaults when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Save configuration to `config.toml` in the ragchat home
    pub fn save(&self) -> Result<PathBuf> {
        fs::create_dir_all(&self.ragchat_home).context("Failed to create .ragchat directory")?;
        let config_path = self.config_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(config_path)
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(URL_ENV).filter(|url| !url.trim().is_empty()) {
            self.base_url = url;
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.ragchat_home.join("config.toml")
    }

    pub fn log_dir(&self) -> PathBuf {
        self.ragchat_home.join("logs")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Absolute URL of a backend path such as `/rag_chat`
    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            policy: self.reconcile_policy,
            evaluate: self.evaluate,
            ground_truth_source: self.ground_truth_source.clone(),
            seed_system_message: self.seed_system_message,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let actual = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(actual, Config::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "base_url = \"http://rag.internal:9000\"\nreconcile_policy = \"append-only\"\nevaluate = true\n\n[ui]\nassistant_name = \"FBD\"\n",
        )
        .unwrap();

        let actual = Config::load_from(&path).unwrap();

        assert_eq!(actual.base_url, "http://rag.internal:9000");
        assert_eq!(actual.reconcile_policy, ReconcilePolicy::AppendOnly);
        assert!(actual.evaluate);
        assert!(actual.seed_system_message);
        assert_eq!(actual.request_timeout_secs, 60);
        assert_eq!(actual.ui.assistant_name, "FBD");
        assert!(actual.ui.show_metrics);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.ragchat_home = dir.path().to_path_buf();
        config.ground_truth_source = Some("all".to_string());

        let path = config.save().unwrap();
        let mut actual = Config::load_from(&path).unwrap();
        actual.ragchat_home = dir.path().to_path_buf();

        assert_eq!(actual, config);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "evaluate = \"maybe\"").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_env_override_replaces_base_url() {
        let mut config = Config::default();
        config.apply_env_overrides(|key| (key == URL_ENV).then(|| "http://10.0.0.2:8000".to_string()));
        assert_eq!(config.base_url, "http://10.0.0.2:8000");

        config.apply_env_overrides(|_| Some("  ".to_string()));
        assert_eq!(config.base_url, "http://10.0.0.2:8000");
    }

    #[test]
    fn test_endpoint_url_strips_trailing_slash() {
        let mut config = Config::default();
        config.base_url = "http://localhost:8000/".to_string();
        assert_eq!(config.endpoint_url("/rag_chat"), "http://localhost:8000/rag_chat");
    }
}
