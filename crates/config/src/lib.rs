//! Configuration loading, validation, and management for taskpilot.
//!
//! Loads configuration from `~/.taskpilot/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use taskpilot_core::{AgentSettings, ToolChoice};

/// The root configuration structure.
///
/// Maps directly to `~/.taskpilot/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Language-model settings, with optional named overrides
    #[serde(default)]
    pub llm: LlmConfig,

    /// Agent loop knobs
    #[serde(default)]
    pub agent: AgentConfig,

    /// Planning flow settings
    #[serde(default)]
    pub flow: FlowConfig,

    /// HTTP gateway settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Built-in tool settings
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// `[llm]` table. Sub-tables (`[llm.vision]`, ...) are named overrides that
/// inherit every field they leave unset from the base.
#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(flatten)]
    pub overrides: BTreeMap<String, LlmOverride>,
}

fn default_model() -> String {
    "gpt-4o".into()
}
fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_temperature() -> f32 {
    1.0
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            overrides: BTreeMap::new(),
        }
    }
}

/// A named `[llm.<name>]` table.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct LlmOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// Fully resolved settings for one LLM client.
#[derive(Clone, PartialEq)]
pub struct LlmSettings {
    pub model: String,
    pub base_url: String,
    pub api_key: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("overrides", &self.overrides)
            .finish()
    }
}

impl std::fmt::Debug for LlmOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmOverride")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

impl std::fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmSettings")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// `[agent]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,

    #[serde(default = "default_duplicate_threshold")]
    pub duplicate_threshold: usize,

    /// Observation cap in characters; 0 means unlimited
    #[serde(default = "default_max_observe")]
    pub max_observe: Option<usize>,

    #[serde(default)]
    pub tool_choice: ToolChoice,

    #[serde(default = "default_special_tools")]
    pub special_tools: Vec<String>,

    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,
}

fn default_max_steps() -> u32 {
    20
}
fn default_duplicate_threshold() -> usize {
    2
}
fn default_max_observe() -> Option<usize> {
    Some(10_000)
}
fn default_special_tools() -> Vec<String> {
    vec!["terminate".into()]
}
fn default_memory_capacity() -> usize {
    100
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            duplicate_threshold: default_duplicate_threshold(),
            max_observe: default_max_observe(),
            tool_choice: ToolChoice::default(),
            special_tools: default_special_tools(),
            memory_capacity: default_memory_capacity(),
        }
    }
}

impl AgentConfig {
    /// Convert to the settings every agent is constructed with.
    pub fn to_settings(&self) -> AgentSettings {
        AgentSettings {
            max_steps: self.max_steps,
            duplicate_threshold: self.duplicate_threshold,
            max_observe: self.max_observe.filter(|n| *n > 0),
            tool_choice: self.tool_choice,
            special_tools: self.special_tools.clone(),
            memory_capacity: self.memory_capacity,
        }
    }
}

/// `[flow]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Ordered executor keys; empty means every registered agent
    #[serde(default)]
    pub executors: Vec<String>,

    #[serde(default = "default_flow_timeout")]
    pub timeout_secs: u64,
}

fn default_flow_timeout() -> u64 {
    3600
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            executors: Vec::new(),
            timeout_secs: default_flow_timeout(),
        }
    }
}

/// `[gateway]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    5173
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// `[tools]` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_bash_timeout")]
    pub bash_timeout_secs: u64,

    #[serde(default = "default_python_timeout")]
    pub python_timeout_secs: u64,

    /// Directory file tools and shell commands run in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,
}

fn default_bash_timeout() -> u64 {
    300
}
fn default_python_timeout() -> u64 {
    60
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            bash_timeout_secs: default_bash_timeout(),
            python_timeout_secs: default_python_timeout(),
            workspace_root: None,
        }
    }
}

impl ToolsConfig {
    /// The configured workspace root, or `~/.taskpilot/workspace`.
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .unwrap_or_else(AppConfig::workspace_dir)
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.taskpilot/config.toml).
    ///
    /// Also checks environment variables:
    /// - `TASKPILOT_API_KEY`, then `OPENAI_API_KEY` (only when no key is configured)
    /// - `TASKPILOT_MODEL`
    /// - `TASKPILOT_BASE_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `var`, which returns the value of
    /// a variable if set.
    pub fn apply_env_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if self.llm.api_key.is_none() {
            self.llm.api_key = var("TASKPILOT_API_KEY").or_else(|| var("OPENAI_API_KEY"));
        }
        if let Some(model) = var("TASKPILOT_MODEL") {
            self.llm.model = model;
        }
        if let Some(base_url) = var("TASKPILOT_BASE_URL") {
            self.llm.base_url = base_url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".taskpilot")
    }

    /// Get the default workspace directory path.
    pub fn workspace_dir() -> PathBuf {
        Self::config_dir().join("workspace")
    }

    /// Resolve the LLM settings registered under `name`, falling back to the
    /// base `[llm]` table for unknown names and unset fields.
    pub fn llm_settings(&self, name: &str) -> LlmSettings {
        let base = &self.llm;
        let over = base.overrides.get(name).cloned().unwrap_or_default();
        LlmSettings {
            model: over.model.unwrap_or_else(|| base.model.clone()),
            base_url: over.base_url.unwrap_or_else(|| base.base_url.clone()),
            api_key: over.api_key.or_else(|| base.api_key.clone()),
            max_tokens: over.max_tokens.unwrap_or(base.max_tokens),
            temperature: over.temperature.unwrap_or(base.temperature),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_temperature("llm.temperature", self.llm.temperature)?;
        for (name, over) in &self.llm.overrides {
            if let Some(t) = over.temperature {
                check_temperature(&format!("llm.{name}.temperature"), t)?;
            }
        }

        if self.agent.duplicate_threshold < 1 {
            return Err(ConfigError::ValidationError(
                "agent.duplicate_threshold must be at least 1".into(),
            ));
        }

        if self.agent.memory_capacity < 1 {
            return Err(ConfigError::ValidationError(
                "agent.memory_capacity must be at least 1".into(),
            ));
        }

        if self.agent.max_steps == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_steps must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.llm.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

fn check_temperature(field: &str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=2.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{field} must be between 0.0 and 2.0"
        )))
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for taskpilot_core::Error {
    fn from(e: ConfigError) -> Self {
        taskpilot_core::Error::Config {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.agent.max_steps, 20);
        assert_eq!(config.gateway.port, 5173);
        assert_eq!(config.flow.timeout_secs, 3600);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.llm.model, config.llm.model);
        assert_eq!(parsed.gateway.port, config.gateway.port);
        assert_eq!(parsed.agent.max_observe, Some(10_000));
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.llm.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_duplicate_threshold_rejected() {
        let mut config = AppConfig::default();
        config.agent.duplicate_threshold = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate_threshold"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
    }

    #[test]
    fn load_from_file_with_named_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[llm]
model = "gpt-4o-mini"
api_key = "sk-base"
temperature = 0.2

[llm.vision]
model = "gpt-4o"
max_tokens = 1024

[agent]
max_steps = 5
max_observe = 0
tool_choice = "required"

[flow]
executors = ["pilot", "data_analysis"]
"#,
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();
        let vision = config.llm_settings("vision");
        assert_eq!(vision.model, "gpt-4o");
        assert_eq!(vision.max_tokens, 1024);
        assert_eq!(vision.api_key.as_deref(), Some("sk-base"));
        assert!((vision.temperature - 0.2).abs() < f32::EPSILON);

        let fallback = config.llm_settings("unknown");
        assert_eq!(fallback.model, "gpt-4o-mini");

        let settings = config.agent.to_settings();
        assert_eq!(settings.max_steps, 5);
        assert_eq!(settings.max_observe, None);
        assert_eq!(settings.tool_choice, ToolChoice::Required);
        assert_eq!(config.flow.executors, vec!["pilot", "data_analysis"]);
    }

    #[test]
    fn parse_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[agent\nmax_steps = ").unwrap();
        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn env_overrides_fill_missing_key() {
        let env: HashMap<&str, &str> = [
            ("OPENAI_API_KEY", "sk-openai"),
            ("TASKPILOT_MODEL", "gpt-4.1"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.apply_env_overrides(|k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-openai"));
        assert_eq!(config.llm.model, "gpt-4.1");
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
    }

    #[test]
    fn env_does_not_replace_configured_key() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-file".into());
        config.apply_env_overrides(|k| (k == "TASKPILOT_API_KEY").then(|| "sk-env".to_string()));
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-file"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn workspace_root_defaults_under_config_dir() {
        let tools = ToolsConfig::default();
        assert!(tools.workspace_root().ends_with(".taskpilot/workspace"));
    }
}
