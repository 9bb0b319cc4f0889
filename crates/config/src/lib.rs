//! Configuration for reactant
//!
//! A configuration snapshot is resolved once per process in layers:
//! compiled defaults, then the JSON config file, then environment
//! variables, then explicit overrides (usually CLI flags).

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod paths;

pub use paths::{config_path, data_dir, expand_home};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Agent run parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_model")]
    pub model: String,
    /// Prompt template; `{system_time}` is substituted on every model call.
    /// `None` selects the built-in ReAct prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    #[serde(default = "default_max_search_results")]
    pub max_search_results: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Wall-clock limit for a whole run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_timeout_secs: Option<u64>,
    /// Forces tool binding on or off; `None` defers to the capability registry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supports_tools: Option<bool>,
    #[serde(default)]
    pub structured_output: bool,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: default_model(),
            system_prompt: None,
            max_steps: default_max_steps(),
            max_search_results: default_max_search_results(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            run_timeout_secs: None,
            supports_tools: None,
            structured_output: false,
        }
    }
}

fn default_model() -> String {
    "claude-3-5-sonnet".to_string()
}

fn default_max_steps() -> u32 {
    25
}

fn default_max_search_results() -> u32 {
    10
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_max_tokens() -> u32 {
    1024
}

/// Holistic AI Bedrock proxy credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolisticConfig {
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_holistic_endpoint")]
    pub api_endpoint: String,
}

impl Default for HolisticConfig {
    fn default() -> Self {
        Self {
            team_id: String::new(),
            api_token: String::new(),
            api_endpoint: default_holistic_endpoint(),
        }
    }
}

fn default_holistic_endpoint() -> String {
    "https://ctwa92wg1b.execute-api.us-east-1.amazonaws.com/prod/invoke".to_string()
}

impl HolisticConfig {
    pub fn is_configured(&self) -> bool {
        !self.team_id.is_empty() && !self.api_token.is_empty()
    }
}

/// OpenAI API access
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

/// Local Ollama server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_base_url")]
    pub base_url: String,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_ollama_base_url(),
        }
    }
}

fn default_ollama_base_url() -> String {
    "http://localhost:11434".to_string()
}

/// All model gateways
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GatewayConfig {
    #[serde(default)]
    pub holistic: HolisticConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub ollama: OllamaConfig,
}

/// Valyu search and contents API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValyuConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_extract_effort")]
    pub extract_effort: String,
    #[serde(default = "default_response_length")]
    pub response_length: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<bool>,
}

impl Default for ValyuConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            extract_effort: default_extract_effort(),
            response_length: default_response_length(),
            summary: None,
        }
    }
}

fn default_extract_effort() -> String {
    "normal".to_string()
}

fn default_response_length() -> String {
    "short".to_string()
}

/// Tool configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ToolkitConfig {
    #[serde(default)]
    pub valyu: ValyuConfig,
}

/// Explicit values that win over every other layer
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub model: Option<String>,
    pub system_prompt: Option<String>,
    pub max_steps: Option<u32>,
    pub structured_output: Option<bool>,
    pub supports_tools: Option<bool>,
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentSettings,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub toolkit: ToolkitConfig,
}

impl Config {
    /// Resolve from the default file location and the process environment
    pub async fn load(overrides: &ConfigOverrides) -> Result<Self> {
        Self::resolve(&config_path(), |key| std::env::var(key).ok(), overrides).await
    }

    /// Resolve all layers: defaults, file, environment, overrides
    pub async fn resolve<F>(path: &Path, env: F, overrides: &ConfigOverrides) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::load_from(path).await?;
        config.apply_env(env);
        config.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Reject values no run can honor
    pub fn validate(&self) -> Result<()> {
        if self.agent.max_steps == 0 {
            return Err(ConfigError::Invalid(
                "agent.max_steps must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Load the file layer on top of defaults
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config found at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("Loading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save to the default location
    pub async fn save(&self) -> Result<()> {
        self.save_to(&config_path()).await
    }

    /// Save to specific location
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("Writing config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Apply the environment layer. Unset or empty variables leave the
    /// current value untouched.
    pub fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(model) = var("MODEL") {
            self.agent.model = model;
        }
        if let Some(prompt) = var("SYSTEM_PROMPT") {
            self.agent.system_prompt = Some(prompt);
        }
        if let Some(steps) = var("MAX_STEPS").and_then(|v| parse_env("MAX_STEPS", &v)) {
            self.agent.max_steps = steps;
        }
        if let Some(n) =
            var("MAX_SEARCH_RESULTS").and_then(|v| parse_env("MAX_SEARCH_RESULTS", &v))
        {
            self.agent.max_search_results = n;
        }
        // The OLLAMA_* names are older spellings; the short name wins
        let first = |keys: &[&'static str]| keys.iter().find_map(|&k| var(k).map(|v| (k, v)));

        if let Some(t) = first(&["TEMPERATURE", "OLLAMA_TEMPERATURE"])
            .and_then(|(k, v)| parse_env(k, &v))
        {
            self.agent.temperature = t;
        }
        if let Some(t) =
            first(&["TIMEOUT", "OLLAMA_TIMEOUT"]).and_then(|(k, v)| parse_env(k, &v))
        {
            self.agent.timeout_secs = t;
        }
        if let Some(n) =
            first(&["MAX_TOKENS", "OLLAMA_NUM_PREDICT"]).and_then(|(k, v)| parse_env(k, &v))
        {
            self.agent.max_tokens = n;
        }

        if let Some(team_id) = var("HOLISTIC_AI_TEAM_ID") {
            self.gateway.holistic.team_id = team_id;
        }
        if let Some(token) = var("HOLISTIC_AI_API_TOKEN") {
            self.gateway.holistic.api_token = token;
        }
        if let Some(endpoint) = var("HOLISTIC_AI_API_ENDPOINT") {
            self.gateway.holistic.api_endpoint = endpoint;
        }
        if let Some(key) = var("OPENAI_API_KEY") {
            self.gateway.openai.api_key = key;
        }
        if let Some(base) = var("OPENAI_API_BASE") {
            self.gateway.openai.api_base = Some(base);
        }
        if let Some(base) = var("OLLAMA_BASE_URL") {
            self.gateway.ollama.base_url = base;
        }
        if let Some(key) = var("VALYU_API_KEY") {
            self.toolkit.valyu.api_key = key;
        }
    }

    /// Apply the explicit override layer
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(model) = &overrides.model {
            self.agent.model = model.clone();
        }
        if let Some(prompt) = &overrides.system_prompt {
            self.agent.system_prompt = Some(prompt.clone());
        }
        if let Some(steps) = overrides.max_steps {
            self.agent.max_steps = steps;
        }
        if let Some(structured) = overrides.structured_output {
            self.agent.structured_output = structured;
        }
        if let Some(tools) = overrides.supports_tools {
            self.agent.supports_tools = Some(tools);
        }
    }

    /// Valyu API key, if any
    pub fn valyu_api_key(&self) -> Option<String> {
        let key = &self.toolkit.valyu.api_key;
        if key.is_empty() {
            None
        } else {
            Some(key.clone())
        }
    }

    /// OpenAI API key, if any
    pub fn openai_api_key(&self) -> Option<String> {
        let key = &self.gateway.openai.api_key;
        if key.is_empty() {
            None
        } else {
            Some(key.clone())
        }
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Option<T> {
    match value.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Ignoring {}: cannot parse {:?}", key, value);
            None
        }
    }
}

/// Write a default config file if none exists
pub async fn init() -> Result<Config> {
    let path = config_path();

    if path.exists() {
        warn!("Config already exists at {:?}", path);
    } else {
        Config::default().save_to(&path).await?;
        info!("Config written to {:?}", path);
    }

    Config::load_from(&path).await
}
