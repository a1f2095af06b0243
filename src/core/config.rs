//! Configuration management for bob
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/bob/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{BobError, Result};

/// Main configuration for bob
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Provider adapter configuration
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Agent loop configuration
    #[serde(default)]
    pub agent: AgentConfig,
    /// Subagent configuration
    #[serde(default)]
    pub subagents: SubagentConfig,
    /// Tool configuration
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// OpenAI-compatible endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Base URL of the chat completions API
    pub base_url: String,
    /// API key (usually taken from OPENAI_API_KEY)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model identifier
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens to generate per call
    pub max_tokens: u32,
}

/// Agent loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum model calls per run
    /// Default: 10
    pub max_iterations: usize,
    /// System prompt override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    /// Whether to show debug output
    pub debug: bool,
}

/// Subagent limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubagentConfig {
    /// Iteration bound of the explore subagent
    pub explore_max_iterations: usize,
    /// Iteration bound of the plan subagent
    pub plan_max_iterations: usize,
    /// Shell timeout inside the explore subagent
    pub explore_shell_timeout_secs: u64,
}

/// Tool configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Shell command timeout for the top-level agent
    pub shell_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: env::var("BOB_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: env::var("OPENAI_API_KEY").ok(),
            model: env::var("BOB_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            timeout_secs: 120,
            temperature: 0.7,
            max_tokens: 4096,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            system_prompt: None,
            debug: env::var("BOB_DEBUG")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

impl Default for SubagentConfig {
    fn default() -> Self {
        Self {
            explore_max_iterations: 5,
            plan_max_iterations: 15,
            explore_shell_timeout_secs: 10,
        }
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            shell_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("bob")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > config file > env vars > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        match Self::load_from_file() {
            Ok(mut config) => {
                // Keys are secrets; keep them out of the file when possible
                if config.provider.api_key.is_none() {
                    config.provider.api_key = env::var("OPENAI_API_KEY").ok();
                }
                config
            }
            Err(e) => {
                tracing::debug!(error = %e, "using default configuration");
                Self::default()
            }
        }
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(BobError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| BobError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| BobError::config(format!("Failed to parse config: {}", e)))
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<PathBuf> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)
                .map_err(|e| BobError::config(format!("Failed to create config dir: {}", e)))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| BobError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| BobError::config(format!("Failed to write config: {}", e)))?;

        Ok(config_path)
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        toml::to_string_pretty(&Config::default())
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}
