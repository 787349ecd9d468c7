//! Configuration management for mindflow.
//!
//! Configuration is loaded from `~/.config/mindflow/config.toml`, which the
//! first `mf auth` writes with defaults. The auth token lives next to it in a
//! plain text `token` file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend configuration.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Sampling settings sent with every request.
    #[serde(default)]
    pub generation: Generation,
    /// Size and time bounds.
    #[serde(default)]
    pub limits: Limits,
}

/// Backend configuration for the completion service.
///
/// The credential is never stored here; it comes from the token store.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// OpenAI-compatible chat completions API.
    OpenAI {
        /// Model name (default: gpt-4o-mini).
        #[serde(default = "default_openai_model")]
        model: String,
        /// Endpoint override for compatible services.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },
    /// Anthropic Claude API.
    Anthropic {
        /// Model name (default: claude-3-5-haiku-latest).
        #[serde(default = "default_anthropic_model")]
        model: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::OpenAI {
            model: default_openai_model(),
            endpoint: None,
        }
    }
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_anthropic_model() -> String {
    "claude-3-5-haiku-latest".to_string()
}

/// Sampling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Generation {
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

impl Default for Generation {
    fn default() -> Self {
        Self {
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
        }
    }
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_temperature() -> f32 {
    0.2
}

/// Bounds applied to prompts, references and outbound requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Limits {
    /// Longest prompt, in characters, that will be sent or printed.
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
    /// Largest single file read while resolving references.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Timeout for every outbound HTTP request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_prompt_chars: default_max_prompt_chars(),
            max_file_bytes: default_max_file_bytes(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_max_prompt_chars() -> usize {
    100_000
}

fn default_max_file_bytes() -> u64 {
    1024 * 1024
}

fn default_timeout_secs() -> u64 {
    60
}

impl Config {
    /// Get the config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("mindflow"))
            .context("Could not determine config directory")
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the path of the plain text token file.
    pub fn token_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("token"))
    }

    /// Load configuration from `path`, using defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`, creating its directory.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Get the backend type as a string.
    pub fn backend_type(&self) -> &'static str {
        match &self.backend {
            BackendConfig::OpenAI { .. } => "openai",
            BackendConfig::Anthropic { .. } => "anthropic",
        }
    }

    /// Get the model name.
    pub fn model_name(&self) -> &str {
        match &self.backend {
            BackendConfig::OpenAI { model, .. } => model,
            BackendConfig::Anthropic { model, .. } => model,
        }
    }
}
