//! TOML-based configuration for NeuronLink.
//!
//! Supports a config file (neuronlink.toml) with environment variable
//! expansion.
//!
//! Example configuration:
//! ```toml
//! [source]
//! url = "https://demo.example.co"
//! anon_key = "${NEURONLINK_SOURCE_KEY}"
//!
//! [ai]
//! base_url = "https://integrate.api.example.com/v1"
//! api_key = "${NEURONLINK_AI_KEY}"
//! model = "meta/llama-3.1-70b-instruct"
//!
//! [catalog]
//! path = "./reference_catalog.json"
//! ```

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::connection::SourceCredentials;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Top-level settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Data-source connection.
    pub source: Option<SourceSettings>,
    /// AI description-generator endpoint.
    pub ai: Option<AiSettings>,
    /// Reference-catalog override.
    pub catalog: Option<CatalogSettings>,
}

/// Data-source section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceSettings {
    /// Base URL of the data source.
    pub url: String,
    /// API key; supports `${VAR}` expansion.
    pub anon_key: String,
}

/// AI endpoint section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AiSettings {
    /// Chat-completions base URL.
    pub base_url: String,
    /// API key; supports `${VAR}` expansion.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
}

/// Reference-catalog section.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogSettings {
    /// Path to a JSON catalog replacing the built-in one.
    pub path: String,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `NEURONLINK_CONFIG`
    /// 2. `./neuronlink.toml`
    ///
    /// Returns defaults when no config file is found.
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("NEURONLINK_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("neuronlink.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        Ok(Settings::default())
    }

    /// Resolve source credentials from the `[source]` section, expanding
    /// environment variables in the key.
    pub fn source_credentials(&self) -> Result<Option<SourceCredentials>, SettingsError> {
        match &self.source {
            Some(source) => {
                let url = expand_env_vars(&source.url)?;
                let anon_key = expand_env_vars(&source.anon_key)?;
                Ok(Some(SourceCredentials::new(url, anon_key)))
            }
            None => Ok(None),
        }
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' {
            if chars.peek() == Some(&'{') {
                chars.next();
                let mut var_name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch == '}' {
                        chars.next();
                        break;
                    }
                    var_name.push(ch);
                    chars.next();
                }
                let value = env::var(&var_name)
                    .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                result.push_str(&value);
            } else {
                let mut var_name = String::new();
                while let Some(&ch) = chars.peek() {
                    if ch.is_alphanumeric() || ch == '_' {
                        var_name.push(ch);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if var_name.is_empty() {
                    result.push('$');
                } else {
                    let value = env::var(&var_name)
                        .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                    result.push_str(&value);
                }
            }
        } else {
            result.push(c);
        }
    }

    Ok(result)
}
