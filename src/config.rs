//! TOML configuration parsing.
//!
//! Every section is optional. When the default config path does not exist
//! the built-in defaults are used, so `orius scan photo.jpg` works with only
//! `GEMINI_API_KEY` set.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Path used when `--config` is not given.
pub const DEFAULT_CONFIG_PATH: &str = "./config/orius.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Name of the environment variable that holds the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_model_name() -> String {
    "gemini-2.5-flash".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct UploadConfig {
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: usize,
    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            allowed_mime_types: default_allowed_mime_types(),
        }
    }
}

fn default_max_file_bytes() -> usize {
    20 * 1024 * 1024
}

fn default_allowed_mime_types() -> Vec<String> {
    vec![
        "image/png".to_string(),
        "image/jpeg".to_string(),
        "image/webp".to_string(),
        "application/pdf".to_string(),
    ]
}

/// Loads and validates the configuration file.
///
/// A missing file at [`DEFAULT_CONFIG_PATH`] falls back to
/// [`Config::default`]; a missing file anywhere else is an error.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() && path == Path::new(DEFAULT_CONFIG_PATH) {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

/// Parses and validates configuration from a TOML string.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.model.name.trim().is_empty() {
        anyhow::bail!("model.name must not be empty");
    }
    if config.model.timeout_secs == 0 {
        anyhow::bail!("model.timeout_secs must be > 0");
    }
    if config.upload.max_file_bytes == 0 {
        anyhow::bail!("upload.max_file_bytes must be > 0");
    }
    if config.upload.allowed_mime_types.is_empty() {
        anyhow::bail!("upload.allowed_mime_types must list at least one type");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = parse_config("").unwrap();
        assert_eq!(cfg.model.name, "gemini-2.5-flash");
        assert_eq!(cfg.model.api_key_env, "GEMINI_API_KEY");
        assert_eq!(cfg.server.bind, "127.0.0.1:8080");
        assert_eq!(cfg.upload.allowed_mime_types.len(), 4);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = parse_config(
            r#"
[model]
name = "gemini-2.0-flash"

[upload]
max_file_bytes = 1024
"#,
        )
        .unwrap();
        assert_eq!(cfg.model.name, "gemini-2.0-flash");
        assert_eq!(cfg.model.timeout_secs, 60);
        assert_eq!(cfg.upload.max_file_bytes, 1024);
        assert!(cfg
            .upload
            .allowed_mime_types
            .contains(&"application/pdf".to_string()));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = parse_config("[model]\ntimeout_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }

    #[test]
    fn rejects_empty_mime_list() {
        let err = parse_config("[upload]\nallowed_mime_types = []\n").unwrap_err();
        assert!(err.to_string().contains("allowed_mime_types"));
    }

    #[test]
    fn example_config_parses() {
        let cfg = parse_config(include_str!("../config/orius.example.toml")).unwrap();
        assert_eq!(cfg.upload.max_file_bytes, 20 * 1024 * 1024);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let err = load_config(Path::new("/nonexistent/orius.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
