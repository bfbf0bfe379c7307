//! Application configuration for Atlas.
//!
//! User config lives at `~/.atlas/atlas.toml`.
//! CLI flags override config file values, which override defaults.
//! Secrets are never stored in the file — only the names of the env vars
//! that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AtlasError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "atlas.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".atlas";

// ---------------------------------------------------------------------------
// Config structs (matching atlas.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// OpenAI-compatible chat API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Notion API settings.
    #[serde(default)]
    pub notion: NotionConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Directory where stage files (sections, summaries, blocks) are written.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,

    /// Nominal section window in seconds.
    #[serde(default = "default_section_window_secs")]
    pub section_window_secs: f64,

    /// Maximum number of topics to research per video.
    #[serde(default = "default_max_topics")]
    pub max_topics: usize,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            section_window_secs: default_section_window_secs(),
            max_topics: default_max_topics(),
        }
    }
}

fn default_output_dir() -> String {
    "transcript_files".into()
}
fn default_section_window_secs() -> f64 {
    300.0
}
fn default_max_topics() -> usize {
    5
}

/// `[openai]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_openai_key_env")]
    pub api_key_env: String,

    /// Default model to use for the summarizer/formatter/research agents.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Base URL of the OpenAI-compatible chat completions API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_openai_key_env(),
            default_model: default_model(),
            api_base: default_api_base(),
        }
    }
}

fn default_openai_key_env() -> String {
    "OPENAI_API_KEY".into()
}
fn default_model() -> String {
    "gpt-4o".into()
}
fn default_api_base() -> String {
    "https://api.openai.com/v1".into()
}

/// `[notion]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    /// Name of the env var holding the Notion integration token.
    #[serde(default = "default_notion_token_env")]
    pub token_env: String,

    /// Name of the env var holding the parent page id for created pages.
    #[serde(default = "default_notion_parent_env")]
    pub parent_page_env: String,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            token_env: default_notion_token_env(),
            parent_page_env: default_notion_parent_env(),
        }
    }
}

fn default_notion_token_env() -> String {
    "NOTION_TOKEN".into()
}
fn default_notion_parent_env() -> String {
    "NOTION_PARENT_PAGE_ID".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.atlas/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AtlasError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.atlas/atlas.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AtlasError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| AtlasError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| AtlasError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| AtlasError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| AtlasError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Resolve a secret from the env var named by `var_name`.
///
/// Returns a config error naming the variable when it is unset or empty, so
/// callers get an actionable message instead of a bare lookup failure.
pub fn resolve_secret(var_name: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.trim().is_empty() => Ok(val.trim().to_string()),
        _ => Err(AtlasError::config(format!(
            "secret not found. Set the {var_name} environment variable."
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("output_dir"));
        assert!(toml_str.contains("OPENAI_API_KEY"));
        assert!(toml_str.contains("NOTION_TOKEN"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.section_window_secs, 300.0);
        assert_eq!(parsed.defaults.max_topics, 5);
        assert_eq!(parsed.openai.default_model, "gpt-4o");
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[defaults]
output_dir = "/tmp/atlas-out"
section_window_secs = 120.0
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.defaults.output_dir, "/tmp/atlas-out");
        assert_eq!(config.defaults.section_window_secs, 120.0);
        assert_eq!(config.defaults.max_topics, 5);
        assert_eq!(config.notion.token_env, "NOTION_TOKEN");
    }

    #[test]
    fn secret_resolution_failure_names_the_var() {
        // Use a unique env var name to avoid interfering with other tests
        let result = resolve_secret("ATLAS_TEST_NONEXISTENT_KEY_12345");
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("ATLAS_TEST_NONEXISTENT_KEY_12345")
        );
    }
}
