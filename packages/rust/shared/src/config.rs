//! Application configuration for askctx.
//!
//! User config lives at `~/.askctx/askctx.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::credential::DEFAULT_API_KEY_ENV;
use crate::error::{AskCtxError, Result};
use crate::types::InteractionMode;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "askctx.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".askctx";

// ---------------------------------------------------------------------------
// Config structs (matching askctx.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Per-run defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Language-model backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Remote source acquisition settings.
    #[serde(default)]
    pub source: SourceConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Interaction mode when `--mode` is not given.
    #[serde(default = "default_mode")]
    pub mode: InteractionMode,

    /// File extensions (without the dot) selected for the corpus. Empty = all files.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Regex patterns; files whose relative path matches any are skipped.
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    /// Upper bound on corpus size in bytes (0 = unbounded).
    #[serde(default = "default_max_corpus_bytes")]
    pub max_corpus_bytes: u64,

    /// Overall deadline for a run in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_secs: Option<u64>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            extensions: default_extensions(),
            exclude_patterns: Vec::new(),
            max_corpus_bytes: default_max_corpus_bytes(),
            deadline_secs: None,
        }
    }
}

fn default_mode() -> InteractionMode {
    InteractionMode::ChatCompletion
}
fn default_extensions() -> Vec<String> {
    vec!["go".into()]
}
fn default_max_corpus_bytes() -> u64 {
    1024 * 1024
}

/// `[backend]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for raw completions.
    #[serde(default = "default_completion_model")]
    pub completion_model: String,

    /// Model used for chat completions.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used for embeddings.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Completion token cap sent with raw completion requests.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            completion_model: default_completion_model(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            timeout_secs: default_timeout_secs(),
            max_tokens: None,
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.into()
}
fn default_completion_model() -> String {
    "gpt-3.5-turbo-instruct".into()
}
fn default_chat_model() -> String {
    "gpt-3.5-turbo".into()
}
fn default_embedding_model() -> String {
    "text-embedding-ada-002".into()
}
fn default_timeout_secs() -> u64 {
    120
}

/// `[source]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Git executable used for remote clones.
    #[serde(default = "default_git_program")]
    pub git_program: String,

    /// Shallow-clone depth; a full clone when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_depth: Option<u32>,

    /// Parent directory for ephemeral workspaces (system temp dir when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace_parent: Option<PathBuf>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            git_program: default_git_program(),
            clone_depth: None,
            workspace_parent: None,
        }
    }
}

fn default_git_program() -> String {
    "git".into()
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.askctx/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| AskCtxError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.askctx/askctx.toml`).
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
    let content = std::fs::read_to_string(path).map_err(|e| AskCtxError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content)
        .map_err(|e| AskCtxError::config(format!("failed to parse {}: {e}", path.display())))?;

    validate(&config)?;
    Ok(config)
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| AskCtxError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| AskCtxError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| AskCtxError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

fn validate(config: &AppConfig) -> Result<()> {
    url::Url::parse(&config.backend.base_url).map_err(|e| {
        AskCtxError::config(format!(
            "backend.base_url '{}' is not a valid URL: {e}",
            config.backend.base_url
        ))
    })?;

    if config.backend.api_key_env.is_empty() {
        return Err(AskCtxError::config("backend.api_key_env must not be empty"));
    }

    Ok(())
}
