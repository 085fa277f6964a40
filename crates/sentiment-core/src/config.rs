// Configuration loading and validation (config/sentiment.toml).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::model::DEFAULT_MODEL;

/// File name of the configuration inside `config/` and `defaults/`.
pub const CONFIG_FILE: &str = "sentiment.toml";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// sentiment.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub lexicon: LexiconConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Which pretrained model artifact to load.
    #[serde(default = "default_identifier")]
    pub identifier: String,
    #[serde(default = "default_inference_timeout_ms")]
    pub inference_timeout_ms: u64,
    #[serde(default = "default_retry_on_timeout")]
    pub retry_on_timeout: bool,
    #[serde(default = "default_max_input_chars")]
    pub max_input_chars: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        ModelConfig {
            identifier: default_identifier(),
            inference_timeout_ms: default_inference_timeout_ms(),
            retry_on_timeout: default_retry_on_timeout(),
            max_input_chars: default_max_input_chars(),
        }
    }
}

fn default_identifier() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_inference_timeout_ms() -> u64 {
    10_000
}

fn default_retry_on_timeout() -> bool {
    true
}

fn default_max_input_chars() -> usize {
    512
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LexiconConfig {
    /// Optional override of the bundled lexicon. Relative paths resolve
    /// against the working directory.
    #[serde(default)]
    pub data_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate `config/sentiment.toml` relative to `base_dir`.
///
/// Does not copy defaults; prefer `load_config()` for application startup.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = std::fs::read_to_string(&path).map_err(|_| ConfigError::FileNotFound {
        path: path.clone(),
    })?;
    let config: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    let mut copied = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }

        let target = config_dir.join(file_name);
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Loads config relative to the current working directory, copying default
/// files into `config/` first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.model.identifier.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "model.identifier".into(),
            message: "must not be empty".into(),
        });
    }

    if config.model.inference_timeout_ms == 0 {
        return Err(ConfigError::ValidationError {
            field: "model.inference_timeout_ms".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.model.max_input_chars == 0 {
        return Err(ConfigError::ValidationError {
            field: "model.max_input_chars".into(),
            message: "must be greater than 0".into(),
        });
    }

    if let Some(path) = &config.lexicon.data_path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationError {
                field: "lexicon.data_path".into(),
                message: "must not be empty when set".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
