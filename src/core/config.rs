//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.strawberry-detect/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::ClientConfig;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DetectConfig {
    #[serde(default)]
    pub api: ApiSection,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiSection {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_TIMEOUT_SECS: u64 = 150;

pub const ENV_BASE_URL: &str = "DETECT_API_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "DETECT_API_TIMEOUT_SECS";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl ResolvedConfig {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.base_url.clone()).with_timeout(self.timeout)
    }
}

/// Values given on the command line. `None` means not specified.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.strawberry-detect/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".strawberry-detect").join("config.toml"))
}

/// Load config from `~/.strawberry-detect/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `DetectConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<DetectConfig, ConfigError> {
    let path = match config_path() {
        Some(p) => p,
        None => {
            warn!("Could not determine home directory, using default config");
            return Ok(DetectConfig::default());
        }
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<DetectConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(DetectConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: DetectConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# strawberry-detect configuration
# All settings are optional; defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [api]
# base_url = "http://localhost:8000/api"   # Or set DETECT_API_BASE_URL
# timeout_secs = 150                       # Or set DETECT_API_TIMEOUT_SECS
"#;

    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            warn!("Failed to create config directory: {}", e);
            return;
        }
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &DetectConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

/// Same as [`resolve`], reading environment variables through `env`.
pub fn resolve_with_env(
    config: &DetectConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Base URL: CLI → env → config → default
    let base_url = cli
        .base_url
        .clone()
        .or_else(|| env(ENV_BASE_URL))
        .or_else(|| config.api.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    // Timeout: CLI → env → config → default. Unparseable or zero values are skipped.
    let env_timeout = env(ENV_TIMEOUT_SECS).and_then(|raw| match raw.trim().parse::<u64>() {
        Ok(0) => {
            warn!("Ignoring {}=0: timeout must be at least one second", ENV_TIMEOUT_SECS);
            None
        }
        Ok(secs) => Some(secs),
        Err(e) => {
            warn!("Ignoring {}={:?}: {}", ENV_TIMEOUT_SECS, raw, e);
            None
        }
    });
    let file_timeout = config.api.timeout_secs.filter(|secs| *secs > 0);
    let timeout_secs = cli
        .timeout_secs
        .or(env_timeout)
        .or(file_timeout)
        .unwrap_or(DEFAULT_TIMEOUT_SECS);

    ResolvedConfig {
        base_url,
        timeout: Duration::from_secs(timeout_secs),
    }
}
