//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.modista/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::autosave::AUTOSAVE_INTERVAL;
use crate::core::storage::FileStorage;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ModistaConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct BackendConfig {
    pub base_url: Option<String>,
    /// Pre-filled in the login form.
    pub username: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UiConfig {
    pub sidebar_open: Option<bool>,
    pub autosave_interval_secs: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub username: Option<String>,
    /// None when no home directory could be found; persistence is then disabled.
    pub storage_dir: Option<PathBuf>,
    pub sidebar_open: bool,
    pub autosave_interval: Duration,
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

/// Returns the path to `~/.modista/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".modista").join("config.toml"))
}

/// Load config from `~/.modista/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `ModistaConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<ModistaConfig, ConfigError> {
    let Some(path) = config_path() else {
        warn!("Could not determine home directory, using default config");
        return Ok(ModistaConfig::default());
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<ModistaConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(ModistaConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: ModistaConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: {:?}", config);
    Ok(config)
}

const DEFAULT_CONFIG: &str = r#"# Modista Configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [backend]
# base_url = "http://localhost:8000"   # Or set MODISTA_BASE_URL
# username = "shopper"                 # Pre-fills the login form (MODISTA_USERNAME)

# [storage]
# dir = "/home/me/.modista/storage"    # Saved conversations and tokens

# [ui]
# sidebar_open = true
# autosave_interval_secs = 30
"#;

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, DEFAULT_CONFIG) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
///
/// `cli_base_url` and `cli_username` are from CLI flags (None = not specified).
pub fn resolve(
    config: &ModistaConfig,
    cli_base_url: Option<&str>,
    cli_username: Option<&str>,
) -> ResolvedConfig {
    resolve_with_env(config, cli_base_url, cli_username, |key| std::env::var(key).ok())
}

fn resolve_with_env(
    config: &ModistaConfig,
    cli_base_url: Option<&str>,
    cli_username: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Base URL: CLI → env → config → default
    let base_url = cli_base_url
        .map(str::to_string)
        .or_else(|| env("MODISTA_BASE_URL"))
        .or_else(|| config.backend.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let username = cli_username
        .map(str::to_string)
        .or_else(|| env("MODISTA_USERNAME"))
        .or_else(|| config.backend.username.clone());

    let storage_dir = config.storage.dir.clone().or_else(FileStorage::default_dir);

    let autosave_interval = config
        .ui
        .autosave_interval_secs
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or(AUTOSAVE_INTERVAL);

    ResolvedConfig {
        base_url,
        username,
        storage_dir,
        sidebar_open: config.ui.sidebar_open.unwrap_or(true),
        autosave_interval,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_resolve_uses_defaults_when_empty() {
        let resolved = resolve_with_env(&ModistaConfig::default(), None, None, no_env);
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
        assert_eq!(resolved.username, None);
        assert!(resolved.sidebar_open);
        assert_eq!(resolved.autosave_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_resolve_config_values_override_defaults() {
        let config = ModistaConfig {
            backend: BackendConfig {
                base_url: Some("http://shop.internal:9000".to_string()),
                username: Some("ana".to_string()),
            },
            storage: StorageConfig {
                dir: Some(PathBuf::from("/tmp/modista-store")),
            },
            ui: UiConfig {
                sidebar_open: Some(false),
                autosave_interval_secs: Some(5),
            },
        };
        let resolved = resolve_with_env(&config, None, None, no_env);
        assert_eq!(resolved.base_url, "http://shop.internal:9000");
        assert_eq!(resolved.username.as_deref(), Some("ana"));
        assert_eq!(resolved.storage_dir, Some(PathBuf::from("/tmp/modista-store")));
        assert!(!resolved.sidebar_open);
        assert_eq!(resolved.autosave_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_env_beats_config_and_cli_beats_env() {
        let config = ModistaConfig {
            backend: BackendConfig {
                base_url: Some("http://from-config".to_string()),
                username: Some("config-user".to_string()),
            },
            ..Default::default()
        };
        let env = |key: &str| match key {
            "MODISTA_BASE_URL" => Some("http://from-env".to_string()),
            "MODISTA_USERNAME" => Some("env-user".to_string()),
            _ => None,
        };

        let resolved = resolve_with_env(&config, None, None, env);
        assert_eq!(resolved.base_url, "http://from-env");
        assert_eq!(resolved.username.as_deref(), Some("env-user"));

        let resolved = resolve_with_env(&config, Some("http://from-cli"), Some("cli-user"), env);
        assert_eq!(resolved.base_url, "http://from-cli");
        assert_eq!(resolved.username.as_deref(), Some("cli-user"));
    }

    #[test]
    fn test_zero_autosave_interval_falls_back() {
        let config = ModistaConfig {
            ui: UiConfig {
                autosave_interval_secs: Some(0),
                ..Default::default()
            },
            ..Default::default()
        };
        let resolved = resolve_with_env(&config, None, None, no_env);
        assert_eq!(resolved.autosave_interval, AUTOSAVE_INTERVAL);
    }

    #[test]
    fn test_sparse_toml_parses() {
        let config: ModistaConfig = toml::from_str("[ui]\nsidebar_open = false\n").unwrap();
        assert_eq!(config.ui.sidebar_open, Some(false));
        assert!(config.backend.base_url.is_none());
        assert!(config.storage.dir.is_none());
    }

    #[test]
    fn test_generated_default_is_valid_toml() {
        let config: ModistaConfig = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert!(config.backend.base_url.is_none());
    }

    #[test]
    fn test_missing_file_is_generated() {
        let dir = std::env::temp_dir().join(format!("modista-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");

        let config = load_config_from(&path).unwrap();
        assert!(config.ui.sidebar_open.is_none());
        assert!(path.exists());

        fs::write(&path, "[backend]\nbase_url = 7\n").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Parse(_))));

        let _ = fs::remove_dir_all(dir);
    }
}
