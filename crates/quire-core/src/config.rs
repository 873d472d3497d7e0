//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/quire/config.toml)
//! 3. Environment variables (QUIRE_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
const ENV_PREFIX: &str = "QUIRE";

/// Keys accepted by [`Config::set_value`]
pub const CONFIG_KEYS: &[&str] = &[
    "content_dir",
    "upload_dir",
    "upload_url_prefix",
    "admin_identity",
    "log_file",
];

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding one record file per article
    #[serde(default = "default_content_dir")]
    pub content_dir: PathBuf,

    /// Directory uploaded images are written to
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// URL prefix under which the site serves `upload_dir`
    #[serde(default = "default_upload_url_prefix")]
    pub upload_url_prefix: String,

    /// The one identity allowed to mutate content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_identity: Option<String>,

    /// Write logs here instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            upload_dir: default_upload_dir(),
            upload_url_prefix: default_upload_url_prefix(),
            admin_identity: None,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (QUIRE_CONTENT_DIR, QUIRE_ADMIN, ...)
    /// 2. Config file (~/.config/quire/config.toml or QUIRE_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(config_path: Option<&PathBuf>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_CONTENT_DIR", ENV_PREFIX)) {
            self.content_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_UPLOAD_DIR", ENV_PREFIX)) {
            self.upload_dir = PathBuf::from(val);
        }

        if let Ok(val) = std::env::var(format!("{}_UPLOAD_URL_PREFIX", ENV_PREFIX)) {
            self.upload_url_prefix = val;
        }

        // Empty clears it
        if let Ok(val) = std::env::var(format!("{}_ADMIN", ENV_PREFIX)) {
            self.admin_identity = if val.trim().is_empty() {
                None
            } else {
                Some(val)
            };
        }

        if let Ok(val) = std::env::var(format!("{}_LOG_FILE", ENV_PREFIX)) {
            self.log_file = if val.is_empty() {
                None
            } else {
                Some(PathBuf::from(val))
            };
        }
    }

    /// Set one configuration key from its string form
    ///
    /// `none` or an empty value unsets optional keys.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let unset = value.is_empty() || value == "none";
        match key {
            "content_dir" | "upload_dir" if value.is_empty() => {
                bail!("{} cannot be empty", key);
            }
            "content_dir" => self.content_dir = value.into(),
            "upload_dir" => self.upload_dir = value.into(),
            "upload_url_prefix" => {
                if !value.is_empty() && !value.starts_with('/') && !value.contains("://") {
                    bail!("upload_url_prefix must be an absolute path or a full URL");
                }
                self.upload_url_prefix = value.to_string();
            }
            "admin_identity" => {
                self.admin_identity = (!unset).then(|| value.to_string());
            }
            "log_file" => {
                self.log_file = (!unset).then(|| value.into());
            }
            _ => {
                bail!(
                    "Unknown configuration key: '{}'\nValid keys: {}",
                    key,
                    CONFIG_KEYS.join(", ")
                );
            }
        }
        Ok(())
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific file
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with QUIRE_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quire")
            .join("config.toml")
    }
}

fn data_root() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("quire")
}

fn default_content_dir() -> PathBuf {
    data_root().join("blog")
}

fn default_upload_dir() -> PathBuf {
    data_root().join("uploads")
}

fn default_upload_url_prefix() -> String {
    "/uploads".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "QUIRE_CONTENT_DIR",
        "QUIRE_UPLOAD_DIR",
        "QUIRE_UPLOAD_URL_PREFIX",
        "QUIRE_ADMIN",
        "QUIRE_LOG_FILE",
        "QUIRE_CONFIG",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.content_dir.ends_with("quire/blog"));
        assert!(config.upload_dir.ends_with("quire/uploads"));
        assert_eq!(config.upload_url_prefix, "/uploads");
        assert!(config.admin_identity.is_none());
        assert!(config.log_file.is_none());
    }

    #[test]
    fn test_env_override_dirs() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("QUIRE_CONTENT_DIR", "/tmp/quire-test/blog");
        env::set_var("QUIRE_UPLOAD_DIR", "/tmp/quire-test/uploads");
        env::set_var("QUIRE_UPLOAD_URL_PREFIX", "/static/img");
        config.apply_env_overrides();

        assert_eq!(config.content_dir, PathBuf::from("/tmp/quire-test/blog"));
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/quire-test/uploads"));
        assert_eq!(config.upload_url_prefix, "/static/img");
    }

    #[test]
    fn test_env_override_admin() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("QUIRE_ADMIN", "me@example.com");
        config.apply_env_overrides();
        assert_eq!(config.admin_identity.as_deref(), Some("me@example.com"));

        // Empty string clears it
        env::set_var("QUIRE_ADMIN", "");
        config.apply_env_overrides();
        assert!(config.admin_identity.is_none());
    }

    #[test]
    fn test_serialization() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config {
            content_dir: PathBuf::from("/srv/blog"),
            upload_dir: PathBuf::from("/srv/public/uploads"),
            upload_url_prefix: "/uploads".to_string(),
            admin_identity: Some("me@example.com".to_string()),
            log_file: None,
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("content_dir"));
        assert!(toml_str.contains("admin_identity"));
        assert!(!toml_str.contains("log_file"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_from_str() {
        let _guard = EnvGuard::new(ENV_VARS);

        let toml = r#"
            content_dir = "/custom/blog"
            admin_identity = "admin@example.com"
        "#;

        let config = Config::load_from_str(toml).unwrap();
        assert_eq!(config.content_dir, PathBuf::from("/custom/blog"));
        assert_eq!(config.admin_identity.as_deref(), Some("admin@example.com"));
        // Unset fields fall back to defaults
        assert_eq!(config.upload_url_prefix, "/uploads");
    }

    #[test]
    fn test_load_from_str_invalid() {
        let _guard = EnvGuard::new(ENV_VARS);
        assert!(Config::load_from_str("content_dir = [").is_err());
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);

        let path = PathBuf::from("/nonexistent/config.toml");
        let config = Config::load_from_path(&path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_reload() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.set_value("admin_identity", "me@example.com").unwrap();
        config.set_value("content_dir", "/srv/blog").unwrap();
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_with_cli_override(Some(&path)).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_set_value() {
        let mut config = Config::default();

        config.set_value("log_file", "/tmp/quire.log").unwrap();
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/quire.log")));
        config.set_value("log_file", "none").unwrap();
        assert!(config.log_file.is_none());

        config
            .set_value("upload_url_prefix", "https://cdn.example.com/u")
            .unwrap();
        assert!(config.set_value("upload_url_prefix", "uploads").is_err());

        assert!(config.set_value("content_dir", "").is_err());
        let err = config.set_value("colour", "blue").unwrap_err();
        assert!(err.to_string().contains("Valid keys"));
    }

    #[test]
    fn test_config_file_path_override() {
        let _guard = EnvGuard::new(ENV_VARS);
        env::set_var("QUIRE_CONFIG", "/etc/quire.toml");
        assert_eq!(Config::config_file_path(), PathBuf::from("/etc/quire.toml"));
    }
}
