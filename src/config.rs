//! Runtime configuration loaded from `pyhandle.toml`

use crate::errors::{ErrorKind, PyError, PyResult};
use crate::logging::{parse_level, LogConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// File name looked up by `RuntimeConfig::discover`
pub const CONFIG_FILE: &str = "pyhandle.toml";

#[cfg(windows)]
const PATH_DELIMITER: char = ';';
#[cfg(not(windows))]
const PATH_DELIMITER: char = ':';

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default = "default_true")]
    pub install_signal_handlers: bool,

    /// Module search path; empty keeps the interpreter default
    #[serde(default)]
    pub search_path: Vec<String>,

    /// Modules imported right after start-up
    #[serde(default)]
    pub preload: Vec<String>,

    #[serde(default)]
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSettings {
    #[serde(default = "default_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,

    #[serde(default)]
    pub file: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            install_signal_handlers: true,
            search_path: Vec::new(),
            preload: Vec::new(),
            log: LogSettings::default(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
            file: None,
        }
    }
}

fn default_true() -> bool { true }
fn default_level() -> String { "info".to_string() }

fn config_error(reason: String) -> PyError {
    PyError::new(ErrorKind::Config(reason))
}

impl RuntimeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> PyResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| config_error(format!("Failed to read {}: {}", path.display(), e)))?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML string
    pub fn parse(content: &str) -> PyResult<Self> {
        toml::from_str(content).map_err(|e| config_error(format!("Failed to parse config: {}", e)))
    }

    /// Find `pyhandle.toml` in the current directory or its parents
    pub fn discover() -> Self {
        let mut current = std::env::current_dir().ok();

        while let Some(dir) = current {
            let config_path = dir.join(CONFIG_FILE);
            if config_path.exists() {
                if let Ok(config) = Self::load(&config_path) {
                    return config;
                }
            }
            current = dir.parent().map(|p| p.to_path_buf());
        }

        Self::default()
    }

    /// Generate default configuration file content
    pub fn generate_default() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate config"))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> PyResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| config_error(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, content)
            .map_err(|e| config_error(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// Search path joined with the platform delimiter, if one is configured
    pub fn joined_search_path(&self) -> Option<String> {
        if self.search_path.is_empty() {
            return None;
        }
        Some(self.search_path.join(&PATH_DELIMITER.to_string()))
    }

    pub fn to_log_config(&self) -> LogConfig {
        LogConfig {
            level: parse_level(&self.log.level),
            file_output: self.log.file.is_some(),
            log_path: self.log.file.clone(),
            json_format: self.log.json,
            show_spans: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn test_default_config() {
        let config = RuntimeConfig::default();
        assert!(config.install_signal_handlers);
        assert!(config.search_path.is_empty());
        assert_eq!(config.log.level, "info");
        assert_eq!(config.joined_search_path(), None);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
install_signal_handlers = false
search_path = ["/opt/lib", "/opt/site"]
preload = ["json"]

[log]
level = "debug"
json = true
"#;

        let config = RuntimeConfig::parse(toml).unwrap();
        assert!(!config.install_signal_handlers);
        assert_eq!(config.preload, vec!["json".to_string()]);
        assert_eq!(
            config.joined_search_path().unwrap(),
            format!("/opt/lib{}/opt/site", PATH_DELIMITER)
        );

        let log = config.to_log_config();
        assert_eq!(log.level, Level::DEBUG);
        assert!(log.json_format);
        assert!(!log.file_output);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = RuntimeConfig::parse("preload = [\"os\"]").unwrap();
        assert!(config.install_signal_handlers);
        assert_eq!(config.log, LogSettings::default());
    }

    #[test]
    fn test_parse_error() {
        let err = RuntimeConfig::parse("install_signal_handlers = \"maybe\"").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Config(_)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let mut config = RuntimeConfig::default();
        config.preload.push("math".to_string());
        config.log.file = Some("run.log".to_string());
        config.save(&path).unwrap();

        let loaded = RuntimeConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
        assert!(loaded.to_log_config().file_output);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RuntimeConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Config(_)));
    }

    #[test]
    fn test_generate_default_parses() {
        let text = RuntimeConfig::generate_default();
        assert_eq!(RuntimeConfig::parse(&text).unwrap(), RuntimeConfig::default());
    }
}
