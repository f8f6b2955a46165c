use std::{collections::HashMap, env, fs, path::PathBuf};

use super::{DuplicateKeyPolicy, RewriteOptions};
use crate::errors::ConfigError;
use crate::logging::LogFormat;

pub const USER_CONFIG_PATH: &str = "~/.config/diplus";
pub const CONFIG_FILE_NAME: &str = "config.toml";

const ENV_DUPLICATE_KEYS: &str = "DIPLUS_FORWARD_DUPLICATE_KEYS";
const ENV_LOG_SNAPSHOTS: &str = "DIPLUS_LOG_SNAPSHOTS";
const ENV_LOG_LEVEL: &str = "DIPLUS_LOG_LEVEL";
const ENV_LOG_FORMAT: &str = "DIPLUS_LOG_FORMAT";

/// Configuration loader responsible for loading options from a file and the environment
pub struct ConfigLoader {
    path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a loader reading `~/.config/diplus/config.toml`
    pub fn new() -> Self {
        Self { path: None }
    }

    /// Create a loader with an explicit config file (tilde is expanded)
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Load options: file first, environment overrides on top.
    /// A missing file yields the defaults.
    pub fn load(&self) -> Result<RewriteOptions, ConfigError> {
        let path = self.config_path();
        let options = if path.exists() {
            let content = fs::read_to_string(&path)
                .map_err(|e| ConfigError::FileRead(path.to_string_lossy().to_string(), e))?;
            Self::parse_named(&content, &path.to_string_lossy())?
        } else {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            RewriteOptions::default()
        };

        Self::apply_env(options, &Self::collect_env_vars())
    }

    /// Parse options from an in-memory TOML document
    pub fn parse_str(content: &str) -> Result<RewriteOptions, ConfigError> {
        Self::parse_named(content, "<memory>")
    }

    fn parse_named(content: &str, origin: &str) -> Result<RewriteOptions, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::TomlParse(origin.to_string(), e))
    }

    /// Apply environment overrides collected into `env_map`
    pub fn apply_env(
        mut options: RewriteOptions,
        env_map: &HashMap<String, String>,
    ) -> Result<RewriteOptions, ConfigError> {
        if let Some(value) = env_map.get(ENV_DUPLICATE_KEYS) {
            options.forwarding.duplicate_keys =
                DuplicateKeyPolicy::parse(value).ok_or_else(|| invalid(ENV_DUPLICATE_KEYS, value))?;
        }

        if let Some(value) = env_map.get(ENV_LOG_SNAPSHOTS) {
            options.diagnostics.log_snapshots = match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(invalid(ENV_LOG_SNAPSHOTS, value)),
            };
        }

        if let Some(value) = env_map.get(ENV_LOG_LEVEL) {
            if value.trim().is_empty() {
                return Err(invalid(ENV_LOG_LEVEL, value));
            }
            options.diagnostics.log_level = value.trim().to_string();
        }

        if let Some(value) = env_map.get(ENV_LOG_FORMAT) {
            options.diagnostics.log_format =
                LogFormat::parse(value).ok_or_else(|| invalid(ENV_LOG_FORMAT, value))?;
        }

        Ok(options)
    }

    fn config_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).as_ref()),
            None => PathBuf::from(shellexpand::tilde(USER_CONFIG_PATH).as_ref()).join(CONFIG_FILE_NAME),
        }
    }

    fn collect_env_vars() -> HashMap<String, String> {
        let env_keys = [
            ENV_DUPLICATE_KEYS,
            ENV_LOG_SNAPSHOTS,
            ENV_LOG_LEVEL,
            ENV_LOG_FORMAT,
        ];

        let mut env_map = HashMap::new();
        for key in &env_keys {
            if let Ok(value) = env::var(key) {
                env_map.insert(key.to_string(), value);
            }
        }
        env_map
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_document() {
        let options = ConfigLoader::parse_str(
            r#"
            [forwarding]
            duplicate_keys = "collapse"

            [diagnostics]
            log_snapshots = true
            log_level = "debug"
            log_format = "compact"
            "#,
        )
        .unwrap();

        assert_eq!(options.forwarding.duplicate_keys, DuplicateKeyPolicy::Collapse);
        assert!(options.diagnostics.log_snapshots);
        assert_eq!(options.diagnostics.log_level, "debug");
        assert_eq!(options.diagnostics.log_format, LogFormat::Compact);
    }

    #[test]
    fn test_parse_partial_document_keeps_defaults() {
        let options = ConfigLoader::parse_str("[diagnostics]\nlog_snapshots = true\n").unwrap();
        assert_eq!(options.forwarding.duplicate_keys, DuplicateKeyPolicy::Reject);
        assert_eq!(options.diagnostics.log_level, "info");
    }

    #[test]
    fn test_parse_rejects_unknown_policy() {
        let result = ConfigLoader::parse_str("[forwarding]\nduplicate_keys = \"merge\"\n");
        assert!(matches!(result, Err(ConfigError::TomlParse(origin, _)) if origin == "<memory>"));
    }

    #[test]
    fn test_env_overrides() {
        let mut env_map = HashMap::new();
        env_map.insert(ENV_DUPLICATE_KEYS.to_string(), "collapse".to_string());
        env_map.insert(ENV_LOG_SNAPSHOTS.to_string(), "yes".to_string());
        env_map.insert(ENV_LOG_LEVEL.to_string(), "diplus=trace".to_string());

        let options = ConfigLoader::apply_env(RewriteOptions::default(), &env_map).unwrap();
        assert_eq!(options.forwarding.duplicate_keys, DuplicateKeyPolicy::Collapse);
        assert!(options.diagnostics.log_snapshots);
        assert_eq!(options.diagnostics.log_level, "diplus=trace");
    }

    #[test]
    fn test_env_invalid_value() {
        let mut env_map = HashMap::new();
        env_map.insert(ENV_LOG_SNAPSHOTS.to_string(), "sometimes".to_string());

        match ConfigLoader::apply_env(RewriteOptions::default(), &env_map) {
            Err(ConfigError::InvalidValue { key, value }) => {
                assert_eq!(key, ENV_LOG_SNAPSHOTS);
                assert_eq!(value, "sometimes");
            }
            other => panic!("Expected InvalidValue, got {:?}", other),
        }
    }

    #[test]
    fn test_load_from_file_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let mut file = fs::File::create(&path).unwrap();
        writeln!(file, "[forwarding]\nduplicate_keys = \"collapse\"").unwrap();

        let loaded = ConfigLoader::with_path(&path).load().unwrap();
        assert_eq!(loaded.forwarding.duplicate_keys, DuplicateKeyPolicy::Collapse);

        let missing = ConfigLoader::with_path(dir.path().join("absent.toml"));
        assert!(missing.config_path().ends_with("absent.toml"));
    }

    #[test]
    fn test_load_reports_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        fs::write(&path, "[forwarding\n").unwrap();

        let result = ConfigLoader::with_path(&path).load();
        assert!(matches!(result, Err(ConfigError::TomlParse(_, _))));
    }
}
