use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Iteration multiplier applied to the initial dirty-path count of a normalization pass.
pub const DEFAULT_MAX_ITERATIONS_FACTOR: usize = 42;

/// Environment variable naming a config file to use instead of the default location.
pub const CONFIG_PATH_ENV: &str = "STRATA_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read editor config at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse editor config at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid `{key}` in editor config at {config_path}: {reason}")]
    InvalidSetting {
        config_path: PathBuf,
        key: &'static str,
        reason: String,
    },
}

/// Editor-wide settings for the editing core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub normalization: NormalizationConfig,
    pub errors: ErrorConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizationConfig {
    /// A pass fails once it has run more than `initial dirty paths * factor` iterations.
    pub max_iterations_factor: usize,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            max_iterations_factor: DEFAULT_MAX_ITERATIONS_FACTOR,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorConfig {
    /// Error keys (e.g. `"point.no_edge_text"`) that recover silently when a fallback exists.
    pub recover: Vec<String>,
}

impl ErrorConfig {
    pub fn recovers(&self, key: &str) -> bool {
        self.recover.iter().any(|k| k == key)
    }
}

impl EditorConfig {
    /// Read the config at `config_path`. A missing file is not an error; the caller falls
    /// back to [`EditorConfig::default`].
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let config: EditorConfig =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;
        config.validate(config_path)?;

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        Self::load_from_path(Self::config_path())
    }

    /// Like [`EditorConfig::load`], with defaults when no file exists.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load()?.unwrap_or_default())
    }

    /// A factor of zero would fail every normalization pass before it starts, and error
    /// keys are always dotted (`"node.not_found"`).
    fn validate(&self, config_path: &Path) -> Result<(), ConfigError> {
        let invalid = |key: &'static str, reason: String| ConfigError::InvalidSetting {
            config_path: config_path.to_path_buf(),
            key,
            reason,
        };
        if self.normalization.max_iterations_factor == 0 {
            return Err(invalid(
                "normalization.max_iterations_factor",
                "must be at least 1".to_string(),
            ));
        }
        if let Some(key) = self.errors.recover.iter().find(|key| !key.contains('.')) {
            return Err(invalid(
                "errors.recover",
                format!("\"{key}\" is not a dotted error key"),
            ));
        }
        Ok(())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize editor config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write editor config to {}", config_path.display()))?;
        Ok(())
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to_path(Self::config_path())
    }

    /// `$STRATA_CONFIG` when set, otherwise `~/.config/strata/config.toml`.
    pub fn config_path() -> PathBuf {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => expand_path(&path),
            _ => expand_path("~/.config/strata/config.toml"),
        }
    }
}

/// Expand `~` and environment variables; a path that fails to expand is used as written.
fn expand_path(path: &str) -> PathBuf {
    match shellexpand::full(path) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_path() {
        let config_path = EditorConfig::config_path();
        let path_str = config_path.to_string_lossy();

        assert!(!path_str.starts_with('~'));
        if std::env::var_os(CONFIG_PATH_ENV).is_none() {
            assert!(path_str.ends_with(".config/strata/config.toml"));
        }
    }

    #[test]
    fn test_expand_path() {
        let home = expand_path("~/strata/config.toml");
        assert!(!home.to_string_lossy().starts_with('~'));
        assert!(home.to_string_lossy().ends_with("strata/config.toml"));

        assert_eq!(expand_path("/etc/strata.toml"), PathBuf::from("/etc/strata.toml"));
        assert_eq!(
            expand_path("$STRATA_UNSET_FOR_TEST/config.toml"),
            PathBuf::from("$STRATA_UNSET_FOR_TEST/config.toml")
        );
    }

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.normalization.max_iterations_factor, 42);
        assert!(config.errors.recover.is_empty());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: EditorConfig = toml::from_str(
            r#"
[errors]
recover = ["point.no_edge_text"]
"#,
        )
        .unwrap();

        assert_eq!(config.normalization.max_iterations_factor, 42);
        assert!(config.errors.recovers("point.no_edge_text"));
        assert!(!config.errors.recovers("node.not_found"));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let non_existent_config = temp_dir.path().join("nonexistent.toml");

        let result = EditorConfig::load_from_path(&non_existent_config).unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "normalization = 3").unwrap();

        let result = EditorConfig::load_from_path(&config_file);

        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("nested").join("config.toml");
        let test_config = EditorConfig {
            normalization: NormalizationConfig {
                max_iterations_factor: 7,
            },
            errors: ErrorConfig {
                recover: vec!["node.not_found".to_string()],
            },
        };

        test_config.save_to_path(&config_file).unwrap();
        let loaded_config = EditorConfig::load_from_path(&config_file).unwrap().unwrap();

        assert_eq!(loaded_config, test_config);
    }

    #[test]
    fn test_load_rejects_zero_iteration_factor() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[normalization]\nmax_iterations_factor = 0\n").unwrap();

        let err = EditorConfig::load_from_path(&config_file).unwrap_err();

        assert!(matches!(
            err,
            ConfigError::InvalidSetting {
                key: "normalization.max_iterations_factor",
                ..
            }
        ));
        assert!(err.to_string().contains("must be at least 1"));
    }

    #[test]
    fn test_load_rejects_undotted_recover_key() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "[errors]\nrecover = [\"not_found\"]\n").unwrap();

        let err = EditorConfig::load_from_path(&config_file).unwrap_err();

        assert!(matches!(err, ConfigError::InvalidSetting { key: "errors.recover", .. }));
    }

    #[test]
    fn test_save_reports_unwritable_path() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();

        let err = EditorConfig::default()
            .save_to_path(blocker.join("config.toml"))
            .unwrap_err();

        assert!(err.to_string().starts_with("Failed to create config directory"));
    }
}
