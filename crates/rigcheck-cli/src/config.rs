//! Layered configuration system
//!
//! Config is loaded with four layers of precedence (highest wins):
//! 1. Environment variables: `RIGCHECK_FLOAT_TOLERANCE`,
//!    `RIGCHECK_MATRIX_TOLERANCE`, `RIGCHECK_LOG`
//! 2. An explicit `--config <path>`
//! 3. Project-local: `.rigcheck/config.toml`
//! 4. Global: `~/.rigcheck/config.toml`

use rigcheck_core::{Result, RigError, ValueComparer};
use rigcheck_reconcile::ReconcileOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `[compare]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompareSection {
    #[serde(default)]
    pub float_tolerance: Option<f64>,
    #[serde(default)]
    pub matrix_tolerance: Option<f64>,
}

/// `[repair]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepairSection {
    #[serde(default)]
    pub atomic_batches: Option<bool>,
}

/// `[log]` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogSection {
    #[serde(default)]
    pub filter: Option<String>,
}

/// Top-level config file structure; unset keys leave lower layers alone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RigcheckConfigFile {
    #[serde(default)]
    pub compare: CompareSection,
    #[serde(default)]
    pub repair: RepairSection,
    #[serde(default)]
    pub log: LogSection,
}

/// Resolved configuration with every layer applied
#[derive(Debug, Clone, PartialEq)]
pub struct RigcheckConfig {
    pub float_tolerance: f64,
    pub matrix_tolerance: f64,
    pub atomic_batches: bool,
    pub log_filter: Option<String>,
}

impl Default for RigcheckConfig {
    fn default() -> Self {
        Self {
            float_tolerance: 0.0,
            matrix_tolerance: 0.0,
            atomic_batches: true,
            log_filter: None,
        }
    }
}

impl RigcheckConfig {
    /// Load config with layered precedence: global < project < explicit < env vars
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut config = RigcheckConfigFile::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                Self::merge_into(&mut config, Self::load_file(&global_path)?);
            }
        }

        let local_path = PathBuf::from(".rigcheck/config.toml");
        if local_path.exists() {
            Self::merge_into(&mut config, Self::load_file(&local_path)?);
        }

        if let Some(path) = explicit {
            Self::merge_into(&mut config, Self::load_file(path)?);
        }

        Self::apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
        Self::resolve(config)
    }

    /// Load config from a specific file path only
    pub fn load_from_file(path: &Path) -> Result<Self> {
        Self::resolve(Self::load_file(path)?)
    }

    /// Pass options for validate and repair
    pub fn reconcile_options(&self) -> ReconcileOptions {
        ReconcileOptions {
            comparer: ValueComparer::new(self.float_tolerance, self.matrix_tolerance),
            atomic_batches: self.atomic_batches,
        }
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".rigcheck").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<RigcheckConfigFile> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            RigError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn merge_into(base: &mut RigcheckConfigFile, overlay: RigcheckConfigFile) {
        if overlay.compare.float_tolerance.is_some() {
            base.compare.float_tolerance = overlay.compare.float_tolerance;
        }
        if overlay.compare.matrix_tolerance.is_some() {
            base.compare.matrix_tolerance = overlay.compare.matrix_tolerance;
        }
        if overlay.repair.atomic_batches.is_some() {
            base.repair.atomic_batches = overlay.repair.atomic_batches;
        }
        if overlay.log.filter.is_some() {
            base.log.filter = overlay.log.filter;
        }
    }

    fn apply_env_overrides<F>(config: &mut RigcheckConfigFile, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = var("RIGCHECK_FLOAT_TOLERANCE") {
            config.compare.float_tolerance = Some(parse_tolerance("RIGCHECK_FLOAT_TOLERANCE", &value)?);
        }
        if let Some(value) = var("RIGCHECK_MATRIX_TOLERANCE") {
            config.compare.matrix_tolerance =
                Some(parse_tolerance("RIGCHECK_MATRIX_TOLERANCE", &value)?);
        }
        if let Some(filter) = var("RIGCHECK_LOG") {
            config.log.filter = Some(filter);
        }
        Ok(())
    }

    fn resolve(file: RigcheckConfigFile) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            float_tolerance: file.compare.float_tolerance.unwrap_or(defaults.float_tolerance),
            matrix_tolerance: file.compare.matrix_tolerance.unwrap_or(defaults.matrix_tolerance),
            atomic_batches: file.repair.atomic_batches.unwrap_or(defaults.atomic_batches),
            log_filter: file.log.filter,
        };

        for (key, value) in [
            ("compare.float_tolerance", config.float_tolerance),
            ("compare.matrix_tolerance", config.matrix_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RigError::ConfigError(format!(
                    "{} must be a non-negative number, got {}",
                    key, value
                )));
            }
        }
        Ok(config)
    }
}

fn parse_tolerance(key: &str, value: &str) -> Result<f64> {
    value
        .trim()
        .parse()
        .map_err(|e| RigError::ConfigError(format!("{}={}: {}", key, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn temp_config(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_config(
            &dir,
            "config.toml",
            r#"
[compare]
matrix_tolerance = 1e-6

[repair]
atomic_batches = false

[log]
filter = "rigcheck_reconcile=debug"
"#,
        );

        let config = RigcheckConfig::load_from_file(&path).unwrap();
        assert_eq!(config.float_tolerance, 0.0);
        assert_eq!(config.matrix_tolerance, 1e-6);
        assert!(!config.atomic_batches);
        assert_eq!(config.log_filter.as_deref(), Some("rigcheck_reconcile=debug"));

        let options = config.reconcile_options();
        assert_eq!(options.comparer.matrix_tolerance, 1e-6);
        assert!(!options.atomic_batches);
    }

    #[test]
    fn test_defaults_are_exact() {
        let config = RigcheckConfig::default();
        assert_eq!(config.reconcile_options(), ReconcileOptions::default());
    }

    #[test]
    fn test_later_layer_wins_only_where_set() {
        let mut base: RigcheckConfigFile = toml::from_str(
            r#"
[compare]
float_tolerance = 0.5
matrix_tolerance = 0.25
"#,
        )
        .unwrap();
        let overlay: RigcheckConfigFile = toml::from_str("[compare]\nmatrix_tolerance = 0.125\n").unwrap();

        RigcheckConfig::merge_into(&mut base, overlay);
        let config = RigcheckConfig::resolve(base).unwrap();
        assert_eq!(config.float_tolerance, 0.5);
        assert_eq!(config.matrix_tolerance, 0.125);
        assert!(config.atomic_batches);
    }

    #[test]
    fn test_env_var_override() {
        let env: HashMap<&str, &str> = [
            ("RIGCHECK_MATRIX_TOLERANCE", "0.001"),
            ("RIGCHECK_LOG", "debug"),
        ]
        .into_iter()
        .collect();

        let mut file: RigcheckConfigFile =
            toml::from_str("[log]\nfilter = \"info\"\n").unwrap();
        RigcheckConfig::apply_env_overrides(&mut file, |key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        let config = RigcheckConfig::resolve(file).unwrap();
        assert_eq!(config.matrix_tolerance, 0.001);
        assert_eq!(config.log_filter.as_deref(), Some("debug"));
    }

    #[test]
    fn test_bad_env_tolerance() {
        let mut file = RigcheckConfigFile::default();
        let result = RigcheckConfig::apply_env_overrides(&mut file, |key| {
            (key == "RIGCHECK_FLOAT_TOLERANCE").then(|| "tiny".to_string())
        });
        assert!(matches!(result, Err(RigError::ConfigError(_))));
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_config(&dir, "config.toml", "[compare]\nfloat_tolerance = -1.0\n");
        assert!(matches!(
            RigcheckConfig::load_from_file(&path),
            Err(RigError::ConfigError(_))
        ));
    }

    #[test]
    fn test_malformed_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = temp_config(&dir, "config.toml", "[compare\n");
        assert!(matches!(
            RigcheckConfig::load_from_file(&path),
            Err(RigError::ConfigError(_))
        ));
    }
}
