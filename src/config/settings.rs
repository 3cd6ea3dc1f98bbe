//! Typed loader settings resolved from a [`ConfigProvider`].

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::provider::{ConfigProvider, ConfigProviderExt};
use super::{ConfigError, ConfigResult};

/// Verbose-diagnostics toggles, checked in order; the first non-empty one wins.
pub const VERBOSE_ENV_VARS: [&str; 2] = ["TASKFORGE_VERBOSE", "TASK_FORGE_VERBOSE"];

const EDITIONS: [&str; 4] = ["2015", "2018", "2021", "2024"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Directory (relative to the project) holding extension sources.
    pub extensions_dir: String,
    /// Single-file fallback when the extensions directory is absent.
    pub root_file: String,
    pub rustc: PathBuf,
    pub edition: String,
    pub rustc_flags: Vec<String>,
    /// Upper bound on files scanned concurrently.
    pub parallelism: usize,
    /// Whether an extension command may replace a built-in of the same name.
    pub allow_builtin_override: bool,
    pub verbose: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            extensions_dir: "taskfiles".into(),
            root_file: "taskfile.rs".into(),
            rustc: PathBuf::from("rustc"),
            edition: "2021".into(),
            rustc_flags: Vec::new(),
            parallelism: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            allow_builtin_override: true,
            verbose: false,
        }
    }
}

impl LoaderConfig {
    /// Read `loader.*` keys, falling back to defaults. The verbose flag is
    /// also enabled by the [`VERBOSE_ENV_VARS`] toggle.
    pub async fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> ConfigResult<Self> {
        let defaults = Self::default();

        let rustc_flags = match provider.get_raw("loader.rustc_flags").await? {
            Some(raw) => parse_flags(&raw),
            None => defaults.rustc_flags,
        };

        let config = Self {
            extensions_dir: provider
                .get_or("loader.extensions_dir", defaults.extensions_dir)
                .await?,
            root_file: provider.get_or("loader.root_file", defaults.root_file).await?,
            rustc: provider.get_or("loader.rustc", defaults.rustc).await?,
            edition: provider.get_or("loader.edition", defaults.edition).await?,
            rustc_flags,
            parallelism: provider
                .get_or("loader.parallelism", defaults.parallelism)
                .await?,
            allow_builtin_override: provider
                .get_or("loader.allow_builtin_override", defaults.allow_builtin_override)
                .await?,
            verbose: provider.get_or("loader.verbose", false).await? || verbose_from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.parallelism == 0 {
            return Err(ConfigError::InvalidValue {
                key: "loader.parallelism".into(),
                message: "must be at least 1".into(),
            });
        }
        if !EDITIONS.contains(&self.edition.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "loader.edition".into(),
                message: format!("unknown edition '{}'", self.edition),
            });
        }
        if self.extensions_dir.trim().is_empty() && self.root_file.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "loader.extensions_dir".into(),
                message: "extensions_dir and root_file cannot both be empty".into(),
            });
        }
        Ok(())
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    pub fn with_builtin_override(mut self, allow: bool) -> Self {
        self.allow_builtin_override = allow;
        self
    }
}

/// A JSON array of strings, or a whitespace-separated list.
fn parse_flags(raw: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(raw)
        .unwrap_or_else(|_| raw.split_whitespace().map(String::from).collect())
}

pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Resolve the verbose toggle through `lookup`.
pub fn verbose_from(lookup: impl Fn(&str) -> Option<String>) -> bool {
    VERBOSE_ENV_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.is_empty())
        .is_some_and(|value| is_truthy(&value))
}

pub fn verbose_from_env() -> bool {
    verbose_from(|name| std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryConfigProvider;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let config = LoaderConfig::from_provider(&MemoryConfigProvider::new())
            .await
            .unwrap();
        assert_eq!(config.extensions_dir, "taskfiles");
        assert_eq!(config.root_file, "taskfile.rs");
        assert_eq!(config.edition, "2021");
        assert!(config.allow_builtin_override);
        assert!(config.parallelism >= 1);
    }

    #[tokio::test]
    async fn test_overrides() {
        let provider = MemoryConfigProvider::new()
            .value("loader.extensions_dir", "tasks")
            .value("loader.parallelism", "2")
            .value("loader.edition", "2024")
            .value("loader.rustc_flags", "-O -C debuginfo=0")
            .value("loader.allow_builtin_override", "false");

        let config = LoaderConfig::from_provider(&provider).await.unwrap();
        assert_eq!(config.extensions_dir, "tasks");
        assert_eq!(config.parallelism, 2);
        assert_eq!(config.edition, "2024");
        assert_eq!(config.rustc_flags, vec!["-O", "-C", "debuginfo=0"]);
        assert!(!config.allow_builtin_override);
    }

    #[tokio::test]
    async fn test_invalid_values_rejected() {
        let provider = MemoryConfigProvider::new().value("loader.parallelism", "0");
        assert!(matches!(
            LoaderConfig::from_provider(&provider).await,
            Err(ConfigError::InvalidValue { .. })
        ));

        let provider = MemoryConfigProvider::new().value("loader.edition", "2019");
        assert!(matches!(
            LoaderConfig::from_provider(&provider).await,
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_flags() {
        assert_eq!(parse_flags(r#"["-O", "--cfg", "ci"]"#), vec!["-O", "--cfg", "ci"]);
        assert_eq!(parse_flags("-O  -g"), vec!["-O", "-g"]);
        assert!(parse_flags("").is_empty());
    }

    #[test]
    fn test_verbose_first_non_empty_wins() {
        let env = |pairs: &[(&str, &str)]| {
            let map: HashMap<String, String> = pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect();
            move |name: &str| map.get(name).cloned()
        };

        assert!(!verbose_from(env(&[])));
        assert!(verbose_from(env(&[("TASKFORGE_VERBOSE", "1")])));
        assert!(verbose_from(env(&[("TASK_FORGE_VERBOSE", "Yes")])));
        assert!(verbose_from(env(&[
            ("TASKFORGE_VERBOSE", ""),
            ("TASK_FORGE_VERBOSE", "on")
        ])));
        assert!(!verbose_from(env(&[
            ("TASKFORGE_VERBOSE", "0"),
            ("TASK_FORGE_VERBOSE", "true")
        ])));
    }

    #[test]
    fn test_is_truthy() {
        for value in ["1", "true", "TRUE", "yes", "on", " On "] {
            assert!(is_truthy(value), "{value}");
        }
        for value in ["0", "false", "no", "off", "", "maybe"] {
            assert!(!is_truthy(value), "{value}");
        }
    }
}
