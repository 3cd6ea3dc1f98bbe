//! Environment overrides.
//!
//! `loader.rustc_flags` is read from `{PREFIX}LOADER_RUSTC_FLAGS`. Only the
//! first underscore after the prefix separates the section from the key, so
//! keys keep their own underscores. Empty variables count as unset.

use super::provider::ConfigProvider;
use super::{ConfigError, ConfigResult};

#[derive(Debug, Clone)]
pub struct EnvConfigProvider {
    prefix: String,
}

impl EnvConfigProvider {
    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn var_name(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key.to_uppercase().replace('.', "_"))
    }

    fn key_for(&self, var: &str) -> Option<String> {
        let rest = var.strip_prefix(self.prefix.as_str())?.to_lowercase();
        Some(match rest.split_once('_') {
            Some((section, key)) => format!("{}.{}", section, key),
            None => rest,
        })
    }
}

#[async_trait::async_trait]
impl ConfigProvider for EnvConfigProvider {
    fn name(&self) -> &str {
        "env"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        match std::env::var(self.var_name(key)) {
            Ok(value) if value.is_empty() => Ok(None),
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(ConfigError::Env(e)),
        }
    }

    async fn list_keys(&self, prefix: &str) -> ConfigResult<Vec<String>> {
        let mut keys: Vec<String> = std::env::vars()
            .filter(|(_, value)| !value.is_empty())
            .filter_map(|(var, _)| self.key_for(&var))
            .filter(|key| key.starts_with(prefix))
            .collect();
        keys.sort();
        Ok(keys)
    }
}
