//! Configuration Provider Trait

use serde::de::DeserializeOwned;

use super::ConfigResult;

/// Read-only source of configuration values, addressed by dotted keys.
#[async_trait::async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>>;

    async fn list_keys(&self, prefix: &str) -> ConfigResult<Vec<String>>;
}

/// Extension methods for typed configuration access
pub trait ConfigProviderExt: ConfigProvider {
    /// Get a typed value.
    ///
    /// Raw values are parsed as JSON first; a value that is not valid JSON is
    /// treated as a bare string (so `TASKFORGE_LOADER_RUSTC=rustc` works).
    fn get<T: DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = ConfigResult<Option<T>>> + Send
    where
        Self: Sync,
    {
        async move {
            let Some(raw) = self.get_raw(key).await? else {
                return Ok(None);
            };
            let value = serde_json::from_str(&raw)
                .or_else(|_| serde_json::from_value(serde_json::Value::String(raw.clone())))
                .map_err(|e| super::ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                })?;
            Ok(Some(value))
        }
    }

    fn get_or<T: DeserializeOwned + Send>(
        &self,
        key: &str,
        default: T,
    ) -> impl std::future::Future<Output = ConfigResult<T>> + Send
    where
        Self: Sync,
    {
        async move { Ok(self.get(key).await?.unwrap_or(default)) }
    }
}

impl<P: ConfigProvider + ?Sized> ConfigProviderExt for P {}
