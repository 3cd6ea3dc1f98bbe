//! JSON file configuration provider.
//!
//! A missing file is an empty configuration. Nested objects are addressed
//! with dotted keys (`{"loader": {"edition": "2021"}}` → `loader.edition`).

use std::path::PathBuf;

use serde_json::{Map, Value};
use tokio::sync::RwLock;

use super::ConfigResult;
use super::provider::ConfigProvider;

pub struct FileConfigProvider {
    path: PathBuf,
    data: RwLock<Option<Map<String, Value>>>,
}

impl FileConfigProvider {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(None),
        }
    }

    async fn load(&self) -> ConfigResult<Map<String, Value>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(Map::new());
        }
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    async fn ensure_loaded(&self) -> ConfigResult<()> {
        if self.data.read().await.is_some() {
            return Ok(());
        }
        let mut data = self.data.write().await;
        if data.is_none() {
            *data = Some(self.load().await?);
        }
        Ok(())
    }

    /// Drop the cached contents and read the file again.
    pub async fn reload(&self) -> ConfigResult<()> {
        let fresh = self.load().await?;
        *self.data.write().await = Some(fresh);
        Ok(())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut parts = key.split('.');
    let first = map.get(parts.next()?)?;
    parts.try_fold(first, |value, part| value.get(part))
}

fn collect_keys(prefix: &str, map: &Map<String, Value>, out: &mut Vec<String>) {
    for (name, value) in map {
        let key = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        match value {
            Value::Object(inner) => collect_keys(&key, inner, out),
            _ => out.push(key),
        }
    }
}

#[async_trait::async_trait]
impl ConfigProvider for FileConfigProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        self.ensure_loaded().await?;
        let data = self.data.read().await;
        let Some(map) = data.as_ref() else {
            return Ok(None);
        };
        Ok(match lookup(map, key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(v) => Some(v.to_string()),
        })
    }

    async fn list_keys(&self, prefix: &str) -> ConfigResult<Vec<String>> {
        self.ensure_loaded().await?;
        let data = self.data.read().await;
        let mut keys = Vec::new();
        if let Some(map) = data.as_ref() {
            collect_keys("", map, &mut keys);
        }
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_provider_nested_keys() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(".taskforge.json");
        let config = serde_json::json!({
            "loader": {
                "edition": "2018",
                "parallelism": 2,
                "rustc_flags": ["-O"]
            }
        });
        tokio::fs::write(&config_path, config.to_string())
            .await
            .unwrap();

        let provider = FileConfigProvider::new(config_path);
        assert_eq!(
            provider.get_raw("loader.edition").await.unwrap(),
            Some("2018".to_string())
        );
        assert_eq!(
            provider.get_raw("loader.parallelism").await.unwrap(),
            Some("2".to_string())
        );
        assert_eq!(
            provider.get_raw("loader.rustc_flags").await.unwrap(),
            Some("[\"-O\"]".to_string())
        );
        assert_eq!(provider.get_raw("loader.missing").await.unwrap(), None);

        let keys = provider.list_keys("loader.").await.unwrap();
        assert_eq!(
            keys,
            vec!["loader.edition", "loader.parallelism", "loader.rustc_flags"]
        );
    }

    #[tokio::test]
    async fn test_file_provider_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let provider = FileConfigProvider::new(temp_dir.path().join("nonexistent.json"));
        assert_eq!(provider.get_raw("key").await.unwrap(), None);
        assert!(provider.list_keys("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_provider_reload() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{"loader": {"edition": "2018"}}"#)
            .await
            .unwrap();

        let provider = FileConfigProvider::new(config_path.clone());
        assert_eq!(
            provider.get_raw("loader.edition").await.unwrap().as_deref(),
            Some("2018")
        );

        tokio::fs::write(&config_path, r#"{"loader": {"edition": "2024"}}"#)
            .await
            .unwrap();
        provider.reload().await.unwrap();
        assert_eq!(
            provider.get_raw("loader.edition").await.unwrap().as_deref(),
            Some("2024")
        );
    }

    #[tokio::test]
    async fn test_file_provider_malformed() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.json");
        tokio::fs::write(&config_path, "{ not json").await.unwrap();

        let provider = FileConfigProvider::new(config_path);
        assert!(provider.get_raw("loader.edition").await.is_err());
    }
}
