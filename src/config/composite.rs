//! Layered lookup over several providers. Earlier layers shadow later ones
//! key by key, so an environment override only replaces the keys it sets.

use std::collections::BTreeSet;

use super::ConfigResult;
use super::provider::ConfigProvider;

#[derive(Default)]
pub struct CompositeConfigProvider {
    layers: Vec<Box<dyn ConfigProvider>>,
}

impl CompositeConfigProvider {
    pub fn new(layers: Vec<Box<dyn ConfigProvider>>) -> Self {
        Self { layers }
    }

    /// Layer names, highest priority first.
    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|p| p.name()).collect()
    }
}

#[async_trait::async_trait]
impl ConfigProvider for CompositeConfigProvider {
    fn name(&self) -> &str {
        "composite"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        for layer in &self.layers {
            if let Some(value) = layer.get_raw(key).await? {
                tracing::trace!(key, layer = layer.name(), "Resolved setting");
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    async fn list_keys(&self, prefix: &str) -> ConfigResult<Vec<String>> {
        let mut keys = BTreeSet::new();
        for layer in &self.layers {
            keys.extend(layer.list_keys(prefix).await?);
        }
        Ok(keys.into_iter().collect())
    }
}

impl std::fmt::Debug for CompositeConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeConfigProvider")
            .field("layers", &self.layer_names())
            .finish()
    }
}
