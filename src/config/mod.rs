//! Layered, read-only configuration.
//!
//! ```rust,no_run
//! use taskforge::config::{ConfigBuilder, LoaderConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = ConfigBuilder::new()
//!     .env_with_prefix("TASKFORGE_")
//!     .file(".taskforge.json")
//!     .build();
//! let config = LoaderConfig::from_provider(&provider).await?;
//! # Ok(())
//! # }
//! ```

pub mod composite;
pub mod env;
pub mod file;
pub mod memory;
pub mod provider;
pub mod settings;

pub use composite::CompositeConfigProvider;
pub use env::EnvConfigProvider;
pub use file::FileConfigProvider;
pub use memory::MemoryConfigProvider;
pub use provider::{ConfigProvider, ConfigProviderExt};
pub use settings::{LoaderConfig, VERBOSE_ENV_VARS, is_truthy, verbose_from, verbose_from_env};

use std::path::Path;

use thiserror::Error;

/// Prefix for environment overrides (`loader.parallelism` → `TASKFORGE_LOADER_PARALLELISM`).
pub const ENV_PREFIX: &str = "TASKFORGE_";

/// Project-local configuration file name.
pub const CONFIG_FILE: &str = ".taskforge.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Key not found: {key}")]
    NotFound { key: String },

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment error: {0}")]
    Env(#[from] std::env::VarError),

    #[error("Provider error: {message}")]
    Provider { message: String },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Assembles the layers of a [`CompositeConfigProvider`], highest priority
/// first.
#[derive(Default)]
pub struct ConfigBuilder {
    layers: Vec<Box<dyn ConfigProvider>>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `TASKFORGE_*` environment overrides, then the project's
    /// `.taskforge.json`.
    pub fn standard(project_dir: &Path) -> Self {
        Self::new()
            .env_with_prefix(ENV_PREFIX)
            .file(project_dir.join(CONFIG_FILE))
    }

    pub fn env_with_prefix(self, prefix: &str) -> Self {
        self.layer(EnvConfigProvider::prefixed(prefix))
    }

    pub fn file(self, path: impl AsRef<Path>) -> Self {
        self.layer(FileConfigProvider::new(path.as_ref().to_path_buf()))
    }

    pub fn layer(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.layers.push(Box::new(provider));
        self
    }

    pub fn build(self) -> CompositeConfigProvider {
        CompositeConfigProvider::new(self.layers)
    }
}
