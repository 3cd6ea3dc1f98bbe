//! # taskforge
//!
//! Command registry and dynamic extension discovery for a build-automation CLI.
//!
//! Built-in commands are registered eagerly; commands supplied by the project
//! (`taskfiles/*.rs` or `taskfile.rs`) are discovered on first use, compiled
//! into a sidecar executable and bound into the same registry.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use taskforge::{CommandDiscovery, LoaderConfig, Registry, builtins};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), taskforge::Error> {
//!     let registry = Arc::new(Registry::new());
//!     builtins::register_all(&registry);
//!
//!     let discovery =
//!         CommandDiscovery::with_registry(".", LoaderConfig::default(), Arc::clone(&registry));
//!     for line in discovery.get_commands_for_help().await {
//!         println!("{}", line);
//!     }
//!
//!     registry.execute("deploy", vec!["--dry-run".into()]).await
//! }
//! ```
//!
//! ## Defining commands
//!
//! ```rust,ignore
//! /// Deploy ships the build
//! pub fn deploy() -> Result<(), String> { Ok(()) }
//!
//! /// Release groups the release steps
//! pub struct Release;
//!
//! impl Release {
//!     /// Tag the current commit
//!     pub fn tag(&self) {}
//! }
//! ```
//!
//! yields `deploy` and `release:tag`.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod builtins;
pub mod command;
pub mod common;
pub mod config;
pub mod discovery;
pub mod loader;
pub mod observability;
pub mod registry;
pub mod scanner;

pub use command::{Command, CommandBuilder, CommandError, CommandOption};
pub use common::SourceType;
pub use config::{ConfigBuilder, ConfigError, LoaderConfig};
pub use discovery::{CommandDiscovery, DiscoveredCommand};
pub use loader::{LoadReport, Loader, LoaderError};
pub use observability::TracingConfig;
pub use registry::{Registry, RegistryError};
pub use scanner::{CommandInfo, ScanError, ScannedFile, Shape};

/// Error type for taskforge operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Command definition violates the naming or callable rules.
    #[error("Invalid command: {0}")]
    Invalid(#[from] CommandError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Loader(#[from] LoaderError),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Environment variable error: {0}")]
    Env(#[from] std::env::VarError),

    /// A command body failed.
    #[error("{0}")]
    Command(String),

    /// An external process exited unsuccessfully.
    #[error("'{command}' exited with {}", code.map(|c| format!("code {}", c)).unwrap_or_else(|| "a signal".into()))]
    ExitStatus { command: String, code: Option<i32> },
}

impl Error {
    /// Process exit code for the dispatcher: a failed child's own code,
    /// otherwise 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::ExitStatus {
                code: Some(code), ..
            } if *code != 0 => *code,
            Error::Registry(RegistryError::DependencyFailed { source, .. }) => source.exit_code(),
            _ => 1,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Registry(RegistryError::UnknownCommand { .. }))
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotFound { key } => Error::Config(format!("Key not found: {}", key)),
            ConfigError::InvalidValue { key, message } => {
                Error::Config(format!("Invalid value for {}: {}", key, message))
            }
            ConfigError::Serialization(e) => Error::Json(e),
            ConfigError::Io(e) => Error::Io(e),
            ConfigError::Env(e) => Error::Env(e),
            ConfigError::Provider { message } => Error::Config(message),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
