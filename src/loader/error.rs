use std::path::PathBuf;

use crate::scanner::ScanError;

#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    #[error("failed to locate extension sources: {0}")]
    Source(String),

    #[error("failed to parse extension source: {0}")]
    Scan(#[from] ScanError),

    #[error("failed to prepare extension build directory: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("failed to run {}: {source}", program.display())]
    Toolchain {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to compile extension commands (exit code {}):\n{stderr}", code.map(|c| c.to_string()).unwrap_or_else(|| "unknown".into()))]
    Compile { code: Option<i32>, stderr: String },

    #[error("extension build was cancelled")]
    Cancelled,

    #[error("invalid extension manifest: {0}")]
    Manifest(String),
}
