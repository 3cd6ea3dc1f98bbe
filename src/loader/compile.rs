//! Building and talking to the extension sidecar.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};

use tempfile::TempDir;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::LoaderError;
use super::manifest::Manifest;
use crate::config::LoaderConfig;

const BINARY_NAME: &str = "taskforge-ext";

/// A compiled sidecar. The build directory is removed when the last owner
/// (every bound command holds one) is dropped.
pub struct ExtensionModule {
    _workspace: TempDir,
    binary: PathBuf,
    project_dir: PathBuf,
    manifest: Manifest,
}

impl ExtensionModule {
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Manifest as reported by the sidecar itself.
    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    /// Run one command in the project directory with inherited stdio.
    pub async fn invoke(&self, symbol: &str, args: Vec<String>) -> crate::Result<()> {
        tracing::debug!(symbol, args = ?args, "Invoking extension command");
        let status = Command::new(&self.binary)
            .arg("invoke")
            .arg(symbol)
            .args(&args)
            .current_dir(&self.project_dir)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| {
                crate::Error::Command(format!(
                    "failed to start extension command '{}': {}",
                    symbol, e
                ))
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(crate::Error::ExitStatus {
                command: symbol.to_string(),
                code: status.code(),
            })
        }
    }
}

impl std::fmt::Debug for ExtensionModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionModule")
            .field("binary", &self.binary)
            .field("project_dir", &self.project_dir)
            .field("commands", &self.manifest.commands.len())
            .finish()
    }
}

/// Write `source` as the crate root in a fresh directory, compile it and
/// read back its manifest.
pub(crate) async fn build(
    config: &LoaderConfig,
    source: &str,
    project_dir: &Path,
    cancel: &CancellationToken,
) -> Result<ExtensionModule, LoaderError> {
    let workspace = tempfile::Builder::new()
        .prefix("taskforge-ext-")
        .tempdir()
        .map_err(LoaderError::Workspace)?;
    let main_rs = workspace.path().join("main.rs");
    tokio::fs::write(&main_rs, source)
        .await
        .map_err(LoaderError::Workspace)?;
    let binary = workspace
        .path()
        .join(format!("{}{}", BINARY_NAME, std::env::consts::EXE_SUFFIX));

    rustc(config, &main_rs, &binary, cancel).await?;
    let manifest = query_manifest(&binary, cancel).await?;

    Ok(ExtensionModule {
        _workspace: workspace,
        binary,
        project_dir: project_dir.to_path_buf(),
        manifest,
    })
}

async fn rustc(
    config: &LoaderConfig,
    main_rs: &Path,
    binary: &Path,
    cancel: &CancellationToken,
) -> Result<(), LoaderError> {
    let mut command = Command::new(&config.rustc);
    command
        .arg("--edition")
        .arg(&config.edition)
        .args(["--crate-type", "bin", "--crate-name", "taskforge_ext"])
        .arg("-o")
        .arg(binary)
        .args(&config.rustc_flags)
        .arg(main_rs);

    tracing::debug!(rustc = %config.rustc.display(), edition = %config.edition, "Compiling extension sidecar");
    let output = run(command, &config.rustc, cancel).await?;
    if !output.status.success() {
        return Err(LoaderError::Compile {
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    Ok(())
}

async fn query_manifest(binary: &Path, cancel: &CancellationToken) -> Result<Manifest, LoaderError> {
    let mut command = Command::new(binary);
    command.arg("manifest");
    let output = run(command, binary, cancel).await?;
    if !output.status.success() {
        return Err(LoaderError::Manifest(format!(
            "sidecar exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Manifest::parse(&String::from_utf8_lossy(&output.stdout))
}

/// Run to completion with captured output. Cancelling kills the child.
async fn run(
    mut command: Command,
    program: &Path,
    cancel: &CancellationToken,
) -> Result<Output, LoaderError> {
    let child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| LoaderError::Toolchain {
            program: program.to_path_buf(),
            source,
        })?;

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(LoaderError::Cancelled),
        output = child.wait_with_output() => output.map_err(|source| LoaderError::Toolchain {
            program: program.to_path_buf(),
            source,
        }),
    }
}
