//! Dynamic loading of project-supplied commands.
//!
//! The loader turns extension sources into registered [`Command`]s:
//!
//! 1. [`Loader::resolve_source`] picks the `taskfiles/` directory, else the
//!    root `taskfile.rs`, else nothing.
//! 2. [`Loader::scan`] lists command candidates without compiling.
//! 3. [`Loader::load_candidates`] compiles every file into one sidecar
//!    executable, checks its manifest and binds one command per candidate.
//!
//! Extension commands run in the sidecar process, never in this one.
//!
//! [`Command`]: crate::command::Command

mod bind;
mod compile;
mod error;
mod harness;
pub mod manifest;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

pub use compile::ExtensionModule;
pub use error::LoaderError;
pub use manifest::{CommandKind, MANIFEST_VERSION, Manifest};

use crate::common;
use crate::config::LoaderConfig;
use crate::observability::CompileSpan;
use crate::registry::Registry;
use crate::scanner::{self, CommandInfo};

/// Where extension commands come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionSource {
    /// Neither the directory nor the root file exists.
    None,
    Directory { dir: PathBuf, files: Vec<PathBuf> },
    File(PathBuf),
}

impl ExtensionSource {
    pub fn files(&self) -> &[PathBuf] {
        match self {
            ExtensionSource::None => &[],
            ExtensionSource::Directory { files, .. } => files,
            ExtensionSource::File(path) => std::slice::from_ref(path),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ExtensionSource::None => None,
            ExtensionSource::Directory { dir, .. } => Some(dir),
            ExtensionSource::File(path) => Some(path),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ExtensionSource::None)
    }
}

/// A scanned candidate and the file declaring it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub info: CommandInfo,
    pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedCandidate {
    /// Full name the candidate would have been registered under.
    pub name: String,
    pub file: PathBuf,
    pub line: usize,
    pub reason: String,
}

impl SkippedCandidate {
    pub(crate) fn new(candidate: &Candidate, reason: impl Into<String>) -> Self {
        Self {
            name: candidate.info.full_name(),
            file: candidate.file.clone(),
            line: candidate.info.line,
            reason: reason.into(),
        }
    }
}

/// Outcome of one load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub source: Option<PathBuf>,
    pub files: Vec<PathBuf>,
    /// Full names bound into the registry, in source order.
    pub registered: Vec<String>,
    /// Subset of `registered` that replaced a built-in.
    pub overridden: Vec<String>,
    /// Candidates dropped as generated-naming artifacts of built-ins.
    pub excluded: Vec<String>,
    pub skipped: Vec<SkippedCandidate>,
}

impl LoadReport {
    fn for_source(source: &ExtensionSource) -> Self {
        Self {
            source: source.path().map(Path::to_path_buf),
            files: source.files().to_vec(),
            ..Self::default()
        }
    }

    pub(crate) fn skip(&mut self, skipped: SkippedCandidate, verbose: bool) {
        if verbose {
            tracing::warn!(
                command = %skipped.name,
                file = %skipped.file.display(),
                line = skipped.line,
                reason = %skipped.reason,
                "Skipping extension command"
            );
        } else {
            tracing::debug!(
                command = %skipped.name,
                file = %skipped.file.display(),
                line = skipped.line,
                reason = %skipped.reason,
                "Skipping extension command"
            );
        }
        self.skipped.push(skipped);
    }
}

#[derive(Debug, Clone)]
pub struct Loader {
    config: LoaderConfig,
    cancel: CancellationToken,
}

impl Loader {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Cancelling `token` aborts an in-flight compile and kills the compiler.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// The extensions directory wins over the root file, even when empty.
    pub fn resolve_source(&self, project_dir: &Path) -> Result<ExtensionSource, LoaderError> {
        let project_dir = std::path::absolute(project_dir).map_err(|e| {
            LoaderError::Source(format!("{}: {}", project_dir.display(), e))
        })?;

        if !self.config.extensions_dir.is_empty() {
            let dir = project_dir.join(&self.config.extensions_dir);
            if dir.is_dir() {
                let files = common::list_source_files(&dir)
                    .map_err(|e| LoaderError::Source(e.to_string()))?;
                return Ok(ExtensionSource::Directory { dir, files });
            }
        }

        if !self.config.root_file.is_empty() {
            let file = project_dir.join(&self.config.root_file);
            if file.is_file() && !common::is_test_file(&file) {
                return Ok(ExtensionSource::File(file));
            }
        }

        Ok(ExtensionSource::None)
    }

    pub async fn scan(&self, source: &ExtensionSource) -> Result<Vec<Candidate>, LoaderError> {
        let scanned = scanner::scan_files(source.files().to_vec(), self.config.parallelism).await?;
        Ok(scanned
            .into_iter()
            .flat_map(|scanned| {
                let file = scanned.path;
                scanned.commands.into_iter().map(move |info| Candidate {
                    info,
                    file: file.clone(),
                })
            })
            .collect())
    }

    /// Compile `source` and bind `candidates` into `registry`.
    ///
    /// Skips compiling when no candidate is bindable. Compile and manifest
    /// failures are errors; per-candidate problems land in the report.
    pub async fn load_candidates(
        &self,
        project_dir: &Path,
        source: &ExtensionSource,
        candidates: &[Candidate],
        registry: &Registry,
    ) -> Result<LoadReport, LoaderError> {
        let mut report = LoadReport::for_source(source);
        let harness = harness::render(source.files(), candidates)?;
        for skipped in harness.skipped {
            report.skip(skipped, self.config.verbose);
        }
        if harness.manifest.is_empty() {
            tracing::debug!("No bindable extension commands");
            return Ok(report);
        }

        let project_dir = std::path::absolute(project_dir).map_err(|e| {
            LoaderError::Source(format!("{}: {}", project_dir.display(), e))
        })?;
        let span = CompileSpan::new(source.files().len());
        let built = compile::build(&self.config, &harness.source, &project_dir, &self.cancel)
            .instrument(span.span().clone())
            .await;
        span.finish(built.is_ok());
        let module = Arc::new(built?);

        if module.manifest() != &harness.manifest {
            tracing::warn!(
                expected = harness.manifest.commands.len(),
                reported = module.manifest().commands.len(),
                "Sidecar manifest differs from the generated one"
            );
        }

        bind::bind(&module, &harness.dispatched, registry, &self.config, &mut report);
        Ok(report)
    }

    /// Resolve, scan, compile and bind in one go.
    pub async fn load(&self, project_dir: &Path, registry: &Registry) -> Result<LoadReport, LoaderError> {
        let source = self.resolve_source(project_dir)?;
        if source.is_none() {
            tracing::debug!(project_dir = %project_dir.display(), "No extension sources");
            return Ok(LoadReport::default());
        }
        let candidates = self.scan(&source).await?;
        self.load_candidates(project_dir, &source, &candidates, registry)
            .await
    }
}
