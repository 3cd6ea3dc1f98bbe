//! Structural source scanner.
//!
//! Reads extension sources and lists their command candidates without
//! compiling anything:
//!
//! - `pub fn deploy()` / `pub fn release(args: Vec<String>)` → flat command
//! - `pub struct Pipeline;` → namespace type
//! - `impl Pipeline { pub fn ci(&self) }` → namespace method `pipeline:ci`
//!
//! Each candidate carries its signature [`Shape`] so unsupported signatures
//! can be reported per candidate instead of failing the whole load.

mod doc;
mod parse;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::common::{self, WorkerLost, namespace, run_bounded};

/// Signature class of a candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shape {
    /// No parameters; also every supported namespace method.
    Unit,
    /// One `Vec<String>` (`borrowed: false`) or `&[String]` parameter.
    Variadic { borrowed: bool },
    /// A namespace type; unit structs are built directly, others via `Default`.
    /// `default` is set when a derive or `impl Default` was seen for it.
    Type { unit: bool, default: bool },
    Unsupported(String),
}

impl Shape {
    pub fn is_supported(&self) -> bool {
        !matches!(self, Shape::Unsupported(_))
    }
}

/// One command candidate found in source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandInfo {
    /// Identifier as written (function, method or type name).
    pub name: String,
    pub is_namespace: bool,
    pub namespace: String,
    /// Empty for a namespace type entry.
    pub method: String,
    pub description: String,
    pub shape: Shape,
    /// 1-based line of the declaration.
    pub line: usize,
}

impl CommandInfo {
    pub fn flat(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            is_namespace: false,
            namespace: String::new(),
            method: String::new(),
            description: String::new(),
            shape,
            line: 0,
        }
    }

    pub fn namespace_type(name: impl Into<String>, shape: Shape) -> Self {
        let name = name.into();
        Self {
            namespace: name.clone(),
            is_namespace: true,
            ..Self::flat(name, shape)
        }
    }

    pub fn method(namespace: impl Into<String>, method: impl Into<String>, shape: Shape) -> Self {
        let method = method.into();
        Self {
            is_namespace: true,
            namespace: namespace.into(),
            method: method.clone(),
            ..Self::flat(method, shape)
        }
    }

    /// A namespace entry point (the type itself) rather than a method.
    pub fn is_namespace_type(&self) -> bool {
        self.is_namespace && self.method.is_empty()
    }

    pub fn is_method(&self) -> bool {
        self.is_namespace && !self.method.is_empty()
    }

    /// Lower-cased lookup name this candidate would be registered under.
    pub fn full_name(&self) -> String {
        if self.is_method() {
            namespace::namespaced(&self.namespace, &self.method)
        } else {
            self.name.to_lowercase()
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("syntax error in {} at line {line}, column {column}", path.display())]
    Syntax {
        path: PathBuf,
        line: usize,
        column: usize,
    },

    #[error("failed to initialize the Rust grammar: {0}")]
    Grammar(String),

    #[error("scan worker {index} stopped before reporting")]
    WorkerLost { index: usize },

    #[error("{} source file(s) failed to scan: {}", .0.len(), join_errors(.0))]
    Multiple(Vec<ScanError>),
}

fn join_errors(errors: &[ScanError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<WorkerLost> for ScanError {
    fn from(lost: WorkerLost) -> Self {
        ScanError::WorkerLost { index: lost.index }
    }
}

/// Scan result of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub commands: Vec<CommandInfo>,
    /// Types given an `impl Default` in this file. Namespace types declared
    /// here already have `default` set; the rest may live in sibling files.
    pub default_impls: Vec<String>,
}

impl ScannedFile {
    fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            commands: Vec::new(),
            default_impls: Vec::new(),
        }
    }
}

/// Mark namespace types implementing `Default` in any of `files`, so an
/// `impl Default` in one file counts for a type declared in another.
pub fn resolve_default_impls(files: &mut [ScannedFile]) {
    let defaults: HashSet<String> = files
        .iter()
        .flat_map(|f| f.default_impls.iter().cloned())
        .collect();
    for info in files.iter_mut().flat_map(|f| f.commands.iter_mut()) {
        if let Shape::Type { default, .. } = &mut info.shape {
            *default |= defaults.contains(&info.name);
        }
    }
}

/// Scan in-memory source. `path` is used for test-file detection and error
/// reporting only.
pub fn scan_source(path: &Path, source: &str) -> Result<Vec<CommandInfo>, ScanError> {
    if common::is_test_file(path) {
        return Ok(Vec::new());
    }
    Ok(parse::parse(path, source)?.commands)
}

/// Scan one file. Test files yield no candidates and are not read.
pub async fn scan_file(path: &Path) -> Result<ScannedFile, ScanError> {
    if common::is_test_file(path) {
        tracing::trace!(path = %path.display(), "Skipping test file");
        return Ok(ScannedFile::empty(path));
    }
    let source = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ScanError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let parsed = parse::parse(path, &source)?;
    tracing::debug!(
        path = %path.display(),
        candidates = parsed.commands.len(),
        "Scanned source file"
    );
    Ok(ScannedFile {
        path: path.to_path_buf(),
        commands: parsed.commands,
        default_impls: parsed.default_impls,
    })
}

/// Scan many files with at most `parallelism` in flight.
///
/// Every file is attempted; if any fail, all failures are returned together
/// as [`ScanError::Multiple`]. Results keep the input order and have
/// cross-file `impl Default` blocks resolved.
pub async fn scan_files(
    paths: Vec<PathBuf>,
    parallelism: usize,
) -> Result<Vec<ScannedFile>, ScanError> {
    let mut scanned = run_bounded(paths, parallelism, |path| async move { scan_file(&path).await })
        .await
        .map_err(ScanError::Multiple)?;
    resolve_default_impls(&mut scanned);
    Ok(scanned)
}
