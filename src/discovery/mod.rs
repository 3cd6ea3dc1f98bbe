//! Memoized discovery of project commands.
//!
//! [`CommandDiscovery`] runs the scan, compile and bind pipeline once, then
//! serves lookups and listings from the cached result until [`clear`] is
//! called.
//!
//! ```text
//! Unloaded --discover()--> Loading --ok--> Loaded
//!                              \--err--> Unloaded
//! ```
//!
//! [`clear`]: CommandDiscovery::clear

pub mod reconcile;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::Instrument;

pub use reconcile::{BUILTIN_NAMESPACES, is_namespace_wrapper};

use crate::command::Command;
use crate::config::LoaderConfig;
use crate::loader::{Candidate, LoadReport, Loader};
use crate::observability::discovery_span;
use crate::registry::Registry;

pub const DEFAULT_DESCRIPTION: &str = "Custom command";

/// Display view of one discovered command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredCommand {
    /// Lower-cased lookup name (`deploy`, `pipeline:ci`).
    pub name: String,
    /// Name as declared in source (`Deploy`, `Pipeline:CI`).
    pub original_name: String,
    pub description: String,
    pub is_namespace: bool,
    pub namespace: String,
    pub method: String,
}

impl DiscoveredCommand {
    pub fn from_command(cmd: &Command) -> Self {
        let original_name = if cmd.is_namespaced() {
            format!("{}:{}", cmd.namespace, cmd.method)
        } else {
            cmd.name.clone()
        };
        Self {
            name: cmd.full_name(),
            original_name,
            description: cmd.description.clone(),
            is_namespace: cmd.is_namespaced(),
            namespace: cmd.namespace.clone(),
            method: cmd.method.clone(),
        }
    }

    /// One pre-formatted help line.
    pub fn help_line(&self) -> String {
        let description = if self.description.is_empty() {
            DEFAULT_DESCRIPTION
        } else {
            &self.description
        };
        format!("  {:<20} {} (custom)", self.name, description)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unloaded,
    Loading,
    Loaded,
}

#[derive(Debug)]
struct State {
    phase: Phase,
    commands: Vec<DiscoveredCommand>,
    report: Option<LoadReport>,
}

impl State {
    fn unloaded() -> Self {
        Self {
            phase: Phase::Unloaded,
            commands: Vec::new(),
            report: None,
        }
    }
}

pub struct CommandDiscovery {
    project_dir: PathBuf,
    registry: Arc<Registry>,
    loader: Loader,
    state: Mutex<State>,
}

impl CommandDiscovery {
    /// Discovery over a private registry; nothing is treated as built-in.
    pub fn new(project_dir: impl Into<PathBuf>, config: LoaderConfig) -> Self {
        Self::with_registry(project_dir, config, Arc::new(Registry::new()))
    }

    /// Discovery that binds into (and reconciles against) a shared registry.
    pub fn with_registry(
        project_dir: impl Into<PathBuf>,
        config: LoaderConfig,
        registry: Arc<Registry>,
    ) -> Self {
        Self::with_loader(project_dir, Loader::new(config), registry)
    }

    pub fn with_loader(project_dir: impl Into<PathBuf>, loader: Loader, registry: Arc<Registry>) -> Self {
        Self {
            project_dir: project_dir.into(),
            registry,
            loader,
            state: Mutex::new(State::unloaded()),
        }
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    pub async fn phase(&self) -> Phase {
        self.state.lock().await.phase
    }

    /// Run discovery if it has not completed yet. Concurrent first calls
    /// wait for the one in progress. A failure leaves the state unloaded so
    /// the next call retries.
    pub async fn discover(&self) -> crate::Result<Vec<DiscoveredCommand>> {
        let mut state = self.state.lock().await;
        match state.phase {
            Phase::Loaded => return Ok(state.commands.clone()),
            Phase::Loading => {
                tracing::debug!("Previous discovery was interrupted, starting over");
                self.registry.remove_extensions();
            }
            Phase::Unloaded => {}
        }
        state.phase = Phase::Loading;

        let span = discovery_span(&self.project_dir);
        match self.run().instrument(span.clone()).await {
            Ok(report) => {
                let commands: Vec<DiscoveredCommand> = report
                    .registered
                    .iter()
                    .filter_map(|name| self.registry.get(name))
                    .map(|cmd| DiscoveredCommand::from_command(&cmd))
                    .collect();
                span.record("commands", commands.len());
                span.record("skipped", report.skipped.len());
                tracing::debug!(
                    commands = commands.len(),
                    skipped = report.skipped.len(),
                    excluded = report.excluded.len(),
                    "Discovery complete"
                );
                state.phase = Phase::Loaded;
                state.commands = commands.clone();
                state.report = Some(report);
                Ok(commands)
            }
            Err(e) => {
                state.phase = Phase::Unloaded;
                Err(e)
            }
        }
    }

    async fn run(&self) -> crate::Result<LoadReport> {
        let verbose = self.loader.config().verbose;
        let source = self.loader.resolve_source(&self.project_dir)?;
        if source.is_none() {
            tracing::debug!("No extension sources found");
            return Ok(LoadReport::default());
        }

        let candidates = self.loader.scan(&source).await?;
        let mut excluded = Vec::new();
        let candidates: Vec<Candidate> = candidates
            .into_iter()
            .filter(|candidate| {
                let info = &candidate.info;
                if info.is_namespace || !is_namespace_wrapper(&info.name, &self.registry) {
                    return true;
                }
                if verbose {
                    tracing::info!(command = %info.name, "Excluding wrapper of a built-in namespace command");
                } else {
                    tracing::debug!(command = %info.name, "Excluding wrapper of a built-in namespace command");
                }
                excluded.push(info.full_name());
                false
            })
            .collect();

        let mut report = self
            .loader
            .load_candidates(&self.project_dir, &source, &candidates, &self.registry)
            .await?;
        report.excluded = excluded;
        Ok(report)
    }

    /// Case-insensitive; a discovery failure counts as "not found".
    pub async fn has_command(&self, name: &str) -> bool {
        self.get_command(name).await.is_some()
    }

    pub async fn get_command(&self, name: &str) -> Option<DiscoveredCommand> {
        let commands = match self.discover().await {
            Ok(commands) => commands,
            Err(e) => {
                tracing::debug!(error = %e, "Discovery failed during lookup");
                return None;
            }
        };
        let name = name.to_lowercase();
        commands.into_iter().find(|c| c.name == name)
    }

    pub async fn list_commands(&self) -> crate::Result<Vec<DiscoveredCommand>> {
        self.discover().await
    }

    /// Help lines for every discovered command; empty if discovery fails.
    pub async fn get_commands_for_help(&self) -> Vec<String> {
        match self.discover().await {
            Ok(commands) => commands.iter().map(DiscoveredCommand::help_line).collect(),
            Err(e) => {
                tracing::debug!(error = %e, "Discovery failed while building help");
                Vec::new()
            }
        }
    }

    /// Report of the last successful discovery.
    pub async fn report(&self) -> Option<LoadReport> {
        self.state.lock().await.report.clone()
    }

    /// Forget discovered commands (and unbind them) so the next call
    /// re-scans.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        if state.phase != Phase::Unloaded {
            let removed = self.registry.remove_extensions();
            tracing::debug!(removed, "Cleared discovered commands");
        }
        *state = State::unloaded();
    }
}

impl std::fmt::Debug for CommandDiscovery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDiscovery")
            .field("project_dir", &self.project_dir)
            .field("loader", &self.loader)
            .finish()
    }
}
