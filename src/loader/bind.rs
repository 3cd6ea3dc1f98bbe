//! Resolving dispatched candidates against the sidecar and registering them.

use std::sync::Arc;

use super::manifest::{CommandKind, method_symbol};
use super::{Candidate, ExtensionModule, LoadReport, SkippedCandidate};
use crate::command::{Command, CommandError};
use crate::common::SourceType;
use crate::config::LoaderConfig;
use crate::registry::Registry;

const EXTENSION_CATEGORY: &str = "custom";

/// What a candidate resolved to in the sidecar manifest.
struct Resolved {
    symbol: String,
    kind: CommandKind,
    description: String,
}

fn resolve(module: &ExtensionModule, candidate: &Candidate) -> Result<Resolved, String> {
    let info = &candidate.info;
    let manifest = module.manifest();

    if info.is_method() {
        let entry = manifest
            .find(&info.namespace)
            .filter(|e| e.kind == CommandKind::Namespace)
            .ok_or_else(|| {
                format!("namespace `{}` not reported by compiled extension", info.namespace)
            })?;
        let method = entry
            .methods
            .iter()
            .find(|m| m.name == info.method)
            .ok_or_else(|| {
                format!(
                    "method `{}` not reported for namespace `{}`",
                    info.method, info.namespace
                )
            })?;
        return Ok(Resolved {
            symbol: method_symbol(&info.namespace, &info.method),
            kind: CommandKind::Func,
            description: method.description.clone(),
        });
    }

    let entry = manifest
        .find(&info.name)
        .ok_or_else(|| format!("symbol `{}` not reported by compiled extension", info.name))?;
    match entry.kind {
        CommandKind::Func | CommandKind::Args => Ok(Resolved {
            symbol: entry.symbol.clone(),
            kind: entry.kind,
            description: entry.description.clone(),
        }),
        CommandKind::Namespace => Err(format!("`{}` is a namespace type, not a function", info.name)),
    }
}

fn build_command(
    module: &Arc<ExtensionModule>,
    candidate: &Candidate,
    resolved: Resolved,
) -> Result<Command, CommandError> {
    let info = &candidate.info;
    let builder = if info.is_method() {
        Command::namespace_builder(&info.namespace, &info.method)
    } else {
        Command::builder(&info.name)
    };
    let builder = builder
        .description(resolved.description)
        .long_description(format!(
            "Defined in {}:{}",
            candidate.file.display(),
            info.line
        ))
        .category(EXTENSION_CATEGORY)
        .with_tag("extension")
        .with_source(SourceType::Extension);

    let module = Arc::clone(module);
    let symbol = resolved.symbol;
    let builder = match resolved.kind {
        CommandKind::Args => builder.with_args_func(move |args| {
            let module = Arc::clone(&module);
            let symbol = symbol.clone();
            async move { module.invoke(&symbol, args).await }
        }),
        CommandKind::Func | CommandKind::Namespace => builder.with_func(move || {
            let module = Arc::clone(&module);
            let symbol = symbol.clone();
            async move { module.invoke(&symbol, Vec::new()).await }
        }),
    };
    builder.build()
}

/// Bind every candidate. Failures are recorded in `report` and never stop
/// the remaining candidates.
pub(crate) fn bind(
    module: &Arc<ExtensionModule>,
    candidates: &[Candidate],
    registry: &Registry,
    config: &LoaderConfig,
    report: &mut LoadReport,
) {
    for candidate in candidates {
        let full_name = candidate.info.full_name();
        let command = resolve(module, candidate)
            .and_then(|resolved| build_command(module, candidate, resolved).map_err(|e| e.to_string()));
        let command = match command {
            Ok(command) => command,
            Err(reason) => {
                report.skip(SkippedCandidate::new(candidate, reason), config.verbose);
                continue;
            }
        };

        let shadows_builtin = registry
            .get(&full_name)
            .is_some_and(|existing| existing.is_builtin() && existing.full_name() == full_name);
        let result = if shadows_builtin && config.allow_builtin_override {
            registry.register_override(command)
        } else {
            registry.register(command)
        };

        match result {
            Ok(()) => {
                if shadows_builtin {
                    if config.verbose {
                        tracing::info!(command = %full_name, "Extension command overrides built-in");
                    } else {
                        tracing::debug!(command = %full_name, "Extension command overrides built-in");
                    }
                    report.overridden.push(full_name.clone());
                }
                report.registered.push(full_name);
            }
            Err(e) => report.skip(SkippedCandidate::new(candidate, e.to_string()), config.verbose),
        }
    }
}
