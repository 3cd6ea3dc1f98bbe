//! Structured span definitions for tracing.

use std::path::Path;
use std::time::Instant;

use tracing::{Level, Span, field, span};

use crate::common::SourceType;

#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    pub enabled: bool,
    pub level: TracingLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingLevel {
    #[default]
    Info,
    Debug,
    Trace,
}

impl TracingLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            TracingLevel::Info => "info",
            TracingLevel::Debug => "debug",
            TracingLevel::Trace => "trace",
        }
    }
}

impl TracingConfig {
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Default::default()
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Default::default()
        }
    }

    /// Verbose runs log discovery diagnostics at debug level.
    pub fn from_verbose(verbose: bool) -> Self {
        let level = if verbose {
            TracingLevel::Debug
        } else {
            TracingLevel::Info
        };
        Self {
            level,
            ..Self::new()
        }
    }

    /// Directive used when `RUST_LOG` is not set.
    pub fn filter_directive(&self) -> String {
        if !self.enabled {
            return "off".into();
        }
        format!("warn,taskforge={}", self.level.as_str())
    }
}

pub fn discovery_span(project_dir: &Path) -> Span {
    span!(
        Level::INFO,
        "discovery",
        project_dir = %project_dir.display(),
        otel.name = "discovery",
        commands = field::Empty,
        skipped = field::Empty,
    )
}

pub fn command_span(full_name: &str, source: SourceType) -> Span {
    span!(
        Level::INFO,
        "command.execute",
        command = full_name,
        source = %source,
        otel.name = format!("command.{}", full_name),
    )
}

/// Tracks one sidecar compilation.
pub struct CompileSpan {
    span: Span,
    start: Instant,
}

impl CompileSpan {
    pub fn new(files: usize) -> Self {
        let span = span!(
            Level::INFO,
            "extension.compile",
            files = files,
            otel.name = "extension.compile",
            success = field::Empty,
            duration_ms = field::Empty,
        );
        Self {
            span,
            start: Instant::now(),
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    pub fn finish(self, success: bool) {
        self.span.record("success", success);
        self.span
            .record("duration_ms", self.start.elapsed().as_millis() as u64);
    }
}
