//! Structured tracing for discovery, compilation and command execution.
//!
//! The library only emits spans and events through `tracing`; installing a
//! subscriber is left to the binary (see `TracingConfig::filter_directive`).

mod spans;

pub use spans::{CompileSpan, TracingConfig, TracingLevel, command_span, discovery_span};
