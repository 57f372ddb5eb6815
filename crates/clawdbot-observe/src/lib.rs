//! Observability for the ClawDBot relay: tracing subscriber setup with
//! human or JSON output and optional OpenTelemetry export.

pub mod tracing_setup;
