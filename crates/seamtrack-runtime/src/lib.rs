//! `seamtrack-runtime` – the stepping engine.
//!
//! Drives the perceive–estimate–act cycle one discrete step at a time.
//! Nothing here owns a clock: an external driver (the CLI, a renderer, a
//! test) calls [`Traverse::step`] as often as it likes and reads back a
//! [`StepResult`][seamtrack_types::StepResult].
//!
//! # Modules
//!
//! - [`traverse`] – [`Traverse`][traverse::Traverse]: the single live
//!   tracking state, its step transition, and the boundary reset.
//!   [`TraverseConfig`][traverse::TraverseConfig] holds the rig parameters
//!   and rejects invalid ones up front.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: installs the
//!   global `tracing` subscriber with an optional OTLP span exporter.

pub mod telemetry;
pub mod traverse;

pub use telemetry::{TelemetryGuard, init_tracing};
pub use traverse::{Traverse, TraverseConfig};
