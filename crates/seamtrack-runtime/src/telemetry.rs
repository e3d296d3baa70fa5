//! Tracing bootstrap for seamtrack binaries.
//!
//! Call [`init_tracing`] once at process start.  Step and reset events
//! emitted by [`Traverse`][crate::traverse::Traverse] are then routed to the
//! console and, optionally, to an OTLP collector.
//!
//! # Environment variables
//!
//! | Variable | Effect |
//! |---|---|
//! | `OTEL_EXPORTER_OTLP_ENDPOINT` | OTLP/HTTP collector base URL.  Enables span export when set. |
//! | `RUST_LOG` | Log filter (default `"info"`; `seamtrack_runtime=debug` shows every step). |
//! | `SEAMTRACK_LOG_FORMAT=json` | Emit newline-delimited JSON instead of compact text. |
//!
//! # Example
//!
//! ```rust,no_run
//! let _guard = seamtrack_runtime::telemetry::init_tracing("seamtrack");
//! ```

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{Resource, trace::SdkTracerProvider};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber.
///
/// Hold the returned [`TelemetryGuard`] until exit; dropping it flushes any
/// spans still buffered by the exporter.  Calling this twice in one process
/// is a no-op for the second call.
pub fn init_tracing(service_name: &str) -> TelemetryGuard {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = if json_requested() {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().compact().boxed()
    };

    let provider = build_provider(service_name);
    let otel_layer = provider
        .as_ref()
        .map(|p| tracing_opentelemetry::layer().with_tracer(p.tracer("seamtrack")));

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .try_init();

    TelemetryGuard(provider)
}

fn json_requested() -> bool {
    std::env::var("SEAMTRACK_LOG_FORMAT").as_deref() == Ok("json")
}

/// Shuts the OTel provider down on drop.
pub struct TelemetryGuard(Option<SdkTracerProvider>);

impl TelemetryGuard {
    /// `true` when spans are being exported to a collector.
    pub fn exporting(&self) -> bool {
        self.0.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.0.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("[seamtrack] OpenTelemetry provider shutdown error: {e}");
        }
    }
}

/// `None` when no collector endpoint is configured or the exporter cannot
/// be built; the caller then logs to the console only.
fn build_provider(service_name: &str) -> Option<SdkTracerProvider> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok()?;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(endpoint)
        .build()
        .map_err(|e| eprintln!("[seamtrack] OTLP exporter init failed: {e}"))
        .ok()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    // The simple exporter needs no async runtime; the stepping loop is
    // synchronous.
    Some(
        SdkTracerProvider::builder()
            .with_resource(resource)
            .with_simple_exporter(exporter)
            .build(),
    )
}
