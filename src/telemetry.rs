//! OpenTelemetry wiring, enabled only when `OTEL_EXPORTER_OTLP_ENDPOINT` is
//! set. Kept as a thin layer on top of `tracing-subscriber`'s `Registry` so
//! `main` can compose it with the stdout `fmt` layer unconditionally.

use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{runtime, trace as sdktrace, Resource};
use tracing_subscriber::registry::Registry;
use tracing_subscriber::Layer;

/// Builds the OTLP tracing layer from `OTEL_EXPORTER_OTLP_ENDPOINT`, to be
/// composed onto the registry alongside the stdout `fmt` layer in `main`.
pub fn init_telemetry(_registry: &Registry) -> Box<dyn Layer<Registry> + Send + Sync> {
    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").unwrap_or_default();

    let exporter = opentelemetry_otlp::new_exporter().tonic().with_endpoint(endpoint);

    let provider = opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(exporter)
        .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![KeyValue::new(
            "service.name",
            "alicloud-infra-operator",
        )])))
        .install_batch(runtime::Tokio)
        .expect("failed to install OTLP tracing pipeline");

    let tracer = provider.tracer("alicloud-infra-operator");
    Box::new(tracing_opentelemetry::layer().with_tracer(tracer))
}

/// Flushes and shuts down the global tracer provider. Best-effort: called on
/// normal exit so buffered spans aren't dropped.
pub fn shutdown_telemetry() {
    opentelemetry::global::shutdown_tracer_provider();
}
