use std::str::FromStr;

use miette::{IntoDiagnostic, WrapErr};
use opentelemetry::InstrumentationScope;
use opentelemetry::trace::TracerProvider;
use opentelemetry_resource_detectors::{HostResourceDetector, OsResourceDetector};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::resource::{EnvResourceDetector, ResourceDetector};
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config;

/// The filter used when `RUST_LOG` is unset.
const DEFAULT_FILTER: &str = "bookshelf=info,googlebooks=info";

/// Format of log lines written to stderr.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format `{other}`, expected text or json")),
        }
    }
}

/// Returns a list of resource detectors to use to enrich OTel attributes.
fn otel_resource_detectors() -> Vec<Box<dyn ResourceDetector>> {
    vec![
        Box::new(EnvResourceDetector::default()),
        Box::new(OsResourceDetector),
        Box::new(HostResourceDetector::default()),
    ]
}

/// Builds a tracer provider that exports spans over OTLP/HTTP.
fn otel_provider() -> miette::Result<SdkTracerProvider> {
    let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .build()
        .into_diagnostic()
        .wrap_err("building otlp http exporter failed")?;
    let res_detectors = otel_resource_detectors();
    let provider = SdkTracerProvider::builder()
        .with_batch_exporter(otlp_exporter)
        .with_resource(
            Resource::builder_empty()
                .with_service_name(env!("CARGO_PKG_NAME"))
                .with_detectors(&res_detectors)
                .build(),
        )
        .build();

    Ok(provider)
}

/// Installs the global tracing subscriber.
///
/// Returns the OTLP tracer provider when span export is enabled, which should be shut down before
/// exiting so pending spans are flushed.
///
/// # Errors
///
/// Returns an error if the exporter cannot be built or a global subscriber is already installed.
pub fn try_init(
    tracing: &config::TracingConfig,
    format: LogFormat,
) -> miette::Result<Option<SdkTracerProvider>> {
    let provider = if tracing.enabled {
        Some(otel_provider()?)
    } else {
        None
    };

    let telemetry_layer = provider.as_ref().map(|provider| {
        let scope = InstrumentationScope::builder(env!("CARGO_PKG_NAME"))
            .with_version(env!("CARGO_PKG_VERSION"))
            .with_schema_url("https://opentelemetry.io/schema/1.0.0")
            .build();
        let tracer = provider.tracer_with_scope(scope);

        tracing_opentelemetry::layer().with_tracer(tracer)
    });

    // Logs go to stderr so that command output on stdout stays machine-readable
    let text_layer = (format == LogFormat::Text)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));
    let json_layer = (format == LogFormat::Json)
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into()),
        )
        .with(telemetry_layer)
        .with(text_layer)
        .with(json_layer)
        .try_init()
        .into_diagnostic()
        .wrap_err("could not init registry")?;

    info!(otlp = tracing.enabled, ?format, "tracing initialized");

    Ok(provider)
}

/// Flushes and shuts down the OTLP tracer provider.
pub fn shutdown(provider: Option<SdkTracerProvider>) {
    if let Some(provider) = provider
        && let Err(err) = provider.shutdown()
    {
        debug!(%err, "could not shut down tracer provider");
    }
}
