//! Logging and OpenTelemetry initialization.
//!
//! Console logging through `tracing-subscriber` is always on. When an OTLP
//! endpoint is configured, traces, logs and metrics are also exported over
//! gRPC.

use std::time::Duration;

use anyhow::{Context, Result};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, KeyValue};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::metrics::SdkMeterProvider;
use opentelemetry_sdk::trace::{RandomIdGenerator, Sampler, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use trackconf::TelemetryConfig;

/// Timeout for OTLP exports - prevents blocking on unavailable endpoints
const EXPORT_TIMEOUT: Duration = Duration::from_secs(5);

/// Keeps exporters alive; call [`TelemetryGuard::shutdown`] before exit to flush.
#[must_use]
pub struct TelemetryGuard {
    otel: Option<OtelProviders>,
}

struct OtelProviders {
    tracer: SdkTracerProvider,
    logger: SdkLoggerProvider,
    meter: SdkMeterProvider,
}

pub fn init(cfg: &TelemetryConfig) -> Result<TelemetryGuard> {
    let env_filter = EnvFilter::try_new(&cfg.log_level)
        .with_context(|| format!("Invalid log filter: {}", cfg.log_level))?;

    let Some(endpoint) = cfg.otlp_endpoint.as_deref() else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
            .context("Failed to install tracing subscriber")?;
        tracing::info!("Logging initialized (no OTLP endpoint configured)");
        return Ok(TelemetryGuard { otel: None });
    };

    let resource = Resource::builder_empty()
        .with_service_name("trackside")
        .with_attributes(vec![KeyValue::new("service.version", env!("CARGO_PKG_VERSION"))])
        .build();
    let endpoint = otlp_url(endpoint);

    let trace_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.clone())
        .with_timeout(EXPORT_TIMEOUT)
        .build()
        .context("Failed to create OTLP span exporter")?;

    let tracer_provider = SdkTracerProvider::builder()
        .with_span_processor(
            opentelemetry_sdk::trace::BatchSpanProcessor::builder(trace_exporter).build(),
        )
        .with_sampler(Sampler::AlwaysOn)
        .with_id_generator(RandomIdGenerator::default())
        .with_resource(resource.clone())
        .build();
    let tracer = tracer_provider.tracer("trackside");
    global::set_tracer_provider(tracer_provider.clone());

    let log_exporter = opentelemetry_otlp::LogExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.clone())
        .with_timeout(EXPORT_TIMEOUT)
        .build()
        .context("Failed to create OTLP log exporter")?;

    let logger_provider = SdkLoggerProvider::builder()
        .with_log_processor(
            opentelemetry_sdk::logs::BatchLogProcessor::builder(log_exporter).build(),
        )
        .with_resource(resource.clone())
        .build();

    let metric_exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint.clone())
        .with_timeout(EXPORT_TIMEOUT)
        .build()
        .context("Failed to create OTLP metric exporter")?;

    let meter_provider = SdkMeterProvider::builder()
        .with_reader(opentelemetry_sdk::metrics::PeriodicReader::builder(metric_exporter).build())
        .with_resource(resource)
        .build();
    global::set_meter_provider(meter_provider.clone());

    let log_appender =
        opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge::new(&logger_provider);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .with(log_appender)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!(
        endpoint = %endpoint,
        "OpenTelemetry initialized; exporting traces, logs and metrics"
    );

    Ok(TelemetryGuard {
        otel: Some(OtelProviders {
            tracer: tracer_provider,
            logger: logger_provider,
            meter: meter_provider,
        }),
    })
}

impl TelemetryGuard {
    /// Flush and stop exporters.
    pub fn shutdown(self) {
        let Some(otel) = self.otel else {
            return;
        };
        tracing::info!("Shutting down OpenTelemetry exporters");
        if let Err(e) = otel.tracer.shutdown() {
            eprintln!("trace exporter shutdown failed: {e:?}");
        }
        if let Err(e) = otel.meter.shutdown() {
            eprintln!("metric exporter shutdown failed: {e:?}");
        }
        if let Err(e) = otel.logger.shutdown() {
            eprintln!("log exporter shutdown failed: {e:?}");
        }
    }
}

/// Accept both `host:port` and full URLs.
fn otlp_url(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}
