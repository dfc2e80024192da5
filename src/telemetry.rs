use std::path::Path;
use std::sync::OnceLock;

use opentelemetry::trace::TracerProvider;
use opentelemetry_otlp::SpanExporter;
use opentelemetry_sdk::{trace::SdkTracerProvider, Resource};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::Layer;
use tracing_subscriber::{fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

/// Setting this variable turns on OTLP trace export
const OTLP_ENDPOINT_ENV: &str = "OTEL_EXPORTER_OTLP_ENDPOINT";

fn get_resource() -> Resource {
    static RESOURCE: OnceLock<Resource> = OnceLock::new();
    RESOURCE
        .get_or_init(|| Resource::builder().with_service_name("sitearchive").build())
        .clone()
}

fn init_traces() -> anyhow::Result<SdkTracerProvider> {
    let exporter = SpanExporter::builder().with_http().build()?;

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(get_resource())
        .build())
}

/// Console default; the progress bar shares stderr
const CONSOLE_DEFAULT_DIRECTIVE: &str = "warn";

/// Log file default
const FILE_DEFAULT_DIRECTIVE: &str = "info";

fn filter_from(directives: Option<&str>, default: &str) -> EnvFilter {
    directives
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

// RUST_LOG wins over the defaults
fn env_filter(default: &str) -> EnvFilter {
    let directives = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    filter_from(directives.as_deref(), default)
}

/// Initialize tracing-subscriber with a console layer, an optional log file
/// and optional OTLP export; the returned guard flushes both on drop
pub fn init_tracing_subscriber(log_file: Option<&Path>) -> anyhow::Result<TelemetryGuard> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(env_filter(CONSOLE_DEFAULT_DIRECTIVE));

    let mut file_guard = None;
    let file_layer = match log_file {
        Some(path) => {
            let directory = path
                .parent()
                .filter(|dir| !dir.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("log file {} has no file name", path.display()))?;
            std::fs::create_dir_all(directory)?;

            let appender = RollingFileAppender::new(Rotation::NEVER, directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            file_guard = Some(guard);

            Some(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_filter(env_filter(FILE_DEFAULT_DIRECTIVE)),
            )
        }
        None => None,
    };

    let tracer_provider = match std::env::var_os(OTLP_ENDPOINT_ENV) {
        Some(_) => Some(init_traces()?),
        None => None,
    };
    let otel_layer = tracer_provider
        .as_ref()
        .map(|provider| OpenTelemetryLayer::new(provider.tracer("sitearchive")));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(otel_layer)
        .init();

    Ok(TelemetryGuard {
        tracer_provider,
        _file_guard: file_guard,
    })
}

pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
    _file_guard: Option<WorkerGuard>,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take() {
            if let Err(err) = provider.shutdown() {
                eprintln!("{err:?}");
            }
        }
    }
}
