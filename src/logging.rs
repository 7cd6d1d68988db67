//! Logging infrastructure using tracing + tracing-subscriber
//!
//! stdout belongs to the protocol, so every console layer writes to stderr.
//! An optional rolling file layer runs on a non-blocking writer whose guard
//! `main` keeps alive. `RUST_LOG` refines levels per module.

use std::fs;
use std::io;
use std::path::Path;

use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::LoggingSettings;
use crate::error::{Error, Result};

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync>;

/// Size budgets below this rotate hourly instead of daily
const HOURLY_ROTATION_BELOW_MB: u64 = 10;

/// Keeps the file writer flushing until dropped
pub struct LogGuards {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize logging for the long-running server
pub fn init_logging(settings: &LoggingSettings, verbose: u8, quiet: bool) -> Result<LogGuards> {
    let level = effective_level(settings, verbose, quiet);

    let (file_output, file_guard) = match settings.file.as_deref() {
        Some(file) => {
            let (layer, guard) = file_layer(Path::new(file), settings)?;
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(crate_filter(level))
        .with(stderr_layer(settings.json_format))
        .with(file_output)
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!(
        level = %level,
        file = ?settings.file,
        json = settings.json_format,
        "Logging initialized"
    );

    Ok(LogGuards {
        _file_guard: file_guard,
    })
}

/// Minimal stderr logging for short-lived CLI commands
pub fn init_simple(level: Level) -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .with(fmt::layer().with_writer(io::stderr).without_time().compact())
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to initialize logging: {}", e)))
}

/// `-q` wins, then `-v`/`-vv`, then the configured level
fn effective_level(settings: &LoggingSettings, verbose: u8, quiet: bool) -> Level {
    match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => level_from_name(&settings.level),
        (false, 1) => Level::DEBUG,
        (false, _) => Level::TRACE,
    }
}

fn level_from_name(name: &str) -> Level {
    name.trim().parse().unwrap_or_else(|_| match name.to_lowercase().as_str() {
        "warning" => Level::WARN,
        "critical" => Level::ERROR,
        _ => Level::INFO,
    })
}

/// Base level from `RUST_LOG` or `level`, with this crate pinned to `level`
fn crate_filter(level: Level) -> EnvFilter {
    let name = level.as_str().to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&name));

    match format!("{}={}", env!("CARGO_CRATE_NAME"), name).parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    }
}

fn stderr_layer<S>(json: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let layer = fmt::layer().with_writer(io::stderr).with_target(true);
    if json {
        Box::new(layer.json().with_file(true).with_line_number(true))
    } else {
        Box::new(layer.with_ansi(false).compact())
    }
}

/// tracing-appender rotates on time only; the size budget picks the period
fn rotation_for(max_file_size_mb: u64) -> Rotation {
    if max_file_size_mb > 0 && max_file_size_mb < HOURLY_ROTATION_BELOW_MB {
        Rotation::HOURLY
    } else {
        Rotation::DAILY
    }
}

fn file_layer<S>(path: &Path, settings: &LoggingSettings) -> Result<(BoxedLayer<S>, WorkerGuard)>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    fs::create_dir_all(directory).map_err(|e| Error::write_failed(directory, e))?;

    let prefix = path
        .file_stem()
        .and_then(|n| n.to_str())
        .unwrap_or("persona-switcher");

    let appender = RollingFileAppender::builder()
        .rotation(rotation_for(settings.max_file_size_mb))
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(settings.max_files.max(1) as usize)
        .build(directory)
        .map_err(|e| Error::Internal(format!("Failed to create log file appender: {}", e)))?;

    let (writer, guard) = tracing_appender::non_blocking(appender);
    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_ansi(false);

    let layer: BoxedLayer<S> = if settings.json_format {
        Box::new(layer.json().with_file(true).with_line_number(true))
    } else {
        Box::new(layer)
    };

    Ok((layer, guard))
}
