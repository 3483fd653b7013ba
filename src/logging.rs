use std::{fs, path::Path};

use anyhow::{Context, Result, anyhow};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, Layer, filter::LevelFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt,
};
use uuid::Uuid;

use crate::config::{LoggingConfig, LoggingRotation};

const LOG_FILE_PREFIX: &str = "volition";
const LOG_FILE_SUFFIX: &str = "jsonl";

/// Keeps the non-blocking file writer alive; dropping it flushes pending
/// events.
pub struct LoggingGuard {
    _worker_guard: WorkerGuard,
    run_id: String,
}

impl LoggingGuard {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }
}

/// Installs the global subscriber: JSON lines into `volition.<period>.jsonl`
/// files and, optionally, WARN and above on stderr. Stdout is left to the
/// bus.
pub fn init_tracing(logging_config: &LoggingConfig) -> Result<LoggingGuard> {
    let filter = parse_filter(&logging_config.filter)?;
    let appender = file_appender(logging_config)?;
    let (writer, worker_guard) = tracing_appender::non_blocking(appender);

    let file_layer = fmt::layer()
        .json()
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_current_span(true)
        .with_span_list(true)
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(filter);
    let stderr_layer = logging_config.stderr_warn_enabled.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(ErrorLayer::default())
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("failed to initialize tracing subscriber")?;

    let run_id = Uuid::now_v7().to_string();
    tracing::info!(
        target: "logging",
        run_id = %run_id,
        dir = %logging_config.dir.display(),
        filter = %logging_config.filter,
        rotation = ?logging_config.rotation,
        kept_files = kept_files(logging_config),
        "logging_initialized"
    );

    Ok(LoggingGuard {
        _worker_guard: worker_guard,
        run_id,
    })
}

fn parse_filter(filter: &str) -> Result<EnvFilter> {
    if filter.trim().is_empty() {
        return Err(anyhow!("logging.filter cannot be empty"));
    }
    EnvFilter::try_new(filter).with_context(|| format!("invalid logging.filter '{filter}'"))
}

/// Rolling appender that prunes files beyond the retention window on every
/// rollover.
fn file_appender(logging_config: &LoggingConfig) -> Result<RollingFileAppender> {
    let dir: &Path = &logging_config.dir;
    if dir.as_os_str().is_empty() {
        return Err(anyhow!("logging.dir cannot be empty"));
    }
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create logging directory {}", dir.display()))?;

    let rotation = match logging_config.rotation {
        LoggingRotation::Daily => Rotation::DAILY,
        LoggingRotation::Hourly => Rotation::HOURLY,
    };
    RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(kept_files(logging_config))
        .build(dir)
        .with_context(|| format!("failed to open log files in {}", dir.display()))
}

/// Number of rotated files covering `retention_days`, never less than one.
fn kept_files(logging_config: &LoggingConfig) -> usize {
    let per_day = match logging_config.rotation {
        LoggingRotation::Daily => 1,
        LoggingRotation::Hourly => 24,
    };
    logging_config.retention_days.max(1).saturating_mul(per_day)
}
