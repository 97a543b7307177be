//! Structured telemetry for a sweep.
//!
//! Events from the bot and the harness are written as JSON lines to
//! `telemetry.jsonl` next to the Markdown summary. Which events reach the file is
//! decided entirely by the filter built from [`LoggingConfig`]: the configured level
//! applies everywhere except the per-survey target, which stays off unless
//! `survey_details` is set.

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::{self, format::FmtSpan};

use crate::config::{LoggingConfig, ResolvedOutputs};

pub const TELEMETRY_FILE: &str = "telemetry.jsonl";

const SURVEY_TARGET: &str = "pursuit_bot::survey";

/// Keeps the background writer alive; dropping it flushes the telemetry file.
pub struct LoggingGuard(WorkerGuard);

/// Installs the JSON subscriber, or returns `None` when structured logging is off.
///
/// `RUST_LOG` replaces the configured filter when set.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    let path = telemetry_path(outputs);
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("creating telemetry directory at {}", dir.display()))?;
    }
    let file = File::create(&path)
        .with_context(|| format!("creating telemetry file at {}", path.display()))?;

    let (writer, guard) = NonBlockingBuilder::default().lossy(false).finish(file);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(logging)));

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish();

    // Tests may run several sweeps in one process; the first subscriber wins.
    let _ = tracing::subscriber::set_global_default(subscriber);

    Ok(Some(LoggingGuard(guard)))
}

/// Filter directives for the configured level and survey detail switch.
pub fn directives(logging: &LoggingConfig) -> String {
    let level = logging.level().unwrap_or(Level::INFO);
    let survey = if logging.survey_details { "info" } else { "off" };
    format!(
        "{},{SURVEY_TARGET}={survey}",
        level.as_str().to_ascii_lowercase()
    )
}

/// Directory holding the telemetry log: the summary's parent, or the working directory.
pub fn telemetry_dir(outputs: &ResolvedOutputs) -> PathBuf {
    outputs
        .summary_md
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn telemetry_path(outputs: &ResolvedOutputs) -> PathBuf {
    telemetry_dir(outputs).join(TELEMETRY_FILE)
}
