use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::{NonBlockingBuilder, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

pub const TELEMETRY_FILE: &str = "telemetry.jsonl";
const MEMORY_DETAILS_ENV: &str = "TELLS_MEMORY_DETAILS";

/// Holds the telemetry writer open; drop it to flush before reading the file back.
pub struct LoggingGuard {
    _worker: WorkerGuard,
    pub telemetry_path: PathBuf,
}

/// Routes engine and harness events as JSON lines into the run's telemetry file.
///
/// Returns `None` when structured logging is off. `RUST_LOG` wins over the
/// configured directives.
pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    if logging.memory_details {
        // SAFETY: runs on the main thread before the tournament runtime starts.
        unsafe {
            std::env::set_var(MEMORY_DETAILS_ENV, "1");
        }
    }

    let telemetry_path = open_telemetry_path(&outputs.telemetry_dir())?;
    let file = File::create(&telemetry_path)
        .with_context(|| format!("opening {} for telemetry", telemetry_path.display()))?;
    let (writer, worker) = NonBlockingBuilder::default().lossy(false).finish(file);

    let level = logging.level().unwrap_or(Level::INFO);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(level, logging.memory_details)));

    let subscriber = fmt()
        .json()
        .with_current_span(false)
        .with_env_filter(filter)
        .with_writer(writer)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!(
            target: "tells_bench::logging",
            "subscriber already installed; telemetry file stays empty"
        );
    }

    Ok(Some(LoggingGuard {
        _worker: worker,
        telemetry_path,
    }))
}

fn open_telemetry_path(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("creating telemetry directory {}", dir.display()))?;
    Ok(dir.join(TELEMETRY_FILE))
}

/// Harness and engine targets at `level`; memory snapshots need DEBUG on `tells_bot::memory`.
fn filter_directives(level: Level, memory_details: bool) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let mut directives = format!("warn,tells_bench={level},tells_bot={level}");
    if memory_details {
        directives.push_str(",tells_bot::memory=debug");
    }
    directives
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_scope_level_to_our_targets() {
        assert_eq!(
            filter_directives(Level::INFO, false),
            "warn,tells_bench=info,tells_bot=info"
        );
    }

    #[test]
    fn memory_details_open_the_memory_target() {
        let directives = filter_directives(Level::WARN, true);
        assert!(directives.ends_with(",tells_bot::memory=debug"));
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn telemetry_directory_is_created() {
        let dir = tempfile::tempdir().expect("tempdir");
        let nested = dir.path().join("run").join("out");
        let path = open_telemetry_path(&nested).expect("path");
        assert!(nested.is_dir());
        assert_eq!(path, nested.join(TELEMETRY_FILE));
    }
}
