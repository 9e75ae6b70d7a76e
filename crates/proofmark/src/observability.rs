//! Logging setup: human-readable stderr plus JSONL files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const ENV_LOG_PATH: &str = "PROOFMARK_LOG_PATH";
const ENV_LOG_DIR: &str = "PROOFMARK_LOG_DIR";
const LOG_FILE_NAME: &str = "proofmark.jsonl";

/// Where log files go.
#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    /// Explicit log file. Not rotated.
    pub log_path: Option<PathBuf>,
    /// Directory for daily-rotated log files.
    pub log_dir: Option<PathBuf>,
}

impl ObservabilityConfig {
    /// Resolve log locations.
    ///
    /// `PROOFMARK_LOG_PATH` wins, then `PROOFMARK_LOG_DIR`, then the
    /// configured directory, then `<data dir>/logs`.
    pub fn from_env_with_overrides(config_log_dir: Option<PathBuf>) -> Self {
        let log_path = std::env::var_os(ENV_LOG_PATH).map(PathBuf::from);
        let log_dir = std::env::var_os(ENV_LOG_DIR)
            .map(PathBuf::from)
            .or(config_log_dir)
            .or_else(|| {
                proofmark_core::config::user_data_local_dir()
                    .map(|dir| dir.join("logs").into_std_path_buf())
            });
        Self { log_path, log_dir }
    }
}

/// Build the filter: `-q` and `-v` beat `RUST_LOG`, which beats the
/// configured level.
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    match (quiet, verbose) {
        (true, _) => EnvFilter::new("error"),
        (false, 1) => EnvFilter::new("debug"),
        (false, 2..) => EnvFilter::new("trace"),
        (false, 0) => {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
        }
    }
}

/// Install the global subscriber. Keep the returned guard alive until exit
/// so buffered file output is flushed.
pub fn init_observability(
    cfg: &ObservabilityConfig,
    filter: EnvFilter,
) -> anyhow::Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let (file_layer, guard) = match file_appender(cfg) {
        Some(appender) => {
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().json().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")?;

    Ok(guard)
}

/// File sink, or `None` when no usable location exists. Logging to a file
/// is best effort.
fn file_appender(cfg: &ObservabilityConfig) -> Option<tracing_appender::rolling::RollingFileAppender> {
    if let Some(path) = &cfg.log_path {
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        let file = path.file_name()?;
        std::fs::create_dir_all(dir).ok()?;
        return Some(tracing_appender::rolling::never(dir, file));
    }

    let dir = cfg.log_dir.as_ref()?;
    std::fs::create_dir_all(dir).ok()?;
    Some(tracing_appender::rolling::daily(dir, LOG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_overrides_verbose() {
        assert_eq!(env_filter(true, 3, "info").to_string(), "error");
    }

    #[test]
    fn verbosity_levels() {
        assert_eq!(env_filter(false, 1, "info").to_string(), "debug");
        assert_eq!(env_filter(false, 2, "info").to_string(), "trace");
    }

    #[test]
    fn no_location_means_no_file() {
        let cfg = ObservabilityConfig::default();
        assert!(file_appender(&cfg).is_none());
    }

    #[test]
    fn default_log_dir_is_under_the_core_data_dir() {
        if std::env::var_os(ENV_LOG_DIR).is_some() {
            return;
        }
        let cfg = ObservabilityConfig::from_env_with_overrides(None);
        let expected = proofmark_core::config::user_data_local_dir()
            .map(|dir| dir.join("logs").into_std_path_buf());
        assert_eq!(cfg.log_dir, expected);
    }

    #[test]
    fn configured_log_dir_is_used() {
        if std::env::var_os(ENV_LOG_DIR).is_some() {
            return;
        }
        let cfg = ObservabilityConfig::from_env_with_overrides(Some(PathBuf::from("/tmp/pm-logs")));
        assert_eq!(cfg.log_dir, Some(PathBuf::from("/tmp/pm-logs")));
    }

    #[test]
    fn log_dir_is_created() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("logs");
        let cfg = ObservabilityConfig {
            log_path: None,
            log_dir: Some(dir.clone()),
        };
        assert!(file_appender(&cfg).is_some());
        assert!(dir.is_dir());
    }
}
