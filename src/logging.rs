//! Tracing setup.
//!
//! Events go to stdout in compact form and, when the file can be opened, to a log file through a
//! non-blocking writer. Settings are read from the environment, so `.env` must be loaded first.
use std::env;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "info";
const DEFAULT_LOG_FILE: &str = "logs/summarize-pro.log";

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Log verbosity and destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    /// `EnvFilter` directives (`RUST_LOG`, default `info`).
    pub filter: String,
    /// Append target for the file layer (`SUMMARIZE_PRO_LOG_FILE`).
    pub file: PathBuf,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl LogSettings {
    /// Read `RUST_LOG` and `SUMMARIZE_PRO_LOG_FILE`; blank values fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            filter: non_blank_var("RUST_LOG").unwrap_or(defaults.filter),
            file: non_blank_var("SUMMARIZE_PRO_LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.file),
        }
    }
}

fn non_blank_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Install the global subscriber. Call once, before anything logs.
pub fn init_tracing(settings: &LogSettings) {
    let env_filter = EnvFilter::try_new(&settings.filter).unwrap_or_else(|err| {
        eprintln!("Ignoring invalid log filter {:?}: {err}", settings.filter);
        EnvFilter::new(DEFAULT_FILTER)
    });
    let file_layer = open_log_file(&settings.file).map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).compact())
        .with(file_layer)
        .init();
}

/// Open `path` for appending, creating its directory. `None` disables file logging.
fn open_log_file(path: &Path) -> Option<NonBlocking> {
    let dir = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    if let Err(err) = dir.map_or(Ok(()), fs::create_dir_all) {
        eprintln!("Failed to create log directory for {}: {err}", path.display());
        return None;
    }

    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => {
            let (writer, guard) = tracing_appender::non_blocking(file);
            let _ = LOG_GUARD.set(guard);
            Some(writer)
        }
        Err(err) => {
            eprintln!("Failed to open log file {}: {err}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_env;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("summarize-pro-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).expect("scratch dir");
        dir
    }

    #[test]
    fn defaults_apply_when_variables_are_unset_or_blank() {
        let _env = test_env::lock(&[("RUST_LOG", Some("  ")), ("SUMMARIZE_PRO_LOG_FILE", None)]);

        assert_eq!(LogSettings::from_env(), LogSettings::default());
        assert_eq!(LogSettings::default().filter, "info");
    }

    #[test]
    fn settings_see_values_loaded_from_env_file() {
        let _env = test_env::lock(&[("RUST_LOG", None), ("SUMMARIZE_PRO_LOG_FILE", None)]);
        let dir = scratch_dir("dotenv");
        let log_path = dir.join("service.log");
        let env_file = dir.join(".env");
        fs::write(
            &env_file,
            format!(
                "RUST_LOG=summarizepro=debug\nSUMMARIZE_PRO_LOG_FILE={}\n",
                log_path.display()
            ),
        )
        .expect("write env file");

        dotenvy::from_path(&env_file).expect("load env file");
        let settings = LogSettings::from_env();

        assert_eq!(settings.filter, "summarizepro=debug");
        assert_eq!(settings.file, log_path);
    }

    #[test]
    fn log_file_directory_is_created() {
        let path = scratch_dir("logfile").join("nested").join("out.log");

        assert!(open_log_file(&path).is_some());
        assert!(path.exists());
    }
}
