//! Logging setup for the HOO client.
//!
//! Console output with uptime timestamps and targets, plus an optional JSON
//! log file for post-mortem analysis of a session. The filter comes from
//! `RUST_LOG` when set, otherwise from the config's `debug.log_level`.

use std::fs::File;
use std::path::{Path, PathBuf};

use hoo_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Name of the JSON log file inside the log directory.
pub const LOG_FILE: &str = "hoo-client.log";

const DEFAULT_FILTER: &str = "info";

/// Filter string for `config`, falling back to [`DEFAULT_FILTER`].
fn filter_directives(config: Option<&Config>) -> &str {
    config
        .map(|c| c.debug.log_level.as_str())
        .filter(|level| !level.is_empty())
        .unwrap_or(DEFAULT_FILTER)
}

/// Create the log directory and truncate the JSON log file.
fn open_log_file(log_dir: &Path) -> std::io::Result<(File, PathBuf)> {
    std::fs::create_dir_all(log_dir)?;
    let path = log_dir.join(LOG_FILE);
    Ok((File::create(&path)?, path))
}

/// Install the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file
/// * `file_logging` - whether to write the JSON log file at all
/// * `config` - source of the default log filter
///
/// Calling this twice panics, as with any global subscriber.
pub fn init_logging(log_dir: Option<&Path>, file_logging: bool, config: Option<&Config>) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true) // connect/reader threads are named
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if file_logging
        && let Some(log_dir) = log_dir
        && let Ok((log_file, path)) = open_log_file(log_dir)
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        tracing::debug!("Writing JSON logs to {}", path.display());
        return;
    }

    subscriber.init();
}

/// `EnvFilter` with the default directives, for tests and tools.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}
