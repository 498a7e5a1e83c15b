use std::path::{Path, PathBuf};

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

static INIT: OnceCell<()> = OnceCell::new();

const ENABLED_VAR: &str = "AGENT_STREAM_LOG_ENABLED";
const LEVEL_VAR: &str = "AGENT_STREAM_LOG_LEVEL";
const FILE_VAR: &str = "AGENT_STREAM_LOG_FILE";
const DEFAULT_FILTER: &str = "info";

/// Where log lines go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogOutput {
    /// Compact lines on stderr, so a terminal display on stdout stays clean.
    Stderr,
    /// One JSON object per line, appended to the file.
    JsonFile(PathBuf),
}

/// Logging setup resolved from the environment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogSettings {
    pub enabled: bool,
    pub filter: String,
    pub output: LogOutput,
}

impl LogSettings {
    /// Reads:
    /// - `AGENT_STREAM_LOG_ENABLED`: `false`/`off`/`0` turns logging off (default on).
    /// - `AGENT_STREAM_LOG_LEVEL`, then `RUST_LOG`: filter directives (default `info`).
    /// - `AGENT_STREAM_LOG_FILE`: JSON-lines log file instead of stderr.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let enabled = lookup(ENABLED_VAR)
            .and_then(|value| parse_switch(&value))
            .unwrap_or(true);
        let filter = [LEVEL_VAR, "RUST_LOG"]
            .into_iter()
            .filter_map(&lookup)
            .find(|directives| EnvFilter::try_new(directives).is_ok())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let output = match lookup(FILE_VAR) {
            Some(path) if !path.trim().is_empty() => LogOutput::JsonFile(PathBuf::from(path)),
            _ => LogOutput::Stderr,
        };
        Self {
            enabled,
            filter,
            output,
        }
    }
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Installs the global subscriber once per process, using [`LogSettings::from_env`].
///
/// Later calls, and calls after another subscriber was installed, do nothing.
pub fn init_observability() {
    INIT.get_or_init(|| install(LogSettings::from_env()));
}

fn install(settings: LogSettings) {
    if !settings.enabled {
        return;
    }
    let filter = EnvFilter::try_new(&settings.filter)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match settings.output {
        LogOutput::Stderr => {
            let layer = tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr);
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init();
        }
        LogOutput::JsonFile(path) => {
            let (dir, file_name) = split_log_path(&path);
            let _ = std::fs::create_dir_all(&dir);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_target(false)
                .with_writer(tracing_appender::rolling::never(dir, file_name));
            let _ = tracing_subscriber::registry()
                .with(filter)
                .with(layer)
                .try_init();
        }
    }
}

/// A bare file name logs into the working directory.
fn split_log_path(path: &Path) -> (PathBuf, PathBuf) {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    let file_name = path
        .file_name()
        .map_or_else(|| PathBuf::from("agent-stream.jsonl"), PathBuf::from);
    (dir, file_name)
}
