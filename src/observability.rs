// SPDX-License-Identifier: Apache-2.0

//! Logging and observability helpers.

pub mod sensitive;

pub use sensitive::Sensitive;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::Local;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "permission-copilot.log";
const LOG_RETENTION_DAYS: u64 = 14;
const DEFAULT_FILTER: &str = "permission_copilot=info,copilot_core=info,copilot_graphql=info";

/// Installs the JSON file subscriber and the panic hook.
///
/// Standard output stays reserved for command responses.
pub fn init_tracing() {
    let log_dir = log_directory();
    let _ = fs::create_dir_all(&log_dir);

    if let Err(e) = cleanup_old_logs(&log_dir, LOG_RETENTION_DAYS) {
        eprintln!("Failed to clean up old logs: {}", e);
    }

    let file_appender: RollingFileAppender =
        tracing_appender::rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(file_appender)
        .json()
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_current_span(true)
        .with_span_list(true)
        .with_ansi(false)
        .with_span_events(FmtSpan::CLOSE)
        .try_init();

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let payload = panic_info.payload();
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            format!("PANIC: {}", s)
        } else if let Some(s) = payload.downcast_ref::<String>() {
            format!("PANIC: {}", s)
        } else {
            "PANIC: unknown cause".to_string()
        };

        tracing::error!(
            target: "panic",
            location = %location,
            message = %msg,
            "Permission copilot panicked"
        );
        previous_hook(panic_info);
    }));

    tracing::info!("Tracing initialized. Logs directory: {:?}", log_dir);
}

pub struct LogExport {
    pub filename: String,
    pub content: String,
}

/// Concatenates every log file, oldest first, for attaching to a report.
pub fn collect_logs() -> Result<LogExport, String> {
    collect_logs_from(&log_directory())
}

fn collect_logs_from(log_dir: &Path) -> Result<LogExport, String> {
    let entries = fs::read_dir(log_dir)
        .map_err(|e| format!("Failed to read log directory {}: {}", log_dir.display(), e))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with(LOG_FILE_PREFIX))
                .unwrap_or(false)
        })
        .collect();

    if files.is_empty() {
        return Err("No log files found".to_string());
    }

    files.sort_by_key(|path| path.file_name().map(|name| name.to_os_string()));

    let mut content = String::new();
    for path in files {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("unknown");
        let data = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read log file {}: {}", path.display(), e))?;

        if !content.is_empty() {
            content.push_str("\n\n");
        }
        content.push_str(&format!("===== {} =====\n", filename));
        content.push_str(&data);
    }

    let filename = format!(
        "permission-copilot-logs-{}.log",
        Local::now().format("%Y%m%d-%H%M%S")
    );

    Ok(LogExport { filename, content })
}

fn log_directory() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_default();
    path.push(".permission-copilot");
    path.push("logs");
    path
}

/// Removes rolled files older than the retention window. Daily rolling
/// appends a date after the prefix, so files are matched by prefix.
fn cleanup_old_logs(log_dir: &Path, retention_days: u64) -> std::io::Result<()> {
    let now = SystemTime::now();
    let retention_duration = Duration::from_secs(retention_days * 24 * 60 * 60);

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX));
        if !is_log {
            continue;
        }

        let Ok(modified) = fs::metadata(&path).and_then(|m| m.modified()) else {
            continue;
        };
        if now.duration_since(modified).is_ok_and(|age| age > retention_duration) {
            if let Err(e) = fs::remove_file(&path) {
                eprintln!("Failed to remove old log file {:?}: {}", path, e);
            }
        }
    }
    Ok(())
}
