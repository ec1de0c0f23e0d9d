//! Logging system configuration and initialization
//!
//! - Console (stderr) and file output, each optional
//! - Structured JSON file logs (optional)
//! - The previous run's log file is rotated by renaming it with its timestamp
//! - Old log files beyond `max_files` are removed on startup
//! - Log files stored relative to the executable unless `log_dir` is set

#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use chrono::Local;
use lazy_static::lazy_static;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{
    EnvFilter, Registry,
    fmt::{self, time::FormatTime},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

pub use crate::infrastructure::config::LoggingConfig;
use crate::infrastructure::config::defaults::LOG_FILE_NAME;

// Keeps the non-blocking file writer alive for the whole process
lazy_static! {
    static ref LOG_GUARDS: Mutex<Vec<tracing_appender::non_blocking::WorkerGuard>> =
        Mutex::new(Vec::new());
}

/// Local wall-clock timestamps with millisecond precision
struct LocalTimeFormatter;

impl FormatTime for LocalTimeFormatter {
    fn format_time(&self, w: &mut fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f %:z"))
    }
}

/// Get the log directory relative to the executable location
pub fn get_log_directory() -> PathBuf {
    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());

    exe_dir.join("logs")
}

fn resolve_log_directory(config: &LoggingConfig) -> PathBuf {
    config.log_dir.clone().unwrap_or_else(get_log_directory)
}

/// Initialize the logging system with default configuration
pub fn init_logging() -> Result<()> {
    init_logging_with_config(&LoggingConfig::default())
}

/// Rotate existing log file by renaming it with its timestamp
fn rotate_existing_log_file(log_dir: &Path, log_file_name: &str) -> Result<Option<PathBuf>> {
    let log_file_path = log_dir.join(log_file_name);

    if !log_file_path.exists() {
        return Ok(None);
    }

    let metadata = std::fs::metadata(&log_file_path)
        .map_err(|e| anyhow!("Failed to get log file metadata: {}", e))?;

    let file_time = metadata
        .modified()
        .or_else(|_| metadata.created())
        .unwrap_or_else(|_| std::time::SystemTime::now());

    let datetime: chrono::DateTime<Local> = file_time.into();
    let file_stem = log_file_name.trim_end_matches(".log");
    let timestamped_name = format!("{}.{}.log", file_stem, datetime.format("%Y%m%dT%H%M%S"));
    let timestamped_path = log_dir.join(&timestamped_name);

    std::fs::rename(&log_file_path, &timestamped_path).map_err(|e| {
        anyhow!(
            "Failed to rotate log file {} to {}: {}",
            log_file_path.display(),
            timestamped_path.display(),
            e
        )
    })?;

    Ok(Some(timestamped_path))
}

/// Build the filter: `RUST_LOG` wins, otherwise the configured level plus
/// per-module directives. Dependency noise is only shown at TRACE.
fn build_env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let mut filter = EnvFilter::try_new(&config.level)
        .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?;

    if !config.level.to_lowercase().contains("trace") {
        let mut modules: Vec<_> = config.module_filters.iter().collect();
        modules.sort();
        for (module, level) in modules {
            let directive = format!("{}={}", module, level)
                .parse()
                .map_err(|e| anyhow!("Invalid log directive for '{}': {}", module, e))?;
            filter = filter.add_directive(directive);
        }
    }

    Ok(filter)
}

/// Initialize logging with custom configuration
///
/// # Environment Variable Override
/// ```bash
/// # Show driver internals while debugging an upsert problem
/// RUST_LOG="debug,mongodb=debug" catalog-sync sync --feed feed.xml
/// ```
pub fn init_logging_with_config(config: &LoggingConfig) -> Result<()> {
    let env_filter = build_env_filter(config)?;
    let registry = Registry::default().with(env_filter);

    let mut rotated = None;
    let log_dir = resolve_log_directory(config);

    match (config.file_output, config.console_output) {
        (false, false) => return Err(anyhow!("No logging output configured")),
        (false, true) => {
            let console_layer = fmt::Layer::new()
                .with_writer(std::io::stderr)
                .with_timer(LocalTimeFormatter)
                .with_target(false);

            registry.with(console_layer).init();
        }
        (true, console) => {
            std::fs::create_dir_all(&log_dir)
                .map_err(|e| anyhow!("Failed to create log directory {:?}: {}", log_dir, e))?;

            rotated = rotate_existing_log_file(&log_dir, LOG_FILE_NAME)?;

            let file_appender = rolling::never(&log_dir, LOG_FILE_NAME);
            let (file_writer, file_guard) = non_blocking(file_appender);
            LOG_GUARDS
                .lock()
                .map_err(|_| anyhow!("Log guard registry poisoned"))?
                .push(file_guard);

            // Each branch stacks the console layer on a different subscriber type
            if config.json_format {
                let file_layer = fmt::Layer::new()
                    .json()
                    .with_writer(file_writer)
                    .with_timer(LocalTimeFormatter)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false);
                let console_layer = console.then(|| {
                    fmt::Layer::new()
                        .with_writer(std::io::stderr)
                        .with_timer(LocalTimeFormatter)
                        .with_target(false)
                });

                registry.with(file_layer).with(console_layer).init();
            } else {
                // time + level + message only
                let file_layer = fmt::Layer::new()
                    .with_writer(file_writer)
                    .with_timer(LocalTimeFormatter)
                    .with_target(false)
                    .with_ansi(false);
                let console_layer = console.then(|| {
                    fmt::Layer::new()
                        .with_writer(std::io::stderr)
                        .with_timer(LocalTimeFormatter)
                        .with_target(false)
                });

                registry.with(file_layer).with(console_layer).init();
            }
        }
    }

    info!("Logging system initialized (level: {})", config.level);
    if config.file_output {
        info!("Log directory: {:?}", log_dir);
        if let Some(path) = rotated {
            info!("Rotated previous log file to: {:?}", path);
        }
        if config.auto_cleanup_logs {
            let removed = cleanup_old_logs(&log_dir, config.max_files)?;
            if removed > 0 {
                info!("Removed {} old log files (keeping {})", removed, config.max_files);
            }
        }
    }

    Ok(())
}

/// Remove the oldest `.log` files so that at most `max_files` remain.
/// Returns how many files were deleted.
pub fn cleanup_old_logs(log_dir: &Path, max_files: u32) -> Result<usize> {
    if !log_dir.exists() {
        return Ok(0);
    }

    let mut log_files = Vec::new();
    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(".log"));

        if path.is_file() && is_log {
            if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                log_files.push((path, modified));
            }
        }
    }

    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    let mut removed = 0;
    for (path, _) in log_files.iter().skip(max_files as usize) {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Failed to remove old log file {:?}: {}", path, e);
        } else {
            removed += 1;
        }
    }

    Ok(removed)
}

/// Log system information for diagnostics
pub fn log_system_info() {
    info!("=== Catalog Sync ===");
    info!("Application version: {}", env!("CARGO_PKG_VERSION"));
    info!("Operating system: {}", std::env::consts::OS);
    info!("Architecture: {}", std::env::consts::ARCH);

    if let Ok(current_dir) = std::env::current_dir() {
        info!("Working directory: {:?}", current_dir);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    #[test]
    fn test_logging_config_default() {
        let config = LoggingConfig::default();
        assert!(!config.level.is_empty());
        assert!(config.console_output);
        assert!(config.file_output);
    }

    #[test]
    fn test_log_directory_is_named_logs() {
        assert!(get_log_directory().to_string_lossy().ends_with("logs"));
    }

    #[test]
    fn test_configured_log_directory_wins() {
        let config = LoggingConfig {
            log_dir: Some(PathBuf::from("/var/log/catalog-sync")),
            ..LoggingConfig::default()
        };
        assert_eq!(resolve_log_directory(&config), PathBuf::from("/var/log/catalog-sync"));
    }

    #[test]
    fn test_rotate_existing_log_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LOG_FILE_NAME), "previous run").unwrap();

        let rotated = rotate_existing_log_file(dir.path(), LOG_FILE_NAME).unwrap().unwrap();

        assert!(!dir.path().join(LOG_FILE_NAME).exists());
        assert_eq!(std::fs::read_to_string(&rotated).unwrap(), "previous run");
        let name = rotated.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("catalog-sync.") && name.ends_with(".log"));
    }

    #[test]
    fn test_rotate_without_existing_file_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        assert!(rotate_existing_log_file(dir.path(), LOG_FILE_NAME).unwrap().is_none());
    }

    #[test]
    fn test_cleanup_keeps_newest_files() {
        let dir = tempfile::tempdir().unwrap();
        let now = SystemTime::now();
        for (i, name) in ["a.log", "b.log", "c.log"].iter().enumerate() {
            let path = dir.path().join(name);
            let file = std::fs::File::create(&path).unwrap();
            file.set_modified(now - Duration::from_secs(60 * (i as u64 + 1))).unwrap();
        }
        std::fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        let removed = cleanup_old_logs(dir.path(), 2).unwrap();

        assert_eq!(removed, 1);
        assert!(dir.path().join("a.log").exists());
        assert!(dir.path().join("b.log").exists());
        assert!(!dir.path().join("c.log").exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    // The only test in this binary that installs the global subscriber
    #[test]
    fn test_init_with_json_file_and_console_output() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoggingConfig {
            json_format: true,
            console_output: true,
            file_output: true,
            log_dir: Some(dir.path().to_path_buf()),
            ..LoggingConfig::default()
        };

        init_logging_with_config(&config).unwrap();
        assert!(dir.path().join(LOG_FILE_NAME).exists());
    }

    #[test]
    fn test_env_filter_accepts_default_directives() {
        let config = LoggingConfig::default();
        assert!(build_env_filter(&config).is_ok());
    }
}
