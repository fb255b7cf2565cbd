//! Logging backend for the `log` facade.
//!
//! Every record is kept in a bounded in-memory buffer that an embedding app can
//! show in a log viewer. When logging is enabled in the configuration, records
//! are also appended to `<data_dir>/rollsync/rollsync.log` through `fern`.

use anyhow::{Context, Result};
use chrono::Local;
use log::LevelFilter;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::Config;

const MAX_BUFFERED_LINES: usize = 1000;

/// Shared logger that can be used across the application
#[derive(Clone)]
pub struct Logger {
    logs: Arc<Mutex<Vec<String>>>,
    log_file: Option<PathBuf>,
    file_sink: Arc<AtomicBool>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            logs: Arc::new(Mutex::new(Vec::new())),
            log_file: None,
            file_sink: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Build a logger; `enabled` adds the file sink.
    pub fn from_config(enabled: bool) -> Result<Self> {
        let mut logger = Self::new();
        if enabled {
            let path = Self::get_log_file_path()?;
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
            }
            logger.log_file = Some(path);
        }
        Ok(logger)
    }

    /// File logging was requested in the configuration.
    pub fn is_enabled(&self) -> bool {
        self.log_file.is_some()
    }

    /// Records are being written to the log file, i.e. `install` chained the file sink.
    pub fn has_file_writer(&self) -> bool {
        self.file_sink.load(Ordering::SeqCst)
    }

    pub fn get_log_file_path() -> Result<PathBuf> {
        Ok(Config::get_data_dir()?.join("rollsync.log"))
    }

    /// Add a log entry
    pub fn log(&self, message: String) {
        let timestamp = Local::now().format("%H:%M:%S%.3f");
        self.push(format!("[{}] {}", timestamp, message));
    }

    fn push(&self, line: String) {
        if let Ok(mut logs) = self.logs.lock() {
            if logs.len() >= MAX_BUFFERED_LINES {
                logs.remove(0);
            }
            logs.push(line);
        }
    }

    /// Get all logs sorted by date (newest first)
    pub fn get_logs(&self) -> Vec<String> {
        if let Ok(logs) = self.logs.lock() {
            let mut sorted_logs = logs.clone();
            sorted_logs.reverse();
            sorted_logs
        } else {
            Vec::new()
        }
    }

    /// Clear all logs
    pub fn clear(&self) {
        if let Ok(mut logs) = self.logs.lock() {
            logs.clear();
        }
    }

    /// Install this logger as the global `log` backend.
    ///
    /// Only the first call in a process takes effect; later calls return an error.
    pub fn install(&self, level: LevelFilter) -> Result<()> {
        let memory = self.clone();

        let mut dispatch = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "[{}] {:<5} {}: {}",
                    Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                    record.level(),
                    record.target(),
                    message
                ))
            })
            .level(level)
            .level_for("sqlx", LevelFilter::Warn)
            .level_for("sea_orm", LevelFilter::Warn)
            .level_for("hyper_util", LevelFilter::Warn)
            .level_for("reqwest", LevelFilter::Warn)
            .chain(fern::Output::call(move |record| memory.push(record.args().to_string())));

        if let Some(path) = &self.log_file {
            let file = fern::log_file(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            dispatch = dispatch.chain(file);
        }

        dispatch.apply().context("A global logger is already installed")?;
        self.file_sink.store(self.log_file.is_some(), Ordering::SeqCst);
        Ok(())
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}
