// LogManager Service
// File logger for the log facade and log retention cleanup

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use chrono::Local;
use log::{Level, LevelFilter, Log, Metadata, Record};

const LOG_STEM: &str = "obs-service-patcher";
pub const LOG_FILE_NAME: &str = "obs-service-patcher.log";

/// Writes every record to the log file and warnings and errors to stderr
pub struct PatcherLogger {
    file: Option<Mutex<fs::File>>,
    level: LevelFilter,
}

impl PatcherLogger {
    /// Open (or create) the log file in `log_dir`. Without a directory the
    /// logger only writes to stderr.
    pub fn new(log_dir: Option<&Path>, level: LevelFilter) -> Result<Self, String> {
        let file = match log_dir {
            Some(dir) => {
                fs::create_dir_all(dir).map_err(|e| format!("Failed to create log dir: {e}"))?;
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(dir.join(LOG_FILE_NAME))
                    .map_err(|e| format!("Failed to open log file: {e}"))?;
                Some(Mutex::new(file))
            }
            None => None,
        };
        Ok(Self { file, level })
    }
}

pub fn format_line(target: &str, level: Level, message: &str) -> String {
    let timestamp = Local::now();
    let date = timestamp.format("%Y-%m-%d");
    let time = timestamp.format("%H:%M:%S");
    format!("[{date}][{time}][{target}][{level}] {message}")
}

impl Log for PatcherLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let message = format!("{}", record.args());
        let line = format_line(record.target(), record.level(), &message);

        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = writeln!(file, "{line}");
            }
        }

        if record.level() <= Level::Warn {
            eprintln!("{line}");
        }
    }

    fn flush(&self) {
        if let Some(file) = &self.file {
            if let Ok(mut file) = file.lock() {
                let _ = file.flush();
            }
        }
    }
}

/// Install the patcher logger. If the log file cannot be opened the logger
/// falls back to stderr only; the error is returned for reporting.
pub fn init_logger(log_dir: Option<&Path>, level: LevelFilter) -> Result<Option<PathBuf>, String> {
    let (logger, file_error) = match PatcherLogger::new(log_dir, level) {
        Ok(logger) => (logger, None),
        Err(e) => (PatcherLogger { file: None, level }, Some(e)),
    };
    let log_path = match (&logger.file, log_dir) {
        (Some(_), Some(dir)) => Some(dir.join(LOG_FILE_NAME)),
        _ => None,
    };

    log::set_boxed_logger(Box::new(logger)).map_err(|e| format!("Failed to set logger: {e}"))?;
    log::set_max_level(level);

    match file_error {
        Some(e) => Err(e),
        None => Ok(log_path),
    }
}

/// True for files this tool writes: the active log and rotated copies of it
fn is_patcher_log(path: &Path) -> bool {
    let stem = path.file_stem().and_then(|stem| stem.to_str()).unwrap_or_default();
    path.extension().and_then(|ext| ext.to_str()) == Some("log")
        && stem.starts_with(LOG_STEM)
}

/// Delete this tool's log files older than `retention_days`. Must run before
/// [`init_logger`]; the active log file is never removed.
pub fn prune_logs(log_dir: &Path, retention_days: u32) -> Result<usize, String> {
    if retention_days == 0 || !log_dir.exists() {
        return Ok(0);
    }

    let cutoff = SystemTime::now()
        .checked_sub(Duration::from_secs(u64::from(retention_days) * 24 * 60 * 60))
        .unwrap_or(SystemTime::UNIX_EPOCH);

    let entries = fs::read_dir(log_dir).map_err(|e| format!("Failed to read log dir: {e}"))?;
    let mut removed = 0;

    for entry in entries.flatten() {
        let path = entry.path();
        if !is_patcher_log(&path) || entry.file_name() == LOG_FILE_NAME {
            continue;
        }

        let stale = entry
            .metadata()
            .and_then(|metadata| metadata.modified())
            .map(|modified| modified < cutoff)
            .unwrap_or(false);
        if stale {
            match fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) => log::debug!("Could not remove {path:?}: {e}"),
            }
        }
    }

    Ok(removed)
}
