use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Local;

const LOG_FILE_NAME: &str = "sweeper_log.txt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    System,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
            LogLevel::System => "SYSTEM",
        };
        write!(f, "{}", name)
    }
}

/// Append-only job log shared by every worker of an orchestrator. One line
/// per entry, `[YYYY-MM-DD HH:MM:SS] [LEVEL] message`; writers are serialized
/// behind a mutex so lines never interleave. Logging failures go to stderr
/// and are never returned to the caller.
#[derive(Debug)]
pub struct JobLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JobLog {
    pub fn new(log_dir: &Path) -> JobLog {
        if let Err(err) = fs::create_dir_all(log_dir) {
            eprintln!("job log: cannot create {}: {}", log_dir.display(), err);
        }
        JobLog {
            path: log_dir.join(LOG_FILE_NAME),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log(&self, msg: &str, level: LogLevel) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("[{}] [{}] {}\n", timestamp, level, msg);

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(err) = result {
            eprintln!("job log write failed: {}", err);
        }
    }

    pub fn info(&self, msg: &str) {
        self.log(msg, LogLevel::Info);
    }

    pub fn warning(&self, msg: &str) {
        self.log(msg, LogLevel::Warning);
    }

    pub fn error(&self, msg: &str) {
        self.log(msg, LogLevel::Error);
    }

    /// Explicit maintenance action, deliberately not run on every write: if
    /// the log file has grown past `max_size_bytes`, rename it to a
    /// timestamped backup and let the next write start a fresh file.
    pub fn rotate_if_needed(&self, max_size_bytes: u64) {
        let rotated = {
            let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
            match fs::metadata(&self.path) {
                Ok(meta) if meta.len() > max_size_bytes => {
                    let stamp = Local::now().format("%Y%m%d_%H%M%S");
                    let backup = self
                        .path
                        .with_file_name(format!("sweeper_log_{}.txt", stamp));
                    match fs::rename(&self.path, &backup) {
                        Ok(()) => true,
                        Err(err) => {
                            eprintln!("log rotation failed: {}", err);
                            false
                        }
                    }
                }
                _ => false,
            }
        };
        if rotated {
            self.log("Log rotated", LogLevel::System);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn writes_timestamped_lines() {
        let dir = TempDir::new().unwrap();
        let log = JobLog::new(dir.path());

        log.info("first message");
        log.log("bad news", LogLevel::Error);

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("] [INFO] first message"));
        assert!(lines[1].ends_with("] [ERROR] bad news"));
        // "[YYYY-MM-DD HH:MM:SS] " prefix is 22 characters
        assert_eq!(&lines[0][0..1], "[");
        assert_eq!(&lines[0][20..22], "] ");
    }

    #[test]
    fn concurrent_writers_never_interleave() {
        let dir = TempDir::new().unwrap();
        let log = Arc::new(JobLog::new(dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let log = Arc::clone(&log);
                thread::spawn(move || {
                    for i in 0..50 {
                        log.info(&format!("writer {} line {}", n, i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let contents = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 8 * 50);
        for line in lines {
            assert!(line.contains("] [INFO] writer "), "mangled line: {}", line);
        }
    }

    #[test]
    fn rotation_moves_oversized_log_aside() {
        let dir = TempDir::new().unwrap();
        let log = JobLog::new(dir.path());

        log.info("grow the file a little");
        log.rotate_if_needed(1);

        let entries: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(entries.iter().any(|n| n.starts_with("sweeper_log_")));
        // the rotation itself is logged into a fresh file
        let contents = fs::read_to_string(log.path()).unwrap();
        assert!(contents.contains("[SYSTEM] Log rotated"));
    }

    #[test]
    fn rotation_below_threshold_is_a_noop() {
        let dir = TempDir::new().unwrap();
        let log = JobLog::new(dir.path());

        log.info("small");
        log.rotate_if_needed(1024 * 1024);

        let entries: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(entries, vec![LOG_FILE_NAME.to_string()]);
    }
}
