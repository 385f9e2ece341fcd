use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::json;
use termbridge_types::OutputSource;

/// Per-session JSONL logger for process I/O and lifecycle events.
///
/// One log file per pid under the log directory; every entry is a single
/// JSON object with a timestamp. Logging failures are ignored by callers so
/// a full disk never breaks a session.
pub struct SessionLogger {
    pid: i32,
    log_file: File,
}

impl std::fmt::Debug for SessionLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionLogger").field("pid", &self.pid).finish()
    }
}

impl SessionLogger {
    /// Create a new session logger
    pub fn new(pid: i32, log_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

        let log_path = log_dir.join(format!("session-{}.log", pid));
        let log_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .context("Failed to create log file")?;

        Ok(Self { pid, log_file })
    }

    /// Log input written to the process
    pub fn log_input(&mut self, data: &str) -> Result<()> {
        self.log_event(json!({
            "timestamp": Utc::now().to_rfc3339(),
            "pid": self.pid,
            "direction": "in",
            "data": data,
        }))
    }

    /// Log output read from the process
    pub fn log_output(&mut self, source: OutputSource, data: &str) -> Result<()> {
        let source = match source {
            OutputSource::Stdout => "stdout",
            OutputSource::Stderr => "stderr",
        };
        self.log_event(json!({
            "timestamp": Utc::now().to_rfc3339(),
            "pid": self.pid,
            "direction": "out",
            "source": source,
            "data": data,
        }))
    }

    /// Log process exit
    pub fn log_exit(&mut self, exit_code: Option<i32>) -> Result<()> {
        self.log_event(json!({
            "timestamp": Utc::now().to_rfc3339(),
            "pid": self.pid,
            "event": "exit",
            "exit_code": exit_code,
        }))
    }

    fn log_event(&mut self, entry: serde_json::Value) -> Result<()> {
        writeln!(self.log_file, "{}", entry).context("Failed to write to log file")?;
        self.log_file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logger_writes_jsonl_entries() {
        let dir = tempfile::tempdir().unwrap();
        let mut logger = SessionLogger::new(4242, dir.path().to_path_buf()).unwrap();
        logger.log_input("1+1\n").unwrap();
        logger.log_output(OutputSource::Stdout, "2\n").unwrap();
        logger.log_exit(Some(0)).unwrap();

        let contents =
            std::fs::read_to_string(dir.path().join("session-4242.log")).unwrap();
        let entries: Vec<serde_json::Value> = contents
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["direction"], "in");
        assert_eq!(entries[1]["source"], "stdout");
        assert_eq!(entries[2]["event"], "exit");
        assert_eq!(entries[2]["exit_code"], 0);
    }
}
