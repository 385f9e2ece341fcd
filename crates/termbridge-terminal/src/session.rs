use chrono::{DateTime, Utc};
use std::time::Instant;
use tokio::sync::mpsc;

use crate::line_buffer::OutputLineBuffer;
use crate::logger::SessionLogger;

/// Live record of one spawned process: its accumulated output lines, the
/// caller's read cursor, and the handle used to feed it input.
///
/// Owned exclusively by the `SessionRegistry` while the process is alive.
/// Lines are append-only; `last_read_index` never exceeds the line count.
#[derive(Debug)]
pub struct Session {
    pub pid: i32,
    /// Queue into the writer task that owns the child's stdin; `None` once
    /// the input pipe is gone
    pub(crate) input_tx: Option<mpsc::Sender<Vec<u8>>>,
    pub(crate) buffer: OutputLineBuffer,
    pub last_read_index: usize,
    /// Set once a quick-prompt pattern or a spawn timeout fired
    pub blocked: bool,
    pub started_at: DateTime<Utc>,
    pub(crate) start: Instant,
    pub(crate) logger: Option<SessionLogger>,
}

impl Session {
    pub fn new(
        pid: i32,
        input_tx: Option<mpsc::Sender<Vec<u8>>>,
        logger: Option<SessionLogger>,
    ) -> Self {
        Self {
            pid,
            input_tx,
            buffer: OutputLineBuffer::new(),
            last_read_index: 0,
            blocked: false,
            started_at: Utc::now(),
            start: Instant::now(),
            logger,
        }
    }

    pub fn runtime_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn lines(&self) -> &[String] {
        self.buffer.lines()
    }
}

/// Frozen history of an exited process, held in the registry's bounded FIFO
/// cache. Created exactly once per session by moving the line history out of
/// the live record at exit.
#[derive(Debug, Clone)]
pub struct CompletedSession {
    pub pid: i32,
    pub lines: Vec<String>,
    pub exit_code: Option<i32>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub runtime_ms: u64,
}
