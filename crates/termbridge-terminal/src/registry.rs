//! Session registry: the single source of truth for session existence and
//! output history.
//!
//! Holds the active sessions plus a bounded FIFO cache of completed ones. A
//! pid belongs to exactly one of the two collections at any time; the move
//! happens atomically inside `complete`. Also serves the paginated reads
//! over a session's line buffer (tail, cursor, and absolute regimes).

use std::collections::{HashMap, VecDeque};

use chrono::Utc;
use termbridge_types::{
    ActiveSessionInfo, OutputSource, PaginatedRead, COMPLETED_SESSION_CAP,
};

use crate::session::{CompletedSession, Session};

/// Output position captured before an interaction, used to compute exactly
/// what that interaction produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSnapshot {
    pub total_chars: usize,
    pub line_count: usize,
}

#[derive(Debug)]
pub struct SessionRegistry {
    active: HashMap<i32, Session>,
    /// Registration order of active pids, for stable listings
    order: Vec<i32>,
    completed: VecDeque<CompletedSession>,
    completed_cap: usize,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::with_completed_cap(COMPLETED_SESSION_CAP)
    }

    pub fn with_completed_cap(completed_cap: usize) -> Self {
        Self {
            active: HashMap::new(),
            order: Vec::new(),
            completed: VecDeque::new(),
            completed_cap,
        }
    }

    /// Register a newly spawned session
    pub fn insert(&mut self, session: Session) {
        let pid = session.pid;
        self.active.insert(pid, session);
        self.order.push(pid);
    }

    pub fn get(&self, pid: i32) -> Option<&Session> {
        self.active.get(&pid)
    }

    pub fn get_mut(&mut self, pid: i32) -> Option<&mut Session> {
        self.active.get_mut(&pid)
    }

    pub fn is_active(&self, pid: i32) -> bool {
        self.active.contains_key(&pid)
    }

    pub fn completed(&self, pid: i32) -> Option<&CompletedSession> {
        self.completed.iter().find(|c| c.pid == pid)
    }

    /// True when the pid is known at all, active or completed
    pub fn contains(&self, pid: i32) -> bool {
        self.is_active(pid) || self.completed(pid).is_some()
    }

    /// Route an output chunk into the session's line buffer. Unknown or
    /// already-completed pids are ignored: late pipe data after the exit
    /// handoff has nowhere to go.
    pub fn append_output(&mut self, pid: i32, chunk: &str, source: OutputSource) {
        if let Some(session) = self.active.get_mut(&pid) {
            session.buffer.append(chunk);
            if let Some(logger) = session.logger.as_mut() {
                let _ = logger.log_output(source, chunk);
            }
        }
    }

    pub fn mark_blocked(&mut self, pid: i32) {
        if let Some(session) = self.active.get_mut(&pid) {
            session.blocked = true;
        }
    }

    /// Atomically move a session into the completed cache, evicting the
    /// earliest-inserted entry beyond the cap
    pub fn complete(&mut self, pid: i32, exit_code: Option<i32>) {
        let Some(mut session) = self.active.remove(&pid) else {
            return;
        };
        self.order.retain(|p| *p != pid);
        if let Some(logger) = session.logger.as_mut() {
            let _ = logger.log_exit(exit_code);
        }

        self.completed.push_back(CompletedSession {
            pid,
            lines: session.buffer.take_lines(),
            exit_code,
            started_at: session.started_at,
            ended_at: Utc::now(),
            runtime_ms: session.runtime_ms(),
        });
        while self.completed.len() > self.completed_cap {
            self.completed.pop_front();
        }
    }

    /// Active sessions in registration order
    pub fn list_active(&self) -> Vec<ActiveSessionInfo> {
        self.order
            .iter()
            .filter_map(|pid| self.active.get(pid))
            .map(|session| ActiveSessionInfo {
                pid: session.pid,
                is_blocked: session.blocked,
                runtime_ms: session.runtime_ms(),
            })
            .collect()
    }

    pub fn output_line_count(&self, pid: i32) -> Option<usize> {
        if let Some(session) = self.active.get(&pid) {
            return Some(session.buffer.len());
        }
        self.completed(pid).map(|c| c.lines.len())
    }

    /// Paginated read. `offset < 0` is a tail read, `offset == 0` reads new
    /// lines since the cursor (the only regime that mutates session state),
    /// `offset > 0` is an absolute read. `None` means the pid is unknown in
    /// both collections — distinct from an empty read.
    pub fn read_paginated(
        &mut self,
        pid: i32,
        offset: i64,
        length: usize,
    ) -> Option<PaginatedRead> {
        if let Some(session) = self.active.get_mut(&pid) {
            let (read, new_cursor) = read_from_lines(
                session.buffer.lines(),
                offset,
                length,
                session.last_read_index,
            );
            if let Some(cursor) = new_cursor {
                session.last_read_index = cursor;
            }
            return Some(read);
        }

        let completed = self.completed(pid)?;
        let (mut read, _) = read_from_lines(&completed.lines, offset, length, 0);
        read.is_complete = true;
        read.exit_code = completed.exit_code;
        read.runtime_ms = Some(completed.runtime_ms);
        Some(read)
    }

    /// Capture the current output extent of an active session
    pub fn snapshot(&self, pid: i32) -> Option<OutputSnapshot> {
        let session = self.active.get(&pid)?;
        Some(OutputSnapshot {
            total_chars: session.buffer.joined().chars().count(),
            line_count: session.buffer.len(),
        })
    }

    /// Text produced since a snapshot, for active or completed sessions.
    /// Empty when nothing new arrived; `None` when the pid is unknown.
    pub fn output_since_snapshot(&self, pid: i32, snapshot: &OutputSnapshot) -> Option<String> {
        let full = self.full_output(pid)?;
        let chars = full.chars().count();
        if chars <= snapshot.total_chars {
            return Some(String::new());
        }
        Some(full.chars().skip(snapshot.total_chars).collect())
    }

    /// The full joined history of a session, active or completed
    pub fn full_output(&self, pid: i32) -> Option<String> {
        if let Some(session) = self.active.get(&pid) {
            return Some(session.buffer.joined());
        }
        self.completed(pid).map(|c| c.lines.join("\n"))
    }
}

/// Serve one read over a line buffer. Returns the read plus the new cursor
/// position when the cursor regime was used.
fn read_from_lines(
    lines: &[String],
    offset: i64,
    length: usize,
    last_read_index: usize,
) -> (PaginatedRead, Option<usize>) {
    let total_lines = lines.len();

    let (start, advances_cursor) = if offset < 0 {
        let from_end = offset.unsigned_abs() as usize;
        (total_lines.saturating_sub(from_end), false)
    } else if offset == 0 {
        (last_read_index, true)
    } else {
        (offset as usize, false)
    };

    let slice_start = start.min(total_lines);
    let slice_end = start.saturating_add(length).min(total_lines);
    let read_lines: Vec<String> = lines[slice_start..slice_end].to_vec();

    let read_count = read_lines.len();
    let end_index = start + read_count;
    let remaining = total_lines.saturating_sub(end_index);

    let new_cursor = if advances_cursor {
        Some(end_index.min(total_lines))
    } else {
        None
    };

    (
        PaginatedRead {
            lines: read_lines,
            total_lines,
            read_from: start,
            read_count,
            remaining,
            is_complete: false,
            exit_code: None,
            runtime_ms: None,
        },
        new_cursor,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry_with_session(pid: i32, lines: &[&str]) -> SessionRegistry {
        let mut registry = SessionRegistry::new();
        registry.insert(Session::new(pid, None, None));
        registry.append_output(pid, &lines.join("\n"), OutputSource::Stdout);
        registry
    }

    #[test]
    fn unknown_pid_reads_none_not_empty() {
        let mut registry = SessionRegistry::new();
        assert!(registry.read_paginated(999, 0, 10).is_none());
        assert!(registry.output_line_count(999).is_none());

        registry.insert(Session::new(1, None, None));
        let read = registry.read_paginated(1, 0, 10).unwrap();
        assert_eq!(read.read_count, 0);
    }

    #[test]
    fn cursor_reads_advance_and_are_idempotent() {
        let mut registry = registry_with_session(7, &["a", "b", "c"]);

        let first = registry.read_paginated(7, 0, 10).unwrap();
        assert_eq!(first.lines, ["a", "b", "c"]);
        assert_eq!(first.read_from, 0);
        assert_eq!(registry.get(7).unwrap().last_read_index, 3);

        // No new output: repeated cursor reads return nothing and never move
        // the cursor backward
        let second = registry.read_paginated(7, 0, 10).unwrap();
        assert_eq!(second.read_count, 0);
        assert_eq!(registry.get(7).unwrap().last_read_index, 3);

        registry.append_output(7, "\nd", OutputSource::Stdout);
        let third = registry.read_paginated(7, 0, 10).unwrap();
        assert_eq!(third.lines, ["d"]);
    }

    #[test]
    fn cursor_read_respects_length_limit() {
        let mut registry = registry_with_session(7, &["a", "b", "c", "d"]);
        let read = registry.read_paginated(7, 0, 2).unwrap();
        assert_eq!(read.lines, ["a", "b"]);
        assert_eq!(read.remaining, 2);
        assert_eq!(registry.get(7).unwrap().last_read_index, 2);
    }

    #[test]
    fn tail_reads_never_touch_the_cursor() {
        let mut registry = registry_with_session(7, &["a", "b", "c", "d"]);
        registry.read_paginated(7, 0, 2).unwrap();

        let tail = registry.read_paginated(7, -2, 100).unwrap();
        assert_eq!(tail.lines, ["c", "d"]);
        assert_eq!(tail.read_from, 2);
        assert_eq!(registry.get(7).unwrap().last_read_index, 2);

        // Tail longer than the buffer clamps to everything
        let all = registry.read_paginated(7, -100, 100).unwrap();
        assert_eq!(all.lines, ["a", "b", "c", "d"]);
    }

    #[test]
    fn absolute_reads_are_pure() {
        let mut registry = registry_with_session(7, &["a", "b", "c", "d"]);
        let first = registry.read_paginated(7, 1, 2).unwrap();
        let second = registry.read_paginated(7, 1, 2).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.lines, ["b", "c"]);
        assert_eq!(first.remaining, 1);
        assert_eq!(registry.get(7).unwrap().last_read_index, 0);
    }

    #[test]
    fn absolute_read_past_the_end_is_empty() {
        let mut registry = registry_with_session(7, &["a", "b"]);
        let read = registry.read_paginated(7, 10, 5).unwrap();
        assert_eq!(read.read_count, 0);
        assert_eq!(read.remaining, 0);
        assert_eq!(read.total_lines, 2);
    }

    #[test]
    fn complete_moves_history_and_reports_exit() {
        let mut registry = registry_with_session(7, &["out"]);
        registry.complete(7, Some(0));

        assert!(!registry.is_active(7));
        assert!(registry.contains(7));

        let read = registry.read_paginated(7, 0, 10).unwrap();
        assert!(read.is_complete);
        assert_eq!(read.exit_code, Some(0));
        assert_eq!(read.lines, ["out"]);
        assert!(read.runtime_ms.is_some());

        // Cursor regime does not persist a cursor on completed sessions
        let again = registry.read_paginated(7, 0, 10).unwrap();
        assert_eq!(again.lines, ["out"]);
    }

    #[test]
    fn completed_cache_evicts_fifo_beyond_cap() {
        let mut registry = SessionRegistry::with_completed_cap(3);
        for pid in 1..=4 {
            registry.insert(Session::new(pid, None, None));
            registry.append_output(pid, &format!("line {}", pid), OutputSource::Stdout);
            registry.complete(pid, Some(0));
        }

        // Inserting the 4th evicted exactly the earliest
        assert!(registry.completed(1).is_none());
        for pid in 2..=4 {
            assert!(registry.completed(pid).is_some());
        }
        assert_eq!(registry.completed.len(), 3);

        // No re-promotion on re-read: reading pid 2 then completing another
        // still evicts pid 2 first
        registry.read_paginated(2, 0, 10).unwrap();
        registry.insert(Session::new(5, None, None));
        registry.complete(5, Some(0));
        assert!(registry.completed(2).is_none());
        assert!(registry.completed(3).is_some());
    }

    #[test]
    fn listing_preserves_registration_order() {
        let mut registry = SessionRegistry::new();
        for pid in [30, 10, 20] {
            registry.insert(Session::new(pid, None, None));
        }
        registry.mark_blocked(10);

        let listed = registry.list_active();
        let pids: Vec<i32> = listed.iter().map(|s| s.pid).collect();
        assert_eq!(pids, [30, 10, 20]);
        assert!(listed[1].is_blocked);
        assert!(!listed[0].is_blocked);

        registry.complete(10, None);
        let pids: Vec<i32> = registry.list_active().iter().map(|s| s.pid).collect();
        assert_eq!(pids, [30, 20]);
    }

    #[test]
    fn snapshot_diffing_returns_only_new_output() {
        let mut registry = registry_with_session(7, &["before"]);
        let snapshot = registry.snapshot(7).unwrap();

        assert_eq!(registry.output_since_snapshot(7, &snapshot).unwrap(), "");

        registry.append_output(7, "\nafter", OutputSource::Stdout);
        assert_eq!(
            registry.output_since_snapshot(7, &snapshot).unwrap(),
            "\nafter"
        );
        assert!(registry.output_since_snapshot(999, &snapshot).is_none());
    }
}
