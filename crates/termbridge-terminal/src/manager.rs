//! Spawn-and-wait and send-input coordination over piped child processes.
//!
//! `ProcessManager` is the facade the tool layer talks to. It owns the
//! session registry and the state detector, spawns children with piped
//! stdio, pumps their output into the registry from per-session reader
//! tasks, and races quick-prompt detection, process exit, and the caller's
//! timeout when a spawn is awaited. All waits are structured selects with a
//! single resolution; timeout is the only cancellation.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot, Mutex};

use termbridge_types::{
    ActiveSessionInfo, ExitReason, OutputEvent, OutputSource, PaginatedRead, ProcessState,
    SpawnOutcome, TimingInfo, TERMINATE_GRACE_MS,
};

use crate::detect::{PromptDetector, StateDetector};
use crate::logger::SessionLogger;
use crate::registry::{OutputSnapshot, SessionRegistry};
use crate::session::Session;
use crate::shell::{resolve_shell, shell_spawn_config};

/// Why a spawn produced no session
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("Error: Failed to execute command: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("Error: Failed to get process ID. The command could not be executed.")]
    NoPid,
}

/// Facade over the process-interaction engine
pub struct ProcessManager {
    registry: Arc<Mutex<SessionRegistry>>,
    detector: Arc<dyn StateDetector>,
    log_dir: PathBuf,
    work_dir: Option<PathBuf>,
}

impl std::fmt::Debug for ProcessManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessManager")
            .field("log_dir", &self.log_dir)
            .field("work_dir", &self.work_dir)
            .finish()
    }
}

impl ProcessManager {
    /// Create a manager with the default prompt heuristics
    pub fn new(log_dir: PathBuf) -> Self {
        Self::with_detector(log_dir, Arc::new(PromptDetector::new()))
    }

    /// Create a manager with a specific detection strategy
    pub fn with_detector(log_dir: PathBuf, detector: Arc<dyn StateDetector>) -> Self {
        Self {
            registry: Arc::new(Mutex::new(SessionRegistry::new())),
            detector,
            log_dir,
            work_dir: None,
        }
    }

    /// Working directory for every spawned child
    pub fn with_work_dir(mut self, work_dir: PathBuf) -> Self {
        self.work_dir = Some(work_dir);
        self
    }

    pub fn detector(&self) -> Arc<dyn StateDetector> {
        Arc::clone(&self.detector)
    }

    /// Spawn a command and wait until a quick prompt is seen on stdout, the
    /// child exits, or the timeout elapses, whichever comes first. The
    /// session stays registered (blocked) for the prompt and timeout
    /// outcomes and moves to the completed cache on exit. A failed spawn
    /// returns pid `-1` with an error message and registers nothing.
    pub async fn execute_command(
        &self,
        command: &str,
        timeout_ms: u64,
        shell: Option<&str>,
        collect_timing: bool,
    ) -> SpawnOutcome {
        let started_at = Utc::now();
        let start = Instant::now();

        let (pid, mut chunk_rx, mut exit_rx) = match self.spawn_session(command, shell).await {
            Ok(handles) => handles,
            Err(err) => {
                let timing = collect_timing.then(|| TimingInfo {
                    started_at,
                    ended_at: Utc::now(),
                    total_duration_ms: start.elapsed().as_millis() as u64,
                    exit_reason: ExitReason::ProcessExit,
                    time_to_first_output_ms: None,
                    events: Vec::new(),
                });
                return SpawnOutcome {
                    pid: -1,
                    output: err.to_string(),
                    is_blocked: false,
                    timing,
                };
            }
        };

        let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
        let mut output = String::new();
        let mut events: Vec<OutputEvent> = Vec::new();
        let mut first_output: Option<Instant> = None;
        let mut exit_reason = ExitReason::Timeout;
        let mut is_blocked = false;
        let mut chunks_open = true;

        loop {
            tokio::select! {
                chunk = chunk_rx.recv(), if chunks_open => {
                    let Some((source, text)) = chunk else {
                        chunks_open = false;
                        continue;
                    };
                    if first_output.is_none() {
                        first_output = Some(Instant::now());
                    }
                    if collect_timing {
                        events.push(output_event(source, &text, start));
                    }
                    output.push_str(&text);

                    if source == OutputSource::Stdout {
                        if let Some(_prompt) = self.detector.quick_prompt(&text) {
                            self.registry.lock().await.mark_blocked(pid);
                            if let Some(last) = events.last_mut() {
                                last.matched_pattern = Some("quick_pattern".to_string());
                            }
                            exit_reason = ExitReason::EarlyExitQuickPattern;
                            is_blocked = true;
                            break;
                        }
                    }
                }
                _ = &mut exit_rx => {
                    exit_reason = ExitReason::ProcessExit;
                    is_blocked = false;
                    break;
                }
                _ = tokio::time::sleep_until(deadline) => {
                    self.registry.lock().await.mark_blocked(pid);
                    exit_reason = ExitReason::Timeout;
                    is_blocked = true;
                    break;
                }
            }
        }

        // Fold in chunks that were already queued when the wait resolved
        while let Ok((source, text)) = chunk_rx.try_recv() {
            if first_output.is_none() {
                first_output = Some(Instant::now());
            }
            if collect_timing {
                events.push(output_event(source, &text, start));
            }
            output.push_str(&text);
        }

        let timing = collect_timing.then(|| TimingInfo {
            started_at,
            ended_at: Utc::now(),
            total_duration_ms: start.elapsed().as_millis() as u64,
            exit_reason,
            time_to_first_output_ms: first_output.map(|t| (t - start).as_millis() as u64),
            events,
        });

        SpawnOutcome {
            pid,
            output,
            is_blocked,
            timing,
        }
    }

    async fn spawn_session(
        &self,
        command: &str,
        shell: Option<&str>,
    ) -> Result<
        (
            i32,
            mpsc::UnboundedReceiver<(OutputSource, String)>,
            oneshot::Receiver<Option<i32>>,
        ),
        SpawnError,
    > {
        let shell_path = resolve_shell(shell);
        let config = shell_spawn_config(&shell_path, command);

        let mut cmd = if config.use_os_shell {
            // Unrecognized shell: let it interpret the command string itself
            let mut cmd = Command::new(&shell_path);
            if cfg!(windows) {
                cmd.arg("/c");
            } else {
                cmd.arg("-c");
            }
            cmd.arg(&config.executable);
            cmd
        } else {
            let mut cmd = Command::new(&config.executable);
            cmd.args(&config.args);
            cmd
        };

        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .env("TERM", "xterm-256color")
            .env("PYTHONIOENCODING", "utf-8");
        if let Some(dir) = &self.work_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn()?;
        let pid = child.id().ok_or(SpawnError::NoPid)? as i32;

        // The writer task owns stdin so input never blocks a registry lock
        let input_tx = child.stdin.take().map(|mut stdin| {
            let (tx, mut rx) = mpsc::channel::<Vec<u8>>(64);
            tokio::spawn(async move {
                while let Some(bytes) = rx.recv().await {
                    if stdin.write_all(&bytes).await.is_err() {
                        break;
                    }
                    let _ = stdin.flush().await;
                }
            });
            tx
        });

        let logger = SessionLogger::new(pid, self.log_dir.clone()).ok();
        self.registry
            .lock()
            .await
            .insert(Session::new(pid, input_tx, logger));

        let (chunk_tx, chunk_rx) = mpsc::unbounded_channel();
        let mut reader_handles = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            reader_handles.push(tokio::spawn(pump_output(
                stdout,
                OutputSource::Stdout,
                pid,
                Arc::clone(&self.registry),
                chunk_tx.clone(),
            )));
        }
        if let Some(stderr) = child.stderr.take() {
            reader_handles.push(tokio::spawn(pump_output(
                stderr,
                OutputSource::Stderr,
                pid,
                Arc::clone(&self.registry),
                chunk_tx.clone(),
            )));
        }
        drop(chunk_tx);

        let (exit_tx, exit_rx) = oneshot::channel();
        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            let status = child.wait().await;
            let code = status.ok().and_then(|s| s.code());
            // Drain both pipes fully before the handoff so the completed
            // history contains every line the process wrote
            for handle in reader_handles {
                let _ = handle.await;
            }
            registry.lock().await.complete(pid, code);
            let _ = exit_tx.send(code);
        });

        Ok((pid, chunk_rx, exit_rx))
    }

    /// Queue input for a session's stdin, appending a trailing newline when
    /// absent. `false` means no active session or a closed input pipe — the
    /// caller surfaces that as an explicit failure, not an exception.
    pub async fn send_input(&self, pid: i32, input: &str) -> bool {
        let tx = {
            let registry = self.registry.lock().await;
            match registry.get(pid).and_then(|s| s.input_tx.clone()) {
                Some(tx) => tx,
                None => return false,
            }
        };

        let data = if input.ends_with('\n') {
            input.to_string()
        } else {
            format!("{}\n", input)
        };

        if tx.send(data.clone().into_bytes()).await.is_err() {
            return false;
        }

        let mut registry = self.registry.lock().await;
        if let Some(session) = registry.get_mut(pid) {
            if let Some(logger) = session.logger.as_mut() {
                let _ = logger.log_input(&data);
            }
        }
        true
    }

    /// Interrupt the process, then force-kill it one second later if the
    /// session is still registered. Returns `false` when there is no active
    /// session for the pid.
    pub async fn force_terminate(&self, pid: i32) -> bool {
        if !self.registry.lock().await.is_active(pid) {
            return false;
        }

        send_signal(pid, false);

        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(TERMINATE_GRACE_MS)).await;
            if registry.lock().await.is_active(pid) {
                send_signal(pid, true);
            }
        });
        true
    }

    /// Classify a session's state from the given output text, folding in the
    /// exit status when the pid is already in the completed cache
    pub async fn analyze_state(&self, pid: i32, output: &str) -> ProcessState {
        let exit_code = {
            let registry = self.registry.lock().await;
            if registry.is_active(pid) {
                None
            } else {
                registry.completed(pid).map(|c| c.exit_code.unwrap_or(-1))
            }
        };
        self.detector.classify(output, exit_code)
    }

    pub async fn list_active(&self) -> Vec<ActiveSessionInfo> {
        self.registry.lock().await.list_active()
    }

    pub async fn is_active(&self, pid: i32) -> bool {
        self.registry.lock().await.is_active(pid)
    }

    pub async fn read_paginated(
        &self,
        pid: i32,
        offset: i64,
        length: usize,
    ) -> Option<PaginatedRead> {
        self.registry.lock().await.read_paginated(pid, offset, length)
    }

    pub async fn output_line_count(&self, pid: i32) -> Option<usize> {
        self.registry.lock().await.output_line_count(pid)
    }

    pub async fn last_read_index(&self, pid: i32) -> Option<usize> {
        self.registry.lock().await.get(pid).map(|s| s.last_read_index)
    }

    pub async fn capture_snapshot(&self, pid: i32) -> Option<OutputSnapshot> {
        self.registry.lock().await.snapshot(pid)
    }

    pub async fn output_since_snapshot(
        &self,
        pid: i32,
        snapshot: &OutputSnapshot,
    ) -> Option<String> {
        self.registry.lock().await.output_since_snapshot(pid, snapshot)
    }

    pub async fn full_output(&self, pid: i32) -> Option<String> {
        self.registry.lock().await.full_output(pid)
    }
}

fn output_event(source: OutputSource, text: &str, start: Instant) -> OutputEvent {
    OutputEvent {
        timestamp: Utc::now(),
        delta_ms: start.elapsed().as_millis() as u64,
        source,
        len: text.len(),
        snippet: text.chars().take(50).collect::<String>().replace('\n', "\\n"),
        matched_pattern: None,
    }
}

async fn pump_output<R: AsyncRead + Unpin>(
    mut reader: R,
    source: OutputSource,
    pid: i32,
    registry: Arc<Mutex<SessionRegistry>>,
    tx: mpsc::UnboundedSender<(OutputSource, String)>,
) {
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let text = String::from_utf8_lossy(&buf[..n]).into_owned();
                registry.lock().await.append_output(pid, &text, source);
                // The spawn wait may already be resolved; the registry copy
                // above is the durable one
                let _ = tx.send((source, text));
            }
        }
    }
}

#[cfg(unix)]
fn send_signal(pid: i32, force: bool) {
    let signal = if force { libc::SIGKILL } else { libc::SIGINT };
    unsafe {
        libc::kill(pid, signal);
    }
}

#[cfg(windows)]
fn send_signal(pid: i32, force: bool) {
    let mut cmd = std::process::Command::new("taskkill");
    if force {
        cmd.arg("/F");
    }
    cmd.args(["/PID", &pid.to_string(), "/T"]);
    let _ = cmd.spawn();
}
