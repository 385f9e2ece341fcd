//! Chunk-to-line stitching.
//!
//! Output arrives from the pipes in arbitrary chunks. This buffer converts
//! them into stable logical lines: a line is only closed once the newline
//! following it has been seen, so byte-by-byte arrival reconstructs exactly
//! the same lines as one big chunk.

/// Append-only sequence of logical output lines for one session
#[derive(Debug, Clone, Default)]
pub struct OutputLineBuffer {
    lines: Vec<String>,
}

impl OutputLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a raw chunk into the line sequence. The first piece of the chunk
    /// extends the still-open last line; every subsequent piece opens a new
    /// line.
    pub fn append(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }

        for (i, piece) in text.split('\n').enumerate() {
            if self.lines.is_empty() {
                self.lines.push(piece.to_string());
            } else if i == 0 {
                let last = self.lines.len() - 1;
                self.lines[last].push_str(piece);
            } else {
                self.lines.push(piece.to_string());
            }
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Full history joined with newlines, as used for snapshot diffing and
    /// state classification
    pub fn joined(&self) -> String {
        self.lines.join("\n")
    }

    /// Move the accumulated lines out, leaving the buffer empty. Used for the
    /// atomic handoff into the completed-session cache.
    pub fn take_lines(&mut self) -> Vec<String> {
        std::mem::take(&mut self.lines)
    }
}
