//! Object-boundary recovery for concatenated JSON dumps.
//!
//! The input is a bare concatenation of top-level JSON objects — no
//! enclosing array, no separators. [`Scanner`] walks the stream one
//! character at a time, tracking brace depth while staying quote- and
//! escape-aware, and emits each balanced top-level object as soon as its
//! closing brace arrives. Nothing but the current object is buffered, so
//! arbitrarily large dumps scan in constant memory.

use crate::error::StructuralError;

/// A trimmed text span holding exactly one balanced top-level JSON object.
pub type ObjectSpan = String;

/// Incremental brace-depth state machine.
///
/// Feed input line by line with [`push_line`](Scanner::push_line); call
/// [`finish`](Scanner::finish) at end of stream to detect a truncated
/// trailing object. State is explicit so the machine can be tested in
/// isolation from any input source.
#[derive(Debug)]
pub struct Scanner {
    depth: i32,
    in_quotes: bool,
    escape_pending: bool,
    buffer: String,
    line: u64,
}

impl Scanner {
    pub fn new() -> Self {
        Self {
            depth: 0,
            in_quotes: false,
            escape_pending: false,
            buffer: String::new(),
            line: 0,
        }
    }

    /// Consume one input line, emitting every object that completes on it.
    ///
    /// The line is assumed to carry no trailing newline (the reader strips
    /// it); when an object is still open at end of line, a newline is
    /// appended to the buffer so inner formatting survives into the
    /// recovered span.
    pub fn push_line(&mut self, line: &str) -> Result<Vec<ObjectSpan>, StructuralError> {
        self.line += 1;
        let mut spans = Vec::new();

        for ch in line.chars() {
            if self.escape_pending {
                // The escaped character is literal regardless of what it is.
                self.escape_pending = false;
                self.buffer.push(ch);
                continue;
            }
            match ch {
                '\\' => {
                    self.escape_pending = true;
                    self.buffer.push(ch);
                }
                '"' => {
                    self.in_quotes = !self.in_quotes;
                    self.buffer.push(ch);
                }
                '{' if !self.in_quotes => {
                    self.depth += 1;
                    self.buffer.push(ch);
                }
                '}' if !self.in_quotes => {
                    self.depth -= 1;
                    self.buffer.push(ch);
                    if self.depth < 0 {
                        return Err(StructuralError::NegativeDepth { line: self.line });
                    }
                    if self.depth == 0 {
                        spans.push(self.buffer.trim().to_string());
                        self.buffer.clear();
                    }
                }
                _ => self.buffer.push(ch),
            }
        }

        // Preserve the line break inside a still-open object.
        if self.depth > 0 {
            self.buffer.push('\n');
        }

        Ok(spans)
    }

    /// End of stream. Fails if an object is still open; a truncated tail
    /// never yields a partial span.
    pub fn finish(self) -> Result<(), StructuralError> {
        if self.depth != 0 {
            return Err(StructuralError::UnexpectedEof { open: self.depth });
        }
        Ok(())
    }

    /// Current nesting depth (exposed for orchestrator diagnostics).
    pub fn depth(&self) -> i32 {
        self.depth
    }
}

impl Default for Scanner {
    fn default() -> Self {
        Self::new()
    }
}
