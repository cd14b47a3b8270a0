//! Line reassembly across chunk boundaries

/// Buffer for accumulating incomplete lines across chunk boundaries.
///
/// Decoded text arrives in chunks that may not align with line boundaries.
/// This buffer accumulates the incomplete tail until a newline completes it.
/// Unlike an SSE event splitter, empty lines are returned too: every complete
/// line is one processing step, and deciding what a blank line means belongs
/// to the caller.
///
/// # Example
/// ```
/// use codestream::streaming::LineBuffer;
///
/// let mut buffer = LineBuffer::new();
///
/// // First chunk contains partial line
/// let lines1 = buffer.feed("data: {\"text\":\"hel");
/// assert!(lines1.is_empty()); // No complete lines yet
///
/// // Second chunk completes the line
/// let lines2 = buffer.feed("lo\"}\n");
/// assert_eq!(lines2, vec!["data: {\"text\":\"hello\"}"]);
/// ```
#[derive(Debug, Default)]
pub struct LineBuffer {
    /// Accumulated incomplete line data
    incomplete: String,
}

impl LineBuffer {
    /// Create a new empty buffer
    pub fn new() -> Self {
        Self {
            incomplete: String::new(),
        }
    }

    /// Feed decoded text into the buffer and return any complete lines.
    ///
    /// Complete lines are those ending with `\n`. The newline character is
    /// stripped from returned lines. Incomplete trailing data is retained in
    /// the buffer for the next call.
    pub fn feed(&mut self, text: &str) -> Vec<String> {
        self.incomplete.push_str(text);

        let Some(last_newline) = self.incomplete.rfind('\n') else {
            return Vec::new();
        };

        let rest = self.incomplete.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.incomplete, rest);

        complete
            .split_terminator('\n')
            .map(str::to_string)
            .collect()
    }

    /// Check if there's any incomplete data remaining in the buffer.
    pub fn has_incomplete(&self) -> bool {
        !self.incomplete.is_empty()
    }

    /// Get any remaining incomplete data.
    pub fn remaining(&self) -> &str {
        &self.incomplete
    }

    /// Take the remaining incomplete data, leaving the buffer empty.
    ///
    /// Call this at end of stream to process a final unterminated line.
    pub fn take_remaining(&mut self) -> Option<String> {
        if self.incomplete.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.incomplete))
        }
    }
}
