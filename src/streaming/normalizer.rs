//! Stream normalization
//!
//! Turns raw response bytes into an ordered sequence of content fragments:
//! incremental UTF-8 decoding, line reassembly, then per-line payload
//! extraction. One instance serves exactly one request.

use tracing::debug;

use super::decoder::Utf8Decoder;
use super::lines::LineBuffer;
use super::payload::{process_line, LineOutcome, PayloadFormat};

/// Per-request normalization state.
///
/// # Example
/// ```
/// use codestream::streaming::{PayloadFormat, StreamNormalizer};
///
/// let mut normalizer = StreamNormalizer::new(PayloadFormat::Generic);
/// let fragments = normalizer.push(b"data: {\"choices\":[{\"delta\":{\"content\":\"a\"}}]}\ndata: [DO");
/// assert_eq!(fragments, vec!["a"]);
///
/// assert!(normalizer.push(b"NE]\n").is_empty());
/// assert!(normalizer.is_done());
/// ```
#[derive(Debug)]
pub struct StreamNormalizer {
    decoder: Utf8Decoder,
    lines: LineBuffer,
    format: PayloadFormat,
    done: bool,
    failure: Option<String>,
    lines_processed: usize,
}

impl StreamNormalizer {
    /// Create normalization state for a single request
    pub fn new(format: PayloadFormat) -> Self {
        Self {
            decoder: Utf8Decoder::new(),
            lines: LineBuffer::new(),
            format,
            done: false,
            failure: None,
            lines_processed: 0,
        }
    }

    /// Feed one raw chunk and return the fragments it completes, in order.
    ///
    /// Once the end-of-stream sentinel or an in-stream failure has been seen,
    /// further input is ignored.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let mut fragments = Vec::new();
        if self.done {
            return fragments;
        }

        let text = self.decoder.decode(chunk);
        let lines = self.lines.feed(&text);
        self.process_lines(lines, true, &mut fragments);
        fragments
    }

    /// Signal end of input: flush the decoder and process a trailing partial line.
    pub fn finish(&mut self) -> Vec<String> {
        let mut fragments = Vec::new();
        if self.done {
            return fragments;
        }

        let tail = self.decoder.finish();
        let lines = self.lines.feed(&tail);
        self.process_lines(lines, true, &mut fragments);

        if !self.done {
            if let Some(partial) = self.lines.take_remaining() {
                self.process_lines(vec![partial], false, &mut fragments);
            }
        }

        self.done = true;
        fragments
    }

    /// Whether the stream has ended (sentinel, failure, or `finish`)
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Take the in-stream failure message reported by the vendor, if any
    pub fn take_failure(&mut self) -> Option<String> {
        self.failure.take()
    }

    /// Number of lines that went through payload processing so far
    pub fn lines_processed(&self) -> usize {
        self.lines_processed
    }

    fn process_lines(&mut self, lines: Vec<String>, terminated: bool, out: &mut Vec<String>) {
        for line in lines {
            self.lines_processed += 1;
            match process_line(&line, terminated, self.format) {
                LineOutcome::Content(content) => out.push(content),
                LineOutcome::Skip => {}
                LineOutcome::Done => {
                    debug!(lines = self.lines_processed, "End-of-stream sentinel received");
                    self.done = true;
                    return;
                }
                LineOutcome::Failure(message) => {
                    self.failure = Some(message);
                    self.done = true;
                    return;
                }
            }
        }
    }
}
