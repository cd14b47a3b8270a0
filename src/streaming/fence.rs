//! Markdown code-fence removal over a fragment stream
//!
//! Models asked for bare code still wrap it in a fence now and then. The
//! stripper removes one opener at the very start of the output and one closer
//! at the very end, no matter how the fence is split across fragments.

use tracing::debug;

/// Three backticks
const FENCE: &str = "```";

/// Longest language tag accepted after an opening fence
const MAX_TAG_LEN: usize = 32;

/// Characters retained in `PassThrough`: the longest closer, `"\r\n```"`
const LOOKBACK_CHARS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FenceState {
    AwaitingOpener,
    PassThrough,
    Done,
}

/// Result of scanning the start of the output for an opening fence
#[derive(Debug, PartialEq, Eq)]
enum OpenerScan {
    /// Not enough text yet to decide
    Pending,
    /// An opener spans this many bytes
    Matched(usize),
    /// The output does not start with an opener
    Absent,
}

/// Stateful fence stripper for one request.
///
/// Output depends only on the concatenated input, never on where fragment
/// boundaries fall.
///
/// # Example
/// ```
/// use codestream::streaming::FenceStripper;
///
/// let mut stripper = FenceStripper::new();
/// let mut out = String::new();
/// for fragment in ["``", "`tsx\nexport default ", "App;\n`", "``"] {
///     out.push_str(&stripper.push(fragment));
/// }
/// out.push_str(&stripper.finish());
/// assert_eq!(out, "export default App;");
/// ```
#[derive(Debug)]
pub struct FenceStripper {
    state: FenceState,
    buffer: String,
}

impl Default for FenceStripper {
    fn default() -> Self {
        Self::new()
    }
}

impl FenceStripper {
    pub fn new() -> Self {
        Self {
            state: FenceState::AwaitingOpener,
            buffer: String::new(),
        }
    }

    /// Feed a fragment and return the text that can be released now.
    pub fn push(&mut self, fragment: &str) -> String {
        match self.state {
            FenceState::Done => {
                debug!(len = fragment.len(), "Fragment received after fence stripping finished");
                String::new()
            }
            FenceState::AwaitingOpener => {
                self.buffer.push_str(fragment);
                match scan_opener(&self.buffer) {
                    OpenerScan::Pending => String::new(),
                    OpenerScan::Matched(len) => {
                        self.buffer.drain(..len);
                        self.state = FenceState::PassThrough;
                        self.release()
                    }
                    OpenerScan::Absent => {
                        self.state = FenceState::PassThrough;
                        self.release()
                    }
                }
            }
            FenceState::PassThrough => {
                self.buffer.push_str(fragment);
                self.release()
            }
        }
    }

    /// Signal end of stream: strip a trailing closer and flush everything left.
    pub fn finish(&mut self) -> String {
        if self.state == FenceState::Done {
            return String::new();
        }

        // A lone opener with no line break before the stream ended
        if self.state == FenceState::AwaitingOpener
            && self.buffer.starts_with(FENCE)
            && scan_opener(&self.buffer) == OpenerScan::Pending
        {
            self.buffer.clear();
        }

        self.state = FenceState::Done;
        let tail = std::mem::take(&mut self.buffer);
        match strip_closer(&tail) {
            Some(stripped) => stripped.to_string(),
            None => tail,
        }
    }

    /// Abandon the stream: flush held-back text verbatim without closer detection.
    pub fn abort(&mut self) -> String {
        self.state = FenceState::Done;
        std::mem::take(&mut self.buffer)
    }

    /// Release all buffered text except the lookback window.
    fn release(&mut self) -> String {
        let keep_from = lookback_start(&self.buffer);
        let window = self.buffer.split_off(keep_from);
        std::mem::replace(&mut self.buffer, window)
    }
}

/// Strip fences from a complete text in one call.
pub fn strip_fences(text: &str) -> String {
    let mut stripper = FenceStripper::new();
    let mut out = stripper.push(text);
    out.push_str(&stripper.finish());
    out
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '+' | '#' | '.' | ' ' | '\t')
}

fn scan_opener(text: &str) -> OpenerScan {
    let mut chars = text.char_indices();

    for _ in 0..FENCE.len() {
        match chars.next() {
            None => return OpenerScan::Pending,
            Some((_, '`')) => {}
            Some(_) => return OpenerScan::Absent,
        }
    }

    let mut tag_len = 0;
    loop {
        match chars.next() {
            None => return OpenerScan::Pending,
            Some((i, '\n')) => return OpenerScan::Matched(i + 1),
            Some((_, '\r')) => {
                return match chars.next() {
                    None => OpenerScan::Pending,
                    Some((j, '\n')) => OpenerScan::Matched(j + 1),
                    Some(_) => OpenerScan::Absent,
                };
            }
            Some((_, c)) if is_tag_char(c) && tag_len < MAX_TAG_LEN => tag_len += 1,
            Some(_) => return OpenerScan::Absent,
        }
    }
}

/// Byte offset where the retained window starts: trailing whitespace plus the
/// last `LOOKBACK_CHARS` characters before it.
fn lookback_start(text: &str) -> usize {
    let content_end = text.trim_end().len();
    text[..content_end]
        .char_indices()
        .rev()
        .nth(LOOKBACK_CHARS - 1)
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn strip_closer(text: &str) -> Option<&str> {
    let body = text.trim_end().strip_suffix(FENCE)?;
    let body = match body.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => body,
    };
    Some(body)
}
