//! Incremental UTF-8 decoding
//!
//! Network reads split multi-byte characters at arbitrary positions. The
//! decoder holds back an incomplete trailing sequence and prepends it to the
//! next chunk, so no character is ever corrupted by a chunk boundary.

/// Replacement character emitted for invalid byte sequences
const REPLACEMENT: char = '\u{FFFD}';

/// Stateful UTF-8 decoder that tolerates split multi-byte sequences.
///
/// Invalid sequences decode to U+FFFD, the same lossy behavior as
/// `String::from_utf8_lossy`, but an incomplete sequence at the end of a chunk
/// is kept back instead of being replaced.
///
/// # Example
/// ```
/// use codestream::streaming::Utf8Decoder;
///
/// let mut decoder = Utf8Decoder::new();
/// let euro = "€".as_bytes();
///
/// assert_eq!(decoder.decode(&euro[..1]), "");
/// assert_eq!(decoder.decode(&euro[1..]), "€");
/// ```
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Bytes of a multi-byte sequence not yet complete
    pending: Vec<u8>,
}

impl Utf8Decoder {
    /// Create a new decoder with no pending bytes
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a chunk, returning all text that is complete so far.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);

        let mut out = String::with_capacity(self.pending.len());
        let mut start = 0;

        while start < self.pending.len() {
            match std::str::from_utf8(&self.pending[start..]) {
                Ok(text) => {
                    out.push_str(text);
                    start = self.pending.len();
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[start..valid_end]));

                    match e.error_len() {
                        Some(invalid_len) => {
                            out.push(REPLACEMENT);
                            start = valid_end + invalid_len;
                        }
                        // Incomplete sequence at the end of input: keep it for the next chunk
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.pending.drain(..start);
        out
    }

    /// Flush at end of stream. A sequence still incomplete here can never be
    /// completed, so it decodes to a replacement character.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            return String::new();
        }
        let tail = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        tail
    }

    /// Number of bytes held back waiting for the rest of a sequence
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}
