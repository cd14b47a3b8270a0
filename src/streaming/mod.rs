//! Streaming normalization pipeline
//!
//! Raw vendor bytes flow through [`StreamNormalizer`] (UTF-8 decoding, line
//! reassembly, payload extraction) and optionally [`FenceStripper`] before
//! reaching the caller as a [`FragmentStream`]. [`StreamHandler`] applies the
//! same normalizer on the consuming side of a relayed response.

mod decoder;
mod fence;
mod handler;
mod lines;
mod normalizer;
mod payload;
pub mod sse;

use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use tracing::{debug, warn};

pub use decoder::Utf8Decoder;
pub use fence::{strip_fences, FenceStripper};
pub(crate) use handler::error_body;
pub use handler::StreamHandler;
pub use lines::LineBuffer;
pub use normalizer::StreamNormalizer;
pub use payload::{process_line, unescape_newlines, LineOutcome, PayloadFormat, DONE_SENTINEL};

use crate::error::{CodegenError, Result};

/// Ordered stream of content fragments for one request
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Normalize a raw byte stream into content fragments.
///
/// Reads are awaited one at a time and every fragment a chunk completes is
/// yielded before the next read. Dropping the returned stream drops `body`,
/// which closes the underlying connection.
pub fn normalize<S, X>(body: S, format: PayloadFormat) -> FragmentStream
where
    S: Stream<Item = std::result::Result<Bytes, X>> + Send + 'static,
    X: Into<CodegenError> + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut normalizer = StreamNormalizer::new(format);
        futures::pin_mut!(body);

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let err: CodegenError = e.into();
                    warn!(error = %err, "Vendor stream read failed");
                    yield Err(err);
                    return;
                }
            };

            for fragment in normalizer.push(&chunk) {
                yield Ok(fragment);
            }
            if let Some(message) = normalizer.take_failure() {
                yield Err(CodegenError::Stream(message));
                return;
            }
            if normalizer.is_done() {
                debug!(lines = normalizer.lines_processed(), "Vendor stream finished by sentinel");
                return;
            }
        }

        for fragment in normalizer.finish() {
            yield Ok(fragment);
        }
        if let Some(message) = normalizer.take_failure() {
            yield Err(CodegenError::Stream(message));
        }
    })
}

/// Degenerate stream for non-incremental vendors: the whole text as one
/// fragment, then end of stream. Empty text yields no fragment.
pub fn one_shot(text: String) -> FragmentStream {
    let fragment = (!text.is_empty()).then_some(Ok(text));
    Box::pin(futures::stream::iter(fragment))
}

/// Remove a leading/trailing markdown fence from a fragment stream.
///
/// On failure the held-back window is released verbatim before the error so
/// content already produced is never lost.
pub fn strip_fence_stream(fragments: FragmentStream) -> FragmentStream {
    Box::pin(async_stream::stream! {
        let mut stripper = FenceStripper::new();
        let mut fragments = fragments;

        while let Some(item) = fragments.next().await {
            match item {
                Ok(fragment) => {
                    let text = stripper.push(&fragment);
                    if !text.is_empty() {
                        yield Ok(text);
                    }
                }
                Err(e) => {
                    let held = stripper.abort();
                    if !held.is_empty() {
                        yield Ok(held);
                    }
                    yield Err(e);
                    return;
                }
            }
        }

        let tail = stripper.finish();
        if !tail.is_empty() {
            yield Ok(tail);
        }
    })
}
