//! Client-side stream consumption
//!
//! Drives a transport response through the same normalizer the providers use
//! and reports each fragment to a caller callback.

use futures::{Stream, StreamExt};
use tracing::{debug, warn};

use super::fence::FenceStripper;
use super::normalizer::StreamNormalizer;
use super::payload::PayloadFormat;
use crate::error::{CodegenError, Result};

/// Consumes a line-oriented response and invokes callbacks.
///
/// The content callback runs once per non-empty fragment, in arrival order.
/// The end callback runs exactly once after the final partial line has been
/// processed, and never when the stream fails: a returned error and a call to
/// `on_end` are mutually exclusive outcomes.
pub struct StreamHandler<C, E> {
    on_content: C,
    on_end: E,
    format: PayloadFormat,
    strip_fences: bool,
}

impl<C, E> StreamHandler<C, E>
where
    C: FnMut(&str),
    E: FnOnce(),
{
    /// Create a handler using the generic payload format
    pub fn new(on_content: C, on_end: E) -> Self {
        Self {
            on_content,
            on_end,
            format: PayloadFormat::Generic,
            strip_fences: false,
        }
    }

    /// Remove a leading/trailing markdown fence before content reaches the callback
    pub fn with_fence_stripping(mut self) -> Self {
        self.strip_fences = true;
        self
    }

    /// Use a vendor-specific payload format instead of the generic one
    pub fn with_format(mut self, format: PayloadFormat) -> Self {
        self.format = format;
        self
    }

    /// Consume an HTTP response.
    ///
    /// A non-success status is reported as a `VendorApi` error carrying the
    /// body verbatim, before any content is read.
    pub async fn handle_response(self, response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if !status.is_success() {
            let message = error_body(response).await;
            warn!(status = %status, "Stream response returned an error status");
            return Err(CodegenError::VendorApi {
                vendor: "upstream",
                status: status.as_u16(),
                message,
            });
        }

        self.handle_stream(response.bytes_stream()).await
    }

    /// Consume any stream of byte chunks.
    ///
    /// At most one read is outstanding at a time; fragments are delivered
    /// before the next chunk is awaited.
    pub async fn handle_stream<S, B, X>(self, stream: S) -> Result<()>
    where
        S: Stream<Item = std::result::Result<B, X>>,
        B: AsRef<[u8]>,
        X: Into<CodegenError>,
    {
        let Self {
            mut on_content,
            on_end,
            format,
            strip_fences,
        } = self;

        let mut normalizer = StreamNormalizer::new(format);
        let mut stripper = strip_fences.then(FenceStripper::new);

        futures::pin_mut!(stream);
        while let Some(chunk) = stream.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    let err: CodegenError = e.into();
                    warn!(error = %err, "Stream read failed");
                    release_held(&mut stripper, &mut on_content);
                    return Err(err);
                }
            };

            for fragment in normalizer.push(chunk.as_ref()) {
                deliver(&mut stripper, &mut on_content, fragment);
            }
            if let Some(message) = normalizer.take_failure() {
                release_held(&mut stripper, &mut on_content);
                return Err(CodegenError::Stream(message));
            }
            if normalizer.is_done() {
                debug!("Stream finished by sentinel");
                break;
            }
        }

        for fragment in normalizer.finish() {
            deliver(&mut stripper, &mut on_content, fragment);
        }
        if let Some(message) = normalizer.take_failure() {
            release_held(&mut stripper, &mut on_content);
            return Err(CodegenError::Stream(message));
        }

        if let Some(mut stripper) = stripper {
            let tail = stripper.finish();
            if !tail.is_empty() {
                on_content(&tail);
            }
        }

        on_end();
        Ok(())
    }
}

/// Body of an error response, or the status reason when the body cannot be read
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    let status = response.status();
    match response.text().await {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => status.canonical_reason().unwrap_or_default().to_string(),
        Err(e) => {
            warn!(status = %status, error = %e, "Failed to read error response body");
            status.canonical_reason().unwrap_or_default().to_string()
        }
    }
}

fn deliver<C: FnMut(&str)>(
    stripper: &mut Option<FenceStripper>,
    on_content: &mut C,
    fragment: String,
) {
    let text = match stripper.as_mut() {
        Some(stripper) => stripper.push(&fragment),
        None => fragment,
    };
    if !text.is_empty() {
        on_content(&text);
    }
}

/// Hand over the stripper's held-back window verbatim before a failure
fn release_held<C: FnMut(&str)>(stripper: &mut Option<FenceStripper>, on_content: &mut C) {
    if let Some(stripper) = stripper.as_mut() {
        let held = stripper.abort();
        if !held.is_empty() {
            on_content(&held);
        }
    }
}
