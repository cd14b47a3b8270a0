//! Integration tests for Codestream
//!
//! These tests run providers, the registry and the stream handler against a
//! mock vendor server and verify the complete request/fragment flow.

mod providers;
mod stream_handler;
