#![cfg_attr(not(test), deny(unsafe_code))]
#![warn(
    clippy::pedantic,
    clippy::unwrap_used,
    clippy::missing_docs_in_private_items
)]

//! Shared HTTP transport abstractions for chat-ox vendor adapters
//!
//! This crate holds the pieces every adapter needs regardless of vendor: the
//! request builder (endpoint, auth, headers), error-body parsing, and the
//! line-oriented stream decoder that turns a raw body into text deltas.

pub mod error;
pub mod request_builder;
pub mod streaming;

pub use error::CommonRequestError;
pub use request_builder::{AuthMethod, Endpoint, HttpMethod, RequestBuilder, RequestConfig};
pub use streaming::{
    ByteStream, DONE_SENTINEL, DeltaStream, Frame, FrameFormat, LineReader, OpenAiFrames,
    decode_deltas,
};

/// Re-export common types for convenience
pub use futures_util::stream::BoxStream;
