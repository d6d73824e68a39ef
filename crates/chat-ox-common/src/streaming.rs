use crate::error::CommonRequestError;
use async_stream::try_stream;
use futures_util::{StreamExt, stream::BoxStream};
use serde_json::Value;
use std::sync::Arc;

/// Raw response body as delivered by the transport.
pub type ByteStream = BoxStream<'static, Result<bytes::Bytes, CommonRequestError>>;

/// Lazy sequence of decoded text deltas.
pub type DeltaStream = BoxStream<'static, Result<String, CommonRequestError>>;

/// Terminal sentinel line used by OpenAI-shaped vendors.
pub const DONE_SENTINEL: &str = "[DONE]";

/// Text extracted from one decoded stream line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    /// Text fragments in the order the vendor emitted them.
    pub deltas: Vec<String>,
    /// The line carried a terminal status; nothing after it is read.
    pub done: bool,
}

impl Frame {
    pub fn text(delta: impl Into<String>) -> Self {
        Self {
            deltas: vec![delta.into()],
            done: false,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn finished(mut self) -> Self {
        self.done = true;
        self
    }
}

/// Vendor-specific interpretation of a single stream line.
///
/// `payload` is the line with any `data:` prefix already stripped. Returning
/// `None` means the payload is not a frame of this vendor (keep-alives, event
/// names, malformed JSON) and the decoder skips it.
pub trait FrameFormat: Send + Sync {
    fn parse_frame(&self, payload: &str) -> Option<Frame>;
}

/// Generic OpenAI-shaped fallback: `choices[0].delta.content`, or
/// `choices[0].message.content` for vendors that stream whole messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiFrames;

impl FrameFormat for OpenAiFrames {
    fn parse_frame(&self, payload: &str) -> Option<Frame> {
        let value: Value = serde_json::from_str(payload).ok()?;
        if !value.is_object() {
            return None;
        }

        let text = value
            .pointer("/choices/0/delta/content")
            .and_then(Value::as_str)
            .or_else(|| {
                value
                    .pointer("/choices/0/message/content")
                    .and_then(Value::as_str)
            });

        Some(text.map_or_else(Frame::empty, Frame::text))
    }
}

/// Splits a byte stream into lines, reassembling lines split across chunks.
pub struct LineReader {
    byte_stream: ByteStream,
    buffer: Vec<u8>,
    finished: bool,
}

impl LineReader {
    pub fn new(byte_stream: ByteStream) -> Self {
        Self {
            byte_stream,
            buffer: Vec::new(),
            finished: false,
        }
    }

    /// Next line without its terminator, or `None` at end of stream.
    ///
    /// Lines are raw bytes; a trailing line without a newline is returned
    /// before `None`.
    pub async fn next_line(&mut self) -> Result<Option<Vec<u8>>, CommonRequestError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(Some(line));
            }

            if self.finished {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(std::mem::take(&mut self.buffer)));
            }

            match self.byte_stream.next().await {
                Some(chunk) => self.buffer.extend_from_slice(&chunk?),
                None => self.finished = true,
            }
        }
    }
}

/// Decode a line-oriented SSE-like body into text deltas.
///
/// For every non-empty line the `data:` prefix is stripped and the `[DONE]`
/// sentinel ends the stream. Lines that are not UTF-8 or that the `format`
/// cannot parse are skipped. Reaching the end of the body without a sentinel
/// is a normal end; only a failed read ends it with an error.
pub fn decode_deltas(body: ByteStream, format: Arc<dyn FrameFormat>) -> DeltaStream {
    Box::pin(try_stream! {
        let mut lines = LineReader::new(body);

        while let Some(raw) = lines.next_line().await? {
            let Ok(line) = std::str::from_utf8(&raw) else {
                log::trace!("skipping non-UTF-8 stream line ({} bytes)", raw.len());
                continue;
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let payload = line.strip_prefix("data:").map_or(line, str::trim_start);
            if payload == DONE_SENTINEL {
                break;
            }

            let Some(frame) = format.parse_frame(payload) else {
                log::trace!("skipping undecodable stream line: {payload}");
                continue;
            };

            for delta in frame.deltas {
                if !delta.is_empty() {
                    yield delta;
                }
            }

            if frame.done {
                break;
            }
        }
    })
}
