//! Vendor capability traits and the completion façade built on them.

pub mod completion;
pub mod pipe;

pub use completion::Provider;
pub use pipe::{DeltaReader, PipeClosed, PipeWriter, pipe};

use std::sync::Arc;

use chat_ox_common::{ByteStream, DeltaStream, FrameFormat, decode_deltas};
use futures_util::{FutureExt, StreamExt, future::BoxFuture};
use serde_json::Value;

use crate::{
    content::{Message, ToolCallRequest},
    context::Context,
    errors::CompletionError,
    options::Options,
};

/// Callback receiving each decoded delta; an `Err` stops the stream.
pub type OnDelta<'a> = dyn FnMut(&str) -> Result<(), CompletionError> + Send + 'a;

/// One non-streaming model turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionResponse {
    pub content: String,
    /// Tool calls in the order the model requested them.
    pub tool_calls: Vec<ToolCallRequest>,
}

impl CompletionResponse {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Issues the HTTP call for one vendor.
///
/// Adapters that can stream also expose a [`StreamParser`] through
/// [`ApiCaller::stream_parser`]; the façade refuses streaming requests for
/// adapters that return `None`.
pub trait ApiCaller: Send + Sync {
    /// Short vendor name used in errors and logs.
    fn name(&self) -> &str;

    /// Sends `messages` and returns the raw response body.
    ///
    /// Non-2xx responses fail with a transport error carrying the status and
    /// the raw body.
    fn call<'a>(
        &'a self,
        ctx: &'a Context,
        messages: &'a [Message],
        stream: bool,
        options: &'a Options,
    ) -> BoxFuture<'a, Result<ByteStream, CompletionError>>;

    fn stream_parser(&self) -> Option<&dyn StreamParser> {
        None
    }

    /// Reads a complete non-streaming body, `None` when it is not in the
    /// vendor's shape.
    fn parse_completion(&self, body: &[u8]) -> Option<CompletionResponse> {
        parse_openai_completion(body)
    }
}

/// Decodes a vendor's streaming framing into text deltas.
pub trait StreamParser: Send + Sync {
    fn frame_format(&self) -> Arc<dyn FrameFormat>;

    fn decode(&self, body: ByteStream) -> DeltaStream {
        decode_deltas(body, self.frame_format())
    }

    /// Feeds every delta of `body` to `on_delta` in order.
    ///
    /// A read failure ends the stream with [`CompletionError::Decode`]; an
    /// error from `on_delta` ends it with that error.
    fn parse_stream<'a, 'b: 'a>(
        &'a self,
        body: ByteStream,
        on_delta: &'a mut OnDelta<'b>,
    ) -> BoxFuture<'a, Result<(), CompletionError>> {
        let mut deltas = self.decode(body);
        async move {
            while let Some(delta) = deltas.next().await {
                let delta = delta.map_err(CompletionError::decode)?;
                on_delta(&delta)?;
            }
            Ok(())
        }
        .boxed()
    }
}

/// `choices[0].message` of an OpenAI-shaped chat completion, including
/// `tool_calls[].function`.
pub fn parse_openai_completion(body: &[u8]) -> Option<CompletionResponse> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let message = value.pointer("/choices/0/message")?;

    let content = message
        .get("content")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let tool_calls = message
        .get("tool_calls")
        .and_then(Value::as_array)
        .map(|calls| calls.iter().filter_map(openai_tool_call).collect())
        .unwrap_or_default();

    Some(CompletionResponse { content, tool_calls })
}

fn openai_tool_call(call: &Value) -> Option<ToolCallRequest> {
    let id = call.get("id")?.as_str()?;
    let function = call.get("function")?;
    let name = function.get("name")?.as_str()?;
    // Arguments are a JSON string on the wire; some vendors send an object.
    let arguments = match function.get("arguments") {
        Some(Value::String(raw)) => raw.clone(),
        Some(Value::Null) | None => "{}".to_string(),
        Some(other) => other.to_string(),
    };
    Some(ToolCallRequest::new(id, name, arguments))
}
