//! Scripted adapter shared by the orchestration tests.
//!
//! Each `call` pops the next [`Reply`] and records what it was sent, so tests
//! can assert on the exact history every model turn saw.

#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use bytes::Bytes;
use chat_ox::{
    ApiCaller, CommonRequestError, CompletionError, Context, Message, Options, StreamParser,
};
use chat_ox_common::{ByteStream, FrameFormat, OpenAiFrames};
use futures_util::{FutureExt, StreamExt, future::BoxFuture, stream};
use serde_json::json;

/// What the scripted vendor answers with.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Whole body in one chunk.
    Body(String),
    /// Body split into these chunks.
    Chunks(Vec<String>),
    /// These chunks, then a body that never ends.
    ChunksThenHang(Vec<String>),
    /// These chunks, then a transport failure.
    ChunksThenFail(Vec<String>),
    /// Non-2xx status.
    Status(u16, String),
    /// The call itself never returns.
    Hang,
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub messages: Vec<Message>,
    pub stream: bool,
}

/// Counts values dropped; attached to every body and pending call.
#[derive(Debug)]
struct DropGuard(Arc<AtomicUsize>);

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Clone)]
pub struct ScriptedCaller {
    replies: Arc<Mutex<VecDeque<Reply>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
    dropped: Arc<AtomicUsize>,
    streaming: bool,
}

impl ScriptedCaller {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            requests: Arc::new(Mutex::new(Vec::new())),
            dropped: Arc::new(AtomicUsize::new(0)),
            streaming: true,
        }
    }

    /// Same script, but the adapter has no stream parser.
    pub fn without_streaming(mut self) -> Self {
        self.streaming = false;
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Bodies and pending calls released so far.
    pub fn dropped(&self) -> usize {
        self.dropped.load(Ordering::SeqCst)
    }

    fn guard(&self) -> DropGuard {
        DropGuard(Arc::clone(&self.dropped))
    }

    fn guarded(&self, body: ByteStream) -> ByteStream {
        let guard = self.guard();
        body.map(move |chunk| {
            let _keep = &guard;
            chunk
        })
        .boxed()
    }
}

fn chunks(parts: Vec<String>) -> ByteStream {
    stream::iter(parts.into_iter().map(|c| Ok(Bytes::from(c)))).boxed()
}

impl ApiCaller for ScriptedCaller {
    fn name(&self) -> &str {
        "scripted"
    }

    fn call<'a>(
        &'a self,
        _ctx: &'a Context,
        messages: &'a [Message],
        stream: bool,
        _options: &'a Options,
    ) -> BoxFuture<'a, Result<ByteStream, CompletionError>> {
        self.requests.lock().unwrap().push(Recorded {
            messages: messages.to_vec(),
            stream,
        });
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Reply::Status(500, "script exhausted".into()));

        async move {
            match reply {
                Reply::Body(body) => Ok(self.guarded(chunks(vec![body]))),
                Reply::Chunks(parts) => Ok(self.guarded(chunks(parts))),
                Reply::ChunksThenHang(parts) => {
                    Ok(self.guarded(chunks(parts).chain(stream::pending()).boxed()))
                }
                Reply::ChunksThenFail(parts) => Ok(self.guarded(
                    chunks(parts)
                        .chain(stream::once(async {
                            Err(CommonRequestError::InvalidEventData("connection reset".into()))
                        }))
                        .boxed(),
                )),
                Reply::Status(status, message) => Err(CommonRequestError::Api {
                    status,
                    message: message.clone(),
                    body: Bytes::from(message),
                }
                .into()),
                Reply::Hang => {
                    let _guard = self.guard();
                    futures_util::future::pending().await
                }
            }
        }
        .boxed()
    }

    fn stream_parser(&self) -> Option<&dyn StreamParser> {
        if self.streaming { Some(self) } else { None }
    }
}

impl StreamParser for ScriptedCaller {
    fn frame_format(&self) -> Arc<dyn FrameFormat> {
        Arc::new(OpenAiFrames)
    }
}

/// Non-streaming OpenAI-shaped answer.
pub fn text_body(text: &str) -> String {
    json!({"choices": [{"message": {"role": "assistant", "content": text}}]}).to_string()
}

/// Non-streaming OpenAI-shaped turn requesting `(id, name, arguments)` calls.
pub fn tool_call_body(calls: &[(&str, &str, &str)]) -> String {
    let tool_calls: Vec<_> = calls
        .iter()
        .map(|(id, name, args)| {
            json!({"id": id, "type": "function", "function": {"name": name, "arguments": args}})
        })
        .collect();
    json!({"choices": [{"message": {
        "role": "assistant",
        "content": null,
        "tool_calls": tool_calls,
    }}]})
    .to_string()
}

/// SSE lines carrying `deltas`, terminated by the `[DONE]` sentinel.
pub fn sse(deltas: &[&str]) -> Vec<String> {
    let mut lines: Vec<String> = deltas
        .iter()
        .map(|d| format!("data: {}\n\n", json!({"choices": [{"delta": {"content": d}}]})))
        .collect();
    lines.push("data: [DONE]\n\n".to_string());
    lines
}
