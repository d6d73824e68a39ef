#![warn(clippy::unwrap_used)]

//! One completion surface over many chat-completion vendors.
//!
//! A [`Client`] wraps a vendor adapter and offers plain completions,
//! callback and reader based streaming, and a bounded tool-call loop that
//! can stream its final answer.

pub mod agent;
pub mod client;
pub mod content;
pub mod context;
pub mod errors;
pub mod options;
pub mod provider;
pub mod response;
pub mod tool;
pub mod vendor;

// Re-export commonly used types
pub use agent::Agent;
pub use client::{
    Client, anannas, anthropic, gemini, groq, mistral, openai, openrouter, perplexity, xai,
};
pub use content::{Message, MessageRole, ToolCallRequest};
pub use context::Context;
pub use errors::CompletionError;
pub use options::{Options, ReasoningEffort};
pub use provider::{
    ApiCaller, CompletionResponse, DeltaReader, PipeClosed, PipeWriter, Provider, StreamParser,
    pipe,
};
pub use response::Response;
pub use tool::{InputSchema, Property, Tool, ToolError, ToolSet};

pub use chat_ox_common::CommonRequestError;
