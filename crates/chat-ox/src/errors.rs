use chat_ox_common::CommonRequestError;
use thiserror::Error;

/// Errors that end a completion request.
///
/// Tool failures are not in here: unknown tools, failing tools and
/// unserializable results are fed back to the model as tool-role content
/// (see [`crate::tool::ToolError`]).
#[derive(Debug, Error)]
pub enum CompletionError {
    /// Non-2xx status or network failure while issuing the call.
    #[error(transparent)]
    Transport(#[from] CommonRequestError),

    /// Streaming was requested from an adapter without a stream parser.
    #[error("streaming not supported by this provider ({provider})")]
    StreamUnsupported { provider: String },

    /// The stream broke mid-read. Deltas delivered before it remain valid.
    #[error("stream decode failed: {source}")]
    Decode {
        #[source]
        source: CommonRequestError,
    },

    /// The tool loop ran `max_steps` model turns without a final answer.
    #[error("maximum tool steps reached ({max_steps})")]
    StepsExhausted { max_steps: u32 },

    /// The request context was cancelled.
    #[error("request cancelled")]
    Cancelled,

    /// The request context deadline passed.
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// The consumer stopped accepting deltas.
    #[error("stream consumer aborted: {0}")]
    Aborted(String),

    /// Request body could not be built.
    #[error("failed to build request: {0}")]
    InvalidRequest(String),
}

impl CompletionError {
    /// Creates a stream-unsupported error for the named provider.
    pub fn stream_unsupported(provider: impl Into<String>) -> Self {
        Self::StreamUnsupported {
            provider: provider.into(),
        }
    }

    /// Wraps a mid-stream failure.
    pub fn decode(source: CommonRequestError) -> Self {
        Self::Decode { source }
    }

    /// Creates an abort error, used by delta callbacks to stop a stream early.
    pub fn aborted(reason: impl Into<String>) -> Self {
        Self::Aborted(reason.into())
    }

    /// HTTP status of a failed vendor call, if there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CompletionError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}
