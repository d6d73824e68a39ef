use crate::{errors::CompletionError, provider::DeltaReader};

/// Result of a tools-aware generation: the full answer, or a live stream of it.
#[derive(Debug)]
pub enum Response {
    Content(String),
    Stream(DeltaReader),
}

impl Response {
    pub fn is_stream(&self) -> bool {
        matches!(self, Response::Stream(_))
    }

    /// The answer text, reading the stream to its end if there is one.
    pub async fn into_text(self) -> Result<String, CompletionError> {
        match self {
            Response::Content(text) => Ok(text),
            Response::Stream(reader) => reader.read_to_string().await,
        }
    }
}
