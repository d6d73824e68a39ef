//! Cancellation and deadline scope for one request.

use std::{future::Future, time::Duration};

use async_stream::stream;
use chat_ox_common::{ByteStream, CommonRequestError};
use futures_util::StreamExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::CompletionError;

/// Request scope handed to adapters and tools.
///
/// Cloning shares the cancellation token, so cancelling any clone cancels
/// every call made with it. Children created with [`Context::child`] are
/// cancelled with their parent but can be cancelled on their own.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context bound to an existing token.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            cancel: token,
            deadline: None,
        }
    }

    /// Same context, failing with `DeadlineExceeded` after `timeout`.
    ///
    /// An earlier deadline already set on the context is kept.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        self.deadline = Some(self.deadline.map_or(deadline, |d| d.min(deadline)));
        self
    }

    #[must_use]
    pub fn child(&self) -> Self {
        Self {
            cancel: self.cancel.child_token(),
            deadline: self.deadline,
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Why the context has ended, or `None` while it is still live.
    pub fn ended(&self) -> Option<CompletionError> {
        if self.cancel.is_cancelled() {
            Some(CompletionError::Cancelled)
        } else if self.deadline.is_some_and(|d| Instant::now() >= d) {
            Some(CompletionError::DeadlineExceeded)
        } else {
            None
        }
    }

    /// Resolves once the context is cancelled or its deadline has passed.
    pub async fn done(&self) -> CompletionError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                () = self.cancel.cancelled() => CompletionError::Cancelled,
                () = tokio::time::sleep_until(deadline) => CompletionError::DeadlineExceeded,
            },
            None => {
                self.cancel.cancelled().await;
                CompletionError::Cancelled
            }
        }
    }

    /// Runs `fut` unless the context ends first.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, CompletionError>
    where
        F: Future<Output = Result<T, CompletionError>>,
    {
        tokio::select! {
            biased;
            err = self.done() => Err(err),
            out = fut => out,
        }
    }

    /// Ties a response body to the context: once the context ends the body
    /// is dropped and the stream yields a final error.
    pub fn bind_stream(&self, mut body: ByteStream) -> ByteStream {
        let ctx = self.clone();
        stream! {
            loop {
                let next = tokio::select! {
                    biased;
                    err = ctx.done() => Err(err),
                    chunk = body.next() => Ok(chunk),
                };

                match next {
                    Err(err) => {
                        log::debug!("response body abandoned: {err}");
                        yield Err(CommonRequestError::InvalidEventData(err.to_string()));
                        break;
                    }
                    Ok(Some(chunk)) => yield chunk,
                    Ok(None) => break,
                }
            }
        }
        .boxed()
    }
}
