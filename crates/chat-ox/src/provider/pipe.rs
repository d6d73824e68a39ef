//! Bounded single-producer, single-consumer pipe between a background
//! streaming task and the caller reading deltas.

use std::{
    pin::Pin,
    task::{Context as TaskContext, Poll},
};

use bytes::Bytes;
use futures_util::{Stream, StreamExt, stream::BoxStream};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;

use crate::errors::CompletionError;

type Item = Result<String, CompletionError>;

/// The reader side of the pipe is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("pipe closed by reader")]
pub struct PipeClosed;

/// Creates a pipe holding at most one undelivered delta.
pub fn pipe() -> (PipeWriter, DeltaReader) {
    let (tx, rx) = mpsc::channel(1);
    (
        PipeWriter { tx },
        DeltaReader {
            rx,
            finished: false,
        },
    )
}

/// Producer end. Dropping it ends the reader's stream cleanly.
#[derive(Debug)]
pub struct PipeWriter {
    tx: mpsc::Sender<Item>,
}

impl PipeWriter {
    /// Waits for room in the pipe and hands over one delta.
    pub async fn write(&self, delta: impl Into<String>) -> Result<(), PipeClosed> {
        self.tx.send(Ok(delta.into())).await.map_err(|_| PipeClosed)
    }

    /// Ends the pipe with `err` as the reader's final item.
    pub async fn close_with_error(self, err: CompletionError) {
        if self.tx.send(Err(err)).await.is_err() {
            log::debug!("stream error dropped, reader already gone");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    /// Resolves once the reader has been dropped or closed.
    pub async fn closed(&self) {
        self.tx.closed().await;
    }
}

/// Consumer end: a stream of deltas ending in at most one error.
///
/// Dropping or [closing](DeltaReader::close) the reader makes the producer's
/// next write fail, which stops the background task.
#[derive(Debug)]
pub struct DeltaReader {
    rx: mpsc::Receiver<Item>,
    finished: bool,
}

impl DeltaReader {
    /// Reader that fails immediately with `err`.
    pub fn failed(err: CompletionError) -> Self {
        let (tx, rx) = mpsc::channel(1);
        // A fresh channel always has room for the first item.
        let _ = tx.try_send(Err(err));
        Self {
            rx,
            finished: false,
        }
    }

    /// Stops accepting deltas. Items already in the pipe can still be read.
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// Reads every remaining delta and concatenates them.
    pub async fn read_to_string(mut self) -> Result<String, CompletionError> {
        let mut out = String::new();
        while let Some(delta) = self.next().await {
            out.push_str(&delta?);
        }
        Ok(out)
    }

    /// Byte-oriented view of the deltas for `tokio::io` consumers.
    ///
    /// A stream error surfaces as an `io::Error` wrapping the [`CompletionError`].
    pub fn into_async_read(
        self,
    ) -> StreamReader<BoxStream<'static, std::io::Result<Bytes>>, Bytes> {
        let bytes = self
            .map(|item| item.map(Bytes::from).map_err(std::io::Error::other))
            .boxed();
        StreamReader::new(bytes)
    }
}

impl Stream for DeltaReader {
    type Item = Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }
        match self.rx.poll_recv(cx) {
            Poll::Ready(Some(Err(err))) => {
                self.finished = true;
                self.rx.close();
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                self.finished = true;
                Poll::Ready(None)
            }
            other => other,
        }
    }
}
