use std::sync::Arc;

use chat_ox_common::CommonRequestError;
use futures_util::StreamExt;

use super::{
    ApiCaller, CompletionResponse,
    pipe::{DeltaReader, PipeWriter, pipe},
};
use crate::{
    content::{Message, with_system_prompt},
    context::Context,
    errors::CompletionError,
    options::Options,
};

/// Completion façade over one vendor adapter.
///
/// Every operation prepends `options.system_prompt` on a local copy of the
/// messages unless they already start with a system message.
#[derive(Clone)]
pub struct Provider {
    caller: Arc<dyn ApiCaller>,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("caller", &self.caller.name())
            .finish()
    }
}

impl Provider {
    pub fn new(caller: impl ApiCaller + 'static) -> Self {
        Self {
            caller: Arc::new(caller),
        }
    }

    pub fn from_arc(caller: Arc<dyn ApiCaller>) -> Self {
        Self { caller }
    }

    pub fn name(&self) -> &str {
        self.caller.name()
    }

    pub fn supports_streaming(&self) -> bool {
        self.caller.stream_parser().is_some()
    }

    /// One non-streaming completion.
    ///
    /// A body the adapter cannot parse is returned verbatim.
    pub async fn complete(
        &self,
        ctx: &Context,
        messages: &[Message],
        options: &Options,
    ) -> Result<String, CompletionError> {
        let body = self.read_body(ctx, messages, options).await?;
        Ok(match self.caller.parse_completion(&body) {
            Some(response) => response.content,
            None => String::from_utf8_lossy(&body).into_owned(),
        })
    }

    /// One non-streaming model turn, tool calls included.
    ///
    /// A body the adapter cannot parse becomes the turn's content.
    pub async fn complete_turn(
        &self,
        ctx: &Context,
        messages: &[Message],
        options: &Options,
    ) -> Result<CompletionResponse, CompletionError> {
        let body = self.read_body(ctx, messages, options).await?;
        Ok(self
            .caller
            .parse_completion(&body)
            .unwrap_or_else(|| CompletionResponse::text(String::from_utf8_lossy(&body))))
    }

    /// Streams the completion into `on_delta`, one call per delta.
    ///
    /// Fails with [`CompletionError::StreamUnsupported`] before any request is
    /// made when the adapter has no stream parser.
    pub async fn complete_stream<F>(
        &self,
        ctx: &Context,
        messages: &[Message],
        options: &Options,
        mut on_delta: F,
    ) -> Result<(), CompletionError>
    where
        F: FnMut(&str) -> Result<(), CompletionError> + Send,
    {
        let parser = self
            .caller
            .stream_parser()
            .ok_or_else(|| CompletionError::stream_unsupported(self.name()))?;

        let messages = with_system_prompt(messages, options.system_prompt.as_deref());
        let body = ctx.run(self.caller.call(ctx, &messages, true, options)).await?;
        parser
            .parse_stream(ctx.bind_stream(body), &mut on_delta)
            .await
            .map_err(|err| match err {
                CompletionError::Decode { .. } => ctx.ended().unwrap_or(err),
                other => other,
            })
    }

    /// Streams the completion through a pipe filled by a background task.
    ///
    /// Request and decode failures arrive as the reader's final item. Dropping
    /// the reader stops the task even while it waits for the vendor.
    pub fn complete_stream_reader(
        &self,
        ctx: &Context,
        messages: &[Message],
        options: &Options,
    ) -> DeltaReader {
        if !self.supports_streaming() {
            return DeltaReader::failed(CompletionError::stream_unsupported(self.name()));
        }

        let (writer, reader) = pipe();
        let provider = self.clone();
        let ctx = ctx.clone();
        let messages = messages.to_vec();
        let options = options.clone();
        tokio::spawn(async move {
            provider.relay(&ctx, &messages, &options, writer).await;
        });
        reader
    }

    /// Runs [`Provider::stream_into`] until it finishes or the reader goes
    /// away, then closes the pipe.
    pub(crate) async fn relay(
        &self,
        ctx: &Context,
        messages: &[Message],
        options: &Options,
        writer: PipeWriter,
    ) {
        let outcome = tokio::select! {
            () = writer.closed() => None,
            result = self.stream_into(ctx, messages, options, &writer) => Some(result),
        };

        match outcome {
            None => log::debug!("{}: stream reader dropped, producer stopped", self.name()),
            Some(Ok(())) => {}
            Some(Err(err)) => writer.close_with_error(err).await,
        }
    }

    /// Streams one completion into `writer`. A closed pipe ends it quietly.
    async fn stream_into(
        &self,
        ctx: &Context,
        messages: &[Message],
        options: &Options,
        writer: &PipeWriter,
    ) -> Result<(), CompletionError> {
        let parser = self
            .caller
            .stream_parser()
            .ok_or_else(|| CompletionError::stream_unsupported(self.name()))?;

        let messages = with_system_prompt(messages, options.system_prompt.as_deref());
        let body = ctx.run(self.caller.call(ctx, &messages, true, options)).await?;
        let mut deltas = parser.decode(ctx.bind_stream(body));

        while let Some(delta) = deltas.next().await {
            let delta = delta.map_err(|err| read_error(ctx, err))?;
            if writer.write(delta).await.is_err() {
                log::debug!("{}: pipe closed mid-stream", self.name());
                return Ok(());
            }
        }
        Ok(())
    }

    async fn read_body(
        &self,
        ctx: &Context,
        messages: &[Message],
        options: &Options,
    ) -> Result<Vec<u8>, CompletionError> {
        let messages = with_system_prompt(messages, options.system_prompt.as_deref());
        let body = ctx.run(self.caller.call(ctx, &messages, false, options)).await?;
        let mut body = ctx.bind_stream(body);

        let mut buf = Vec::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk.map_err(|err| read_error(ctx, err))?);
        }
        Ok(buf)
    }
}

/// A failed body read caused by the context ending reports the context's
/// reason; anything else is a decode failure.
fn read_error(ctx: &Context, err: CommonRequestError) -> CompletionError {
    ctx.ended().unwrap_or_else(|| CompletionError::decode(err))
}
