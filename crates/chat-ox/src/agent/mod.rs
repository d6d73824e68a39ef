//! Bounded tool-call loop on top of the completion façade.

use crate::{
    content::{Message, with_system_prompt},
    context::Context,
    errors::CompletionError,
    options::Options,
    provider::{DeltaReader, Provider, pipe},
};

/// Where the loop stands after one model turn.
#[derive(Debug)]
enum LoopState {
    /// Tools ran; their results are in the history and the model goes again.
    Continue,
    /// The model answered without asking for tools.
    Answered(String),
    /// `max_tool_steps` turns taken without an answer.
    Exhausted,
    /// The model call failed; the run ends with this error.
    Failed(CompletionError),
}

/// One invocation of the tool loop. Owns the conversation history, which
/// only ever grows.
struct ToolLoop<'a> {
    provider: &'a Provider,
    ctx: &'a Context,
    options: &'a Options,
    history: Vec<Message>,
    step: u32,
}

impl<'a> ToolLoop<'a> {
    fn new(
        provider: &'a Provider,
        ctx: &'a Context,
        messages: &[Message],
        options: &'a Options,
    ) -> Self {
        Self {
            provider,
            ctx,
            options,
            history: with_system_prompt(messages, options.system_prompt.as_deref()),
            step: 0,
        }
    }

    /// Takes one model turn and runs the tools it asked for, in order.
    async fn advance(&mut self) -> LoopState {
        if self.step >= self.options.max_tool_steps {
            return LoopState::Exhausted;
        }
        self.step += 1;

        let turn = match self
            .provider
            .complete_turn(self.ctx, &self.history, self.options)
            .await
        {
            Ok(turn) => turn,
            Err(err) => return LoopState::Failed(err),
        };
        log::debug!(
            "{}: turn {}/{} returned {} tool call(s)",
            self.provider.name(),
            self.step,
            self.options.max_tool_steps,
            turn.tool_calls.len()
        );

        if !turn.has_tool_calls() {
            return LoopState::Answered(turn.content);
        }

        let calls = turn.tool_calls;
        self.history
            .push(Message::assistant_with_tool_calls(turn.content, calls.clone()));

        for call in &calls {
            let content = self
                .options
                .tools
                .invoke_to_content(self.ctx.clone(), call, self.options.on_tool_call.as_ref())
                .await;
            self.history.push(Message::tool_result(&call.id, content));
        }

        LoopState::Continue
    }

    /// Advances until the model answers or the step budget runs out.
    async fn run(&mut self) -> Result<String, CompletionError> {
        loop {
            match self.advance().await {
                LoopState::Continue => {}
                LoopState::Answered(content) => return Ok(content),
                LoopState::Failed(err) => return Err(err),
                LoopState::Exhausted => {
                    log::warn!(
                        "{}: no answer after {} tool step(s)",
                        self.provider.name(),
                        self.options.max_tool_steps
                    );
                    return Err(CompletionError::StepsExhausted {
                        max_steps: self.options.max_tool_steps,
                    });
                }
            }
        }
    }
}

/// Drives the model through tool calls until it produces an answer.
#[derive(Debug, Clone)]
pub struct Agent {
    provider: Provider,
}

impl Agent {
    pub fn new(provider: Provider) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Runs the loop and returns the model's final answer.
    ///
    /// Tool failures never end the run; the model sees them as tool-role
    /// messages. Fails with [`CompletionError::StepsExhausted`] once
    /// `options.max_tool_steps` turns have passed without an answer.
    pub async fn run(
        &self,
        ctx: &Context,
        messages: &[Message],
        options: &Options,
    ) -> Result<String, CompletionError> {
        ToolLoop::new(&self.provider, ctx, messages, options).run().await
    }

    /// Runs the loop in the background and streams the final answer.
    ///
    /// Tool-call turns are non-streaming. Once a turn comes back without tool
    /// calls, the last request is issued again in streaming mode over the
    /// same history and its deltas are relayed to the reader. Every failure
    /// is the reader's final item.
    pub fn run_stream(
        &self,
        ctx: &Context,
        messages: &[Message],
        options: &Options,
    ) -> DeltaReader {
        if !self.provider.supports_streaming() {
            return DeltaReader::failed(CompletionError::stream_unsupported(self.provider.name()));
        }

        let (writer, reader) = pipe();
        let provider = self.provider.clone();
        let ctx = ctx.clone();
        let messages = messages.to_vec();
        let options = options.clone();

        tokio::spawn(async move {
            let mut tool_loop = ToolLoop::new(&provider, &ctx, &messages, &options);
            let outcome = tokio::select! {
                () = writer.closed() => None,
                result = tool_loop.run() => Some(result),
            };

            match outcome {
                None => log::debug!("{}: reader dropped during tool loop", provider.name()),
                Some(Ok(_)) => {
                    provider.relay(&ctx, &tool_loop.history, &options, writer).await;
                }
                Some(Err(err)) => writer.close_with_error(err).await,
            }
        });

        reader
    }
}
