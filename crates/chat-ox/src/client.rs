use crate::{
    agent::Agent,
    content::Message,
    context::Context,
    errors::CompletionError,
    options::Options,
    provider::{ApiCaller, DeltaReader, Provider},
    response::Response,
    vendor::{Anthropic, Flavor, Gemini, OpenAiCompatible},
};

/// Entry point: one vendor adapter behind the completion and tool-loop
/// operations.
#[derive(Debug, Clone)]
pub struct Client {
    provider: Provider,
}

impl Client {
    pub fn new(caller: impl ApiCaller + 'static) -> Self {
        Self {
            provider: Provider::new(caller),
        }
    }

    pub fn from_provider(provider: Provider) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub async fn complete(
        &self,
        ctx: &Context,
        messages: &[Message],
    ) -> Result<String, CompletionError> {
        self.complete_with_options(ctx, messages, &Options::default()).await
    }

    pub async fn complete_with_options(
        &self,
        ctx: &Context,
        messages: &[Message],
        options: &Options,
    ) -> Result<String, CompletionError> {
        self.provider.complete(ctx, messages, options).await
    }

    pub async fn stream_complete<F>(
        &self,
        ctx: &Context,
        messages: &[Message],
        on_delta: F,
    ) -> Result<(), CompletionError>
    where
        F: FnMut(&str) -> Result<(), CompletionError> + Send,
    {
        self.stream_complete_with_options(ctx, messages, &Options::default(), on_delta)
            .await
    }

    pub async fn stream_complete_with_options<F>(
        &self,
        ctx: &Context,
        messages: &[Message],
        options: &Options,
        on_delta: F,
    ) -> Result<(), CompletionError>
    where
        F: FnMut(&str) -> Result<(), CompletionError> + Send,
    {
        self.provider
            .complete_stream(ctx, messages, options, on_delta)
            .await
    }

    /// Streams a plain completion through a [`DeltaReader`]; tools are not run.
    pub fn stream_reader(
        &self,
        ctx: &Context,
        messages: &[Message],
        options: &Options,
    ) -> DeltaReader {
        self.provider.complete_stream_reader(ctx, messages, options)
    }

    /// Tools-aware generation.
    ///
    /// With tools in `options` the tool loop runs first. When `stream` is set
    /// the answer comes back as [`Response::Stream`]; adapters that cannot
    /// stream fail right away.
    pub async fn generate(
        &self,
        ctx: &Context,
        messages: &[Message],
        options: &Options,
        stream: bool,
    ) -> Result<Response, CompletionError> {
        if stream {
            if !self.provider.supports_streaming() {
                return Err(CompletionError::stream_unsupported(self.provider.name()));
            }
            return Ok(Response::Stream(self.generate_stream(ctx, messages, options)));
        }

        let content = if options.has_tools() {
            Agent::new(self.provider.clone())
                .run(ctx, messages, options)
                .await?
        } else {
            self.provider.complete(ctx, messages, options).await?
        };
        Ok(Response::Content(content))
    }

    /// Tools-aware streaming generation. Every failure, including a missing
    /// stream parser, is the reader's final item.
    pub fn generate_stream(
        &self,
        ctx: &Context,
        messages: &[Message],
        options: &Options,
    ) -> DeltaReader {
        if options.has_tools() {
            Agent::new(self.provider.clone()).run_stream(ctx, messages, options)
        } else {
            self.provider.complete_stream_reader(ctx, messages, options)
        }
    }
}

fn compatible(flavor: Flavor, api_key: impl Into<String>, model: impl Into<String>) -> Client {
    Client::new(OpenAiCompatible::new(flavor, api_key, model))
}

pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Client {
    compatible(Flavor::OpenAi, api_key, model)
}

pub fn groq(api_key: impl Into<String>, model: impl Into<String>) -> Client {
    compatible(Flavor::Groq, api_key, model)
}

pub fn mistral(api_key: impl Into<String>, model: impl Into<String>) -> Client {
    compatible(Flavor::Mistral, api_key, model)
}

pub fn openrouter(api_key: impl Into<String>, model: impl Into<String>) -> Client {
    compatible(Flavor::OpenRouter, api_key, model)
}

pub fn perplexity(api_key: impl Into<String>, model: impl Into<String>) -> Client {
    compatible(Flavor::Perplexity, api_key, model)
}

pub fn xai(api_key: impl Into<String>, model: impl Into<String>) -> Client {
    compatible(Flavor::Xai, api_key, model)
}

pub fn anannas(api_key: impl Into<String>, model: impl Into<String>) -> Client {
    compatible(Flavor::Anannas, api_key, model)
}

pub fn anthropic(api_key: impl Into<String>, model: impl Into<String>) -> Client {
    Client::new(Anthropic::new(api_key, model))
}

pub fn gemini(api_key: impl Into<String>, model: impl Into<String>) -> Client {
    Client::new(Gemini::new(api_key, model))
}
