use bon::Builder;
use serde::{Deserialize, Serialize};

use crate::tool::{Tool, ToolObserver, ToolSet};

/// Default cap on model turns in the tool loop.
pub const DEFAULT_MAX_TOOL_STEPS: u32 = 5;

/// How much effort a reasoning model should spend before answering.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ReasoningEffort {
    Low,
    Medium,
    High,
}

/// Per-request settings. Fixed for the whole request, tool loop included.
#[derive(Clone, Builder)]
pub struct Options {
    /// Overrides the adapter's default model.
    #[builder(into)]
    pub model: Option<String>,
    /// Prepended as a system message unless the history already starts with one.
    #[builder(into)]
    pub system_prompt: Option<String>,
    pub max_completion_tokens: Option<u32>,
    pub reasoning_effort: Option<ReasoningEffort>,
    pub temperature: Option<f32>,
    #[builder(default)]
    pub tools: ToolSet,
    /// Maximum number of model turns the tool loop may take.
    #[builder(default = DEFAULT_MAX_TOOL_STEPS)]
    pub max_tool_steps: u32,
    /// Called with `(name, raw arguments)` before each registered tool runs.
    pub on_tool_call: Option<ToolObserver>,
}

impl Default for Options {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl std::fmt::Debug for Options {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Options")
            .field("model", &self.model)
            .field("system_prompt", &self.system_prompt)
            .field("max_completion_tokens", &self.max_completion_tokens)
            .field("reasoning_effort", &self.reasoning_effort)
            .field("temperature", &self.temperature)
            .field("tools", &self.tools)
            .field("max_tool_steps", &self.max_tool_steps)
            .field("has_tool_observer", &self.on_tool_call.is_some())
            .finish()
    }
}

impl Options {
    /// Same options with one more tool registered.
    #[must_use]
    pub fn with_tool(mut self, name: impl Into<String>, tool: Tool) -> Self {
        self.tools.add_tool(name, tool);
        self
    }

    /// Whether requests with these options go through the tool loop.
    pub fn has_tools(&self) -> bool {
        !self.tools.is_empty()
    }

    /// The model to request: the explicit override, else `default`.
    pub fn model_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.model.as_deref().filter(|m| !m.is_empty()).unwrap_or(default)
    }
}
