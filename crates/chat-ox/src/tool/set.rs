use std::collections::BTreeMap;

use super::{Tool, ToolError, ToolObserver};
use crate::{content::ToolCallRequest, context::Context};

/// Tools available to the model, keyed by name.
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: BTreeMap<String, Tool>,
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSet")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `tool` under `name`, replacing any tool already there.
    pub fn add_tool(&mut self, name: impl Into<String>, tool: Tool) {
        self.tools.insert(name.into(), tool);
    }

    /// Adds a tool using a builder pattern.
    #[must_use]
    pub fn with_tool(mut self, name: impl Into<String>, tool: Tool) -> Self {
        self.add_tool(name, tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.get(name)
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Tools in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tool)> {
        self.tools.iter().map(|(name, tool)| (name.as_str(), tool))
    }

    /// Invokes the tool a call names.
    pub async fn invoke(&self, ctx: Context, call: &ToolCallRequest) -> Result<String, ToolError> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| ToolError::not_found(&call.name))?;

        tool.invoke(&call.name, ctx, call.arguments.clone()).await
    }

    /// Invokes the tool a call names and returns the tool-role message
    /// content, which is the error payload when the call failed.
    ///
    /// The observer fires only for registered tools, right before they run.
    pub async fn invoke_to_content(
        &self,
        ctx: Context,
        call: &ToolCallRequest,
        observer: Option<&ToolObserver>,
    ) -> String {
        if self.has_function(&call.name) {
            if let Some(observer) = observer {
                observer(&call.name, &call.arguments);
            }
        }

        match self.invoke(ctx, call).await {
            Ok(content) => {
                log::debug!("tool '{}' ({}) succeeded", call.name, call.id);
                content
            }
            Err(err) => {
                log::warn!("tool call {} reported back to the model: {err}", call.id);
                err.to_payload()
            }
        }
    }
}

impl FromIterator<(String, Tool)> for ToolSet {
    fn from_iter<I: IntoIterator<Item = (String, Tool)>>(iter: I) -> Self {
        Self {
            tools: iter.into_iter().collect(),
        }
    }
}
