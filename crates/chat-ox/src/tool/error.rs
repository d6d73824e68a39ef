use std::error::Error as StdError;
use thiserror::Error;

/// A type alias for a boxed error that is thread-safe.
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Represents errors that can occur during tool invocation.
///
/// None of these end a request. The orchestrator turns each one into a
/// tool-role message (see [`ToolError::to_payload`]) so the model sees the
/// failure on its next turn.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The model asked for a tool that was never registered.
    #[error("Tool not found: {name}")]
    NotFound { name: String },

    /// The raw arguments did not match the tool's argument type.
    #[error("Input deserialization failed for tool '{name}': {error}")]
    InputDeserialization {
        name: String,
        #[source]
        error: BoxedError,
    },

    /// The tool executed but failed with its own error.
    #[error("Tool execution failed for tool '{name}': {error}")]
    Execution {
        name: String,
        #[source]
        error: BoxedError,
    },

    /// The tool succeeded but its result could not be serialized to JSON.
    #[error("Output serialization failed for tool '{name}': {error}")]
    OutputSerialization {
        name: String,
        #[source]
        error: BoxedError,
    },
}

impl ToolError {
    /// Creates a "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    /// Creates an "input deserialization" error, wrapping the source error.
    pub fn input_deserialization(name: impl Into<String>, error: impl Into<BoxedError>) -> Self {
        Self::InputDeserialization {
            name: name.into(),
            error: error.into(),
        }
    }

    /// Creates a "tool execution" error, wrapping the tool's specific error.
    pub fn execution(name: impl Into<String>, error: impl Into<BoxedError>) -> Self {
        Self::Execution {
            name: name.into(),
            error: error.into(),
        }
    }

    /// Creates an "output serialization" error, wrapping the source error.
    pub fn output_serialization(name: impl Into<String>, error: impl Into<BoxedError>) -> Self {
        Self::OutputSerialization {
            name: name.into(),
            error: error.into(),
        }
    }

    /// Name of the tool the error belongs to.
    pub fn tool_name(&self) -> &str {
        match self {
            Self::NotFound { name }
            | Self::InputDeserialization { name, .. }
            | Self::Execution { name, .. }
            | Self::OutputSerialization { name, .. } => name,
        }
    }

    /// Tool-role message content reporting this error: `{"error": "<message>"}`.
    pub fn to_payload(&self) -> String {
        serde_json::json!({ "error": self.to_string() }).to_string()
    }
}
