pub mod message;

// Re-export commonly used types
pub use message::{Message, MessageRole, ToolCallRequest};

/// Prepends a system message built from `system_prompt` unless the
/// conversation already starts with one.
///
/// Works on a copy; the caller's slice is left untouched.
pub fn with_system_prompt(messages: &[Message], system_prompt: Option<&str>) -> Vec<Message> {
    match system_prompt {
        Some(prompt) if !prompt.is_empty() && !messages.first().is_some_and(Message::is_system) => {
            let mut out = Vec::with_capacity(messages.len() + 1);
            out.push(Message::system(prompt));
            out.extend_from_slice(messages);
            out
        }
        _ => messages.to_vec(),
    }
}
