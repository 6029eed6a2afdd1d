//! Chat message types for the OpenAI-compatible wire protocol.
//!
//! Provider-agnostic representation of a chat message; the transport layer
//! converts these into the JSON shape the endpoint expects.

/// Role of a chat message participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    /// System message (schema rendering and output instructions)
    System,
    /// User message (the raw input text)
    User,
    /// Assistant message (model responses)
    Assistant,
}

impl ChatRole {
    /// Returns the role as a string for API requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    /// The role of the message sender
    pub role: ChatRole,
    /// The message content
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message.
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message.
    ///
    /// # Example
    ///
    /// ```
    /// use ordis::ChatMessage;
    ///
    /// let msg = ChatMessage::system("Respond with JSON only.");
    /// assert_eq!(msg.role.as_str(), "system");
    /// ```
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}
