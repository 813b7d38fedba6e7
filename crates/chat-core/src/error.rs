use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad error category used for user-facing handling.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Invalid user input (blank names, unsupported files).
    Validation,
    /// Referenced chat, message or user does not exist.
    NotFound,
    /// Authentication/authorization failure.
    Auth,
    /// Transient network or transport failure.
    Network,
    /// Local persistence failure.
    Storage,
    /// Serialization/deserialization failure.
    Serialization,
    /// Internal bug or invariant break.
    Internal,
}

/// Stable error payload emitted across the core/front-end boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("{category:?}:{code}: {message}")]
pub struct ChatError {
    /// High-level error category.
    pub category: ErrorCategory,
    /// Stable machine-readable error code.
    pub code: String,
    /// Human-readable message. Only validation messages reach users verbatim.
    pub message: String,
}

impl ChatError {
    /// Construct a new error.
    pub fn new(
        category: ErrorCategory,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Build a standard validation error.
    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCategory::Validation, code, message)
    }
}

/// Rejections reported by [`crate::ChatRegistry`] mutations.
///
/// A rejected mutation leaves the registry untouched.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No chat has the given ID.
    #[error("chat '{0}' was not found")]
    ChatNotFound(String),
    /// The chat exists but holds no message with the given ID.
    #[error("message '{message_id}' was not found in chat '{chat_id}'")]
    MessageNotFound { chat_id: String, message_id: String },
    /// Status updates only apply to messages the local user sent.
    #[error("message '{message_id}' is inbound and carries no delivery status")]
    InboundMessage { message_id: String },
    /// The update would move a status backward or leave it unchanged.
    #[error("message '{message_id}' cannot move from {from:?} to {to:?}")]
    StatusRegression {
        message_id: String,
        from: Option<crate::DeliveryStatus>,
        to: crate::DeliveryStatus,
    },
    /// Another chat already uses this ID.
    #[error("chat '{0}' already exists")]
    DuplicateChat(String),
}
