use serde::{Deserialize, Serialize};

use crate::error::{ChatError, ErrorCategory};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// User-visible toast queued on the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub description: String,
}

impl Notice {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: "Done".to_owned(),
            description: description.into(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: "Error".to_owned(),
            description: description.into(),
        }
    }
}

/// User action that talks to an external collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteAction {
    Login,
    CreateChat,
    UploadAvatar,
    Logout,
}

impl RemoteAction {
    fn failure_text(self) -> &'static str {
        match self {
            RemoteAction::Login => "Could not sign in",
            RemoteAction::CreateChat => "Could not create the chat",
            RemoteAction::UploadAvatar => "Could not upload the avatar",
            RemoteAction::Logout => "Could not sign out",
        }
    }
}

/// Convert a failed remote action into an error notice.
///
/// Validation messages are written for users and shown as-is; everything
/// else collapses to a generic per-action description.
pub fn notice_for_failure(action: RemoteAction, error: &ChatError) -> Notice {
    match error.category {
        ErrorCategory::Validation => Notice::error(error.message.clone()),
        _ => Notice::error(action.failure_text()),
    }
}
