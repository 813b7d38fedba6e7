//! Interfaces for the services the chat core talks to, with in-memory and
//! file-backed implementations.

pub mod avatar;
pub mod directory;
pub mod identity;
pub mod session_store;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use avatar::{AvatarUploader, InMemoryAvatarUploader};
pub use directory::{
    ChatDirectory, ChatMember, ChatType, CreateChatRequest, CreatedChat, InMemoryChatDirectory,
    MemberRole,
};
pub use identity::{IdentityClaims, IdentityProvider, InMemoryIdentityProvider};
pub use session_store::{FileSessionStore, InMemorySessionStore, SessionStore};

/// Failures reported by platform services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("credential rejected")]
    Unauthorized,
    #[error("service unavailable: {0}")]
    Unavailable(String),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("serialization failure: {0}")]
    Serialization(String),
}

/// Signed-in user as returned by the identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserRecord {
    pub id: u64,
    /// Subject identifier at the identity provider.
    pub identity_provider_id: String,
    pub email: String,
    pub name: String,
    pub avatar_url: String,
}
