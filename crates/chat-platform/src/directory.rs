use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::PlatformError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatType {
    Group,
    Channel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberRole {
    Admin,
    Member,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMember {
    pub user_id: u64,
    pub role: MemberRole,
}

/// Form payload for a new group or channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateChatRequest {
    pub name: String,
    pub chat_type: ChatType,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub member_ids: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedChat {
    pub id: u64,
    pub name: String,
    pub avatar_url: String,
    pub chat_type: ChatType,
    pub members: Vec<ChatMember>,
}

/// Creates chats on behalf of a signed-in user.
pub trait ChatDirectory: Send + Sync {
    fn create_chat(
        &self,
        caller: u64,
        request: &CreateChatRequest,
    ) -> Result<CreatedChat, PlatformError>;
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryChatDirectory {
    chats: Arc<Mutex<Vec<CreatedChat>>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryChatDirectory {
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn chats(&self) -> Vec<CreatedChat> {
        self.chats.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl ChatDirectory for InMemoryChatDirectory {
    fn create_chat(
        &self,
        caller: u64,
        request: &CreateChatRequest,
    ) -> Result<CreatedChat, PlatformError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(PlatformError::Invalid("chat name is required".to_owned()));
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PlatformError::Unavailable("chat directory offline".to_owned()));
        }

        // The caller always joins as admin; other IDs join once as members.
        let mut members = vec![ChatMember {
            user_id: caller,
            role: MemberRole::Admin,
        }];
        for &user_id in &request.member_ids {
            if members.iter().all(|member| member.user_id != user_id) {
                members.push(ChatMember {
                    user_id,
                    role: MemberRole::Member,
                });
            }
        }

        let mut chats = self.chats.lock().unwrap_or_else(|p| p.into_inner());
        let created = CreatedChat {
            id: chats.len() as u64 + 1,
            name: name.to_owned(),
            avatar_url: request.avatar_url.clone(),
            chat_type: request.chat_type,
            members,
        };
        chats.push(created.clone());
        info!(
            chat_id = created.id,
            caller,
            members = created.members.len(),
            "chat created"
        );
        Ok(created)
    }
}
