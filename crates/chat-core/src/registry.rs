use crate::{
    error::RegistryError,
    types::{Chat, DeliveryStatus, Message},
};

/// Authoritative collection of chats, in sidebar order.
///
/// Every mutation either applies fully or returns an error and leaves the
/// registry exactly as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatRegistry {
    chats: Vec<Chat>,
}

impl ChatRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the given chats. Later duplicates of an ID are dropped.
    pub fn with_chats(chats: impl IntoIterator<Item = Chat>) -> Self {
        let mut registry = Self::new();
        for chat in chats {
            let _ = registry.insert_chat(chat);
        }
        registry
    }

    /// Chats in display order.
    pub fn chats(&self) -> &[Chat] {
        &self.chats
    }

    /// Number of chats.
    pub fn len(&self) -> usize {
        self.chats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chats.is_empty()
    }

    /// Chat with the given ID.
    pub fn get(&self, chat_id: &str) -> Option<&Chat> {
        self.chats.iter().find(|chat| chat.id == chat_id)
    }

    /// Whether a chat with the given ID exists.
    pub fn contains(&self, chat_id: &str) -> bool {
        self.get(chat_id).is_some()
    }

    /// Chats whose name contains `query`, ignoring case. A blank query matches all.
    pub fn filter_by_name(&self, query: &str) -> Vec<&Chat> {
        let needle = query.trim().to_lowercase();
        self.chats
            .iter()
            .filter(|chat| needle.is_empty() || chat.name.to_lowercase().contains(&needle))
            .collect()
    }

    /// Add a chat at the end of the list.
    pub fn insert_chat(&mut self, chat: Chat) -> Result<(), RegistryError> {
        if self.contains(&chat.id) {
            return Err(RegistryError::DuplicateChat(chat.id));
        }
        self.chats.push(chat);
        Ok(())
    }

    /// Remove a chat and return it. The order of the remaining chats is kept.
    pub fn remove_chat(&mut self, chat_id: &str) -> Result<Chat, RegistryError> {
        let index = self
            .chats
            .iter()
            .position(|chat| chat.id == chat_id)
            .ok_or_else(|| RegistryError::ChatNotFound(chat_id.to_owned()))?;
        Ok(self.chats.remove(index))
    }

    /// Append a message and refresh the chat's `last_message`/`time` cache.
    pub fn append_message(
        &mut self,
        chat_id: &str,
        message: Message,
    ) -> Result<(), RegistryError> {
        let chat = self.chat_mut(chat_id)?;
        chat.last_message = message.text.clone();
        chat.time = message.time.clone();
        chat.messages.push(message);
        Ok(())
    }

    /// Move an outbound message's status forward.
    pub fn update_message_status(
        &mut self,
        chat_id: &str,
        message_id: &str,
        new_status: DeliveryStatus,
    ) -> Result<(), RegistryError> {
        let chat = self.chat_mut(chat_id)?;
        let message = chat
            .messages
            .iter_mut()
            .find(|message| message.id == message_id)
            .ok_or_else(|| RegistryError::MessageNotFound {
                chat_id: chat_id.to_owned(),
                message_id: message_id.to_owned(),
            })?;

        if !message.is_sent {
            return Err(RegistryError::InboundMessage {
                message_id: message_id.to_owned(),
            });
        }

        let allowed = match message.status {
            Some(current) => current.can_advance_to(new_status),
            None => true,
        };
        if !allowed {
            return Err(RegistryError::StatusRegression {
                message_id: message_id.to_owned(),
                from: message.status,
                to: new_status,
            });
        }

        message.status = Some(new_status);
        Ok(())
    }

    /// Set the remote typing indicator.
    pub fn set_typing(&mut self, chat_id: &str, value: bool) -> Result<(), RegistryError> {
        self.chat_mut(chat_id)?.is_typing = value;
        Ok(())
    }

    fn chat_mut(&mut self, chat_id: &str) -> Result<&mut Chat, RegistryError> {
        self.chats
            .iter_mut()
            .find(|chat| chat.id == chat_id)
            .ok_or_else(|| RegistryError::ChatNotFound(chat_id.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ChatRegistry {
        ChatRegistry::with_chats([
            Chat::new("a", "Anna Smirnova", "A").with_messages(vec![
                Message::inbound("1", "hi", "10:00"),
                Message::outbound("2", "hello", "10:01"),
            ]),
            Chat::new("b", "Quantum Team", "Q"),
        ])
    }

    #[test]
    fn append_updates_summary_fields() {
        let mut reg = registry();
        reg.append_message("b", Message::outbound("m1", "ship it", "11:30"))
            .expect("append should work");

        let chat = reg.get("b").expect("chat b exists");
        assert_eq!(chat.messages.len(), 1);
        assert_eq!(chat.last_message, "ship it");
        assert_eq!(chat.time, "11:30");
    }

    #[test]
    fn append_to_unknown_chat_is_rejected_without_changes() {
        let mut reg = registry();
        let before = reg.clone();
        let err = reg
            .append_message("zzz", Message::outbound("m1", "x", "11:30"))
            .expect_err("unknown chat must be rejected");
        assert_eq!(err, RegistryError::ChatNotFound("zzz".into()));
        assert_eq!(reg, before);
    }

    #[test]
    fn status_moves_forward_only() {
        let mut reg = registry();
        reg.update_message_status("a", "2", DeliveryStatus::Delivered)
            .expect("sent -> delivered");
        reg.update_message_status("a", "2", DeliveryStatus::Read)
            .expect("delivered -> read");

        let before = reg.clone();
        let err = reg
            .update_message_status("a", "2", DeliveryStatus::Delivered)
            .expect_err("read -> delivered must be rejected");
        assert!(matches!(err, RegistryError::StatusRegression { .. }));
        assert_eq!(reg, before);
    }

    #[test]
    fn status_update_with_unknown_ids_leaves_registry_equal() {
        let mut reg = registry();
        let before = reg.clone();

        assert!(reg
            .update_message_status("nope", "2", DeliveryStatus::Delivered)
            .is_err());
        assert!(reg
            .update_message_status("a", "404", DeliveryStatus::Delivered)
            .is_err());
        assert_eq!(reg, before);
    }

    #[test]
    fn inbound_messages_never_receive_status() {
        let mut reg = registry();
        let err = reg
            .update_message_status("a", "1", DeliveryStatus::Read)
            .expect_err("inbound target must be rejected");
        assert_eq!(
            err,
            RegistryError::InboundMessage {
                message_id: "1".into()
            }
        );
        assert_eq!(reg.get("a").and_then(|c| c.messages[0].status), None);
    }

    #[test]
    fn status_update_is_scoped_to_one_chat() {
        let mut reg = ChatRegistry::with_chats([
            Chat::new("a", "A", "A").with_messages(vec![Message::outbound("1", "x", "10:00")]),
            Chat::new("b", "B", "B").with_messages(vec![Message::outbound("1", "y", "10:00")]),
        ]);
        reg.update_message_status("a", "1", DeliveryStatus::Delivered)
            .expect("update should work");

        assert_eq!(
            reg.get("a").and_then(|c| c.messages[0].status),
            Some(DeliveryStatus::Delivered)
        );
        assert_eq!(
            reg.get("b").and_then(|c| c.messages[0].status),
            Some(DeliveryStatus::Sent)
        );
    }

    #[test]
    fn typing_flag_and_duplicate_insert() {
        let mut reg = registry();
        reg.set_typing("b", true).expect("typing on");
        assert!(reg.get("b").is_some_and(|c| c.is_typing));
        assert!(reg.set_typing("zzz", true).is_err());

        let err = reg
            .insert_chat(Chat::new("a", "dup", "D"))
            .expect_err("duplicate id must be rejected");
        assert_eq!(err, RegistryError::DuplicateChat("a".into()));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn filters_by_name_case_insensitively() {
        let reg = registry();
        let hits = reg.filter_by_name("QUANT");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "b");
        assert_eq!(reg.filter_by_name("  ").len(), 2);
    }

    #[test]
    fn remove_chat_keeps_order_and_rejects_unknown_ids() {
        let mut reg = ChatRegistry::with_chats([
            Chat::new("a", "A", "A"),
            Chat::new("b", "B", "B"),
            Chat::new("c", "C", "C"),
        ]);
        let removed = reg.remove_chat("b").expect("remove should work");
        assert_eq!(removed.id, "b");
        let ids: Vec<&str> = reg.chats().iter().map(|chat| chat.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);

        let before = reg.clone();
        assert_eq!(
            reg.remove_chat("b"),
            Err(RegistryError::ChatNotFound("b".into()))
        );
        assert_eq!(reg, before);
    }
}
