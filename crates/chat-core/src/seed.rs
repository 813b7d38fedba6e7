//! Demo conversations loaded when a session starts without a backend.

use crate::types::{Chat, ChatKind, DeliveryStatus, Message};

/// Chat opened at startup.
pub const SEED_SELECTED_CHAT_ID: &str = "1";

pub fn seed_chats() -> Vec<Chat> {
    vec![
        Chat::new("1", "Anna Smirnova", "👩‍💼")
            .with_presence(true)
            .with_unread(2)
            .with_messages(vec![
                Message::inbound("1", "Hi! How are you?", "14:28"),
                Message::outbound("2", "Hi! All good, working on the project", "14:29")
                    .with_status(DeliveryStatus::Read),
                Message::inbound("3", "Nice! Can we call tonight?", "14:30"),
                Message::outbound("4", "Sure! Does 19:00 work?", "14:31")
                    .with_status(DeliveryStatus::Delivered),
                Message::inbound("5", "Great, see you then!", "14:32"),
            ]),
        Chat::new("2", "Quantum Team", "🚀")
            .with_kind(ChatKind::Group)
            .with_presence(true)
            .with_unread(5)
            .with_typing(true)
            .with_messages(vec![
                Message::inbound("1", "Hi all! Starting the standup", "13:00"),
                Message::outbound("2", "I finished the UI components", "13:05"),
                Message::inbound("3", "Great! I'm on the backend", "13:10"),
                Message::inbound("4", "Added the new features", "13:15"),
            ]),
        Chat::new("3", "Maxim Petrov", "👨‍💻").with_messages(vec![
            Message::inbound("1", "Hi! Sent the PR for review", "12:40"),
            Message::outbound("2", "Will look tonight!", "12:42"),
            Message::inbound("3", "Please take a look at the code", "12:45"),
        ]),
        Chat::new("4", "Elena Volkova", "👩‍🎨").with_messages(vec![
            Message::inbound("1", "New designs are ready", "Yesterday"),
            Message::outbound("2", "Looks great!", "Yesterday"),
            Message::inbound("3", "Thanks for the feedback!", "Yesterday"),
        ]),
    ]
}
