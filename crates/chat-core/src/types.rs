use serde::{Deserialize, Serialize};

/// Delivery progress of an outbound message.
///
/// Variants are ordered; a message may only move to a later variant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    /// Accepted locally and handed to the transport.
    Sent,
    /// Reached the counterparty.
    Delivered,
    /// Seen by the counterparty.
    Read,
}

impl DeliveryStatus {
    /// Whether moving from `self` to `next` is a forward transition.
    pub fn can_advance_to(self, next: DeliveryStatus) -> bool {
        next > self
    }

    /// Lowercase name shown next to outbound messages.
    pub fn label(self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Read => "read",
        }
    }
}

/// One unit of chat content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Identifier, unique within its chat.
    pub id: String,
    /// User-visible body.
    pub text: String,
    /// Display-formatted timestamp (`HH:MM`). Not used for ordering.
    pub time: String,
    /// `true` when authored by the local user.
    pub is_sent: bool,
    /// Delivery status; only ever present on outbound messages.
    pub status: Option<DeliveryStatus>,
}

impl Message {
    /// Build an outbound message in the `Sent` state.
    pub fn outbound(
        id: impl Into<String>,
        text: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            time: time.into(),
            is_sent: true,
            status: Some(DeliveryStatus::Sent),
        }
    }

    /// Build an inbound message. Inbound messages never carry a status.
    pub fn inbound(
        id: impl Into<String>,
        text: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            time: time.into(),
            is_sent: false,
            status: None,
        }
    }

    /// Override the initial status of an outbound message (used by seed data).
    pub fn with_status(mut self, status: DeliveryStatus) -> Self {
        if self.is_sent {
            self.status = Some(status);
        }
        self
    }
}

/// Kind of conversation a chat represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    /// One-to-one conversation.
    #[default]
    Direct,
    /// Multi-member conversation where everyone can post.
    Group,
    /// Broadcast conversation where only admins post.
    Channel,
}

impl ChatKind {
    /// Emoji used when a chat has no avatar of its own.
    pub fn default_avatar(self) -> &'static str {
        match self {
            ChatKind::Direct => "👤",
            ChatKind::Group => "👥",
            ChatKind::Channel => "📢",
        }
    }
}

/// A conversation thread and its cached summary fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chat {
    /// Stable identifier used by every mutation.
    pub id: String,
    /// Display name; the sidebar search matches against it.
    pub name: String,
    /// Emoji or image URL.
    pub avatar: String,
    pub kind: ChatKind,
    /// Messages in chronological (insertion) order.
    pub messages: Vec<Message>,
    /// Text of the last message in `messages`.
    pub last_message: String,
    /// Display time of the last message in `messages`.
    pub time: String,
    /// Unseen inbound message count.
    pub unread: u32,
    /// Presence of the remote party.
    pub is_online: bool,
    /// The remote party is composing a reply.
    pub is_typing: bool,
}

impl Chat {
    /// Create an empty chat.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        avatar: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            avatar: avatar.into(),
            kind: ChatKind::Direct,
            messages: Vec::new(),
            last_message: String::new(),
            time: String::new(),
            unread: 0,
            is_online: false,
            is_typing: false,
        }
    }

    pub fn with_kind(mut self, kind: ChatKind) -> Self {
        self.kind = kind;
        self
    }

    /// Mark the remote party online or offline.
    pub fn with_presence(mut self, is_online: bool) -> Self {
        self.is_online = is_online;
        self
    }

    pub fn with_unread(mut self, unread: u32) -> Self {
        self.unread = unread;
        self
    }

    pub fn with_typing(mut self, is_typing: bool) -> Self {
        self.is_typing = is_typing;
        self
    }

    /// Seed the history, keeping the summary fields in sync.
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = messages;
        self.sync_summary();
        self
    }

    /// Last message in the thread, when any.
    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub(crate) fn sync_summary(&mut self) {
        match self.messages.last() {
            Some(last) => {
                self.last_message = last.text.clone();
                self.time = last.time.clone();
            }
            None => {
                self.last_message.clear();
                self.time.clear();
            }
        }
    }
}

/// Color scheme of the front end.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

/// User intents accepted by a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChatCommand {
    /// Open a chat thread.
    SelectChat {
        /// Target chat ID.
        chat_id: String,
    },
    /// Send text to whichever chat is open when the command is applied.
    ///
    /// Ignored when no thread is visible.
    SendToSelected {
        /// Message body.
        text: String,
    },
    /// Delete a chat locally, dropping its pending deliveries and replies.
    RemoveChat {
        /// Target chat ID.
        chat_id: String,
    },
    /// Send text to a chat.
    SendMessage {
        /// Target chat ID.
        chat_id: String,
        /// Message body.
        text: String,
    },
    /// Return to the chat list (mobile layout).
    Back,
    /// Viewport width changed.
    Resize {
        /// New viewport width in pixels.
        width_px: u32,
    },
    /// Filter the sidebar by chat name.
    SetSearchQuery {
        /// Case-insensitive substring; empty shows every chat.
        query: String,
    },
    /// Switch between light and dark theme.
    ToggleTheme,
}
