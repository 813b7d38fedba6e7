//! Session context owning every piece of mutable chat state.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    clock::Clock,
    error::RegistryError,
    lifecycle::{LifecycleController, LifecycleSettings, ScheduledEffect},
    notice::Notice,
    registry::ChatRegistry,
    seed::{SEED_SELECTED_CHAT_ID, seed_chats},
    types::{Chat, ChatCommand, ChatKind, Message, Theme},
    view::{DEFAULT_MOBILE_BREAKPOINT_PX, PanelLayout, ViewState, VisiblePanels},
};

const TYPING_PREVIEW: &str = "typing…";
const DEFAULT_VIEWPORT_WIDTH_PX: u32 = 1_440;

/// Construction parameters for a [`ChatSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub lifecycle: LifecycleSettings,
    pub mobile_breakpoint_px: u32,
    pub initial_width_px: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            lifecycle: LifecycleSettings::default(),
            mobile_breakpoint_px: DEFAULT_MOBILE_BREAKPOINT_PX,
            initial_width_px: DEFAULT_VIEWPORT_WIDTH_PX,
        }
    }
}

/// Sidebar row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRow {
    pub chat_id: String,
    pub name: String,
    pub avatar: String,
    /// Last message text, or a typing hint while the remote party composes.
    pub preview: String,
    pub time: String,
    pub unread: u32,
    pub is_online: bool,
    pub is_typing: bool,
    pub is_selected: bool,
}

/// Open thread with header metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThreadView {
    pub chat_id: String,
    pub name: String,
    pub avatar: String,
    pub kind: ChatKind,
    pub is_online: bool,
    pub is_typing: bool,
    pub messages: Vec<Message>,
}

/// Immutable render model of the session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub chats: Vec<ChatRow>,
    pub thread: Option<ThreadView>,
    pub layout: PanelLayout,
    pub panels: VisiblePanels,
    pub theme: Theme,
    pub search_query: String,
    pub notices: Vec<Notice>,
}

/// Registry, view state, lifecycle timers and UI preferences for one user session.
#[derive(Debug)]
pub struct ChatSession {
    registry: ChatRegistry,
    view: ViewState,
    lifecycle: LifecycleController,
    clock: Arc<dyn Clock>,
    theme: Theme,
    search_query: String,
    notices: Vec<Notice>,
}

impl ChatSession {
    /// Session over `registry` with nothing selected.
    pub fn new(
        registry: ChatRegistry,
        clock: Arc<dyn Clock>,
        settings: SessionSettings,
    ) -> Self {
        let view = ViewState::new(
            settings.initial_width_px,
            settings.mobile_breakpoint_px,
            None,
        );
        Self {
            registry,
            view,
            lifecycle: LifecycleController::new(settings.lifecycle),
            clock,
            theme: Theme::default(),
            search_query: String::new(),
            notices: Vec::new(),
        }
    }

    /// Session over the demo conversations with the first chat open.
    pub fn seeded(clock: Arc<dyn Clock>, settings: SessionSettings) -> Self {
        let mut session = Self::new(ChatRegistry::with_chats(seed_chats()), clock, settings);
        session.select_chat(SEED_SELECTED_CHAT_ID);
        info!(chat_count = session.registry.len(), "seeded chat session");
        session
    }

    pub fn registry(&self) -> &ChatRegistry {
        &self.registry
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn selected_chat_id(&self) -> Option<&str> {
        self.view.selected_chat_id()
    }

    /// Open a chat. Unknown IDs are ignored and return `false`.
    pub fn select_chat(&mut self, chat_id: &str) -> bool {
        if !self.registry.contains(chat_id) {
            warn!(%chat_id, "ignoring selection of unknown chat");
            return false;
        }
        debug!(%chat_id, "session selected chat");
        self.view.select_chat(chat_id);
        true
    }

    pub fn back(&mut self) {
        self.view.back();
    }

    pub fn resize(&mut self, width_px: u32) {
        self.view.resize(width_px);
    }

    /// Send to an explicit chat. See [`LifecycleController::send_message`].
    pub fn send_message(&mut self, chat_id: &str, text: &str) -> Option<String> {
        self.lifecycle
            .send_message(&mut self.registry, self.clock.as_ref(), chat_id, text)
    }

    /// Send to the chat open right now. The chat ID is captured here, so later
    /// selection changes do not redirect delivery or the reply.
    ///
    /// Nothing is sent while the thread panel is hidden, e.g. on the mobile
    /// chat list after `back`.
    pub fn send_to_selected(&mut self, text: &str) -> Option<String> {
        if !self.view.visible_panels().thread {
            debug!("send ignored: no open thread");
            return None;
        }
        let chat_id = self.view.selected_chat_id()?.to_owned();
        self.send_message(&chat_id, text)
    }

    /// Delete a chat locally. Its pending deliveries and replies are dropped,
    /// and the selection is cleared when it pointed at the chat.
    pub fn remove_chat(&mut self, chat_id: &str) -> Result<Chat, RegistryError> {
        let removed = self.registry.remove_chat(chat_id)?;
        let cancelled = self.lifecycle.cancel_chat(chat_id);
        if self.view.selected_chat_id() == Some(chat_id) {
            self.view.clear_selection();
        }
        info!(%chat_id, cancelled, "chat removed from session");
        Ok(removed)
    }

    /// Apply lifecycle effects that are due.
    pub fn advance_timers(&mut self) -> Vec<ScheduledEffect> {
        self.lifecycle
            .advance(&mut self.registry, self.clock.as_ref())
    }

    pub fn next_due_ms(&self) -> Option<u64> {
        self.lifecycle.next_due_ms()
    }

    pub fn pending_effects(&self) -> usize {
        self.lifecycle.pending()
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.search_query = query.into();
    }

    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        self.theme
    }

    /// Register a chat created through the chat directory.
    pub fn add_chat(&mut self, chat: Chat) -> Result<(), RegistryError> {
        let chat_id = chat.id.clone();
        self.registry.insert_chat(chat)?;
        info!(%chat_id, "chat added to session");
        Ok(())
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    /// Remove and return queued notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Dispatch one user intent.
    pub fn apply(&mut self, command: ChatCommand) {
        match command {
            ChatCommand::SelectChat { chat_id } => {
                self.select_chat(&chat_id);
            }
            ChatCommand::SendToSelected { text } => {
                self.send_to_selected(&text);
            }
            ChatCommand::SendMessage { chat_id, text } => {
                self.send_message(&chat_id, &text);
            }
            ChatCommand::RemoveChat { chat_id } => {
                if let Err(err) = self.remove_chat(&chat_id) {
                    warn!(%chat_id, error = %err, "ignoring removal of unknown chat");
                }
            }
            ChatCommand::Back => self.back(),
            ChatCommand::Resize { width_px } => self.resize(width_px),
            ChatCommand::SetSearchQuery { query } => self.set_search_query(query),
            ChatCommand::ToggleTheme => {
                self.toggle_theme();
            }
        }
    }

    /// Current render model. Queued notices are included but not consumed.
    pub fn snapshot(&self) -> SessionSnapshot {
        let selected = self.view.selected_chat_id();
        let chats = self
            .registry
            .filter_by_name(&self.search_query)
            .into_iter()
            .map(|chat| ChatRow {
                chat_id: chat.id.clone(),
                name: chat.name.clone(),
                avatar: chat.avatar.clone(),
                preview: if chat.is_typing {
                    TYPING_PREVIEW.to_owned()
                } else {
                    chat.last_message.clone()
                },
                time: chat.time.clone(),
                unread: chat.unread,
                is_online: chat.is_online,
                is_typing: chat.is_typing,
                is_selected: selected == Some(chat.id.as_str()),
            })
            .collect();

        let thread = selected
            .and_then(|chat_id| self.registry.get(chat_id))
            .map(|chat| ThreadView {
                chat_id: chat.id.clone(),
                name: chat.name.clone(),
                avatar: chat.avatar.clone(),
                kind: chat.kind,
                is_online: chat.is_online,
                is_typing: chat.is_typing,
                messages: chat.messages.clone(),
            });

        SessionSnapshot {
            chats,
            thread,
            layout: self.view.layout(),
            panels: self.view.visible_panels(),
            theme: self.theme,
            search_query: self.search_query.clone(),
            notices: self.notices.clone(),
        }
    }
}
