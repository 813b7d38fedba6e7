//! Plain-text rendering of session snapshots.

use std::fmt::Write;

use chat_core::{NoticeLevel, SessionSnapshot, Theme};

/// Render the visible panels of `snapshot`.
pub fn render(snapshot: &SessionSnapshot) -> String {
    let mut out = String::new();
    let theme = match snapshot.theme {
        Theme::Light => "light",
        Theme::Dark => "dark",
    };
    let _ = writeln!(out, "── {:?} · {theme} ──", snapshot.layout);

    if snapshot.panels.sidebar {
        if !snapshot.search_query.is_empty() {
            let _ = writeln!(out, "search: {}", snapshot.search_query);
        }
        if snapshot.chats.is_empty() {
            let _ = writeln!(out, "  (no chats)");
        }
        for row in &snapshot.chats {
            let marker = if row.is_selected { '>' } else { ' ' };
            let online = if row.is_online { "●" } else { " " };
            let unread = if row.unread > 0 {
                format!(" ({})", row.unread)
            } else {
                String::new()
            };
            let _ = writeln!(
                out,
                "{marker} [{}] {} {online} {}{unread}  {}  {}",
                row.chat_id, row.avatar, row.name, row.preview, row.time
            );
        }
    }

    if snapshot.panels.thread
        && let Some(thread) = &snapshot.thread
    {
        let _ = writeln!(out, "━━ {} {} ━━", thread.avatar, thread.name);
        for message in &thread.messages {
            let status = message
                .status
                .map(|status| format!(" [{}]", status.label()))
                .unwrap_or_default();
            let side = if message.is_sent { "me" } else { "them" };
            let _ = writeln!(out, "  {} {side}: {}{status}", message.time, message.text);
        }
        if thread.is_typing {
            let _ = writeln!(out, "  {} is typing…", thread.name);
        }
    }

    if snapshot.panels.info
        && let Some(thread) = &snapshot.thread
    {
        let presence = if thread.is_online { "online" } else { "offline" };
        let _ = writeln!(
            out,
            "info: {:?} · {presence} · {} messages",
            thread.kind,
            thread.messages.len()
        );
    }

    for notice in &snapshot.notices {
        let level = match notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "error",
        };
        let _ = writeln!(out, "[{level}] {}: {}", notice.title, notice.description);
    }

    out
}
