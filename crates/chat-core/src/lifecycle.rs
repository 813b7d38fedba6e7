use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::{
    clock::Clock,
    registry::ChatRegistry,
    types::{DeliveryStatus, Message},
};

pub const DEFAULT_DELIVER_AFTER_MS: u64 = 1_000;
pub const DEFAULT_REPLY_AFTER_MS: u64 = 3_000;
pub const DEFAULT_REPLY_TEXT: &str = "Sounds great! 👍";

/// Timing and content of the simulated remote party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleSettings {
    /// Delay between send and the `Delivered` transition.
    pub deliver_after_ms: u64,
    /// Delay between send and the simulated reply.
    pub reply_after_ms: u64,
    /// Body of the simulated reply.
    pub reply_text: String,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            deliver_after_ms: DEFAULT_DELIVER_AFTER_MS,
            reply_after_ms: DEFAULT_REPLY_AFTER_MS,
            reply_text: DEFAULT_REPLY_TEXT.to_owned(),
        }
    }
}

/// Deferred mutation bound to identifiers captured at send time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledEffect {
    /// Move the sent message to `Delivered`.
    MarkDelivered { chat_id: String, message_id: String },
    /// Append the canned inbound reply and clear the typing flag.
    SimulatedReply { chat_id: String },
}

impl ScheduledEffect {
    pub fn chat_id(&self) -> &str {
        match self {
            ScheduledEffect::MarkDelivered { chat_id, .. }
            | ScheduledEffect::SimulatedReply { chat_id } => chat_id,
        }
    }
}

/// Drives outbound messages through send → deliver → reply.
///
/// Pending effects sit in a queue ordered by `(due_ms, scheduling order)` and
/// are applied by [`LifecycleController::advance`]. Effects never look at the
/// current selection; a target that disappeared is skipped.
#[derive(Debug, Clone)]
pub struct LifecycleController {
    settings: LifecycleSettings,
    next_message_seq: u64,
    next_effect_seq: u64,
    pending: BTreeMap<(u64, u64), ScheduledEffect>,
}

impl LifecycleController {
    pub fn new(settings: LifecycleSettings) -> Self {
        Self {
            settings,
            next_message_seq: 1,
            next_effect_seq: 0,
            pending: BTreeMap::new(),
        }
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    /// Send `text` to `chat_id` and schedule its delivery and reply.
    ///
    /// Returns the new message ID, or `None` when the text is blank or the
    /// chat does not exist (nothing is appended or scheduled then).
    pub fn send_message(
        &mut self,
        registry: &mut ChatRegistry,
        clock: &dyn Clock,
        chat_id: &str,
        text: &str,
    ) -> Option<String> {
        if text.trim().is_empty() {
            trace!(%chat_id, "ignoring blank message");
            return None;
        }
        if !registry.contains(chat_id) {
            debug!(%chat_id, "send ignored: chat not found");
            return None;
        }

        let message_id = self.next_message_id();
        let message = Message::outbound(message_id.clone(), text, clock.display_time());
        if let Err(err) = registry.append_message(chat_id, message) {
            debug!(%chat_id, error = %err, "send append rejected");
            return None;
        }

        let now_ms = clock.now_ms();
        self.schedule(
            now_ms.saturating_add(self.settings.deliver_after_ms),
            ScheduledEffect::MarkDelivered {
                chat_id: chat_id.to_owned(),
                message_id: message_id.clone(),
            },
        );
        self.schedule(
            now_ms.saturating_add(self.settings.reply_after_ms),
            ScheduledEffect::SimulatedReply {
                chat_id: chat_id.to_owned(),
            },
        );
        debug!(%chat_id, %message_id, now_ms, "message sent");
        Some(message_id)
    }

    /// Apply every effect due at or before the clock's current time.
    pub fn advance(
        &mut self,
        registry: &mut ChatRegistry,
        clock: &dyn Clock,
    ) -> Vec<ScheduledEffect> {
        let now_ms = clock.now_ms();
        let mut applied = Vec::new();

        while let Some(entry) = self.pending.first_entry() {
            if entry.key().0 > now_ms {
                break;
            }
            let effect = entry.remove();
            self.apply(registry, clock, &effect);
            applied.push(effect);
        }

        if !applied.is_empty() {
            trace!(now_ms, applied = applied.len(), "lifecycle advanced");
        }
        applied
    }

    /// Earliest pending due time.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.pending.keys().next().map(|(due_ms, _)| *due_ms)
    }

    /// Number of queued effects.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drop pending effects targeting `chat_id`. Returns how many were dropped.
    pub fn cancel_chat(&mut self, chat_id: &str) -> usize {
        let before = self.pending.len();
        self.pending.retain(|_, effect| effect.chat_id() != chat_id);
        let dropped = before - self.pending.len();
        if dropped > 0 {
            debug!(%chat_id, dropped, "cancelled pending lifecycle effects");
        }
        dropped
    }

    fn schedule(&mut self, due_ms: u64, effect: ScheduledEffect) {
        let seq = self.next_effect_seq;
        self.next_effect_seq += 1;
        self.pending.insert((due_ms, seq), effect);
    }

    fn next_message_id(&mut self) -> String {
        let id = format!("msg-{}", self.next_message_seq);
        self.next_message_seq += 1;
        id
    }

    fn apply(&mut self, registry: &mut ChatRegistry, clock: &dyn Clock, effect: &ScheduledEffect) {
        match effect {
            ScheduledEffect::MarkDelivered {
                chat_id,
                message_id,
            } => {
                if let Err(err) =
                    registry.update_message_status(chat_id, message_id, DeliveryStatus::Delivered)
                {
                    debug!(%chat_id, %message_id, error = %err, "delivery update skipped");
                }
            }
            ScheduledEffect::SimulatedReply { chat_id } => {
                let reply = Message::inbound(
                    self.next_message_id(),
                    self.settings.reply_text.clone(),
                    clock.display_time(),
                );
                if let Err(err) = registry.append_message(chat_id, reply) {
                    debug!(%chat_id, error = %err, "simulated reply skipped");
                    return;
                }
                let _ = registry.set_typing(chat_id, false);
            }
        }
    }
}

impl Default for LifecycleController {
    fn default() -> Self {
        Self::new(LifecycleSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{clock::ManualClock, types::Chat};

    fn one_chat() -> ChatRegistry {
        ChatRegistry::with_chats([Chat::new("c1", "Anna", "A").with_typing(true)])
    }

    #[test]
    fn end_to_end_send_deliver_reply() {
        let clock = ManualClock::starting_at(9, 0);
        let mut reg = one_chat();
        let mut ctl = LifecycleController::default();

        let id = ctl
            .send_message(&mut reg, &clock, "c1", "hello")
            .expect("send should produce a message");
        let chat = reg.get("c1").expect("chat exists");
        assert_eq!(chat.messages.len(), 1);
        assert_eq!(chat.messages[0].status, Some(DeliveryStatus::Sent));
        assert_eq!(chat.last_message, "hello");
        assert_eq!(chat.time, "09:00");

        clock.advance(999);
        assert!(ctl.advance(&mut reg, &clock).is_empty());

        clock.advance(1);
        ctl.advance(&mut reg, &clock);
        let chat = reg.get("c1").expect("chat exists");
        assert_eq!(chat.messages[0].id, id);
        assert_eq!(chat.messages[0].status, Some(DeliveryStatus::Delivered));
        assert_eq!(chat.messages.len(), 1);

        clock.set(3_000);
        ctl.advance(&mut reg, &clock);
        let chat = reg.get("c1").expect("chat exists");
        assert_eq!(chat.messages.len(), 2);
        assert!(!chat.messages[1].is_sent);
        assert_eq!(chat.messages[1].status, None);
        assert_eq!(chat.messages[1].text, DEFAULT_REPLY_TEXT);
        assert_eq!(chat.last_message, DEFAULT_REPLY_TEXT);
        assert!(!chat.is_typing);
        assert_eq!(ctl.pending(), 0);
    }

    #[test]
    fn blank_text_creates_nothing() {
        let clock = ManualClock::default();
        let mut reg = one_chat();
        let before = reg.clone();
        let mut ctl = LifecycleController::default();

        assert_eq!(ctl.send_message(&mut reg, &clock, "c1", ""), None);
        assert_eq!(ctl.send_message(&mut reg, &clock, "c1", " \t\n "), None);
        assert_eq!(reg, before);
        assert_eq!(ctl.pending(), 0);
    }

    #[test]
    fn unknown_chat_schedules_nothing() {
        let clock = ManualClock::default();
        let mut reg = one_chat();
        let mut ctl = LifecycleController::default();

        assert_eq!(ctl.send_message(&mut reg, &clock, "ghost", "hi"), None);
        assert_eq!(ctl.pending(), 0);
        assert_eq!(ctl.next_due_ms(), None);
    }

    #[test]
    fn rapid_sends_get_distinct_ids_and_are_delivered_by_id() {
        let clock = ManualClock::default();
        let mut reg = one_chat();
        let mut ctl = LifecycleController::default();

        let first = ctl.send_message(&mut reg, &clock, "c1", "one");
        clock.advance(500);
        let second = ctl.send_message(&mut reg, &clock, "c1", "two");
        assert_ne!(first, second);

        clock.set(1_000);
        ctl.advance(&mut reg, &clock);
        let chat = reg.get("c1").expect("chat exists");
        assert_eq!(chat.messages[0].status, Some(DeliveryStatus::Delivered));
        assert_eq!(chat.messages[1].status, Some(DeliveryStatus::Sent));

        clock.set(1_500);
        ctl.advance(&mut reg, &clock);
        let chat = reg.get("c1").expect("chat exists");
        assert_eq!(chat.messages[1].status, Some(DeliveryStatus::Delivered));
    }

    #[test]
    fn status_sequence_is_monotonic() {
        let clock = ManualClock::default();
        let mut reg = one_chat();
        let mut ctl = LifecycleController::default();
        let id = ctl
            .send_message(&mut reg, &clock, "c1", "track me")
            .expect("send should work");

        let mut observed = vec![DeliveryStatus::Sent];
        for _ in 0..40 {
            clock.advance(100);
            ctl.advance(&mut reg, &clock);
            let status = reg
                .get("c1")
                .and_then(|chat| chat.messages.iter().find(|m| m.id == id))
                .and_then(|m| m.status);
            if observed.last() != status.as_ref() {
                observed.extend(status);
            }
        }
        assert_eq!(
            observed,
            vec![DeliveryStatus::Sent, DeliveryStatus::Delivered]
        );
        assert!(observed.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn effects_due_together_apply_in_schedule_order() {
        let clock = ManualClock::default();
        let mut reg = one_chat();
        let mut ctl = LifecycleController::new(LifecycleSettings {
            deliver_after_ms: 10,
            reply_after_ms: 20,
            reply_text: "ok".into(),
        });
        ctl.send_message(&mut reg, &clock, "c1", "a");

        clock.advance(1_000);
        let applied = ctl.advance(&mut reg, &clock);
        assert!(matches!(applied[0], ScheduledEffect::MarkDelivered { .. }));
        assert!(matches!(applied[1], ScheduledEffect::SimulatedReply { .. }));
    }

    #[test]
    fn cancel_drops_only_the_targeted_chat() {
        let clock = ManualClock::default();
        let mut reg =
            ChatRegistry::with_chats([Chat::new("a", "A", "A"), Chat::new("b", "B", "B")]);
        let mut ctl = LifecycleController::default();
        ctl.send_message(&mut reg, &clock, "a", "to a");
        ctl.send_message(&mut reg, &clock, "b", "to b");

        assert_eq!(ctl.cancel_chat("a"), 2);
        assert_eq!(ctl.pending(), 2);

        clock.advance(5_000);
        ctl.advance(&mut reg, &clock);
        assert_eq!(reg.get("a").map(|c| c.messages.len()), Some(1));
        assert_eq!(reg.get("b").map(|c| c.messages.len()), Some(2));
    }
}
