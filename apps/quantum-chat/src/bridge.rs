//! Runtime bridge that drives a [`ChatSession`] from front-end commands and
//! lifecycle timers, publishing a snapshot after every change.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use chat_core::{ChatChannels, ChatCommand, ChatSession, Clock, Notice, SessionSnapshot};
use chrono::Local;
use tokio::{
    sync::{Notify, mpsc},
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, info, trace, warn};

/// Clock backed by tokio's timer so paused-time tests drive it too.
#[derive(Clone)]
pub struct TokioClock {
    started_at: Instant,
}

impl TokioClock {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TokioClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioClock")
            .field("elapsed_ms", &self.now_ms())
            .finish()
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> u64 {
        let elapsed_ms = self.started_at.elapsed().as_millis();
        elapsed_ms.min(u128::from(u64::MAX)) as u64
    }

    fn display_time(&self) -> String {
        Local::now().format("%H:%M").to_string()
    }
}

/// Owns the session and the two workers mutating it.
pub struct ChatBridge {
    session: Arc<Mutex<ChatSession>>,
    channels: ChatChannels,
    timer_wake: Arc<Notify>,
    command_task: JoinHandle<()>,
    timer_task: JoinHandle<()>,
}

impl ChatBridge {
    /// Start the command and timer workers on `runtime_handle`.
    pub fn spawn(
        session: ChatSession,
        channels: ChatChannels,
        mut command_rx: mpsc::Receiver<ChatCommand>,
        runtime_handle: &tokio::runtime::Handle,
    ) -> Arc<Self> {
        info!(
            chats = session.registry().len(),
            layout = ?session.view().layout(),
            "spawning chat bridge"
        );
        let session = Arc::new(Mutex::new(session));
        let timer_wake = Arc::new(Notify::new());

        let session_for_commands = Arc::clone(&session);
        let channels_for_commands = channels.clone();
        let wake_for_commands = Arc::clone(&timer_wake);
        let command_task = runtime_handle.spawn(async move {
            debug!("chat command worker started");
            while let Some(command) = command_rx.recv().await {
                debug!(command = command_kind(&command), "applying chat command");
                let snapshot = {
                    let mut session = lock_session(&session_for_commands);
                    session.apply(command);
                    session.snapshot()
                };
                channels_for_commands.publish(snapshot);
                // A send may have scheduled an earlier deadline.
                wake_for_commands.notify_one();
            }
            debug!("chat command worker exiting");
        });

        let session_for_timers = Arc::clone(&session);
        let channels_for_timers = channels.clone();
        let wake_for_timers = Arc::clone(&timer_wake);
        let timer_task = runtime_handle.spawn(async move {
            debug!("chat timer worker started");
            loop {
                let delay_ms = {
                    let session = lock_session(&session_for_timers);
                    let now_ms = session.clock().now_ms();
                    session
                        .next_due_ms()
                        .map(|due_ms| due_ms.saturating_sub(now_ms))
                };

                let Some(delay_ms) = delay_ms else {
                    wake_for_timers.notified().await;
                    continue;
                };

                trace!(delay_ms, "timer worker sleeping until next effect");
                tokio::select! {
                    () = tokio::time::sleep(Duration::from_millis(delay_ms)) => {}
                    () = wake_for_timers.notified() => continue,
                }

                let (applied, snapshot) = {
                    let mut session = lock_session(&session_for_timers);
                    let applied = session.advance_timers();
                    (applied.len(), session.snapshot())
                };
                if applied > 0 {
                    debug!(applied, "lifecycle effects applied");
                    channels_for_timers.publish(snapshot);
                }
            }
        });

        let bridge = Arc::new(Self {
            session,
            channels,
            timer_wake,
            command_task,
            timer_task,
        });
        bridge.publish_snapshot();
        bridge
    }

    pub fn channels(&self) -> &ChatChannels {
        &self.channels
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        lock_session(&self.session).snapshot()
    }

    /// Run `f` against the session, then publish and re-arm the timer.
    pub fn update<R>(&self, f: impl FnOnce(&mut ChatSession) -> R) -> R {
        let (result, snapshot) = {
            let mut session = lock_session(&self.session);
            let result = f(&mut session);
            (result, session.snapshot())
        };
        self.channels.publish(snapshot);
        self.timer_wake.notify_one();
        result
    }

    /// Queue a notice and return every queued notice, draining the queue.
    pub fn notify(&self, notice: Notice) -> Vec<Notice> {
        self.update(|session| {
            session.push_notice(notice);
            session.take_notices()
        })
    }

    fn publish_snapshot(&self) {
        let snapshot = self.snapshot();
        trace!(
            chats = snapshot.chats.len(),
            selected = snapshot
                .thread
                .as_ref()
                .map(|thread| thread.chat_id.as_str())
                .unwrap_or(""),
            "publishing initial snapshot"
        );
        self.channels.publish(snapshot);
    }
}

impl Drop for ChatBridge {
    fn drop(&mut self) {
        info!("shutting down chat bridge tasks");
        self.command_task.abort();
        self.timer_task.abort();
    }
}

fn lock_session(session: &Mutex<ChatSession>) -> MutexGuard<'_, ChatSession> {
    session.lock().unwrap_or_else(|poisoned| {
        warn!("chat session lock poisoned; recovering");
        poisoned.into_inner()
    })
}

fn command_kind(command: &ChatCommand) -> &'static str {
    match command {
        ChatCommand::SelectChat { .. } => "SelectChat",
        ChatCommand::SendMessage { .. } => "SendMessage",
        ChatCommand::SendToSelected { .. } => "SendToSelected",
        ChatCommand::RemoveChat { .. } => "RemoveChat",
        ChatCommand::Back => "Back",
        ChatCommand::Resize { .. } => "Resize",
        ChatCommand::SetSearchQuery { .. } => "SetSearchQuery",
        ChatCommand::ToggleTheme => "ToggleTheme",
    }
}
