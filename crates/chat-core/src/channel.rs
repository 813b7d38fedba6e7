use thiserror::Error;
use tokio::sync::{broadcast, mpsc};

use crate::{session::SessionSnapshot, types::ChatCommand};

/// Broadcast snapshot stream type used by front-end subscribers.
pub type SnapshotStream = broadcast::Receiver<SessionSnapshot>;

/// Errors returned by channel operations.
#[derive(Debug, Error)]
pub enum ChatChannelError {
    /// The command receiver side is closed.
    #[error("command channel is closed")]
    CommandChannelClosed,
}

/// Command/snapshot channel pair shared by the session driver and front ends.
#[derive(Clone, Debug)]
pub struct ChatChannels {
    command_tx: mpsc::Sender<ChatCommand>,
    snapshot_tx: broadcast::Sender<SessionSnapshot>,
}

impl ChatChannels {
    /// Create a new channel set and return it with the command receiver.
    pub fn new(
        command_buffer: usize,
        snapshot_buffer: usize,
    ) -> (Self, mpsc::Receiver<ChatCommand>) {
        let (command_tx, command_rx) = mpsc::channel(command_buffer.max(1));
        let (snapshot_tx, _) = broadcast::channel(snapshot_buffer.max(1));

        (
            Self {
                command_tx,
                snapshot_tx,
            },
            command_rx,
        )
    }

    pub fn command_sender(&self) -> mpsc::Sender<ChatCommand> {
        self.command_tx.clone()
    }

    pub fn subscribe(&self) -> SnapshotStream {
        self.snapshot_tx.subscribe()
    }

    /// Send one command to the session driver.
    pub async fn send_command(&self, command: ChatCommand) -> Result<(), ChatChannelError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| ChatChannelError::CommandChannelClosed)
    }

    /// Publish a snapshot to all subscribers.
    ///
    /// Best-effort: with no subscribers the snapshot is dropped.
    pub fn publish(&self, snapshot: SessionSnapshot) {
        let _ = self.snapshot_tx.send(snapshot);
    }
}
