//! Core chat model shared by the runtime driver and front ends.
//!
//! This crate holds the chat registry, the simulated message lifecycle, the
//! panel/selection state machine and the session context tying them together.

/// Command/snapshot channel primitives.
pub mod channel;
/// Time sources used for scheduling and display timestamps.
pub mod clock;
/// Stable error types and HTTP classification helpers.
pub mod error;
/// Send → deliver → reply scheduling.
pub mod lifecycle;
/// User-visible notices for failed remote actions.
pub mod notice;
/// Chat collection and per-chat message store.
pub mod registry;
/// Demo conversations for a fresh session.
pub mod seed;
/// Session context and render snapshots.
pub mod session;
/// Message, chat and command types.
pub mod types;
/// Panel layout and selection state machine.
pub mod view;

pub use channel::{ChatChannelError, ChatChannels, SnapshotStream};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ChatError, ErrorCategory, RegistryError};
pub use lifecycle::{LifecycleController, LifecycleSettings, ScheduledEffect};
pub use notice::{Notice, NoticeLevel, RemoteAction, notice_for_failure};
pub use registry::ChatRegistry;
pub use session::{ChatRow, ChatSession, SessionSettings, SessionSnapshot, ThreadView};
pub use types::{Chat, ChatCommand, ChatKind, DeliveryStatus, Message, Theme};
pub use view::{DEFAULT_MOBILE_BREAKPOINT_PX, PanelLayout, ViewState, VisiblePanels};
