use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Instant,
};

use chrono::Local;

const MS_PER_MINUTE: u64 = 60_000;
const MINUTES_PER_DAY: u64 = 24 * 60;

/// Time source for the session: a monotonic millisecond counter for
/// scheduling and a wall-clock label for message timestamps.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Milliseconds since an arbitrary fixed origin. Never decreases.
    fn now_ms(&self) -> u64;

    /// Current time formatted for display (`HH:MM`).
    fn display_time(&self) -> String;
}

/// Real clock: `Instant` for scheduling, local time for labels.
#[derive(Debug, Clone)]
pub struct SystemClock {
    started_at: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        let elapsed_ms = self.started_at.elapsed().as_millis();
        elapsed_ms.min(u128::from(u64::MAX)) as u64
    }

    fn display_time(&self) -> String {
        Local::now().format("%H:%M").to_string()
    }
}

/// Hand-driven clock for tests and replays.
///
/// Clones share the same counter, so a test can keep one handle and advance
/// the clock owned by a session.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Arc<AtomicU64>,
    start_minute_of_day: u64,
}

impl ManualClock {
    /// Clock at `0` ms whose display time starts at `hour:minute`.
    pub fn starting_at(hour: u8, minute: u8) -> Self {
        Self {
            now_ms: Arc::new(AtomicU64::new(0)),
            start_minute_of_day: u64::from(hour) * 60 + u64::from(minute),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now_ms.fetch_max(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::starting_at(12, 0)
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.load(Ordering::SeqCst)
    }

    fn display_time(&self) -> String {
        let minute_of_day =
            (self.start_minute_of_day + self.now_ms() / MS_PER_MINUTE) % MINUTES_PER_DAY;
        format!("{:02}:{:02}", minute_of_day / 60, minute_of_day % 60)
    }
}
