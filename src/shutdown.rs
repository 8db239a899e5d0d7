//! Signal handling for the cycle loop (SIGINT/SIGTERM)
//!
//! First signal: finish the current cycle, run exit cleanup, stop.
//! Second signal: exit immediately without cleanup.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Exit code used when a second signal cuts shutdown short.
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Shared shutdown flag.
#[derive(Debug, Default)]
pub struct ShutdownState {
    requested: AtomicBool,
    signal_count: AtomicU8,
}

impl ShutdownState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub fn signal_count(&self) -> u8 {
        self.signal_count.load(Ordering::SeqCst)
    }

    /// Record a signal and decide what to do about it.
    pub fn handle_signal(&self) -> ShutdownAction {
        let count = self.signal_count.fetch_add(1, Ordering::SeqCst);

        match count {
            0 => {
                self.requested.store(true, Ordering::SeqCst);
                ShutdownAction::Graceful
            }
            1 => ShutdownAction::Immediate,
            _ => ShutdownAction::Ignore,
        }
    }

    /// Sleep up to `timeout`, returning early once shutdown is requested.
    ///
    /// Returns true if shutdown was requested.
    pub fn wait(&self, timeout: Duration) -> bool {
        let start = Instant::now();

        while start.elapsed() < timeout {
            if self.is_requested() {
                return true;
            }
            std::thread::sleep(POLL_INTERVAL.min(timeout.saturating_sub(start.elapsed())));
        }

        self.is_requested()
    }
}

/// What a received signal asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownAction {
    Graceful,
    Immediate,
    Ignore,
}

/// Install the process-wide SIGINT/SIGTERM handler.
///
/// Must be called once at startup.
pub fn install(state: Arc<ShutdownState>) -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(move || match state.handle_signal() {
        ShutdownAction::Graceful => {
            tracing::info!("received shutdown signal, finishing current cycle");
        }
        ShutdownAction::Immediate => {
            tracing::warn!("received second signal, exiting immediately");
            std::process::exit(EXIT_CODE_INTERRUPTED);
        }
        ShutdownAction::Ignore => {}
    })
}
