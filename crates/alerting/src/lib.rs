//! Alerting System
//!
//! Provides the debounced alarm latch and the audible alert emitter.

mod emitter;
mod latch;

pub use emitter::{spawn_alert, AlertEmitter, SystemBeep, FALLBACK_MARKER};
pub use latch::{AlarmLatch, LatchConfig};

use thiserror::Error;

/// Alert playback error types
#[derive(Error, Debug)]
pub enum AlertError {
    #[error("Audible alerts are not supported on this platform")]
    Unsupported,

    #[error("Standard output is not a terminal")]
    NoTerminal,

    #[error("Beep call failed with code {0}")]
    Os(i32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
