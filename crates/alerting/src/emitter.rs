//! Audible alert playback

use std::sync::Arc;
use metrics::counter;
use tracing::{debug, warn};

use crate::AlertError;

/// Printed when the audible alert cannot be played
pub const FALLBACK_MARKER: &str = "\x07🚨 DROWSINESS ALERT! 🚨";

/// Beep tone frequency (Hz)
const BEEP_FREQUENCY_HZ: u32 = 800;

/// Beep duration (ms)
const BEEP_DURATION_MS: u32 = 500;

/// Something that can play one alert. `emit` may block for the duration of the sound.
pub trait AlertEmitter: Send + Sync {
    fn emit(&self) -> Result<(), AlertError>;
}

/// OS-level beep: the Beep API on Windows, the terminal bell elsewhere
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemBeep;

#[cfg(windows)]
#[link(name = "kernel32")]
extern "system" {
    fn Beep(dw_freq: u32, dw_duration: u32) -> i32;
}

impl AlertEmitter for SystemBeep {
    #[cfg(windows)]
    fn emit(&self) -> Result<(), AlertError> {
        let ok = unsafe { Beep(BEEP_FREQUENCY_HZ, BEEP_DURATION_MS) };
        if ok == 0 {
            return Err(AlertError::Os(std::io::Error::last_os_error().raw_os_error().unwrap_or(0)));
        }
        Ok(())
    }

    #[cfg(unix)]
    fn emit(&self) -> Result<(), AlertError> {
        use std::io::Write;

        // The bell is only audible on a terminal
        if unsafe { libc::isatty(libc::STDOUT_FILENO) } != 1 {
            return Err(AlertError::NoTerminal);
        }

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(b"\x07")?;
        stdout.flush()?;
        debug!(
            "Terminal bell sent ({} Hz / {} ms tone not available)",
            BEEP_FREQUENCY_HZ, BEEP_DURATION_MS
        );
        Ok(())
    }

    #[cfg(not(any(windows, unix)))]
    fn emit(&self) -> Result<(), AlertError> {
        Err(AlertError::Unsupported)
    }
}

/// Play one alert on a detached background task.
///
/// Never blocks the caller and never reports failure: playback errors are
/// logged, counted, and replaced by [`FALLBACK_MARKER`] on stdout.
pub fn spawn_alert(emitter: Arc<dyn AlertEmitter>) {
    match tokio::runtime::Handle::try_current() {
        Ok(handle) => {
            // Detached: the join handle is dropped
            drop(handle.spawn_blocking(move || play(emitter.as_ref())));
        }
        Err(_) => {
            let spawned = std::thread::Builder::new()
                .name("alert-playback".to_string())
                .spawn(move || play(emitter.as_ref()));
            if let Err(e) = spawned {
                warn!("Failed to spawn alert thread: {}", e);
                fallback();
            }
        }
    }
}

fn play(emitter: &dyn AlertEmitter) {
    match emitter.emit() {
        Ok(()) => {
            counter!("alerts_emitted_total").increment(1);
            debug!("Alert played");
        }
        Err(e) => {
            warn!(error = %e, "Alert playback failed, using text fallback");
            counter!("alerts_failed_total").increment(1);
            fallback();
        }
    }
}

fn fallback() {
    println!("{}", FALLBACK_MARKER);
}
