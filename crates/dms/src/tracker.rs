//! Drowsiness state tracking
//!
//! A hysteresis filter over per-frame eye counts drives a debounced alarm.
//! Closure accumulates one frame at a time while the 5-frame average stays
//! under one eye, and recovery drains twice as fast.

use std::sync::Arc;
use std::time::Instant;

use alerting::{spawn_alert, AlarmLatch, AlertEmitter, LatchConfig};
use tracing::{debug, info};

use crate::history::EyeStateHistory;

/// Eye counts kept per session
pub const HISTORY_CAPACITY: usize = 10;

/// Entries averaged for the closed/open decision
pub const SMOOTHING_WINDOW: usize = 5;

/// Average eye count below which a frame counts as closed
pub const CLOSED_AVERAGE_THRESHOLD: f64 = 1.0;

/// Closed frames beyond which the driver is drowsy
pub const CLOSED_FRAMES_THRESHOLD: u32 = 15;

/// Counter decrement on an open frame
const RECOVERY_STEP: u32 = 2;

/// Per-session drowsiness tracker
pub struct DrowsinessTracker {
    history: EyeStateHistory,
    closed_frames: u32,
    alarm: AlarmLatch,
    emitter: Arc<dyn AlertEmitter>,
}

impl DrowsinessTracker {
    pub fn new(emitter: Arc<dyn AlertEmitter>) -> Self {
        Self {
            history: EyeStateHistory::new(HISTORY_CAPACITY),
            closed_frames: 0,
            alarm: AlarmLatch::new(LatchConfig::default()),
            emitter,
        }
    }

    /// Feed the eye count of one face in the current frame
    pub fn observe(&mut self, eye_count: usize) {
        self.history.push(eye_count);

        let Some(average) = self.history.recent_mean(SMOOTHING_WINDOW) else {
            return;
        };
        if average < CLOSED_AVERAGE_THRESHOLD {
            self.closed_frames += 1;
        } else {
            self.closed_frames = self.closed_frames.saturating_sub(RECOVERY_STEP);
        }
        debug!(eye_count, average, closed_frames = self.closed_frames, "Eye observation");
    }

    pub fn is_drowsy(&self) -> bool {
        self.closed_frames > CLOSED_FRAMES_THRESHOLD
    }

    /// Assert the alarm and start one detached alert. Returns whether an alert was started.
    pub fn trigger_alarm(&mut self, now: Instant) -> bool {
        if !self.alarm.try_assert(now) {
            return false;
        }
        info!(closed_frames = self.closed_frames, "Drowsiness alarm raised");
        spawn_alert(Arc::clone(&self.emitter));
        true
    }

    /// Release the alarm once it has been held long enough. Returns whether it was released.
    pub fn reset_alarm(&mut self, now: Instant) -> bool {
        if !self.alarm.try_release(now) {
            return false;
        }
        self.closed_frames = 0;
        info!("Drowsiness alarm cleared");
        true
    }

    pub fn closed_frames(&self) -> u32 {
        self.closed_frames
    }

    pub fn is_alarm_on(&self) -> bool {
        self.alarm.is_asserted()
    }

    pub fn history(&self) -> &EyeStateHistory {
        &self.history
    }

    pub fn recent_average(&self) -> Option<f64> {
        self.history.recent_mean(SMOOTHING_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alerting::AlertError;
    use proptest::prelude::*;
    use std::sync::mpsc;
    use std::sync::Mutex;
    use std::time::Duration;

    struct ChannelEmitter(Mutex<mpsc::Sender<()>>);

    impl AlertEmitter for ChannelEmitter {
        fn emit(&self) -> Result<(), AlertError> {
            if let Ok(tx) = self.0.lock() {
                let _ = tx.send(());
            }
            Ok(())
        }
    }

    struct Silent;

    impl AlertEmitter for Silent {
        fn emit(&self) -> Result<(), AlertError> {
            Ok(())
        }
    }

    fn tracker() -> DrowsinessTracker {
        DrowsinessTracker::new(Arc::new(Silent))
    }

    fn observed(counts: &[usize]) -> DrowsinessTracker {
        let mut t = tracker();
        for &c in counts {
            t.observe(c);
        }
        t
    }

    #[test]
    fn test_no_decision_before_five_frames() {
        let t = observed(&[0, 0, 0, 0]);
        assert_eq!(t.closed_frames(), 0);
        assert_eq!(t.recent_average(), None);
    }

    #[test]
    fn test_sustained_zeros_increase_every_frame() {
        let mut t = tracker();
        for frame in 1..=30u32 {
            let before = t.closed_frames();
            t.observe(0);
            if frame >= 5 {
                assert_eq!(t.closed_frames(), before + 1, "frame {}", frame);
            }
        }
    }

    #[test]
    fn test_sixteen_zero_frames() {
        let t = observed(&[0; 16]);
        // Frames 5..=16 each count once
        assert_eq!(t.closed_frames(), 12);
        assert!(!t.is_drowsy());

        let t = observed(&[0; 20]);
        assert_eq!(t.closed_frames(), 16);
        assert!(t.is_drowsy());
    }

    #[test]
    fn test_drowsy_needs_sixteen_increments() {
        let t = observed(&[0; 19]);
        assert_eq!(t.closed_frames(), 15);
        assert!(!t.is_drowsy());
    }

    #[test]
    fn test_open_eyes_never_drowsy() {
        let mut t = tracker();
        for _ in 0..5 {
            t.observe(2);
            assert_eq!(t.closed_frames(), 0);
            assert!(!t.is_drowsy());
        }
    }

    #[test]
    fn test_recovery_is_twice_as_fast() {
        let mut t = observed(&[0; 14]);
        assert_eq!(t.closed_frames(), 10);

        // One open frame: average of last five is 2/5, still closed
        t.observe(2);
        assert_eq!(t.closed_frames(), 11);
        t.observe(2);
        assert_eq!(t.closed_frames(), 12);

        // An average of exactly 1.0 counts as open
        t.observe(1);
        assert_eq!(t.closed_frames(), 10);
        t.observe(2);
        assert_eq!(t.closed_frames(), 8);
    }

    #[test]
    fn test_history_is_bounded() {
        let t = observed(&[1; 25]);
        assert_eq!(t.history().len(), HISTORY_CAPACITY);
    }

    #[test]
    fn test_double_trigger_emits_once() {
        let (tx, rx) = mpsc::channel();
        let mut t = DrowsinessTracker::new(Arc::new(ChannelEmitter(Mutex::new(tx))));
        let t0 = Instant::now();

        assert!(t.trigger_alarm(t0));
        assert!(!t.trigger_alarm(t0 + Duration::from_secs(1)));
        assert!(t.is_alarm_on());

        assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[test]
    fn test_reset_holds_alarm_for_two_seconds() {
        let mut t = observed(&[0; 20]);
        let t0 = Instant::now();
        t.trigger_alarm(t0);

        assert!(!t.reset_alarm(t0));
        assert!(t.is_alarm_on());
        assert_eq!(t.closed_frames(), 16);

        assert!(t.reset_alarm(t0 + Duration::from_millis(2500)));
        assert!(!t.is_alarm_on());
        assert_eq!(t.closed_frames(), 0);
    }

    #[test]
    fn test_reset_without_alarm_keeps_counter() {
        let mut t = observed(&[0; 10]);
        assert!(!t.reset_alarm(Instant::now()));
        assert_eq!(t.closed_frames(), 6);
    }

    #[test]
    fn test_retrigger_after_debounce() {
        let mut t = tracker();
        let t0 = Instant::now();
        assert!(t.trigger_alarm(t0));
        assert!(t.reset_alarm(t0 + Duration::from_millis(2100)));
        assert!(!t.trigger_alarm(t0 + Duration::from_secs(3)));
        assert!(t.trigger_alarm(t0 + Duration::from_millis(3100)));
    }

    proptest! {
        #[test]
        fn prop_counter_matches_reference(counts in prop::collection::vec(0usize..4, 0..200)) {
            let mut t = tracker();
            let mut reference: i64 = 0;
            for (i, &c) in counts.iter().enumerate() {
                t.observe(c);
                if i + 1 >= SMOOTHING_WINDOW {
                    let window = &counts[i + 1 - SMOOTHING_WINDOW..=i];
                    let avg = window.iter().sum::<usize>() as f64 / SMOOTHING_WINDOW as f64;
                    reference = if avg < 1.0 { reference + 1 } else { (reference - 2).max(0) };
                }
                prop_assert!(reference >= 0);
                prop_assert_eq!(t.closed_frames() as i64, reference);
            }
        }

        #[test]
        fn prop_drowsy_iff_counter_over_threshold(counts in prop::collection::vec(0usize..3, 0..100)) {
            let t = observed(&counts);
            prop_assert_eq!(t.is_drowsy(), t.closed_frames() > CLOSED_FRAMES_THRESHOLD);
            prop_assert!(t.history().len() <= HISTORY_CAPACITY);
        }
    }
}
