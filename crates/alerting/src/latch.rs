//! Alarm Latch Implementation

use std::time::{Duration, Instant};
use tracing::debug;

/// Latch timing configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatchConfig {
    /// Minimum interval between two assertions
    pub retrigger_interval: Duration,
    /// Minimum time an assertion is held before it can be released
    pub min_hold: Duration,
}

impl Default for LatchConfig {
    fn default() -> Self {
        Self {
            retrigger_interval: Duration::from_secs(3),
            min_hold: Duration::from_secs(2),
        }
    }
}

/// Two-state alarm with debounce on assertion and a minimum hold on release.
///
/// The first assertion is never debounced. After that, a new assertion must be
/// strictly more than `retrigger_interval` after the previous one, and a release
/// must be strictly more than `min_hold` after the assertion it releases.
#[derive(Debug, Clone)]
pub struct AlarmLatch {
    config: LatchConfig,
    asserted: bool,
    last_asserted: Option<Instant>,
}

impl AlarmLatch {
    /// Create a new released latch
    pub fn new(config: LatchConfig) -> Self {
        Self {
            config,
            asserted: false,
            last_asserted: None,
        }
    }

    /// Try to assert the alarm. Returns true only on the released -> asserted edge.
    pub fn try_assert(&mut self, now: Instant) -> bool {
        if self.asserted {
            return false;
        }

        if let Some(last) = self.last_asserted {
            let since = now.saturating_duration_since(last);
            if since <= self.config.retrigger_interval {
                debug!("Alarm suppressed: {:?} since last assertion", since);
                return false;
            }
        }

        self.asserted = true;
        self.last_asserted = Some(now);
        debug!("Alarm asserted");
        true
    }

    /// Try to release the alarm. Returns true only on the asserted -> released edge.
    pub fn try_release(&mut self, now: Instant) -> bool {
        if !self.asserted {
            return false;
        }

        let held = self
            .last_asserted
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(Duration::MAX);
        if held <= self.config.min_hold {
            debug!("Alarm release deferred: held for {:?}", held);
            return false;
        }

        self.asserted = false;
        debug!("Alarm released after {:?}", held);
        true
    }

    /// Whether the alarm is currently asserted
    pub fn is_asserted(&self) -> bool {
        self.asserted
    }

    /// Time of the most recent assertion
    pub fn last_asserted(&self) -> Option<Instant> {
        self.last_asserted
    }
}

impl Default for AlarmLatch {
    fn default() -> Self {
        Self::new(LatchConfig::default())
    }
}
