//! Driver Monitoring System (DMS)
//!
//! Webcam drowsiness detection:
//! - Face and eye location with OpenCV Haar cascades
//! - Eye-count smoothing with hysteresis
//! - Debounced drowsiness alarm with an audible alert
//! - Detection overlay for display

pub mod analysis;
pub mod config;
pub mod detector;
pub mod history;
pub mod overlay;
pub mod tracker;

mod mat;

pub use analysis::{FaceObservation, FrameAnalysis};
pub use config::{DetectionParams, DmsConfig};
pub use detector::{CascadeLocator, FaceEyeLocator, ObjectLocator, Region};
pub use tracker::DrowsinessTracker;

use std::sync::Arc;
use std::time::Instant;

use alerting::AlertEmitter;
use camera_capture::{FrameError, VideoFrame};
use metrics::counter;
use thiserror::Error;
use tracing::debug;

/// DMS error types
#[derive(Error, Debug)]
pub enum DmsError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Detection failed: {0}")]
    Detection(String),

    #[error("OpenCV error: {0}")]
    OpenCv(#[from] opencv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),
}

/// One detection session: the shared locators plus a private tracker
pub struct DrowsinessSession {
    locator: FaceEyeLocator,
    tracker: DrowsinessTracker,
}

impl DrowsinessSession {
    pub fn new(locator: FaceEyeLocator, emitter: Arc<dyn AlertEmitter>) -> Self {
        Self {
            locator,
            tracker: DrowsinessTracker::new(emitter),
        }
    }

    /// Analyze one frame, update the tracker, and draw the overlay onto it
    pub fn process_frame(
        &mut self,
        frame: &mut VideoFrame,
        now: Instant,
    ) -> Result<FrameAnalysis, DmsError> {
        let gray = frame.to_grayscale();
        let faces = self.locator.faces(&gray)?;

        let mut observations = Vec::with_capacity(faces.len());
        let mut drowsy = false;
        let mut alert_started = false;

        for face in faces {
            let eyes: Vec<Region> = self
                .locator
                .eyes(&gray, &face)?
                .iter()
                .map(|eye| eye.offset(&face))
                .collect();

            self.tracker.observe(eyes.len());
            if self.tracker.is_drowsy() {
                drowsy = true;
                alert_started |= self.tracker.trigger_alarm(now);
            }

            observations.push(FaceObservation { face, eyes });
        }

        if !drowsy {
            self.tracker.reset_alarm(now);
        }

        let analysis = FrameAnalysis {
            sequence: frame.sequence,
            faces: observations,
            closed_frames: self.tracker.closed_frames(),
            drowsy,
            alarm_on: self.tracker.is_alarm_on(),
            alert_started,
        };

        overlay::render(frame.image_mut(), &analysis)?;

        counter!("frames_processed_total").increment(1);
        counter!("faces_detected_total").increment(analysis.faces.len() as u64);
        debug!(
            sequence = analysis.sequence,
            faces = analysis.faces.len(),
            eyes = analysis.total_eyes(),
            closed_frames = analysis.closed_frames,
            alarm_on = analysis.alarm_on,
            "Frame processed"
        );

        Ok(analysis)
    }

    pub fn tracker(&self) -> &DrowsinessTracker {
        &self.tracker
    }
}
