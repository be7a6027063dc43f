//! Per-frame analysis results

use serde::{Deserialize, Serialize};
use crate::detector::Region;

/// Caption shown while the alarm is asserted
pub const ALERT_CAPTION: &str = "DROWSINESS ALERT!";

/// Caption shown otherwise
pub const MONITORING_CAPTION: &str = "MONITORING";

/// One face and the eyes found inside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaceObservation {
    /// Face bounding box (frame coordinates)
    pub face: Region,

    /// Eye bounding boxes (frame coordinates)
    pub eyes: Vec<Region>,
}

impl FaceObservation {
    pub fn eye_count(&self) -> usize {
        self.eyes.len()
    }
}

/// Complete result of processing one frame
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameAnalysis {
    /// Frame sequence number
    pub sequence: u32,

    /// Faces in detection order
    pub faces: Vec<FaceObservation>,

    /// Closed-frame counter after this frame
    pub closed_frames: u32,

    /// Whether any face was classified drowsy this frame
    pub drowsy: bool,

    /// Alarm state after this frame
    pub alarm_on: bool,

    /// Whether this frame started a new alert
    pub alert_started: bool,
}

impl FrameAnalysis {
    pub fn face_detected(&self) -> bool {
        !self.faces.is_empty()
    }

    pub fn total_eyes(&self) -> usize {
        self.faces.iter().map(FaceObservation::eye_count).sum()
    }

    /// Status caption for the overlay
    pub fn caption(&self) -> &'static str {
        if self.alarm_on {
            ALERT_CAPTION
        } else {
            MONITORING_CAPTION
        }
    }
}
