//! Camera Capture Library for the Drowsiness Demo
//!
//! The camera itself lives in the browser. This crate owns the server side
//! of that frame source:
//! - Decoding compressed frames received from the page
//! - Grayscale conversion for the detectors
//! - Re-encoding processed frames for display

pub mod frame;

pub use frame::{VideoFrame, DEFAULT_JPEG_QUALITY};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Frame error types
#[derive(Error, Debug)]
pub enum FrameError {
    #[error("Failed to decode frame: {0}")]
    Decode(String),

    #[error("Failed to encode frame: {0}")]
    Encode(String),

    #[error("Invalid frame dimensions: {width}x{height} with {len} bytes")]
    Dimensions { width: u32, height: u32, len: usize },

    #[error("Empty frame payload")]
    Empty,
}

/// Media constraints requested from the browser camera (`getUserMedia`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConstraints {
    /// Request the video track
    pub video: bool,
    /// Request the audio track
    pub audio: bool,
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            video: true,
            audio: false,
        }
    }
}

/// Capture configuration for the page-side camera
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Track constraints
    pub constraints: MediaConstraints,
    /// Ideal capture width
    pub width: u32,
    /// Ideal capture height
    pub height: u32,
    /// JPEG quality used on the way back to the page (1-100)
    pub jpeg_quality: u8,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            constraints: MediaConstraints::default(),
            width: 640,
            height: 480,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}
