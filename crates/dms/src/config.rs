//! DMS configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// File name of the frontal face cascade
pub const FACE_CASCADE_FILE: &str = "haarcascade_frontalface_default.xml";

/// File name of the eye cascade
pub const EYE_CASCADE_FILE: &str = "haarcascade_eye.xml";

/// Multi-scale detection parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionParams {
    /// Pyramid step between scales (> 1.0)
    pub scale_factor: f64,

    /// Candidates a cluster needs beyond this count to be kept
    pub min_neighbors: usize,

    /// Smallest object size (width, height) in pixels
    pub min_size: (u32, u32),

    /// Largest object size (width, height); `None` means the image size
    pub max_size: Option<(u32, u32)>,
}

impl DetectionParams {
    /// Parameters for faces in a full frame
    pub fn faces() -> Self {
        Self {
            scale_factor: 1.3,
            min_neighbors: 5,
            min_size: (100, 100),
            max_size: None,
        }
    }

    /// Parameters for eyes inside a face region
    pub fn eyes() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 5,
            min_size: (10, 10),
            max_size: Some((50, 50)),
        }
    }
}

/// DMS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DmsConfig {
    /// Directory holding the cascade XML files
    pub cascade_dir: PathBuf,

    /// Face detection parameters
    pub faces: DetectionParams,

    /// Eye detection parameters
    pub eyes: DetectionParams,
}

impl Default for DmsConfig {
    fn default() -> Self {
        Self {
            cascade_dir: PathBuf::from("data/haarcascades"),
            faces: DetectionParams::faces(),
            eyes: DetectionParams::eyes(),
        }
    }
}

impl DmsConfig {
    /// Config with cascades looked up in `dir`
    pub fn with_cascade_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            cascade_dir: dir.into(),
            ..Default::default()
        }
    }

    /// Path of the face cascade
    pub fn face_cascade_path(&self) -> PathBuf {
        self.cascade_dir.join(FACE_CASCADE_FILE)
    }

    /// Path of the eye cascade
    pub fn eye_cascade_path(&self) -> PathBuf {
        self.cascade_dir.join(EYE_CASCADE_FILE)
    }
}
