//! Face and eye locators

use std::path::Path;
use std::sync::{Arc, Mutex};

use image::{imageops, GrayImage};
use opencv::core::{Rect, Size, Vector};
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{DetectionParams, DmsConfig};
use crate::mat::gray_to_mat;
use crate::DmsError;

/// Axis-aligned rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Shift by an origin (region-relative to frame coordinates)
    pub fn offset(&self, origin: &Region) -> Region {
        Region::new(self.x + origin.x, self.y + origin.y, self.width, self.height)
    }

    /// Intersect with an image of the given size; `None` if nothing is left
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Region> {
        if self.x >= width || self.y >= height {
            return None;
        }
        let w = self.width.min(width - self.x);
        let h = self.height.min(height - self.y);
        if w == 0 || h == 0 {
            return None;
        }
        Some(Region::new(self.x, self.y, w, h))
    }

    pub(crate) fn to_rect(self) -> Rect {
        Rect::new(self.x as i32, self.y as i32, self.width as i32, self.height as i32)
    }
}

impl From<Rect> for Region {
    fn from(r: Rect) -> Self {
        Region::new(
            r.x.max(0) as u32,
            r.y.max(0) as u32,
            r.width.max(0) as u32,
            r.height.max(0) as u32,
        )
    }
}

/// Finds objects of one kind in a grayscale image
pub trait ObjectLocator: Send + Sync {
    fn locate(&self, gray: &GrayImage) -> Result<Vec<Region>, DmsError>;
}

/// OpenCV Haar cascade with fixed detection parameters
pub struct CascadeLocator {
    classifier: Mutex<CascadeClassifier>,
    params: DetectionParams,
}

impl CascadeLocator {
    pub fn new(classifier: CascadeClassifier, params: DetectionParams) -> Result<Self, DmsError> {
        if params.scale_factor.is_nan() || params.scale_factor <= 1.0 {
            return Err(DmsError::Config(format!(
                "scale factor must be greater than 1, got {}",
                params.scale_factor
            )));
        }
        if classifier.empty()? {
            return Err(DmsError::ModelLoad("cascade classifier is empty".to_string()));
        }
        Ok(Self {
            classifier: Mutex::new(classifier),
            params,
        })
    }

    /// Load the cascade XML at `path`
    pub fn load(path: &Path, params: DetectionParams) -> Result<Self, DmsError> {
        if !path.is_file() {
            return Err(DmsError::ModelLoad(format!("{} not found", path.display())));
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| DmsError::ModelLoad(format!("{} is not valid UTF-8", path.display())))?;

        let classifier = CascadeClassifier::new(path_str)
            .map_err(|e| DmsError::ModelLoad(format!("{}: {}", path.display(), e)))?;
        let locator = Self::new(classifier, params).map_err(|e| match e {
            DmsError::ModelLoad(msg) => DmsError::ModelLoad(format!("{}: {}", path.display(), msg)),
            other => other,
        })?;

        info!("Loaded cascade {}", path.display());
        Ok(locator)
    }
}

impl ObjectLocator for CascadeLocator {
    fn locate(&self, gray: &GrayImage) -> Result<Vec<Region>, DmsError> {
        if gray.width() == 0 || gray.height() == 0 {
            return Ok(Vec::new());
        }

        let image = gray_to_mat(gray)?;
        let p = &self.params;
        let min_size = Size::new(p.min_size.0 as i32, p.min_size.1 as i32);
        let max_size = p
            .max_size
            .map(|(w, h)| Size::new(w as i32, h as i32))
            .unwrap_or_default();

        let mut found = Vector::<Rect>::new();
        let mut classifier = self
            .classifier
            .lock()
            .map_err(|_| DmsError::Detection("cascade lock poisoned".to_string()))?;
        classifier.detect_multi_scale(
            &image,
            &mut found,
            p.scale_factor,
            p.min_neighbors as i32,
            0,
            min_size,
            max_size,
        )?;

        Ok(found.iter().map(Region::from).collect())
    }
}

/// Face locator plus eye locator, shared read-only by all sessions
#[derive(Clone)]
pub struct FaceEyeLocator {
    faces: Arc<dyn ObjectLocator>,
    eyes: Arc<dyn ObjectLocator>,
}

impl FaceEyeLocator {
    pub fn new(faces: Arc<dyn ObjectLocator>, eyes: Arc<dyn ObjectLocator>) -> Self {
        Self { faces, eyes }
    }

    /// Load both cascades from the configured directory
    pub fn load(config: &DmsConfig) -> Result<Self, DmsError> {
        let faces = CascadeLocator::load(&config.face_cascade_path(), config.faces)?;
        let eyes = CascadeLocator::load(&config.eye_cascade_path(), config.eyes)?;
        Ok(Self::new(Arc::new(faces), Arc::new(eyes)))
    }

    /// Faces in a full grayscale frame
    pub fn faces(&self, gray: &GrayImage) -> Result<Vec<Region>, DmsError> {
        let faces = self.faces.locate(gray)?;
        debug!("Located {} face(s)", faces.len());
        Ok(faces)
    }

    /// Eyes inside `face`, in face-relative coordinates
    pub fn eyes(&self, gray: &GrayImage, face: &Region) -> Result<Vec<Region>, DmsError> {
        let Some(face) = face.clamp_to(gray.width(), gray.height()) else {
            return Ok(Vec::new());
        };
        let roi = imageops::crop_imm(gray, face.x, face.y, face.width, face.height).to_image();
        self.eyes.locate(&roi)
    }
}
