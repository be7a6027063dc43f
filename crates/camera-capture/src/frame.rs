//! Video frame types and processing

use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, Luma, RgbImage};
use tracing::debug;

use crate::FrameError;

/// JPEG quality used when returning frames to the page
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Decoded RGB video frame
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// RGB pixels
    image: RgbImage,
    /// Receive timestamp (nanoseconds)
    pub timestamp_ns: u64,
    /// Frame sequence number within the session
    pub sequence: u32,
}

impl VideoFrame {
    /// Wrap an already decoded RGB image
    pub fn new(image: RgbImage, timestamp_ns: u64, sequence: u32) -> Self {
        Self {
            image,
            timestamp_ns,
            sequence,
        }
    }

    /// Decode a compressed frame (JPEG from the page, PNG also accepted)
    pub fn decode(bytes: &[u8], timestamp_ns: u64, sequence: u32) -> Result<Self, FrameError> {
        if bytes.is_empty() {
            return Err(FrameError::Empty);
        }

        let img = image::load_from_memory(bytes).map_err(|e| FrameError::Decode(e.to_string()))?;
        let rgb = img.to_rgb8();
        debug!(
            sequence,
            width = rgb.width(),
            height = rgb.height(),
            "Decoded frame"
        );

        Ok(Self::new(rgb, timestamp_ns, sequence))
    }

    /// Encode the frame as JPEG
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, FrameError> {
        let mut out = Vec::with_capacity(self.image.as_raw().len() / 8);
        let mut encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
        encoder
            .encode_image(&self.image)
            .map_err(|e| FrameError::Encode(e.to_string()))?;
        Ok(out)
    }

    /// Frame width
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Frame height
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Get pixel at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Borrow the pixels mutably (overlay rendering)
    pub fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    /// Convert to grayscale
    pub fn to_grayscale(&self) -> GrayImage {
        let mut gray = GrayImage::new(self.width(), self.height());
        for (dst, pixel) in gray.pixels_mut().zip(self.image.pixels()) {
            // Luminance formula: 0.299*R + 0.587*G + 0.114*B
            let y = pixel[0] as f32 * 0.299 + pixel[1] as f32 * 0.587 + pixel[2] as f32 * 0.114;
            *dst = Luma([y.round().min(255.0) as u8]);
        }
        gray
    }
}
