//! Copies between `image` buffers and OpenCV matrices
//!
//! Frames stay in RGB channel order on the OpenCV side; colours passed to
//! drawing calls use the same order.

use camera_capture::FrameError;
use image::{GrayImage, RgbImage};
use opencv::core::{Mat, Scalar, CV_8UC1, CV_8UC3};
use opencv::prelude::*;

use crate::DmsError;

pub(crate) fn gray_to_mat(gray: &GrayImage) -> Result<Mat, DmsError> {
    filled(gray.width(), gray.height(), CV_8UC1, gray.as_raw())
}

pub(crate) fn rgb_to_mat(rgb: &RgbImage) -> Result<Mat, DmsError> {
    filled(rgb.width(), rgb.height(), CV_8UC3, rgb.as_raw())
}

/// Write the pixels of `mat` back into `rgb` (same size and type)
pub(crate) fn copy_into_rgb(mat: &Mat, rgb: &mut RgbImage) -> Result<(), DmsError> {
    let (width, height) = rgb.dimensions();
    let bytes = mat.data_bytes()?;
    let raw: &mut [u8] = rgb;
    if bytes.len() != raw.len() {
        return Err(FrameError::Dimensions {
            width,
            height,
            len: bytes.len(),
        }
        .into());
    }
    raw.copy_from_slice(bytes);
    Ok(())
}

fn filled(width: u32, height: u32, typ: i32, data: &[u8]) -> Result<Mat, DmsError> {
    let mut mat =
        Mat::new_rows_cols_with_default(height as i32, width as i32, typ, Scalar::all(0.0))?;
    mat.data_bytes_mut()?.copy_from_slice(data);
    Ok(mat)
}
