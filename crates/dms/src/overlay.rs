//! Detection boxes and status caption drawn onto the frame

use image::RgbImage;
use opencv::core::{Point, Scalar};
use opencv::imgproc::{self, FONT_HERSHEY_SIMPLEX, LINE_8};

use crate::analysis::FrameAnalysis;
use crate::detector::Region;
use crate::mat::{copy_into_rgb, rgb_to_mat};
use crate::DmsError;

pub const FACE_RGB: [u8; 3] = [0, 0, 255];
pub const EYE_RGB: [u8; 3] = [0, 255, 0];
pub const ALERT_RGB: [u8; 3] = [255, 0, 0];
pub const MONITORING_RGB: [u8; 3] = [0, 255, 0];

const BOX_THICKNESS: i32 = 2;

/// Left end of the caption baseline
const CAPTION_ORIGIN: (i32, i32) = (50, 50);
const CAPTION_SCALE: f64 = 1.0;
const CAPTION_THICKNESS: i32 = 3;

/// Draw all boxes from `analysis` and its caption
pub fn render(image: &mut RgbImage, analysis: &FrameAnalysis) -> Result<(), DmsError> {
    if image.width() == 0 || image.height() == 0 {
        return Ok(());
    }

    let mut mat = rgb_to_mat(image)?;

    for face in &analysis.faces {
        draw_box(&mut mat, &face.face, FACE_RGB)?;
        for eye in &face.eyes {
            draw_box(&mut mat, eye, EYE_RGB)?;
        }
    }

    let color = if analysis.alarm_on {
        ALERT_RGB
    } else {
        MONITORING_RGB
    };
    imgproc::put_text(
        &mut mat,
        analysis.caption(),
        Point::new(CAPTION_ORIGIN.0, CAPTION_ORIGIN.1),
        FONT_HERSHEY_SIMPLEX,
        CAPTION_SCALE,
        scalar(color),
        CAPTION_THICKNESS,
        LINE_8,
        false,
    )?;

    copy_into_rgb(&mat, image)
}

fn draw_box(mat: &mut opencv::core::Mat, region: &Region, rgb: [u8; 3]) -> Result<(), DmsError> {
    imgproc::rectangle(mat, region.to_rect(), scalar(rgb), BOX_THICKNESS, LINE_8, 0)?;
    Ok(())
}

// Mats hold RGB, so channels are given in that order
fn scalar(rgb: [u8; 3]) -> Scalar {
    Scalar::new(rgb[0] as f64, rgb[1] as f64, rgb[2] as f64, 0.0)
}
