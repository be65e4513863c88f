use opencv::core::Rect;
use opencv::core::Size;
use opencv::core::BORDER_DEFAULT;
use opencv::imgproc::bilateral_filter;
use opencv::imgproc::resize;
use opencv::imgproc::threshold;
use opencv::imgproc::INTER_LINEAR;
use opencv::imgproc::THRESH_BINARY;
use opencv::imgproc::THRESH_OTSU;
use opencv::prelude::*;

use crate::config::PreprocessConfig;
use crate::error::PipelineError;

/// Crops `rect` out of a grayscale frame and normalizes it for OCR: linear
/// upscale, edge-preserving smoothing, Otsu binarization. Deterministic for
/// a fixed (frame, rect, config).
pub fn prepare(gray: &Mat, rect: Rect, config: &PreprocessConfig) -> Result<Mat, PipelineError> {
    if rect.x < 0
        || rect.y < 0
        || rect.width <= 0
        || rect.height <= 0
        || rect.x + rect.width > gray.cols()
        || rect.y + rect.height > gray.rows()
    {
        return Err(PipelineError::InvalidInput(format!(
            "region {}x{}+{}+{} outside a {}x{} frame",
            rect.width,
            rect.height,
            rect.x,
            rect.y,
            gray.cols(),
            gray.rows()
        )));
    }

    // The ROI is a view into the frame; clone to get a contiguous buffer
    // before filtering.
    let plate = Mat::roi(gray, rect)?.try_clone()?;

    let mut upscaled = Mat::default();
    resize(
        &plate,
        &mut upscaled,
        Size::default(),
        config.upscale,
        config.upscale,
        INTER_LINEAR,
    )?;

    let mut smoothed = Mat::default();
    bilateral_filter(
        &upscaled,
        &mut smoothed,
        config.bilateral_diameter,
        config.bilateral_sigma_color,
        config.bilateral_sigma_space,
        BORDER_DEFAULT,
    )?;

    let mut binary = Mat::default();
    threshold(&smoothed, &mut binary, 0.0, 255.0, THRESH_BINARY + THRESH_OTSU)?;

    Ok(binary)
}
