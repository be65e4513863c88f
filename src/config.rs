//! Tuning knobs for the pipeline stages. The defaults are the values the
//! pipeline was calibrated with; substitute a different struct to re-tune
//! without touching stage code.

/// Cascade detector settings.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Geometric step between scan scales.
    pub scale_factor: f64,
    /// Overlapping detections required before a candidate box is accepted.
    pub min_neighbors: i32,
    /// Candidate boxes smaller than this square (pixels) are rejected.
    pub min_size: i32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            scale_factor: 1.1,
            min_neighbors: 5,
            min_size: 25,
        }
    }
}

/// Region normalization settings applied between detection and OCR.
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Linear upscale factor applied to the cropped region on both axes.
    pub upscale: f64,
    /// Pixel neighborhood diameter of the bilateral filter.
    pub bilateral_diameter: i32,
    /// Filter sigma in color space.
    pub bilateral_sigma_color: f64,
    /// Filter sigma in coordinate space.
    pub bilateral_sigma_space: f64,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            upscale: 2.0,
            bilateral_diameter: 11,
            bilateral_sigma_color: 17.0,
            bilateral_sigma_space: 17.0,
        }
    }
}

/// Recognition engine settings.
#[derive(Debug, Clone)]
pub struct OcrConfig {
    /// Characters the engine is allowed to emit.
    pub char_whitelist: String,
    /// Tesseract page segmentation mode. "7" treats the image as a single
    /// text line.
    pub page_seg_mode: String,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            char_whitelist: "ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789".to_string(),
            page_seg_mode: "7".to_string(),
        }
    }
}

/// Session log acceptance settings.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    /// Minimum character count for a string to be logged.
    pub min_length: usize,
    /// Declared tuning knob carried along with the other thresholds; the
    /// acceptance check gates on length and character content only and does
    /// not consult it.
    pub min_confidence: f64,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_length: 4,
            min_confidence: 0.6,
        }
    }
}
