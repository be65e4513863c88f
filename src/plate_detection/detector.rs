use std::path::Path;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use opencv::core::Rect;
use opencv::core::Size;
use opencv::core::Vector;
use opencv::imgproc::cvt_color;
use opencv::imgproc::COLOR_BGR2GRAY;
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;

use crate::config::DetectorConfig;
use crate::error::PipelineError;

/// Boxes found in one frame together with the intensity image they were
/// found in. The grayscale image is handed on to the preprocessor so every
/// box is cropped from exactly what the detector scanned.
pub struct Detections {
    pub boxes: Vector<Rect>,
    pub gray: Mat,
}

/// Multi-scale sliding-window plate detector backed by a Haar cascade.
pub struct PlateDetector {
    classifier: CascadeClassifier,
    config: DetectorConfig,
}

impl PlateDetector {
    /// Loads the cascade definition. A missing or unloadable file is a fatal
    /// startup condition, so this runs before the frame loop.
    pub fn from_cascade(path: &Path, config: DetectorConfig) -> Result<Self> {
        if !path.is_file() {
            bail!("cascade classifier file missing: {}", path.display());
        }
        let classifier = CascadeClassifier::new(
            path.to_str()
                .context("cascade classifier path is not valid UTF-8")?,
        )
        .with_context(|| format!("failed to load cascade {}", path.display()))?;
        // A present but unparseable file leaves the classifier empty rather
        // than failing construction.
        if classifier.empty()? {
            bail!("cascade {} contains no usable stages", path.display());
        }

        Ok(Self { classifier, config })
    }

    /// Scans a BGR frame and returns every plate-shaped candidate region.
    ///
    /// Boxes are unordered, may overlap and always lie fully inside the
    /// frame. Grayscale conversion happens here, not at the call site.
    pub fn detect(&mut self, frame: &Mat) -> Result<Detections, PipelineError> {
        if frame.empty() {
            return Err(PipelineError::InvalidInput("empty frame".to_string()));
        }
        if frame.channels() != 3 {
            return Err(PipelineError::InvalidInput(format!(
                "expected a 3-channel BGR frame, got {} channels",
                frame.channels()
            )));
        }

        let mut gray = Mat::default();
        cvt_color(frame, &mut gray, COLOR_BGR2GRAY, 0)?;

        let mut boxes = Vector::<Rect>::default();
        self.classifier.detect_multi_scale(
            &gray,
            &mut boxes,
            self.config.scale_factor,
            self.config.min_neighbors,
            0,
            Size::new(self.config.min_size, self.config.min_size),
            Size::default(),
        )?;

        Ok(Detections { boxes, gray })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_cascade_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.xml");
        assert!(PlateDetector::from_cascade(&path, DetectorConfig::default()).is_err());
    }

    #[test]
    fn unparseable_cascade_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bogus.xml");
        std::fs::write(&path, "<not-a-cascade/>").unwrap();
        assert!(PlateDetector::from_cascade(&path, DetectorConfig::default()).is_err());
    }
}
