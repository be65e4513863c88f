use log::warn;
use opencv::core::Point;
use opencv::core::Scalar;
use opencv::imgproc::put_text;
use opencv::imgproc::rectangle;
use opencv::imgproc::FONT_HERSHEY_SIMPLEX;
use opencv::imgproc::LINE_8;
use opencv::prelude::*;
use opencv::videoio::VideoWriter;

use crate::error::PipelineError;
use crate::plate_detection::pipeline::FrameReport;

const RECORDING_FPS: f64 = 25.0;

/// Draws detection boxes, recognized text and the running counters onto a
/// frame, optionally recording the annotated stream to an MJPG file.
pub struct BoundingBoxRender {
    writer: Option<VideoWriter>,
    // Recording starts lazily: the writer needs the frame size, which is
    // only known once the first frame arrives.
    record_path: Option<String>,
}

impl BoundingBoxRender {
    pub fn new() -> Self {
        Self {
            writer: None,
            record_path: None,
        }
    }

    pub fn with_recording(path: String) -> Self {
        Self {
            writer: None,
            record_path: Some(path),
        }
    }

    pub fn annotate(
        &mut self,
        frame: &mut Mat,
        report: &FrameReport,
        unique_plates: usize,
    ) -> Result<(), PipelineError> {
        let green = Scalar::new(0.0, 255.0, 0.0, 0.0);

        for sighting in &report.sightings {
            rectangle(frame, sighting.region, green, 2, LINE_8, 0)?;
            if let Some(text) = &sighting.text {
                put_text(
                    frame,
                    text,
                    Point::new(sighting.region.x, (sighting.region.y - 10).max(0)),
                    FONT_HERSHEY_SIMPLEX,
                    0.5,
                    green,
                    2,
                    LINE_8,
                    false,
                )?;
            }
        }

        let counter = format!("Plates detected: {}", report.sightings.len());
        put_text(
            frame,
            &counter,
            Point::new(10, 30),
            FONT_HERSHEY_SIMPLEX,
            1.0,
            green,
            2,
            LINE_8,
            false,
        )?;
        let unique = format!("Unique this session: {}", unique_plates);
        put_text(
            frame,
            &unique,
            Point::new(10, 60),
            FONT_HERSHEY_SIMPLEX,
            0.6,
            green,
            2,
            LINE_8,
            false,
        )?;

        if let Some(path) = self.record_path.take() {
            match VideoWriter::new(
                &path,
                VideoWriter::fourcc('M', 'J', 'P', 'G')?,
                RECORDING_FPS,
                frame.size()?,
                true,
            ) {
                // A writer can come back constructed but unopened (bad path
                // or missing codec); it would then swallow every frame.
                Ok(writer) => match writer.is_opened() {
                    Ok(true) => self.writer = Some(writer),
                    Ok(false) => warn!("cannot record to {}: writer did not open", path),
                    Err(err) => warn!("cannot record to {}: {}", path, err),
                },
                Err(err) => warn!("cannot record to {}: {}", path, err),
            }
        }
        if let Some(writer) = self.writer.as_mut() {
            writer.write(frame)?;
        }

        Ok(())
    }
}

impl Default for BoundingBoxRender {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for BoundingBoxRender {
    fn drop(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(err) = writer.release() {
                warn!("failed to finalize recording: {}", err);
            }
        }
    }
}
