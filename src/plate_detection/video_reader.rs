use std::path::Path;
use std::thread;
use std::time::Duration;
use std::time::Instant;

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use log::warn;
use opencv::prelude::*;
use opencv::videoio::VideoCapture;
use opencv::videoio::CAP_ANY;

/// Wraps a capture device or a video file and hands out frames one at a
/// time. An unopenable source is a fatal startup condition; once running,
/// exhaustion and read failures both end the stream quietly.
pub struct VideoReader {
    capture: VideoCapture,
    fps_control: Instant,
    fps_wait: Option<Duration>,
}

impl VideoReader {
    pub fn from_camera(index: i32, max_fps: Option<u64>) -> Result<Self> {
        let capture = VideoCapture::new(index, CAP_ANY)
            .with_context(|| format!("cannot open capture device {}", index))?;
        Self::opened(capture, max_fps, &format!("capture device {}", index))
    }

    pub fn from_file(path: &Path, max_fps: Option<u64>) -> Result<Self> {
        let capture = VideoCapture::from_file(
            path.to_str().context("video path is not valid UTF-8")?,
            CAP_ANY,
        )
        .with_context(|| format!("cannot open {}", path.display()))?;
        Self::opened(capture, max_fps, &path.display().to_string())
    }

    fn opened(capture: VideoCapture, max_fps: Option<u64>, source: &str) -> Result<Self> {
        if !capture.is_opened()? {
            bail!("could not open {}", source);
        }
        Ok(Self {
            capture,
            fps_control: Instant::now(),
            fps_wait: max_fps.map(|fps| Duration::from_millis(1000 / fps.max(1))),
        })
    }

    /// Reads the next frame. `None` means the stream is exhausted or the
    /// device stopped delivering, which ends the session normally.
    pub fn next_frame(&mut self) -> Option<Mat> {
        let mut frame = Mat::default();
        let grabbed = match self.capture.read(&mut frame) {
            Ok(grabbed) => grabbed,
            Err(err) => {
                warn!("frame read failed: {}", err);
                return None;
            }
        };
        if !grabbed || frame.empty() {
            return None;
        }

        // Pace playback so a file does not run faster than real time.
        if let Some(wait) = self.fps_wait {
            let elapsed = self.fps_control.elapsed();
            if wait > elapsed {
                thread::sleep(wait - elapsed);
            }
            self.fps_control = Instant::now();
        }

        Some(frame)
    }
}

impl Drop for VideoReader {
    fn drop(&mut self) {
        if let Err(err) = self.capture.release() {
            warn!("failed to release capture: {}", err);
        }
    }
}
