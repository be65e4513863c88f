use std::collections::HashSet;

use log::debug;
use log::warn;
use opencv::core::Rect;
use opencv::core::Vector;
use opencv::prelude::*;

use crate::config::PreprocessConfig;
use crate::plate_detection::detector::PlateDetector;
use crate::plate_detection::ocr::PlateReader;
use crate::plate_detection::plate_log::PlateLog;
use crate::plate_detection::preprocess::prepare;
use crate::plate_detection::PlateSighting;

/// Everything the display layer needs for one frame.
#[derive(Default)]
pub struct FrameReport {
    pub sightings: Vec<PlateSighting>,
    /// Plates logged for the first time during this frame.
    pub new_plates: usize,
}

/// Per-frame orchestration: detect regions, normalize each one, read its
/// text and feed novel strings to the session log. Holds the only mutable
/// session state, the set of plate strings already logged.
pub struct PlatePipeline {
    detector: PlateDetector,
    reader: PlateReader,
    log: PlateLog,
    seen: HashSet<String>,
    preprocess: PreprocessConfig,
}

impl PlatePipeline {
    pub fn new(
        detector: PlateDetector,
        reader: PlateReader,
        log: PlateLog,
        preprocess: PreprocessConfig,
    ) -> Self {
        Self {
            detector,
            reader,
            log,
            seen: HashSet::new(),
            preprocess,
        }
    }

    /// Runs the full pipeline over one frame. Never fails the frame loop:
    /// a detection error yields an empty report, and a failure on one region
    /// does not stop the remaining regions of the same frame.
    pub fn process_frame(&mut self, frame: &Mat) -> FrameReport {
        let detections = match self.detector.detect(frame) {
            Ok(detections) => detections,
            Err(err) => {
                warn!("detection failed, skipping frame: {}", err);
                return FrameReport::default();
            }
        };

        let reader = &mut self.reader;
        process_regions(
            &detections.gray,
            &detections.boxes,
            &self.preprocess,
            &mut self.seen,
            &mut self.log,
            &mut |plate| reader.read(plate),
        )
    }

    /// Distinct plate strings logged since the session started.
    pub fn unique_plates(&self) -> usize {
        self.seen.len()
    }
}

/// Per-region step of the pipeline, with the session state threaded through
/// explicitly and the reader abstracted behind a callable. A failure on one
/// region never stops the remaining regions of the same frame.
fn process_regions(
    gray: &Mat,
    boxes: &Vector<Rect>,
    preprocess: &PreprocessConfig,
    seen: &mut HashSet<String>,
    log: &mut PlateLog,
    read: &mut dyn FnMut(&Mat) -> Option<String>,
) -> FrameReport {
    let mut report = FrameReport::default();
    for rect in boxes.iter() {
        let text = match prepare(gray, rect, preprocess) {
            Ok(plate) => read(&plate),
            Err(err) => {
                warn!("skipping region: {}", err);
                None
            }
        };

        if let Some(text) = &text {
            if record_new_plate(seen, log, text) {
                debug!("new plate logged: {}", text);
                report.new_plates += 1;
            }
        }
        report.sightings.push(PlateSighting::new(text, rect));
    }

    report
}

/// Session dedup gate. A string is persisted at most once per session, and
/// only a successful write marks it as seen.
fn record_new_plate(seen: &mut HashSet<String>, log: &mut PlateLog, text: &str) -> bool {
    if seen.contains(text) {
        return false;
    }
    if log.consider(text) {
        seen.insert(text.to_string());
        return true;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::config::LoggerConfig;

    fn log_in(dir: &tempfile::TempDir) -> PlateLog {
        PlateLog::create(dir.path().join("plates.txt"), LoggerConfig::default()).unwrap()
    }

    fn entry_count(log: &PlateLog) -> usize {
        std::fs::read_to_string(log.path()).unwrap().lines().count() - 1
    }

    fn gray_frame() -> Mat {
        let rows: Vec<Vec<u8>> = (0..40)
            .map(|_| (0..40).map(|c| if c < 20 { 30u8 } else { 220u8 }).collect())
            .collect();
        Mat::from_slice_2d(&rows).unwrap()
    }

    #[test]
    fn failing_region_does_not_stop_the_rest() {
        let gray = gray_frame();
        // The middle box reaches outside the frame, so its preprocessing
        // fails; the surrounding boxes must still be read and logged.
        let boxes = Vector::from_iter([
            Rect::new(0, 0, 10, 10),
            Rect::new(35, 35, 20, 20),
            Rect::new(10, 10, 10, 10),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let mut log = log_in(&dir);
        let mut seen = HashSet::new();

        let mut reads = 0;
        let report = process_regions(
            &gray,
            &boxes,
            &PreprocessConfig::default(),
            &mut seen,
            &mut log,
            &mut |_plate| {
                reads += 1;
                Some(format!("PLATE{}", reads))
            },
        );

        assert_eq!(report.sightings.len(), 3);
        assert_eq!(reads, 2);
        assert!(report.sightings[0].text.is_some());
        assert!(report.sightings[1].text.is_none());
        assert!(report.sightings[2].text.is_some());
        assert_eq!(report.new_plates, 2);
        assert_eq!(entry_count(&log), 2);
    }

    #[test]
    fn unreadable_region_still_yields_a_sighting() {
        let gray = gray_frame();
        let boxes = Vector::from_iter([
            Rect::new(0, 0, 10, 10),
            Rect::new(10, 0, 10, 10),
            Rect::new(20, 0, 10, 10),
        ]);
        let dir = tempfile::tempdir().unwrap();
        let mut log = log_in(&dir);
        let mut seen = HashSet::new();

        // The reader comes up empty on the second region only.
        let mut reads = 0;
        let report = process_regions(
            &gray,
            &boxes,
            &PreprocessConfig::default(),
            &mut seen,
            &mut log,
            &mut |_plate| {
                reads += 1;
                if reads == 2 {
                    None
                } else {
                    Some(format!("PLATE{}", reads))
                }
            },
        );

        assert_eq!(reads, 3);
        assert_eq!(report.sightings.len(), 3);
        assert!(report.sightings[1].text.is_none());
        assert_eq!(report.new_plates, 2);
        assert_eq!(entry_count(&log), 2);
    }

    #[test]
    fn repeated_text_is_logged_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = log_in(&dir);
        let mut seen = HashSet::new();

        let mut written = 0;
        for _ in 0..100 {
            if record_new_plate(&mut seen, &mut log, "AB12") {
                written += 1;
            }
        }

        assert_eq!(written, 1);
        assert_eq!(seen.len(), 1);
        assert_eq!(entry_count(&log), 1);
    }

    #[test]
    fn unqualified_text_is_not_marked_seen() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = log_in(&dir);
        let mut seen = HashSet::new();

        assert!(!record_new_plate(&mut seen, &mut log, "AB"));
        assert!(seen.is_empty());
        assert_eq!(entry_count(&log), 0);
    }

    #[test]
    fn distinct_texts_each_get_an_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = log_in(&dir);
        let mut seen = HashSet::new();

        assert!(record_new_plate(&mut seen, &mut log, "AB12CDE"));
        assert!(record_new_plate(&mut seen, &mut log, "XY34ZW"));
        assert!(!record_new_plate(&mut seen, &mut log, "AB12CDE"));

        assert_eq!(seen.len(), 2);
        assert_eq!(entry_count(&log), 2);
    }

    #[test]
    fn failed_write_leaves_text_unseen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plates.txt");
        let mut log = PlateLog::create(&path, LoggerConfig::default()).unwrap();
        let mut seen = HashSet::new();

        // The log reopens the path on every write; removing the file makes
        // the next append fail with NotFound.
        std::fs::remove_file(&path).unwrap();
        std::fs::remove_dir_all(dir.path()).unwrap();

        assert!(!record_new_plate(&mut seen, &mut log, "AB12"));
        assert!(seen.is_empty());
    }
}
