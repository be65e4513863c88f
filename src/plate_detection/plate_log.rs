use std::fs::File;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use chrono::Local;
use log::warn;

use crate::config::LoggerConfig;

pub const LOG_HEADER: &str = "=== License Plate Detection Log ===";

/// Append-only session log of accepted plate strings. Deduplication against
/// previously accepted strings is the caller's responsibility; this type
/// only decides whether a single string qualifies and persists it.
pub struct PlateLog {
    path: PathBuf,
    config: LoggerConfig,
}

impl PlateLog {
    /// Starts a session log: truncates any previous file and writes the
    /// header line.
    pub fn create(path: impl Into<PathBuf>, config: LoggerConfig) -> std::io::Result<Self> {
        let path = path.into();
        let mut file = File::create(&path)?;
        writeln!(file, "{}", LOG_HEADER)?;
        Ok(Self { path, config })
    }

    /// Appends a timestamped entry for `text` if it qualifies. Returns true
    /// iff a line was written.
    pub fn consider(&mut self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        if text.chars().count() < self.config.min_length {
            return false;
        }
        // Checked independently of the length guard: the whitelist upstream
        // can be reconfigured to admit non-alphanumeric characters.
        if !text.chars().any(|c| c.is_alphanumeric()) {
            return false;
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("{} - Plate: {}\n", timestamp, text);
        if let Err(err) = self.append(&line) {
            // The caller must not mark the text as seen on a failed write,
            // so the next sighting of the same plate retries it.
            warn!("cannot append to {}: {}", self.path.display(), err);
            return false;
        }
        true
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(line.as_bytes())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_log(dir: &tempfile::TempDir) -> PlateLog {
        PlateLog::create(dir.path().join("plates.txt"), LoggerConfig::default()).unwrap()
    }

    fn lines(log: &PlateLog) -> Vec<String> {
        std::fs::read_to_string(log.path())
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn writes_header_on_session_start() {
        let dir = tempfile::tempdir().unwrap();
        let log = new_log(&dir);
        assert_eq!(lines(&log), vec![LOG_HEADER.to_string()]);
    }

    #[test]
    fn rejects_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = new_log(&dir);
        assert!(!log.consider(""));
        assert_eq!(lines(&log).len(), 1);
    }

    #[test]
    fn rejects_short_text() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = new_log(&dir);
        assert!(!log.consider("AB"));
        assert_eq!(lines(&log).len(), 1);
    }

    #[test]
    fn rejects_text_without_alphanumerics() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = new_log(&dir);
        assert!(!log.consider("----"));
        assert_eq!(lines(&log).len(), 1);
    }

    #[test]
    fn accepts_qualifying_text_with_timestamp_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = new_log(&dir);
        assert!(log.consider("AB12"));

        let lines = lines(&log);
        assert_eq!(lines.len(), 2);

        let entry = &lines[1];
        let (timestamp, rest) = entry.split_at(19);
        assert_eq!(rest, " - Plate: AB12");
        assert!(chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S").is_ok());
    }

    #[test]
    fn distinct_accepts_append_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut log = new_log(&dir);
        let plates = ["AB12CDE", "XY34ZW", "KL9821"];
        for plate in plates {
            assert!(log.consider(plate));
        }

        let lines = lines(&log);
        assert_eq!(lines.len(), plates.len() + 1);
        for (line, plate) in lines[1..].iter().zip(plates) {
            assert!(line.ends_with(&format!(" - Plate: {}", plate)));
        }
    }

    #[test]
    fn restart_truncates_previous_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plates.txt");

        let mut log = PlateLog::create(&path, LoggerConfig::default()).unwrap();
        assert!(log.consider("AB12"));
        drop(log);

        let log = PlateLog::create(&path, LoggerConfig::default()).unwrap();
        assert_eq!(lines(&log), vec![LOG_HEADER.to_string()]);
    }
}
