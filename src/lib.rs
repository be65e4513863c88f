//! Real-time license plate detection: locates plate-shaped regions in video
//! frames, runs OCR over each region and keeps a de-duplicated, timestamped
//! session log of every distinct plate string observed.

pub mod config;
pub mod error;
pub mod plate_detection;
