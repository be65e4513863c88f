pub mod bounding_box_render;
pub mod detector;
pub mod ocr;
pub mod pipeline;
pub mod plate_log;
pub mod preprocess;
pub mod video_reader;

use opencv::core::Rect;

/// One detected region and the text read from it, if any.
#[derive(Clone, Debug)]
pub struct PlateSighting {
    pub text: Option<String>,
    pub region: Rect,
}

impl PlateSighting {
    pub fn new(text: Option<String>, region: Rect) -> Self {
        Self { text, region }
    }
}
