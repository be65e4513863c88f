use std::ffi::CString;

use anyhow::anyhow;
use anyhow::Context;
use anyhow::Result;
use leptess::tesseract::TessApi;
use log::warn;
use opencv::prelude::*;

use crate::config::OcrConfig;

/// Single-line text recognition over preprocessed plate regions.
pub struct PlateReader {
    ocr: TessApi,
}

impl PlateReader {
    /// Initializes the recognition engine and doubles as its availability
    /// probe: a missing tesseract install or language pack fails here,
    /// before the frame loop starts.
    pub fn new(datapath: Option<&str>, lang: &str, config: &OcrConfig) -> Result<Self> {
        let mut api = TessApi::new(datapath, lang)
            .map_err(|err| anyhow!("tesseract engine unavailable: {}", err))?;

        set_variable(&mut api, "tessedit_char_whitelist", &config.char_whitelist)?;
        set_variable(&mut api, "tessedit_pageseg_mode", &config.page_seg_mode)?;

        Ok(Self { ocr: api })
    }

    /// Best-effort read of a binarized single-channel region. Engine errors
    /// are reported on the diagnostic channel and degrade to `None`; a
    /// returned `Some` always carries a non-empty, trimmed string. A plate
    /// missed on one frame will usually be read on a later frame.
    pub fn read(&mut self, plate: &Mat) -> Option<String> {
        match self.read_inner(plate) {
            Ok(raw) => {
                let text = raw.trim();
                if text.is_empty() {
                    None
                } else {
                    Some(text.to_string())
                }
            }
            Err(err) => {
                warn!("ocr failed on region: {}", err);
                None
            }
        }
    }

    fn read_inner(&mut self, plate: &Mat) -> Result<String> {
        let cols = plate.cols();
        let rows = plate.rows();
        let data = plate.data_bytes().context("region buffer is not contiguous")?;

        self.ocr
            .raw
            .set_image(data, cols, rows, 1, cols)
            .map_err(|err| anyhow!("cannot set ocr image: {}", err))?;

        let text = self
            .ocr
            .get_utf8_text()
            .map_err(|err| anyhow!("cannot fetch ocr text: {}", err))?;
        Ok(text)
    }
}

fn set_variable(api: &mut TessApi, name: &str, value: &str) -> Result<()> {
    let name_c = CString::new(name)?;
    let value_c = CString::new(value)?;
    api.raw
        .set_variable(&name_c, &value_c)
        .map_err(|err| anyhow!("cannot set tesseract variable {}: {}", name, err))?;
    Ok(())
}
