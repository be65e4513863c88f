use std::fmt;

/// Errors raised by the per-frame pipeline stages. Startup failures use
/// `anyhow` at the binary seam instead; everything here is recoverable at
/// frame or region scope.
#[derive(Debug)]
pub enum PipelineError {
    /// The caller handed over a malformed frame or an out-of-bounds region.
    InvalidInput(String),
    /// A failure inside an OpenCV routine.
    OpenCv(opencv::Error),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            PipelineError::OpenCv(err) => write!(f, "opencv: {}", err),
        }
    }
}

impl std::error::Error for PipelineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PipelineError::OpenCv(err) => Some(err),
            PipelineError::InvalidInput(_) => None,
        }
    }
}

impl From<opencv::Error> for PipelineError {
    fn from(err: opencv::Error) -> Self {
        PipelineError::OpenCv(err)
    }
}
