use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("index {index} out of range (limit {limit})")]
    OutOfRange { index: usize, limit: usize },

    #[error("invalid calibration sample: point has no depth")]
    InvalidPoint,

    #[error("not enough correspondence pairs: have {have}, need {need}")]
    InsufficientPairs { have: usize, need: usize },

    #[error("degenerate point configuration: correspondences are collinear or coincident")]
    DegenerateConfiguration,

    #[error("mapping has not been fitted")]
    NotCalibrated,

    #[error("calibration file not found: {0}")]
    NotFound(PathBuf),

    #[error("corrupt calibration file {path}: {reason}")]
    CorruptFile { path: PathBuf, reason: String },

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
