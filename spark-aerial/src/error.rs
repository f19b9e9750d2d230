use std::path::PathBuf;
use thiserror::Error;

/// Failures a caller may want to tell apart. Travels inside `anyhow::Error`.
#[derive(Debug, Error)]
pub enum AerialError {
    #[error("class `{0}` has no IoU threshold")]
    MissingThreshold(String),
    #[error("class id {0} is not in the label map")]
    UnknownClass(u32),
    #[error("no eligible images under {}", .0.display())]
    NoImages(PathBuf),
    #[error("invalid window configuration: {0}")]
    InvalidWindow(String),
    #[error("{failed} of {workers} workers failed")]
    WorkerFailed { failed: usize, workers: usize },
    #[error("aggregator received {received} of {expected} results")]
    IncompleteRun { received: usize, expected: usize },
}
