use thiserror::Error;

#[derive(Error, Debug)]
pub enum EqualizeError {
    #[error("Worker count must be at least 1")]
    NoWorkers,

    #[error("Cannot split {rows} rows across {workers} workers: every worker needs at least one row")]
    TooManyWorkers { workers: usize, rows: u32 },

    #[error("Buffer length {actual} does not match {width}x{height} image dimensions")]
    ShapeMismatch {
        width: u32,
        height: u32,
        actual: usize,
    },

    #[error("Histogram has no samples; cannot build a lookup table")]
    EmptyHistogram,

    #[error("Degenerate image: all {total} samples share one intensity level, equalization is undefined")]
    DegenerateHistogram { total: u64 },

    #[error("Worker {rank} panicked during the pipeline")]
    WorkerPanic { rank: usize },
}

pub type Result<T> = std::result::Result<T, EqualizeError>;

impl EqualizeError {
    /// Returns true when the failure stems from how the run was configured
    /// rather than from the image content.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            EqualizeError::NoWorkers | EqualizeError::TooManyWorkers { .. }
        )
    }

    /// Returns an error code for programmatic handling
    pub fn error_code(&self) -> &'static str {
        match self {
            EqualizeError::NoWorkers => "NO_WORKERS",
            EqualizeError::TooManyWorkers { .. } => "TOO_MANY_WORKERS",
            EqualizeError::ShapeMismatch { .. } => "SHAPE_MISMATCH",
            EqualizeError::EmptyHistogram => "EMPTY_HISTOGRAM",
            EqualizeError::DegenerateHistogram { .. } => "DEGENERATE_HISTOGRAM",
            EqualizeError::WorkerPanic { .. } => "WORKER_PANIC",
        }
    }
}
