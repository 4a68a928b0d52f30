use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The prefix tree worker pool needs at least one worker.
    #[error("`worker_count` must be at least 1, got {0}")]
    WorkerCountZero(usize),
    /// A page size is outside the range accepted by its backend.
    #[error("`{field}` must be between 1 and {max}, got {value}")]
    PageSizeOutOfRange {
        field: &'static str,
        value: usize,
        max: usize,
    },
}
