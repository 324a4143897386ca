use thiserror::Error;

/// Errors produced by the matrix-profile engine and its supporting
/// algorithms. Every fallible entry point in this crate returns one of
/// these variants instead of panicking.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MassError {
    #[error("first series is empty")]
    EmptySeries,

    #[error("second series must be None for a self join, or have a length greater than 0")]
    SecondSeriesEmpty,

    #[error("subsequence length must be at least 2, got {0}")]
    WindowTooShort(usize),

    #[error("subsequence length must be less than half the timeseries (m={m}, n={n})")]
    SubsequenceTooLong { m: usize, n: usize },

    #[error("z-normalizing a subsequence with zero standard deviation is undefined")]
    DegenerateSubsequence,

    #[error("sample rate must be in (0, 1], got {0}")]
    InvalidSampleRate(f64),

    #[error("index {idx} with window {m} asks for data beyond the length of the series ({len})")]
    IndexOutOfRange { idx: usize, m: usize, len: usize },

    #[error("operation requires a self join")]
    NotSelfJoin,

    #[error("length mismatch: {left_name} has length {left}, {right_name} has length {right}")]
    LengthMismatch {
        left_name: &'static str,
        left: usize,
        right_name: &'static str,
        right: usize,
    },

    #[error("parallelism must be at least 1")]
    InvalidParallelism,

    #[error("batch_size must be greater than 0, got {0}")]
    InvalidBatchSize(usize),

    #[error("top_matches must be greater than 0, got {0}")]
    InvalidTopMatches(usize),

    #[error("batch_size ({batch_size}) must be greater than the query's length ({query_len})")]
    BatchSizeTooSmallForQuery { batch_size: usize, query_len: usize },

    #[error("top_matches ({top_matches}) must be less than or equal to the number of batches ({batches}); choose a smaller batch_size or fewer top_matches")]
    TooFewBatches { batches: usize, top_matches: usize },
}
