use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Batch or target dimensions do not match what the model expects.
    /// Fatal: a malformed batch is never skipped or retried.
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A loss, gradient norm, or task weight stopped being finite.
    /// Raised before any shared state is mutated, so the run halts with the
    /// weight vector and model parameters intact.
    #[error("{quantity} diverged at step {step} (value {value})")]
    Divergence {
        quantity: String,
        step: usize,
        value: f64,
    },

    /// Invalid construction-time parameter. Never raised mid-run.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Fold manifest or sample decoding problem.
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Chart rendering problem, or the `plots` feature is not compiled in.
    #[error("plot error: {0}")]
    Plot(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
