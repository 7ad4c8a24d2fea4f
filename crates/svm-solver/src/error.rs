//! Error types for svm-solver.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("singular matrix")]
    SingularMatrix,

    #[error("invalid matrix dimensions: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("singular augmented system while probing {probe}")]
    SingularPerturbation { probe: String },

    #[error("invalid transient parameters: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Circuit(#[from] svm_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
