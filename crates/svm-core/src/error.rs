//! Error types for svm-core.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("component {component} references node {node}, outside [0, {node_count})")]
    NodeOutOfRange {
        component: String,
        node: u32,
        node_count: usize,
    },

    #[error("component {0} has zero value")]
    ZeroValue(String),

    #[error("circuit has no components")]
    EmptyCircuit,

    #[error("invalid circuit: {0}")]
    InvalidCircuit(String),
}

pub type Result<T> = std::result::Result<T, Error>;
