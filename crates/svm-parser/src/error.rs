//! Error types for svm-parser.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error at line {line}: {message}")]
    ParseError { line: usize, message: String },

    #[error("line {line}: unknown component type `{kind}`")]
    UnknownComponentType { line: usize, kind: String },

    #[error("line {line}: invalid value `{text}`")]
    InvalidValue { line: usize, text: String },

    #[error("line {line}: {component} needs {expected} fields, found {found}")]
    MissingField {
        line: usize,
        component: String,
        expected: usize,
        found: usize,
    },

    #[error("invalid initial condition `{0}`, expected NODE=VOLTS")]
    InvalidInitialCondition(String),
}

pub type Result<T> = std::result::Result<T, Error>;
