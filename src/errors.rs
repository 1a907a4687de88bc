use thiserror::Error;

use crate::value::ValueType;

/// Errors surfaced by parsing, evaluation, and value conversion.
#[derive(Debug, Error)]
pub enum Error {
    /// The source text could not be parsed. Lines are 1-based.
    #[error("parse error: line {line}: {message}")]
    Parse { line: u32, message: String },

    /// Script execution failed (undefined variable, bad operand types,
    /// division by zero, exhausted step budget, ...).
    #[error("runtime error: {0}")]
    Runtime(String),

    /// A strict `Value` accessor was called on the wrong variant.
    #[error("value is not a {expected} but {actual}")]
    InvalidType {
        expected: ValueType,
        actual: ValueType,
    },

    /// The sandboxed evaluation capability is not present in this build
    /// or was disabled in the environment.
    #[error("sandbox capability is not available")]
    SandboxUnavailable,
}

impl Error {
    pub(crate) fn runtime(msg: impl Into<String>) -> Self {
        Error::Runtime(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
