use serde::Serialize;
use std::fmt;

/// Coarse classification of a failure, carried by [`crate::executor::ExecutionResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The captured request text could not be tokenized.
    Parse,
    /// The descriptor does not look like a request against the expected API.
    Validation,
    /// Non-zero exit, spawn failure or timeout of the HTTP client process.
    TransportFailure,
    /// The client exited cleanly but its output was not JSON.
    MalformedResponse,
    /// A sibling request could not be built from the base descriptor.
    Derivation,
    /// A JSON payload did not have the expected shape.
    DataShape,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Parse => "parse error",
            ErrorKind::Validation => "validation error",
            ErrorKind::TransportFailure => "transport failure",
            ErrorKind::MalformedResponse => "malformed response",
            ErrorKind::Derivation => "derivation error",
            ErrorKind::DataShape => "data shape error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("could not parse captured request: {0}")]
    Parse(String),

    #[error("invalid captured request: {0}")]
    Validation(String),

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    MalformedResponse(String),

    #[error("could not derive request: {0}")]
    Derivation(String),

    #[error("unexpected data shape: {0}")]
    DataShape(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Parse(_) => ErrorKind::Parse,
            Error::Validation(_) => ErrorKind::Validation,
            Error::Transport(_) | Error::Io(_) => ErrorKind::TransportFailure,
            Error::MalformedResponse(_) => ErrorKind::MalformedResponse,
            Error::Derivation(_) => ErrorKind::Derivation,
            Error::DataShape(_) | Error::Json(_) => ErrorKind::DataShape,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
