use std::{io, path::PathBuf};
use thiserror::Error;

/// Coarse classification of a [`TransformError`], used in run reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Schema,
    Parse,
}

impl ErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorKind::Io => "IOError",
            ErrorKind::Schema => "SchemaError",
            ErrorKind::Parse => "ParseError",
        }
    }
}

/// Failures of the CSV → JSON transform. None are recovered locally.
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("IOError: {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("SchemaError: {path}: {details}")]
    Schema { path: PathBuf, details: String },

    #[error("ParseError: {path} line {line}: {details}")]
    Parse {
        path: PathBuf,
        line: u64,
        details: String,
    },
}

impl TransformError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TransformError::Io { .. } => ErrorKind::Io,
            TransformError::Schema { .. } => ErrorKind::Schema,
            TransformError::Parse { .. } => ErrorKind::Parse,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        TransformError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn schema(path: impl Into<PathBuf>, details: impl Into<String>) -> Self {
        TransformError::Schema {
            path: path.into(),
            details: details.into(),
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, line: u64, details: impl Into<String>) -> Self {
        TransformError::Parse {
            path: path.into(),
            line,
            details: details.into(),
        }
    }
}
