use std::fmt;
use std::path::{Path, PathBuf};

use fsfacade_platform::{ErrorKind, HandlerError};
use thiserror::Error;

/// Public facade operation, used to label failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ReadContentOf,
    StreamContentOf,
    CheckIfExists,
    CreateFile,
    WriteContentTo,
    StreamContentTo,
    CreateDirectory,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Operation::ReadContentOf => "read content of",
            Operation::StreamContentOf => "attach reader to",
            Operation::CheckIfExists => "verify existence of",
            Operation::CreateFile => "create file",
            Operation::WriteContentTo => "write content to",
            Operation::StreamContentTo => "stream content to",
            Operation::CreateDirectory => "create directory",
        };
        f.write_str(text)
    }
}

/// Handler failure annotated with the operation and path it happened on
#[derive(Debug, Error)]
#[error("failed to {operation} {}: {source}", .path.display())]
pub struct Error {
    operation: Operation,
    path: PathBuf,
    #[source]
    source: HandlerError,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn new(operation: Operation, path: impl Into<PathBuf>, source: HandlerError) -> Self {
        Self {
            operation,
            path: path.into(),
            source,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    /// The original handler error, for identity checks
    pub fn handler_error(&self) -> &HandlerError {
        &self.source
    }

    pub fn into_handler_error(self) -> HandlerError {
        self.source
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}
