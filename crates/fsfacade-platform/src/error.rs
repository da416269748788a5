use std::io;

use thiserror::Error;

/// Broad classification of a handler failure, stable across wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    WrongEntryType,
    UnresolvableDirectoryStructure,
    UnsupportedOperation,
    IntegrityMismatch,
    /// Unclassified OS failure (permission denied, disk full, ...)
    Io,
    /// Failure raised by an injected handler
    Other,
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("file not found")]
    FileNotFound,
    #[error("file already exists")]
    FileFound,
    #[error("directory already exists")]
    DirectoryFound,
    #[error("{reason}: unresolvable directory structure")]
    UnresolvableDirectoryStructure { reason: &'static str },
    #[error("cannot create directory structure: {0}")]
    DirectoryStructureCreation(#[source] io::Error),
    #[error("location contains directory but handler expects file")]
    Directory,
    #[error("location contains file but handler expects directory")]
    File,
    #[error("amount of written bytes ({written}) does not match the requested amount ({expected})")]
    WriteLengthMismatch { written: usize, expected: usize },
    #[error("content operation {0} is not supported")]
    UnsupportedContentOperation(u8),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl HandlerError {
    pub fn forbidden_directory_structure() -> Self {
        Self::UnresolvableDirectoryStructure {
            reason: "creation of non-existing directory structure is forbidden by current settings",
        }
    }

    pub fn invalid_directory_structure() -> Self {
        Self::UnresolvableDirectoryStructure {
            reason: "location structure does not contain valid directory as target",
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound => ErrorKind::NotFound,
            Self::FileFound | Self::DirectoryFound => ErrorKind::AlreadyExists,
            Self::Directory | Self::File => ErrorKind::WrongEntryType,
            Self::UnresolvableDirectoryStructure { .. } => {
                ErrorKind::UnresolvableDirectoryStructure
            }
            Self::UnsupportedContentOperation(_) => ErrorKind::UnsupportedOperation,
            Self::WriteLengthMismatch { .. } => ErrorKind::IntegrityMismatch,
            Self::DirectoryStructureCreation(_) | Self::Io(_) => ErrorKind::Io,
            Self::Other(_) => ErrorKind::Other,
        }
    }

    /// Underlying OS error, if this failure carries one
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::Io(e) | Self::DirectoryStructureCreation(e) => Some(e),
            _ => None,
        }
    }
}
