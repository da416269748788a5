use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HandlerError;
use crate::mode::Mode;

/// How a write treats existing file content.
///
/// Only [`ContentOperation::APPEND`] and [`ContentOperation::OVERWRITE`] are
/// valid. Other raw values can still be constructed (config files, CLI input)
/// and are rejected by [`ContentOperation::validate`] before any write.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentOperation(u8);

impl ContentOperation {
    pub const APPEND: ContentOperation = ContentOperation(1);
    pub const OVERWRITE: ContentOperation = ContentOperation(2);

    pub const fn from_raw(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u8 {
        self.0
    }

    pub fn is(self, other: ContentOperation) -> bool {
        self == other
    }

    pub fn validate(self) -> Result<(), HandlerError> {
        if self == Self::APPEND || self == Self::OVERWRITE {
            Ok(())
        } else {
            Err(HandlerError::UnsupportedContentOperation(self.0))
        }
    }
}

impl Default for ContentOperation {
    fn default() -> Self {
        Self::APPEND
    }
}

impl fmt::Debug for ContentOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::APPEND => f.write_str("Append"),
            Self::OVERWRITE => f.write_str("Overwrite"),
            Self(raw) => write!(f, "Unsupported({})", raw),
        }
    }
}

impl fmt::Display for ContentOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::APPEND => f.write_str("append"),
            Self::OVERWRITE => f.write_str("overwrite"),
            Self(raw) => write!(f, "{}", raw),
        }
    }
}

impl FromStr for ContentOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "append" => Ok(Self::APPEND),
            "overwrite" => Ok(Self::OVERWRITE),
            other => other
                .parse::<u8>()
                .map(Self)
                .map_err(|_| format!("unknown content operation: {}", s)),
        }
    }
}

/// Resolved settings for a single create/write call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arguments {
    pub allow_creation_of_directory_structure: bool,
    pub allow_overwrite: bool,
    pub directory_structure_mode: Mode,
    pub mode: Mode,
    pub content_operation: ContentOperation,
}

impl Arguments {
    /// Defaults for `create_file`
    pub fn for_create_file() -> Self {
        Self {
            allow_creation_of_directory_structure: false,
            allow_overwrite: false,
            directory_structure_mode: Mode::ALL_READ_WRITE_EXECUTE,
            mode: Mode::ALL_READ_WRITE,
            content_operation: ContentOperation::APPEND,
        }
    }

    /// Defaults for `create_directory`. Overwrite does not apply to directories.
    pub fn for_create_directory() -> Self {
        Self {
            allow_creation_of_directory_structure: false,
            allow_overwrite: false,
            directory_structure_mode: Mode::ALL_READ_WRITE_EXECUTE,
            mode: Mode::ALL_READ_WRITE_EXECUTE,
            content_operation: ContentOperation::APPEND,
        }
    }

    /// Defaults for `write_content_to` and `stream_content_to`
    pub fn for_content_write() -> Self {
        Self {
            content_operation: ContentOperation::APPEND,
            ..Self::for_create_file()
        }
    }

    /// Apply `args` in order; the last argument touching a field wins.
    pub fn apply(&mut self, args: &[Argument]) {
        for arg in args {
            arg.apply_to(self);
        }
    }

    pub fn with(mut self, args: &[Argument]) -> Self {
        self.apply(args);
        self
    }
}

/// A single per-call option
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Argument {
    ContentOperation(ContentOperation),
    DirectoryStructureMode(Mode),
    AllowCreationOfDirectoryStructure(bool),
    AllowOverwrite(bool),
    Mode(Mode),
}

impl Argument {
    fn apply_to(self, args: &mut Arguments) {
        match self {
            Argument::ContentOperation(op) => args.content_operation = op,
            Argument::DirectoryStructureMode(mode) => args.directory_structure_mode = mode,
            Argument::AllowCreationOfDirectoryStructure(allow) => {
                args.allow_creation_of_directory_structure = allow
            }
            Argument::AllowOverwrite(allow) => args.allow_overwrite = allow,
            Argument::Mode(mode) => args.mode = mode,
        }
    }
}

pub fn with_content_operation(op: ContentOperation) -> Argument {
    Argument::ContentOperation(op)
}

pub fn with_directory_structure_mode(mode: Mode) -> Argument {
    Argument::DirectoryStructureMode(mode)
}

pub fn with_allow_creation_of_directory_structure(allow: bool) -> Argument {
    Argument::AllowCreationOfDirectoryStructure(allow)
}

pub fn with_allow_overwrite(allow: bool) -> Argument {
    Argument::AllowOverwrite(allow)
}

pub fn with_mode(mode: Mode) -> Argument {
    Argument::Mode(mode)
}
