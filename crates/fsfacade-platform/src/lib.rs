// Shared types and the handler contract for the filesystem facade

pub mod arguments;
pub mod content;
pub mod error;
pub mod filesystem;
pub mod mode;

pub use arguments::{
    with_allow_creation_of_directory_structure, with_allow_overwrite, with_content_operation,
    with_directory_structure_mode, with_mode, Argument, Arguments, ContentOperation,
};
pub use content::{Content, ContentError};
pub use error::{ErrorKind, HandlerError};
pub use filesystem::{ContentReader, FileSystemHandler, HandlerResult};
pub use mode::{Mode, ParseModeError};
