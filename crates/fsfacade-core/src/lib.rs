// Filesystem facade: handler dispatch, in-memory backend and config

pub mod config;
pub mod error;
pub mod facade;
pub mod memory;

pub use config::FacadeConfig;
pub use error::{Error, Operation, Result};
pub use facade::{Filesystem, FilesystemBuilder};
pub use memory::MemoryFileSystem;
