// Native filesystem handlers

pub mod filesystem;
pub mod handle;

pub use filesystem::NativeFileSystem;
