use std::io::{self, Cursor, Read};
use std::path::Path;

use crate::arguments::Arguments;
use crate::content::Content;
use crate::error::HandlerError;

pub type HandlerResult<T> = Result<T, HandlerError>;

/// A readable byte source whose release can be observed.
///
/// Dropping the reader also releases it, but `close` reports the result.
pub trait ContentReader: Read + Send {
    fn close(self: Box<Self>) -> io::Result<()>;
}

impl ContentReader for Cursor<Vec<u8>> {
    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

impl ContentReader for Cursor<Content> {
    fn close(self: Box<Self>) -> io::Result<()> {
        Ok(())
    }
}

/// Backend for every filesystem operation the facade exposes.
///
/// `Arguments` arrive fully resolved; implementations apply the policy for
/// directory-structure creation, overwrite protection and content mode.
pub trait FileSystemHandler: Send + Sync {
    /// Read the whole file at `path`
    fn read_content_of(&self, path: &Path) -> HandlerResult<Content>;

    /// Open the file at `path` for lazy reading
    fn stream_content_of(&self, path: &Path) -> HandlerResult<Box<dyn ContentReader>>;

    /// Whether any entry (file or directory) exists at `path`
    fn check_if_exists(&self, path: &Path) -> HandlerResult<bool>;

    /// Create an empty file at `path`
    fn create_file(&self, path: &Path, args: Arguments) -> HandlerResult<()>;

    /// Append or overwrite the content of an existing file
    fn write_content_to(&self, path: &Path, content: &[u8], args: Arguments)
        -> HandlerResult<()>;

    /// Same as `write_content_to`, copying from a reader
    fn stream_content_to(
        &self,
        path: &Path,
        content: &mut dyn Read,
        args: Arguments,
    ) -> HandlerResult<()>;

    /// Create a single directory level at `path`
    fn create_directory(&self, path: &Path, args: Arguments) -> HandlerResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_reader_close() {
        let mut reader: Box<dyn ContentReader> = Box::new(Cursor::new(b"TEST".to_vec()));
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        assert_eq!(out, "TEST");
        assert!(reader.close().is_ok());
    }

    #[test]
    fn test_content_cursor_reader() {
        let mut reader: Box<dyn ContentReader> = Box::new(Cursor::new(Content::from("abc")));
        let mut out = Vec::new();
        reader.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"abc");
    }
}
