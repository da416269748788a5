use std::fs::File;
use std::io::{self, BufReader, Read};

use fsfacade_platform::ContentReader;

/// Close `file` and report the result instead of discarding it on drop.
#[cfg(unix)]
pub fn close_file(file: File) -> io::Result<()> {
    use std::os::fd::IntoRawFd;

    nix::unistd::close(file.into_raw_fd()).map_err(io::Error::from)
}

#[cfg(not(unix))]
pub fn close_file(file: File) -> io::Result<()> {
    drop(file);
    Ok(())
}

/// Buffered read side of an open file
pub struct FileReader {
    inner: BufReader<File>,
}

impl FileReader {
    pub fn new(file: File) -> Self {
        Self {
            inner: BufReader::new(file),
        }
    }
}

impl Read for FileReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl ContentReader for FileReader {
    fn close(self: Box<Self>) -> io::Result<()> {
        close_file(self.inner.into_inner())
    }
}
