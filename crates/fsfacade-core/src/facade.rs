use std::fmt;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use fsfacade_native::NativeFileSystem;
use fsfacade_platform::{
    Argument, Arguments, Content, ContentReader, FileSystemHandler, HandlerResult,
};
use tracing::{debug, warn};

use crate::error::{Error, Operation, Result};

type ReadContentOfFn = dyn Fn(&Path) -> HandlerResult<Content> + Send + Sync;
type StreamContentOfFn = dyn Fn(&Path) -> HandlerResult<Box<dyn ContentReader>> + Send + Sync;
type CheckIfExistsFn = dyn Fn(&Path) -> HandlerResult<bool> + Send + Sync;
type CreateFileFn = dyn Fn(&Path, Arguments) -> HandlerResult<()> + Send + Sync;
type WriteContentToFn = dyn Fn(&Path, &[u8], Arguments) -> HandlerResult<()> + Send + Sync;
type StreamContentToFn =
    dyn Fn(&Path, &mut dyn Read, Arguments) -> HandlerResult<()> + Send + Sync;
type CreateDirectoryFn = dyn Fn(&Path, Arguments) -> HandlerResult<()> + Send + Sync;

/// Filesystem facade.
///
/// Every operation resolves its per-call [`Arguments`], dispatches to the bound
/// handler and wraps failures with the operation and path. Handlers are fixed at
/// construction, so one instance can be shared freely across threads.
pub struct Filesystem {
    read_content_of: Box<ReadContentOfFn>,
    stream_content_of: Box<StreamContentOfFn>,
    check_if_exists: Box<CheckIfExistsFn>,
    create_file: Box<CreateFileFn>,
    write_content_to: Box<WriteContentToFn>,
    stream_content_to: Box<StreamContentToFn>,
    create_directory: Box<CreateDirectoryFn>,
}

impl Filesystem {
    /// Facade bound to the native filesystem
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Facade bound to a single handler for every operation
    pub fn with_handler(handler: impl FileSystemHandler + 'static) -> Self {
        Self::builder().handler(handler).build()
    }

    pub fn builder() -> FilesystemBuilder {
        FilesystemBuilder::default()
    }

    /// Return the entire content of the file at `path`.
    ///
    /// A missing file surfaces as [`fsfacade_platform::ErrorKind::NotFound`].
    pub fn read_content_of(&self, path: impl AsRef<Path>) -> Result<Content> {
        let path = path.as_ref();
        dispatch(Operation::ReadContentOf, path, || (self.read_content_of)(path))
    }

    /// Return a closable reader over the file at `path`.
    ///
    /// Depending on the handler the content may be streamed from its source or
    /// preloaded. The caller owns the reader and should `close` it.
    pub fn stream_content_of(&self, path: impl AsRef<Path>) -> Result<Box<dyn ContentReader>> {
        let path = path.as_ref();
        dispatch(Operation::StreamContentOf, path, || {
            (self.stream_content_of)(path)
        })
    }

    /// Check whether a file or directory exists at `path`
    pub fn check_if_exists(&self, path: impl AsRef<Path>) -> Result<bool> {
        let path = path.as_ref();
        dispatch(Operation::CheckIfExists, path, || (self.check_if_exists)(path))
    }

    /// Create an empty file at `path`.
    ///
    /// Defaults: mode `0666`, directory-structure mode `0777`, no overwrite,
    /// no creation of missing parent directories.
    pub fn create_file(&self, path: impl AsRef<Path>, args: &[Argument]) -> Result<()> {
        let path = path.as_ref();
        let args = Arguments::for_create_file().with(args);
        dispatch(Operation::CreateFile, path, || (self.create_file)(path, args))
    }

    /// Append (default) or overwrite the content of an existing file
    pub fn write_content_to(
        &self,
        path: impl AsRef<Path>,
        content: impl AsRef<[u8]>,
        args: &[Argument],
    ) -> Result<()> {
        let path = path.as_ref();
        let content = content.as_ref();
        let args = Arguments::for_content_write().with(args);
        dispatch(Operation::WriteContentTo, path, || {
            args.content_operation.validate()?;
            (self.write_content_to)(path, content, args)
        })
    }

    /// Append (default) or overwrite the content of an existing file from a reader
    pub fn stream_content_to(
        &self,
        path: impl AsRef<Path>,
        content: &mut dyn Read,
        args: &[Argument],
    ) -> Result<()> {
        let path = path.as_ref();
        let args = Arguments::for_content_write().with(args);
        dispatch(Operation::StreamContentTo, path, || {
            args.content_operation.validate()?;
            (self.stream_content_to)(path, content, args)
        })
    }

    /// Create a single directory at `path`. Existing entries are never reused.
    pub fn create_directory(&self, path: impl AsRef<Path>, args: &[Argument]) -> Result<()> {
        let path = path.as_ref();
        let args = Arguments::for_create_directory().with(args);
        dispatch(Operation::CreateDirectory, path, || {
            (self.create_directory)(path, args)
        })
    }
}

impl Default for Filesystem {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Filesystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Filesystem").finish_non_exhaustive()
    }
}

fn dispatch<T>(
    operation: Operation,
    path: &Path,
    call: impl FnOnce() -> HandlerResult<T>,
) -> Result<T> {
    debug!("{} {}", operation, path.display());
    call().map_err(|source| {
        warn!("failed to {} {}: {}", operation, path.display(), source);
        Error::new(operation, path, source)
    })
}

/// Assembles a [`Filesystem`], overriding any subset of operation handlers.
///
/// Operations without an override use the base handler, which defaults to
/// [`NativeFileSystem`].
#[derive(Default)]
pub struct FilesystemBuilder {
    base: Option<Arc<dyn FileSystemHandler>>,
    read_content_of: Option<Box<ReadContentOfFn>>,
    stream_content_of: Option<Box<StreamContentOfFn>>,
    check_if_exists: Option<Box<CheckIfExistsFn>>,
    create_file: Option<Box<CreateFileFn>>,
    write_content_to: Option<Box<WriteContentToFn>>,
    stream_content_to: Option<Box<StreamContentToFn>>,
    create_directory: Option<Box<CreateDirectoryFn>>,
}

impl FilesystemBuilder {
    /// Base handler for every operation without an override
    pub fn handler(self, handler: impl FileSystemHandler + 'static) -> Self {
        self.shared_handler(Arc::new(handler))
    }

    pub fn shared_handler(mut self, handler: Arc<dyn FileSystemHandler>) -> Self {
        self.base = Some(handler);
        self
    }

    pub fn read_content_of_handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&Path) -> HandlerResult<Content> + Send + Sync + 'static,
    {
        self.read_content_of = Some(Box::new(f));
        self
    }

    pub fn stream_content_of_handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&Path) -> HandlerResult<Box<dyn ContentReader>> + Send + Sync + 'static,
    {
        self.stream_content_of = Some(Box::new(f));
        self
    }

    pub fn check_if_exists_handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&Path) -> HandlerResult<bool> + Send + Sync + 'static,
    {
        self.check_if_exists = Some(Box::new(f));
        self
    }

    pub fn create_file_handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&Path, Arguments) -> HandlerResult<()> + Send + Sync + 'static,
    {
        self.create_file = Some(Box::new(f));
        self
    }

    pub fn write_content_to_handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&Path, &[u8], Arguments) -> HandlerResult<()> + Send + Sync + 'static,
    {
        self.write_content_to = Some(Box::new(f));
        self
    }

    pub fn stream_content_to_handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&Path, &mut dyn Read, Arguments) -> HandlerResult<()> + Send + Sync + 'static,
    {
        self.stream_content_to = Some(Box::new(f));
        self
    }

    pub fn create_directory_handler<F>(mut self, f: F) -> Self
    where
        F: Fn(&Path, Arguments) -> HandlerResult<()> + Send + Sync + 'static,
    {
        self.create_directory = Some(Box::new(f));
        self
    }

    pub fn build(self) -> Filesystem {
        let base: Arc<dyn FileSystemHandler> = self
            .base
            .unwrap_or_else(|| Arc::new(NativeFileSystem::new()));

        Filesystem {
            read_content_of: self.read_content_of.unwrap_or_else(|| {
                let base = Arc::clone(&base);
                Box::new(move |path: &Path| base.read_content_of(path))
            }),
            stream_content_of: self.stream_content_of.unwrap_or_else(|| {
                let base = Arc::clone(&base);
                Box::new(move |path: &Path| base.stream_content_of(path))
            }),
            check_if_exists: self.check_if_exists.unwrap_or_else(|| {
                let base = Arc::clone(&base);
                Box::new(move |path: &Path| base.check_if_exists(path))
            }),
            create_file: self.create_file.unwrap_or_else(|| {
                let base = Arc::clone(&base);
                Box::new(move |path: &Path, args: Arguments| base.create_file(path, args))
            }),
            write_content_to: self.write_content_to.unwrap_or_else(|| {
                let base = Arc::clone(&base);
                Box::new(move |path: &Path, content: &[u8], args: Arguments| {
                    base.write_content_to(path, content, args)
                })
            }),
            stream_content_to: self.stream_content_to.unwrap_or_else(|| {
                let base = Arc::clone(&base);
                Box::new(move |path: &Path, content: &mut dyn Read, args: Arguments| {
                    base.stream_content_to(path, content, args)
                })
            }),
            create_directory: self.create_directory.unwrap_or_else(|| {
                Box::new(move |path: &Path, args: Arguments| base.create_directory(path, args))
            }),
        }
    }
}
