use std::fs::{self, DirBuilder, File, Metadata, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use fsfacade_platform::{
    Arguments, Content, ContentOperation, ContentReader, FileSystemHandler, HandlerError,
    HandlerResult, Mode,
};
use tracing::{debug, trace};

use crate::handle::{close_file, FileReader};

/// Default handlers backed by the host filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeFileSystem;

impl NativeFileSystem {
    pub fn new() -> Self {
        Self
    }

    /// Parent directory of `path`; a bare file name resolves to the current directory
    fn parent_of(path: &Path) -> &Path {
        match path.parent() {
            Some(parent) if parent.as_os_str().is_empty() => Path::new("."),
            Some(parent) => parent,
            None => path,
        }
    }

    fn stat(path: &Path) -> HandlerResult<Option<Metadata>> {
        match fs::metadata(path) {
            Ok(meta) => Ok(Some(meta)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Make sure `dir` exists as a directory, creating the whole chain when allowed
    fn resolve_directory_structure(dir: &Path, args: &Arguments) -> HandlerResult<()> {
        match Self::stat(dir)? {
            Some(meta) if meta.is_dir() => Ok(()),
            Some(_) => Err(HandlerError::invalid_directory_structure()),
            None => {
                if !args.allow_creation_of_directory_structure {
                    return Err(HandlerError::forbidden_directory_structure());
                }
                debug!(
                    "creating directory structure {} ({})",
                    dir.display(),
                    args.directory_structure_mode
                );
                dir_builder(args.directory_structure_mode)
                    .recursive(true)
                    .create(dir)
                    .map_err(HandlerError::DirectoryStructureCreation)
            }
        }
    }

    fn open_for_content_write(path: &Path, op: ContentOperation) -> HandlerResult<File> {
        let mut options = OpenOptions::new();
        if op.is(ContentOperation::OVERWRITE) {
            options.write(true).truncate(true);
        } else {
            options.append(true);
        }
        options.open(path).map_err(not_found_as_file_not_found)
    }
}

impl FileSystemHandler for NativeFileSystem {
    fn read_content_of(&self, path: &Path) -> HandlerResult<Content> {
        let mut reader = self.stream_content_of(path)?;
        let mut data = Vec::new();
        let drained = reader.read_to_end(&mut data);
        let closed = reader.close();
        drained?;
        closed?;
        Ok(Content::from(data))
    }

    fn stream_content_of(&self, path: &Path) -> HandlerResult<Box<dyn ContentReader>> {
        let file = File::open(path).map_err(not_found_as_file_not_found)?;
        Ok(Box::new(FileReader::new(file)))
    }

    fn check_if_exists(&self, path: &Path) -> HandlerResult<bool> {
        Ok(Self::stat(path)?.is_some())
    }

    fn create_file(&self, path: &Path, args: Arguments) -> HandlerResult<()> {
        Self::resolve_directory_structure(Self::parent_of(path), &args)?;

        match Self::stat(path)? {
            Some(meta) if meta.is_dir() => return Err(HandlerError::Directory),
            Some(_) if !args.allow_overwrite => return Err(HandlerError::FileFound),
            Some(_) => trace!("truncating existing file {}", path.display()),
            None => {}
        }

        let file = file_options(args.mode)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        close_file(file)?;
        Ok(())
    }

    fn write_content_to(
        &self,
        path: &Path,
        content: &[u8],
        args: Arguments,
    ) -> HandlerResult<()> {
        args.content_operation.validate()?;

        let mut file = Self::open_for_content_write(path, args.content_operation)?;
        let outcome = write_counted(&mut file, content)
            .map_err(HandlerError::from)
            .and_then(|written| check_written(written, content.len()));
        let closed = close_file(file);
        outcome?;
        closed?;
        Ok(())
    }

    fn stream_content_to(
        &self,
        path: &Path,
        content: &mut dyn Read,
        args: Arguments,
    ) -> HandlerResult<()> {
        args.content_operation.validate()?;

        let mut file = Self::open_for_content_write(path, args.content_operation)?;
        let outcome = io::copy(content, &mut file);
        let closed = close_file(file);
        let copied = outcome?;
        closed?;
        trace!("streamed {} bytes to {}", copied, path.display());
        Ok(())
    }

    fn create_directory(&self, path: &Path, args: Arguments) -> HandlerResult<()> {
        Self::resolve_directory_structure(Self::parent_of(path), &args)?;

        match Self::stat(path)? {
            Some(meta) if meta.is_dir() => Err(HandlerError::DirectoryFound),
            Some(_) => Err(HandlerError::File),
            None => {
                dir_builder(args.mode).create(path)?;
                Ok(())
            }
        }
    }
}

fn not_found_as_file_not_found(err: io::Error) -> HandlerError {
    if err.kind() == io::ErrorKind::NotFound {
        HandlerError::FileNotFound
    } else {
        HandlerError::Io(err)
    }
}

fn dir_builder(mode: Mode) -> DirBuilder {
    let mut builder = DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode.bits());
    }
    #[cfg(not(unix))]
    let _ = mode;
    builder
}

fn file_options(mode: Mode) -> OpenOptions {
    let mut options = OpenOptions::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode.bits());
    }
    #[cfg(not(unix))]
    let _ = mode;
    options
}

/// Write as much of `content` as the writer accepts. Stops early when the
/// writer reports zero progress so the caller can compare lengths.
fn write_counted<W: Write + ?Sized>(writer: &mut W, content: &[u8]) -> io::Result<usize> {
    let mut written = 0;
    while written < content.len() {
        match writer.write(&content[written..]) {
            Ok(0) => break,
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(written)
}

fn check_written(written: usize, expected: usize) -> HandlerResult<()> {
    if written != expected {
        return Err(HandlerError::WriteLengthMismatch { written, expected });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsfacade_platform::ErrorKind;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn seed(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn create_file_args() -> Arguments {
        Arguments::for_create_file()
    }

    /// Accepts `limit` bytes, then stops making progress
    struct StallingWriter {
        limit: usize,
        accepted: Vec<u8>,
    }

    impl Write for StallingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.limit - self.accepted.len();
            let n = room.min(buf.len()).min(2);
            self.accepted.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_create_file_in_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test-file.txt");

        NativeFileSystem::new().create_file(&path, create_file_args()).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"");
    }

    #[test]
    fn test_create_file_forbids_missing_directory_structure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("path").join("to").join("test-file.txt");

        let err = NativeFileSystem::new()
            .create_file(&path, create_file_args())
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnresolvableDirectoryStructure);
        assert!(!dir.path().join("path").exists());
    }

    #[test]
    fn test_create_file_builds_directory_structure_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("path").join("to").join("test-file.txt");
        let mut args = create_file_args();
        args.allow_creation_of_directory_structure = true;

        NativeFileSystem::new().create_file(&path, args).unwrap();

        assert!(dir.path().join("path").is_dir());
        assert!(dir.path().join("path").join("to").is_dir());
        assert_eq!(fs::read(&path).unwrap(), b"");
    }

    #[test]
    fn test_create_file_keeps_existing_file_without_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = seed(&dir, "test-file.txt", "TEST");

        let err = NativeFileSystem::new()
            .create_file(&path, create_file_args())
            .unwrap_err();

        assert!(matches!(err, HandlerError::FileFound));
        assert_eq!(fs::read_to_string(&path).unwrap(), "TEST");
    }

    #[test]
    fn test_create_file_truncates_when_overwrite_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = seed(&dir, "test-file.txt", "TEST");
        let mut args = create_file_args();
        args.allow_overwrite = true;

        NativeFileSystem::new().create_file(&path, args).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"");
    }

    #[test]
    fn test_create_file_rejects_directory_target_even_with_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("occupied");
        fs::create_dir(&path).unwrap();
        let mut args = create_file_args();
        args.allow_overwrite = true;

        let err = NativeFileSystem::new().create_file(&path, args).unwrap_err();

        assert!(matches!(err, HandlerError::Directory));
        assert!(path.is_dir());
    }

    #[test]
    fn test_create_file_rejects_file_as_parent() {
        let dir = tempfile::tempdir().unwrap();
        let parent = seed(&dir, "not-a-dir", "x");
        let mut args = create_file_args();
        args.allow_creation_of_directory_structure = true;

        let err = NativeFileSystem::new()
            .create_file(&parent.join("child.txt"), args)
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnresolvableDirectoryStructure);
    }

    #[cfg(unix)]
    #[test]
    fn test_create_file_applies_modes() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("secret.txt");
        let mut args = create_file_args();
        args.allow_creation_of_directory_structure = true;
        args.mode = Mode::USER_READ_WRITE;
        args.directory_structure_mode = Mode::USER_READ_WRITE_EXECUTE;

        NativeFileSystem::new().create_file(&path, args).unwrap();

        let file_mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        let dir_mode = fs::metadata(dir.path().join("nested"))
            .unwrap()
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(file_mode, 0o600);
        assert_eq!(dir_mode, 0o700);
    }

    #[test]
    fn test_write_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = seed(&dir, "test-file.txt", "TEST");

        NativeFileSystem::new()
            .write_content_to(&path, b"-MORE", Arguments::for_content_write())
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "TEST-MORE");
    }

    #[test]
    fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = seed(&dir, "test-file.txt", "TEST-LONGER-THAN-REPLACEMENT");
        let mut args = Arguments::for_content_write();
        args.content_operation = ContentOperation::OVERWRITE;

        NativeFileSystem::new()
            .write_content_to(&path, b"OVERWRITE", args)
            .unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "OVERWRITE");
    }

    #[test]
    fn test_write_never_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test-file.txt");

        let err = NativeFileSystem::new()
            .write_content_to(&path, b"Test", Arguments::for_content_write())
            .unwrap_err();

        assert!(matches!(err, HandlerError::FileNotFound));
        assert!(!path.exists());
    }

    #[test]
    fn test_write_validates_operation_before_opening() {
        let dir = tempfile::tempdir().unwrap();
        // a missing file would yield FileNotFound if the open happened first
        let path = dir.path().join("missing.txt");
        let mut args = Arguments::for_content_write();
        args.content_operation = ContentOperation::from_raw(0);

        let err = NativeFileSystem::new()
            .write_content_to(&path, b"Test", args)
            .unwrap_err();

        assert!(matches!(err, HandlerError::UnsupportedContentOperation(0)));
        assert!(!path.exists());
    }

    #[test]
    fn test_stream_write_modes() {
        let dir = tempfile::tempdir().unwrap();
        let path = seed(&dir, "test-file.txt", "TEST");
        let fs_handler = NativeFileSystem::new();

        fs_handler
            .stream_content_to(&path, &mut "-MORE".as_bytes(), Arguments::for_content_write())
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "TEST-MORE");

        let mut args = Arguments::for_content_write();
        args.content_operation = ContentOperation::OVERWRITE;
        fs_handler
            .stream_content_to(&path, &mut "OVERWRITE".as_bytes(), args)
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "OVERWRITE");
    }

    #[test]
    fn test_stream_write_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test-file.txt");

        let err = NativeFileSystem::new()
            .stream_content_to(&path, &mut "Test".as_bytes(), Arguments::for_content_write())
            .unwrap_err();

        assert!(matches!(err, HandlerError::FileNotFound));
        assert!(!path.exists());
    }

    #[test]
    fn test_short_write_is_reported() {
        let mut writer = StallingWriter {
            limit: 3,
            accepted: Vec::new(),
        };

        let written = write_counted(&mut writer, b"TEST-MORE").unwrap();
        assert_eq!(written, 3);
        assert_eq!(writer.accepted, b"TES");

        let err = check_written(written, 9).unwrap_err();
        assert!(matches!(
            err,
            HandlerError::WriteLengthMismatch {
                written: 3,
                expected: 9
            }
        ));
        assert!(check_written(9, 9).is_ok());
    }

    #[test]
    fn test_read_and_stream_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = seed(&dir, "data.txt", "hello");
        let fs_handler = NativeFileSystem::new();

        assert_eq!(fs_handler.read_content_of(&path).unwrap().to_string(), "hello");

        let mut reader = fs_handler.stream_content_of(&path).unwrap();
        let mut out = String::new();
        reader.read_to_string(&mut out).unwrap();
        reader.close().unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing");
        let fs_handler = NativeFileSystem::new();

        assert!(matches!(
            fs_handler.read_content_of(&path),
            Err(HandlerError::FileNotFound)
        ));
        assert!(matches!(
            fs_handler.stream_content_of(&path),
            Err(HandlerError::FileNotFound)
        ));
    }

    #[test]
    fn test_check_if_exists() {
        let dir = tempfile::tempdir().unwrap();
        let file = seed(&dir, "present.txt", "");
        let fs_handler = NativeFileSystem::new();

        assert!(fs_handler.check_if_exists(&file).unwrap());
        assert!(fs_handler.check_if_exists(dir.path()).unwrap());
        assert!(!fs_handler.check_if_exists(&dir.path().join("absent")).unwrap());
    }

    #[test]
    fn test_check_if_exists_below_file_propagates_stat_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = seed(&dir, "f", "x");

        let err = NativeFileSystem::new()
            .check_if_exists(&file.join("child"))
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn test_parent_stat_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let file = seed(&dir, "f", "x");
        let fs_handler = NativeFileSystem::new();
        let mut args = create_file_args();
        args.allow_creation_of_directory_structure = true;

        let err = fs_handler
            .create_file(&file.join("sub").join("x"), args)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);

        // The lookup fails before the creation flag is consulted
        let err = fs_handler
            .create_file(&file.join("sub").join("x"), create_file_args())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);

        let err = fs_handler
            .create_directory(&file.join("sub").join("x"), Arguments::for_create_directory())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(!dir.path().join("sub").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_target_stat_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        seed(&dir, "f", "x");
        // The parent resolves to `dir`, but a trailing slash makes stat on the
        // file itself fail with ENOTDIR
        let target = dir.path().join("f/");
        let mut args = create_file_args();
        args.allow_overwrite = true;

        let err = NativeFileSystem::new().create_file(&target, args).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(fs::read_to_string(dir.path().join("f")).unwrap(), "x");
    }

    #[test]
    fn test_create_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test-directory");

        NativeFileSystem::new()
            .create_directory(&path, Arguments::for_create_directory())
            .unwrap();

        assert!(path.is_dir());
    }

    #[test]
    fn test_create_directory_structure_rules() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("path").join("to").join("test-directory");
        let fs_handler = NativeFileSystem::new();

        let err = fs_handler
            .create_directory(&path, Arguments::for_create_directory())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnresolvableDirectoryStructure);
        assert!(!path.exists());

        let mut args = Arguments::for_create_directory();
        args.allow_creation_of_directory_structure = true;
        fs_handler.create_directory(&path, args).unwrap();
        assert!(path.is_dir());
    }

    #[test]
    fn test_create_directory_never_reuses_entries() {
        let dir = tempfile::tempdir().unwrap();
        let existing_dir = dir.path().join("existing");
        fs::create_dir(&existing_dir).unwrap();
        let existing_file = seed(&dir, "file.txt", "x");
        let fs_handler = NativeFileSystem::new();

        assert!(matches!(
            fs_handler.create_directory(&existing_dir, Arguments::for_create_directory()),
            Err(HandlerError::DirectoryFound)
        ));
        assert!(matches!(
            fs_handler.create_directory(&existing_file, Arguments::for_create_directory()),
            Err(HandlerError::File)
        ));
    }

    #[test]
    fn test_parent_of_bare_name() {
        assert_eq!(NativeFileSystem::parent_of(Path::new("file.txt")), Path::new("."));
        assert_eq!(NativeFileSystem::parent_of(Path::new("a/b")), Path::new("a"));
        assert_eq!(NativeFileSystem::parent_of(Path::new("/")), Path::new("/"));
    }
}
