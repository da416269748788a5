use std::collections::BTreeMap;
use std::io::{self, Cursor, Read};
use std::path::{Component, Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use anyhow::anyhow;
use fsfacade_platform::{
    Arguments, Content, ContentOperation, ContentReader, FileSystemHandler, HandlerError,
    HandlerResult, Mode,
};
use tracing::trace;

#[derive(Debug, Clone)]
enum Entry {
    File { data: Vec<u8>, mode: Mode },
    Directory { mode: Mode },
}

/// In-memory handler applying the same creation and write policy as the
/// native one. Paths are resolved against a virtual root `/`; `.` and `..`
/// components are folded lexically.
#[derive(Debug)]
pub struct MemoryFileSystem {
    entries: Mutex<BTreeMap<PathBuf, Entry>>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(
            PathBuf::from("/"),
            Entry::Directory {
                mode: Mode::ALL_READ_WRITE_EXECUTE,
            },
        );
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Seed a file, creating any missing parents
    pub fn with_file(self, path: impl AsRef<Path>, data: impl Into<Vec<u8>>) -> Self {
        self.seed(
            path.as_ref(),
            Entry::File {
                data: data.into(),
                mode: Mode::ALL_READ_WRITE,
            },
        );
        self
    }

    /// Seed a directory, creating any missing parents
    pub fn with_directory(self, path: impl AsRef<Path>) -> Self {
        self.seed(
            path.as_ref(),
            Entry::Directory {
                mode: Mode::ALL_READ_WRITE_EXECUTE,
            },
        );
        self
    }

    /// Mode recorded for the entry at `path`
    pub fn mode_of(&self, path: impl AsRef<Path>) -> Option<Mode> {
        let entries = self.inspect();
        entries.get(&normalize(path.as_ref())).map(|entry| match entry {
            Entry::File { mode, .. } | Entry::Directory { mode } => *mode,
        })
    }

    pub fn is_directory(&self, path: impl AsRef<Path>) -> bool {
        matches!(
            self.inspect().get(&normalize(path.as_ref())),
            Some(Entry::Directory { .. })
        )
    }

    /// Number of entries, including the root directory
    pub fn entry_count(&self) -> usize {
        self.inspect().len()
    }

    // Seeding and inspection run outside handler calls, so a poisoned lock
    // still yields the map as the last writer left it.
    fn inspect(&self) -> MutexGuard<'_, BTreeMap<PathBuf, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn seed(&self, path: &Path, entry: Entry) {
        let path = normalize(path);
        let mut entries = self.inspect();
        seed_parents(&mut entries, &path);
        entries.insert(path, entry);
    }

    fn lock(&self) -> HandlerResult<MutexGuard<'_, BTreeMap<PathBuf, Entry>>> {
        self.entries
            .lock()
            .map_err(|_| HandlerError::Other(anyhow!("memory filesystem lock poisoned")))
    }

    fn resolve_directory_structure(
        entries: &mut BTreeMap<PathBuf, Entry>,
        dir: &Path,
        args: &Arguments,
    ) -> HandlerResult<()> {
        match entries.get(dir) {
            Some(Entry::Directory { .. }) => return Ok(()),
            Some(Entry::File { .. }) => return Err(HandlerError::invalid_directory_structure()),
            None => {}
        }
        // A file further up makes the lookup itself fail, whatever the flags say
        check_ancestors(entries, dir)?;
        if !args.allow_creation_of_directory_structure {
            return Err(HandlerError::forbidden_directory_structure());
        }

        let missing: Vec<PathBuf> = dir
            .ancestors()
            .take_while(|ancestor| !entries.contains_key(*ancestor))
            .map(Path::to_path_buf)
            .collect();
        for path in missing.into_iter().rev() {
            trace!("creating directory {}", path.display());
            entries.insert(
                path,
                Entry::Directory {
                    mode: args.directory_structure_mode,
                },
            );
        }
        Ok(())
    }

    fn write(&self, path: &Path, content: &[u8], args: Arguments) -> HandlerResult<()> {
        args.content_operation.validate()?;

        let path = normalize(path);
        let mut entries = self.lock()?;
        match entries.get_mut(&path) {
            Some(Entry::File { data, .. }) => {
                if args.content_operation.is(ContentOperation::OVERWRITE) {
                    data.clear();
                }
                data.extend_from_slice(content);
                Ok(())
            }
            Some(Entry::Directory { .. }) => Err(HandlerError::Directory),
            None => Err(missing_entry(&entries, &path)),
        }
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystemHandler for MemoryFileSystem {
    fn read_content_of(&self, path: &Path) -> HandlerResult<Content> {
        let path = normalize(path);
        let entries = self.lock()?;
        match entries.get(&path) {
            Some(Entry::File { data, .. }) => Ok(Content::from(data.clone())),
            Some(Entry::Directory { .. }) => Err(HandlerError::Directory),
            None => Err(missing_entry(&entries, &path)),
        }
    }

    fn stream_content_of(&self, path: &Path) -> HandlerResult<Box<dyn ContentReader>> {
        let content = self.read_content_of(path)?;
        Ok(Box::new(Cursor::new(content)))
    }

    fn check_if_exists(&self, path: &Path) -> HandlerResult<bool> {
        let path = normalize(path);
        let entries = self.lock()?;
        if entries.contains_key(&path) {
            return Ok(true);
        }
        check_ancestors(&entries, &path)?;
        Ok(false)
    }

    fn create_file(&self, path: &Path, args: Arguments) -> HandlerResult<()> {
        let path = normalize(path);
        let mut entries = self.lock()?;
        Self::resolve_directory_structure(&mut entries, parent_of(&path), &args)?;

        match entries.get(&path) {
            Some(Entry::Directory { .. }) => return Err(HandlerError::Directory),
            Some(Entry::File { .. }) if !args.allow_overwrite => {
                return Err(HandlerError::FileFound)
            }
            _ => {}
        }
        entries.insert(
            path,
            Entry::File {
                data: Vec::new(),
                mode: args.mode,
            },
        );
        Ok(())
    }

    fn write_content_to(
        &self,
        path: &Path,
        content: &[u8],
        args: Arguments,
    ) -> HandlerResult<()> {
        self.write(path, content, args)
    }

    fn stream_content_to(
        &self,
        path: &Path,
        content: &mut dyn Read,
        args: Arguments,
    ) -> HandlerResult<()> {
        args.content_operation.validate()?;
        {
            let target = normalize(path);
            let entries = self.lock()?;
            match entries.get(&target) {
                Some(Entry::File { .. }) => {}
                Some(Entry::Directory { .. }) => return Err(HandlerError::Directory),
                None => return Err(missing_entry(&entries, &target)),
            }
        }
        let mut buffer = Vec::new();
        content.read_to_end(&mut buffer)?;
        self.write(path, &buffer, args)
    }

    fn create_directory(&self, path: &Path, args: Arguments) -> HandlerResult<()> {
        let path = normalize(path);
        let mut entries = self.lock()?;
        Self::resolve_directory_structure(&mut entries, parent_of(&path), &args)?;

        match entries.get(&path) {
            Some(Entry::Directory { .. }) => Err(HandlerError::DirectoryFound),
            Some(Entry::File { .. }) => Err(HandlerError::File),
            None => {
                entries.insert(path, Entry::Directory { mode: args.mode });
                Ok(())
            }
        }
    }
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::ParentDir => {
                out.pop();
            }
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    out
}

fn parent_of(path: &Path) -> &Path {
    path.parent().unwrap_or(path)
}

/// Fails the way a native lookup does when a file sits between the root and
/// `path`.
fn check_ancestors(entries: &BTreeMap<PathBuf, Entry>, path: &Path) -> HandlerResult<()> {
    for ancestor in path.ancestors().skip(1) {
        if let Some(Entry::File { .. }) = entries.get(ancestor) {
            return Err(HandlerError::Io(io::Error::new(
                io::ErrorKind::NotADirectory,
                format!("{} is not a directory", ancestor.display()),
            )));
        }
    }
    Ok(())
}

fn missing_entry(entries: &BTreeMap<PathBuf, Entry>, path: &Path) -> HandlerError {
    match check_ancestors(entries, path) {
        Err(err) => err,
        Ok(()) => HandlerError::FileNotFound,
    }
}

fn seed_parents(entries: &mut BTreeMap<PathBuf, Entry>, path: &Path) {
    for ancestor in path.ancestors().skip(1) {
        entries
            .entry(ancestor.to_path_buf())
            .or_insert(Entry::Directory {
                mode: Mode::ALL_READ_WRITE_EXECUTE,
            });
    }
}
