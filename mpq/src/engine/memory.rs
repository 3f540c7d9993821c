//! In-memory archive engine
//!
//! [`MemoryEngine`] serves archive images registered under a path instead of
//! reading files from disk. It follows the same rules as a native engine:
//! names are case-insensitive, `/` and `\` are interchangeable, engine-level
//! patch archives overlay the base archive, and a missing `(listfile)` is
//! just a missing entry.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::engine::ArchiveEngine;
use crate::flags::{InfoField, OpenFlags, SearchScope, SeekOrigin};
use crate::path::{lookup_key, to_archive_name};
use crate::{reserved, Error, Result};

/// One stored entry of an [`ArchiveImage`]
#[derive(Debug, Clone)]
pub struct MemoryEntry {
    name: String,
    data: Rc<[u8]>,
    compressed_size: u64,
    file_time: u64,
}

impl MemoryEntry {
    /// Create an entry; the compressed size defaults to the data length
    pub fn new<S: Into<String>, D: Into<Vec<u8>>>(name: S, data: D) -> Self {
        let data: Vec<u8> = data.into();
        Self {
            name: to_archive_name(&name.into()),
            compressed_size: data.len() as u64,
            data: data.into(),
            file_time: 0,
        }
    }

    /// Set the stored (compressed) size reported for this entry
    pub fn with_compressed_size(mut self, size: u64) -> Self {
        self.compressed_size = size;
        self
    }

    /// Set the modification time as a Windows FILETIME
    pub fn with_file_time(mut self, file_time: u64) -> Self {
        self.file_time = file_time;
        self
    }

    /// Name as stored in the archive (backslash separated)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Entry contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// Contents of one archive as seen by [`MemoryEngine`]
#[derive(Debug, Clone, Default)]
pub struct ArchiveImage {
    entries: BTreeMap<String, MemoryEntry>,
    corrupt: bool,
}

impl ArchiveImage {
    /// Create an empty image
    pub fn new() -> Self {
        Self::default()
    }

    /// An image the engine refuses to open, as if the file were damaged
    pub fn corrupt() -> Self {
        Self {
            entries: BTreeMap::new(),
            corrupt: true,
        }
    }

    /// Add a file with default metadata
    pub fn with_file<S: Into<String>, D: Into<Vec<u8>>>(self, name: S, data: D) -> Self {
        self.with_entry(MemoryEntry::new(name, data))
    }

    /// Add a prepared entry, replacing any entry with the same name
    pub fn with_entry(mut self, entry: MemoryEntry) -> Self {
        self.entries.insert(lookup_key(&entry.name), entry);
        self
    }

    /// Store a `(listfile)` naming every entry added so far
    ///
    /// The listfile is CRLF separated with backslash paths, like the ones
    /// written by Blizzard's tools.
    pub fn with_listfile(self) -> Self {
        let mut listfile = String::new();
        for entry in self.entries.values() {
            if entry.name == reserved::LISTFILE || entry.name == reserved::ATTRIBUTES {
                continue;
            }
            listfile.push_str(&entry.name);
            listfile.push_str("\r\n");
        }
        self.with_file(reserved::LISTFILE, listfile.into_bytes())
    }

    /// Number of stored entries, including special files
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the image has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get(&self, name: &str) -> Option<&MemoryEntry> {
        self.entries.get(&lookup_key(name))
    }
}

/// Handle to an archive opened by [`MemoryEngine`]
#[derive(Debug)]
pub struct MemoryArchive {
    handle: u32,
}

/// Handle to an entry opened by [`MemoryEngine`]
#[derive(Debug)]
pub struct MemoryFile {
    entry: MemoryEntry,
    position: u64,
}

#[derive(Debug)]
struct Patch {
    image: Rc<ArchiveImage>,
    prefix: Option<String>,
}

#[derive(Debug)]
struct OpenArchive {
    image: Rc<ArchiveImage>,
    patches: Vec<Patch>,
}

impl OpenArchive {
    fn find(&self, name: &str, scope: SearchScope) -> Option<&MemoryEntry> {
        if scope == SearchScope::Patched {
            // Most recently attached patch wins
            for patch in self.patches.iter().rev() {
                let found = match &patch.prefix {
                    Some(prefix) => patch.image.get(&format!("{prefix}\\{name}")),
                    None => patch.image.get(name),
                };
                if found.is_some() {
                    return found;
                }
            }
        }
        self.image.get(name)
    }
}

#[derive(Debug, Default)]
struct State {
    images: HashMap<PathBuf, Rc<ArchiveImage>>,
    archives: HashMap<u32, OpenArchive>,
    next_handle: u32,
    open_files: usize,
}

/// Archive engine backed by in-memory images
///
/// Images are snapshotted when an archive is opened, so registering a new
/// image under the same path only affects later opens. The engine is not
/// thread-safe, matching the single-owner handle model.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    state: RefCell<State>,
}

impl MemoryEngine {
    /// Create an engine with no archives
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an archive image under `path`
    pub fn insert_archive<P: Into<PathBuf>>(&self, path: P, image: ArchiveImage) {
        self.state
            .borrow_mut()
            .images
            .insert(path.into(), Rc::new(image));
    }

    /// Number of archive handles currently open
    pub fn open_archive_count(&self) -> usize {
        self.state.borrow().archives.len()
    }

    /// Number of file handles currently open
    pub fn open_file_count(&self) -> usize {
        self.state.borrow().open_files
    }

    fn image(&self, path: &Path) -> Result<Rc<ArchiveImage>> {
        let state = self.state.borrow();
        let image = state
            .images
            .get(path)
            .ok_or_else(|| Error::open(path, "No such file or directory"))?;
        if image.corrupt {
            return Err(Error::open(path, "Archive is corrupted"));
        }
        Ok(Rc::clone(image))
    }

    fn with_archive<T>(
        &self,
        archive: &MemoryArchive,
        operation: &'static str,
        f: impl FnOnce(&OpenArchive) -> Result<T>,
    ) -> Result<T> {
        let state = self.state.borrow();
        let open = state
            .archives
            .get(&archive.handle)
            .ok_or_else(|| Error::engine(operation, "Invalid handle"))?;
        f(open)
    }
}

impl ArchiveEngine for MemoryEngine {
    type Archive = MemoryArchive;
    type File = MemoryFile;

    fn open_archive(&self, path: &Path, _flags: OpenFlags) -> Result<MemoryArchive> {
        let image = self.image(path)?;

        let mut state = self.state.borrow_mut();
        state.next_handle += 1;
        let handle = state.next_handle;
        state.archives.insert(
            handle,
            OpenArchive {
                image,
                patches: Vec::new(),
            },
        );

        log::trace!("Opened in-memory archive {} as #{}", path.display(), handle);
        Ok(MemoryArchive { handle })
    }

    fn close_archive(&self, archive: MemoryArchive) -> Result<()> {
        self.state
            .borrow_mut()
            .archives
            .remove(&archive.handle)
            .map(|_| ())
            .ok_or_else(|| Error::engine("close_archive", "Invalid handle"))
    }

    fn has_file(&self, archive: &MemoryArchive, name: &str) -> Result<bool> {
        self.with_archive(archive, "has_file", |open| {
            Ok(open.find(name, SearchScope::Patched).is_some())
        })
    }

    fn open_file(
        &self,
        archive: &MemoryArchive,
        name: &str,
        scope: SearchScope,
    ) -> Result<MemoryFile> {
        let entry = self.with_archive(archive, "open_file", |open| {
            open.find(name, scope)
                .cloned()
                .ok_or_else(|| Error::FileNotFound(name.to_string()))
        })?;

        self.state.borrow_mut().open_files += 1;
        Ok(MemoryFile { entry, position: 0 })
    }

    fn close_file(&self, _file: MemoryFile) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.open_files = state.open_files.saturating_sub(1);
        Ok(())
    }

    fn read(&self, file: &mut MemoryFile, buf: &mut [u8]) -> Result<usize> {
        let data = file.entry.data();
        let start = usize::try_from(file.position)
            .unwrap_or(usize::MAX)
            .min(data.len());
        let count = buf.len().min(data.len() - start);

        buf[..count].copy_from_slice(&data[start..start + count]);
        file.position += count as u64;
        Ok(count)
    }

    fn seek(&self, file: &mut MemoryFile, offset: i64, origin: SeekOrigin) -> Result<u64> {
        let base = match origin {
            SeekOrigin::Start => 0,
            SeekOrigin::Current => file.position as i64,
            SeekOrigin::End => file.entry.data.len() as i64,
        };
        let position = base.saturating_add(offset);
        if position < 0 {
            return Err(Error::NegativeSeek { position });
        }

        file.position = position as u64;
        Ok(file.position)
    }

    fn file_size(&self, file: &MemoryFile) -> Result<u64> {
        Ok(file.entry.data.len() as u64)
    }

    fn file_info(&self, file: &MemoryFile, field: InfoField) -> Result<u64> {
        Ok(match field {
            InfoField::FileTime => file.entry.file_time,
            InfoField::CompressedSize => file.entry.compressed_size,
            InfoField::FileSize => file.entry.data.len() as u64,
        })
    }

    fn file_name(&self, file: &MemoryFile) -> Result<String> {
        Ok(file.entry.name.clone())
    }

    fn extract(
        &self,
        archive: &MemoryArchive,
        name: &str,
        dest: &Path,
        scope: SearchScope,
    ) -> Result<()> {
        let data = self.with_archive(archive, "extract", |open| {
            open.find(name, scope)
                .map(|entry| Rc::clone(&entry.data))
                .ok_or_else(|| Error::FileNotFound(name.to_string()))
        })?;

        fs::write(dest, &data)?;
        Ok(())
    }

    fn open_patch_archive(
        &self,
        archive: &MemoryArchive,
        path: &Path,
        prefix: Option<&str>,
    ) -> Result<()> {
        let image = self.image(path)?;

        let mut state = self.state.borrow_mut();
        let open = state
            .archives
            .get_mut(&archive.handle)
            .ok_or_else(|| Error::engine("open_patch_archive", "Invalid handle"))?;
        open.patches.push(Patch {
            image,
            prefix: prefix.map(to_archive_name),
        });
        Ok(())
    }

    fn is_patched(&self, archive: &MemoryArchive) -> Result<bool> {
        self.with_archive(archive, "is_patched", |open| Ok(!open.patches.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(path: &str, image: ArchiveImage) -> MemoryEngine {
        let engine = MemoryEngine::new();
        engine.insert_archive(path, image);
        engine
    }

    #[test]
    fn test_open_missing_archive() {
        let engine = MemoryEngine::new();
        let result = engine.open_archive(Path::new("missing.mpq"), OpenFlags::default());
        assert!(matches!(result, Err(Error::Open { .. })));
    }

    #[test]
    fn test_open_corrupt_archive() {
        let engine = engine_with("bad.mpq", ArchiveImage::corrupt());
        let result = engine.open_archive(Path::new("bad.mpq"), OpenFlags::default());
        assert!(matches!(result, Err(Error::Open { .. })));
    }

    #[test]
    fn test_names_are_case_and_separator_insensitive() {
        let engine = engine_with(
            "a.mpq",
            ArchiveImage::new().with_file("Dir\\File.txt", b"x".to_vec()),
        );
        let archive = engine
            .open_archive(Path::new("a.mpq"), OpenFlags::default())
            .unwrap();

        assert!(engine.has_file(&archive, "dir/file.TXT").unwrap());
        assert!(!engine.has_file(&archive, "dir/other.txt").unwrap());
        engine.close_archive(archive).unwrap();
    }

    #[test]
    fn test_generated_listfile() {
        let image = ArchiveImage::new()
            .with_file("b.txt", b"".to_vec())
            .with_file("a/c.txt", b"".to_vec())
            .with_listfile();
        let listfile = image.get(reserved::LISTFILE).unwrap();
        assert_eq!(listfile.data(), b"a\\c.txt\r\nb.txt\r\n");
    }

    #[test]
    fn test_read_and_seek() {
        let engine = engine_with(
            "a.mpq",
            ArchiveImage::new().with_file("f.bin", b"0123456789".to_vec()),
        );
        let archive = engine
            .open_archive(Path::new("a.mpq"), OpenFlags::default())
            .unwrap();
        let mut file = engine
            .open_file(&archive, "f.bin", SearchScope::Patched)
            .unwrap();

        let mut buf = [0u8; 4];
        assert_eq!(engine.read(&mut file, &mut buf).unwrap(), 4);
        assert_eq!(&buf, b"0123");

        assert_eq!(engine.seek(&mut file, -2, SeekOrigin::End).unwrap(), 8);
        assert_eq!(engine.read(&mut file, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"89");

        assert_eq!(engine.seek(&mut file, 100, SeekOrigin::Start).unwrap(), 100);
        assert_eq!(engine.read(&mut file, &mut buf).unwrap(), 0);

        assert!(matches!(
            engine.seek(&mut file, -1, SeekOrigin::Start),
            Err(Error::NegativeSeek { position: -1 })
        ));

        assert_eq!(engine.open_file_count(), 1);
        engine.close_file(file).unwrap();
        assert_eq!(engine.open_file_count(), 0);
        engine.close_archive(archive).unwrap();
    }

    #[test]
    fn test_patch_overlay_with_prefix() {
        let engine = engine_with(
            "base.mpq",
            ArchiveImage::new().with_file("data.txt", b"base".to_vec()),
        );
        engine.insert_archive(
            "patch.mpq",
            ArchiveImage::new().with_file("enUS\\data.txt", b"patched".to_vec()),
        );

        let archive = engine
            .open_archive(Path::new("base.mpq"), OpenFlags::default())
            .unwrap();
        assert!(!engine.is_patched(&archive).unwrap());

        engine
            .open_patch_archive(&archive, Path::new("patch.mpq"), Some("enUS"))
            .unwrap();
        assert!(engine.is_patched(&archive).unwrap());

        let patched = engine
            .open_file(&archive, "data.txt", SearchScope::Patched)
            .unwrap();
        assert_eq!(patched.entry.data(), b"patched");

        let base = engine
            .open_file(&archive, "data.txt", SearchScope::BaseOnly)
            .unwrap();
        assert_eq!(base.entry.data(), b"base");

        engine.close_file(patched).unwrap();
        engine.close_file(base).unwrap();
        engine.close_archive(archive).unwrap();
    }

    #[test]
    fn test_closed_handle_is_rejected() {
        let engine = engine_with("a.mpq", ArchiveImage::new());
        let archive = engine
            .open_archive(Path::new("a.mpq"), OpenFlags::default())
            .unwrap();
        let stale = MemoryArchive {
            handle: archive.handle,
        };
        engine.close_archive(archive).unwrap();

        assert!(matches!(
            engine.has_file(&stale, "x"),
            Err(Error::Engine { .. })
        ));
    }
}
