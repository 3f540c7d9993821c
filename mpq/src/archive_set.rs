//! Ordered sets of archives forming a patch chain
//!
//! An [`ArchiveSet`] owns every archive it attaches and resolves names
//! against them in [`Priority`] order. The combined `(listfile)` listing is
//! cached and rebuilt only after the set changes.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::archive::{Archive, ArchiveId, Priority};
use crate::engine::ArchiveEngine;
use crate::file::{ArchiveFile, Entry, FileRef};
use crate::flags::{OpenFlags, SearchScope};
use crate::path::local_path;
use crate::special_files::parse_listfile;
use crate::{reserved, Error, Result};

/// Combined listing of all archives, rebuilt lazily
#[derive(Debug)]
struct ListingCache {
    names: BTreeSet<String>,
    stale: bool,
}

impl ListingCache {
    fn new() -> Self {
        Self {
            names: BTreeSet::new(),
            stale: true,
        }
    }

    fn invalidate(&mut self) {
        self.stale = true;
    }
}

/// Outcome of [`ArchiveSet::extract_all`]
#[derive(Debug, Default)]
pub struct ExtractSummary {
    /// Local paths written
    pub written: Vec<PathBuf>,
    /// Listed names no archive holds
    pub skipped: Vec<String>,
    /// Names that were found but could not be extracted
    pub failed: Vec<(String, Error)>,
}

impl ExtractSummary {
    /// True when no entry failed
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// A patch chain of archives opened through one engine
///
/// # Examples
///
/// ```
/// use mpq::engine::memory::{ArchiveImage, MemoryEngine};
/// use mpq::{ArchiveSet, OpenFlags, Priority};
///
/// # fn main() -> Result<(), mpq::Error> {
/// let engine = MemoryEngine::new();
/// engine.insert_archive("a.mpq", ArchiveImage::new().with_file("x.txt", b"a".to_vec()));
/// engine.insert_archive("b.mpq", ArchiveImage::new().with_file("x.txt", b"b".to_vec()));
///
/// let mut set = ArchiveSet::with_priority(engine, Priority::FirstAttachedFirst);
/// set.attach("a.mpq", OpenFlags::default())?;
/// set.attach("b.mpq", OpenFlags::default())?;
///
/// assert_eq!(set.resolve("x.txt")?.name(), "a.mpq");
/// # Ok(())
/// # }
/// ```
pub struct ArchiveSet<E: ArchiveEngine> {
    engine: E,
    priority: Priority,
    /// Archives in attach order
    archives: Vec<Archive<E::Archive>>,
    listing: ListingCache,
    closed: bool,
}

impl<E: ArchiveEngine> ArchiveSet<E> {
    /// Create an empty set where later-attached archives take precedence
    pub fn new(engine: E) -> Self {
        Self::with_priority(engine, Priority::default())
    }

    /// Create an empty set with an explicit priority policy
    pub fn with_priority(engine: E, priority: Priority) -> Self {
        Self {
            engine,
            priority,
            archives: Vec::new(),
            listing: ListingCache::new(),
            closed: false,
        }
    }

    /// The engine all archives are opened through
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The priority policy of this set
    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Number of attached archives
    pub fn len(&self) -> usize {
        self.archives.len()
    }

    /// Check if no archives are attached
    pub fn is_empty(&self) -> bool {
        self.archives.is_empty()
    }

    /// Check if [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            Err(Error::Closed)
        } else {
            Ok(())
        }
    }

    /// Open an archive and append it to the set
    pub fn attach<P: AsRef<Path>>(&mut self, path: P, flags: OpenFlags) -> Result<ArchiveId> {
        self.ensure_open()?;

        let path = path.as_ref();
        let handle = self.engine.open_archive(path, flags)?;
        let id = ArchiveId(self.archives.len());

        log::debug!("Attached {} as archive {}", path.display(), id);
        self.archives
            .push(Archive::new(id, path.to_path_buf(), flags, handle));
        self.listing.invalidate();

        Ok(id)
    }

    /// Attached archives in priority order
    pub fn archives(&self) -> impl Iterator<Item = &Archive<E::Archive>> + '_ {
        let len = self.archives.len();
        let forward = self.priority == Priority::FirstAttachedFirst;
        (0..len).map(move |i| {
            if forward {
                &self.archives[i]
            } else {
                &self.archives[len - 1 - i]
            }
        })
    }

    /// Look up an archive by id
    pub fn archive(&self, id: ArchiveId) -> Result<&Archive<E::Archive>> {
        self.ensure_open()?;
        self.archives
            .get(id.0)
            .ok_or(Error::UnknownArchive(id.0))
    }

    /// Check whether any attached archive contains `name`
    ///
    /// Always asks the engine; the answer is never cached.
    pub fn contains(&self, name: &str) -> Result<bool> {
        self.ensure_open()?;
        for archive in self.archives() {
            if self.engine.has_file(&archive.handle, name)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// The first archive in priority order that contains `name`
    pub fn resolve(&self, name: &str) -> Result<&Archive<E::Archive>> {
        self.ensure_open()?;
        for archive in self.archives() {
            log::trace!("Probing {} for {}", archive.path().display(), name);
            if self.engine.has_file(&archive.handle, name)? {
                log::debug!("Resolved {} to {}", name, archive.path().display());
                return Ok(archive);
            }
        }
        Err(Error::FileNotFound(name.to_string()))
    }

    /// Every archive containing `name`, in priority order
    ///
    /// The first element is the one [`resolve`](Self::resolve) returns; the
    /// rest are shadowed by it.
    pub fn archives_containing(&self, name: &str) -> Result<Vec<&Archive<E::Archive>>> {
        self.ensure_open()?;
        let mut found = Vec::new();
        for archive in self.archives() {
            if self.engine.has_file(&archive.handle, name)? {
                found.push(archive);
            }
        }
        Ok(found)
    }

    fn locate(&self, file: FileRef<'_>) -> Result<&Archive<E::Archive>> {
        match file {
            FileRef::Name(name) => self.resolve(name),
            FileRef::Resolved(entry) => self.archive(entry.archive()),
        }
    }

    /// Open an entry with the engine's patch overlay applied
    pub fn open<'r, F: Into<FileRef<'r>>>(&self, file: F) -> Result<ArchiveFile<'_, E>> {
        self.open_with(file, SearchScope::Patched)
    }

    /// Open an entry with an explicit engine search scope
    pub fn open_with<'r, F: Into<FileRef<'r>>>(
        &self,
        file: F,
        scope: SearchScope,
    ) -> Result<ArchiveFile<'_, E>> {
        let file = file.into();
        let archive = self.locate(file)?;
        let handle = self.engine.open_file(&archive.handle, file.name(), scope)?;

        Ok(ArchiveFile::new(
            &self.engine,
            handle,
            Entry::new(archive.id(), file.name().to_string()),
        ))
    }

    /// Read an entry completely
    pub fn read_all<'r, F: Into<FileRef<'r>>>(&self, file: F) -> Result<Vec<u8>> {
        let mut file = self.open(file)?;
        let data = file.read_remaining()?;
        file.close()?;
        Ok(data)
    }

    /// Names of every entry listed by the archives' `(listfile)` entries
    ///
    /// Names use `/` separators. Archives without a `(listfile)` contribute
    /// nothing. The result is cached until an archive or patch is attached.
    pub fn list(&mut self) -> Result<&BTreeSet<String>> {
        self.ensure_open()?;

        if self.listing.stale {
            let names = self.collect_listing()?;
            log::debug!(
                "Rebuilt listing: {} names from {} archives",
                names.len(),
                self.archives.len()
            );
            self.listing.names = names;
            self.listing.stale = false;
        }

        Ok(&self.listing.names)
    }

    fn collect_listing(&self) -> Result<BTreeSet<String>> {
        let mut names = BTreeSet::new();

        for archive in &self.archives {
            let mut file = match self.engine.open_file(
                &archive.handle,
                reserved::LISTFILE,
                SearchScope::Patched,
            ) {
                Ok(handle) => ArchiveFile::new(
                    &self.engine,
                    handle,
                    Entry::new(archive.id(), reserved::LISTFILE.to_string()),
                ),
                Err(e) if e.is_not_found() => {
                    log::debug!("{} has no (listfile)", archive.path().display());
                    continue;
                }
                Err(e) => return Err(e),
            };

            let data = file.read_remaining()?;
            file.close()?;
            names.extend(parse_listfile(&data));
        }

        Ok(names)
    }

    /// Extract an entry to the local file `dest`, creating parent directories
    pub fn extract<'r, F: Into<FileRef<'r>>, P: AsRef<Path>>(&self, file: F, dest: P) -> Result<()> {
        self.extract_with(file, dest, SearchScope::Patched)
    }

    /// Extract an entry with an explicit engine search scope
    pub fn extract_with<'r, F: Into<FileRef<'r>>, P: AsRef<Path>>(
        &self,
        file: F,
        dest: P,
        scope: SearchScope,
    ) -> Result<()> {
        let file = file.into();
        let dest = dest.as_ref();
        let archive = self.locate(file)?;

        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        log::debug!(
            "Extracting {} from {} to {}",
            file.name(),
            archive.path().display(),
            dest.display()
        );
        self.engine
            .extract(&archive.handle, file.name(), dest, scope)
    }

    /// Extract every listed entry below `dir`
    ///
    /// Listed names no archive holds are skipped, and a failure on one
    /// entry does not stop the others. Only a failure to build the listing
    /// is returned as an error.
    pub fn extract_all<P: AsRef<Path>>(&mut self, dir: P) -> Result<ExtractSummary> {
        let dir = dir.as_ref();
        let names: Vec<String> = self.list()?.iter().cloned().collect();

        let mut summary = ExtractSummary::default();
        for name in names {
            match self.contains(&name) {
                Ok(true) => {}
                Ok(false) => {
                    log::warn!("Listed file {} is not in any archive", name);
                    summary.skipped.push(name);
                    continue;
                }
                Err(e) => {
                    summary.failed.push((name, e));
                    continue;
                }
            }

            let dest = local_path(dir, &name);
            match self.extract(name.as_str(), &dest) {
                Ok(()) => summary.written.push(dest),
                Err(e) => {
                    log::warn!("Failed to extract {}: {}", name, e);
                    summary.failed.push((name, e));
                }
            }
        }

        log::debug!(
            "Extracted {} file(s), skipped {}, failed {}",
            summary.written.len(),
            summary.skipped.len(),
            summary.failed.len()
        );
        Ok(summary)
    }

    /// Attach an engine-level patch archive to one archive of the set
    ///
    /// `prefix` is the directory inside the patch archive that mirrors the
    /// base archive, if any.
    pub fn patch<P: AsRef<Path>>(
        &mut self,
        archive: ArchiveId,
        path: P,
        prefix: Option<&str>,
    ) -> Result<()> {
        let path = path.as_ref();
        let target = self.archive(archive)?;
        self.engine
            .open_patch_archive(&target.handle, path, prefix)?;

        log::debug!("Patched archive {} with {}", archive, path.display());
        self.listing.invalidate();
        Ok(())
    }

    /// Check whether one archive has engine-level patches attached
    pub fn is_patched(&self, archive: ArchiveId) -> Result<bool> {
        let target = self.archive(archive)?;
        self.engine.is_patched(&target.handle)
    }

    /// Close every archive
    ///
    /// All archives are closed even if one fails; the first failure is
    /// returned. Every later operation fails with [`Error::Closed`].
    pub fn close(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.closed = true;
        self.listing = ListingCache::new();

        let mut first_error = None;
        for archive in self.archives.drain(..) {
            let path = archive.path().to_path_buf();
            if let Err(e) = self.engine.close_archive(archive.handle) {
                log::warn!("Failed to close {}: {}", path.display(), e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<E: ArchiveEngine> Drop for ArchiveSet<E> {
    fn drop(&mut self) {
        if !self.closed {
            if let Err(e) = self.close() {
                log::warn!("Error while dropping archive set: {}", e);
            }
        }
    }
}

impl<E: ArchiveEngine> fmt::Debug for ArchiveSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveSet")
            .field("priority", &self.priority)
            .field("archives", &self.archives)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}
