//! The archive engine seam
//!
//! Everything that understands the MPQ format lives behind [`ArchiveEngine`].
//! Implementations hand out opaque archive and file handles; the rest of
//! this crate only moves those handles around and decides which archive to
//! ask.

use std::path::Path;

use crate::flags::{InfoField, OpenFlags, SearchScope, SeekOrigin};
use crate::Result;

pub mod memory;

/// Primitive operations of an MPQ archive engine
///
/// Handles are passed by value to the `close_*` methods, so a handle can
/// only be released once. Engines report failures as typed [`crate::Error`]
/// values and never retry.
pub trait ArchiveEngine {
    /// Opaque handle to one open archive
    type Archive;

    /// Opaque handle to one open entry, owning its own cursor
    type File;

    /// Open an archive at `path`
    fn open_archive(&self, path: &Path, flags: OpenFlags) -> Result<Self::Archive>;

    /// Release an archive handle
    fn close_archive(&self, archive: Self::Archive) -> Result<()>;

    /// Check whether `name` exists in the archive
    ///
    /// A missing name is `Ok(false)`; only engine failures are errors.
    fn has_file(&self, archive: &Self::Archive, name: &str) -> Result<bool>;

    /// Open a named entry
    fn open_file(&self, archive: &Self::Archive, name: &str, scope: SearchScope)
        -> Result<Self::File>;

    /// Release a file handle
    fn close_file(&self, file: Self::File) -> Result<()>;

    /// Read into `buf` from the cursor, returning the number of bytes read
    ///
    /// Returns fewer bytes than requested only at the end of the entry.
    fn read(&self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize>;

    /// Move the cursor and return the new absolute position
    ///
    /// A negative resulting position is [`crate::Error::NegativeSeek`].
    /// Positions past the end are accepted: an engine may keep them or
    /// clamp them to the entry size, and either way a following read
    /// returns no bytes. StormLib clamps; [`memory::MemoryEngine`] keeps
    /// the requested position.
    fn seek(&self, file: &mut Self::File, offset: i64, origin: SeekOrigin) -> Result<u64>;

    /// Total size of the entry in bytes
    fn file_size(&self, file: &Self::File) -> Result<u64>;

    /// Query one information field of an open entry
    fn file_info(&self, file: &Self::File, field: InfoField) -> Result<u64>;

    /// Name of the open entry as stored in the archive
    fn file_name(&self, file: &Self::File) -> Result<String>;

    /// Extract a named entry to a local file
    fn extract(
        &self,
        archive: &Self::Archive,
        name: &str,
        dest: &Path,
        scope: SearchScope,
    ) -> Result<()>;

    /// Attach an engine-level patch archive to an open archive
    fn open_patch_archive(
        &self,
        archive: &Self::Archive,
        path: &Path,
        prefix: Option<&str>,
    ) -> Result<()>;

    /// Check whether the archive has engine-level patches attached
    fn is_patched(&self, archive: &Self::Archive) -> Result<bool>;
}

impl<E: ArchiveEngine + ?Sized> ArchiveEngine for &E {
    type Archive = E::Archive;
    type File = E::File;

    fn open_archive(&self, path: &Path, flags: OpenFlags) -> Result<Self::Archive> {
        (**self).open_archive(path, flags)
    }

    fn close_archive(&self, archive: Self::Archive) -> Result<()> {
        (**self).close_archive(archive)
    }

    fn has_file(&self, archive: &Self::Archive, name: &str) -> Result<bool> {
        (**self).has_file(archive, name)
    }

    fn open_file(
        &self,
        archive: &Self::Archive,
        name: &str,
        scope: SearchScope,
    ) -> Result<Self::File> {
        (**self).open_file(archive, name, scope)
    }

    fn close_file(&self, file: Self::File) -> Result<()> {
        (**self).close_file(file)
    }

    fn read(&self, file: &mut Self::File, buf: &mut [u8]) -> Result<usize> {
        (**self).read(file, buf)
    }

    fn seek(&self, file: &mut Self::File, offset: i64, origin: SeekOrigin) -> Result<u64> {
        (**self).seek(file, offset, origin)
    }

    fn file_size(&self, file: &Self::File) -> Result<u64> {
        (**self).file_size(file)
    }

    fn file_info(&self, file: &Self::File, field: InfoField) -> Result<u64> {
        (**self).file_info(file, field)
    }

    fn file_name(&self, file: &Self::File) -> Result<String> {
        (**self).file_name(file)
    }

    fn extract(
        &self,
        archive: &Self::Archive,
        name: &str,
        dest: &Path,
        scope: SearchScope,
    ) -> Result<()> {
        (**self).extract(archive, name, dest, scope)
    }

    fn open_patch_archive(
        &self,
        archive: &Self::Archive,
        path: &Path,
        prefix: Option<&str>,
    ) -> Result<()> {
        (**self).open_patch_archive(archive, path, prefix)
    }

    fn is_patched(&self, archive: &Self::Archive) -> Result<bool> {
        (**self).is_patched(archive)
    }
}
