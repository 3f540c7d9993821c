//! Open archive entries
//!
//! An [`ArchiveFile`] owns one engine file handle. The engine keeps the
//! cursor; the wrapper never tracks a position of its own.

use std::fmt;
use std::io::Write;

use crate::archive::ArchiveId;
use crate::engine::ArchiveEngine;
use crate::flags::SeekOrigin;
use crate::info::FileInfo;
use crate::{Error, Result};

/// Chunk size used when streaming an entry
const COPY_CHUNK_SIZE: usize = 64 * 1024;

/// A name resolved to a specific archive of a set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Entry {
    archive: ArchiveId,
    name: String,
}

impl Entry {
    pub(crate) fn new(archive: ArchiveId, name: String) -> Self {
        Self { archive, name }
    }

    /// Archive that served the entry
    pub fn archive(&self) -> ArchiveId {
        self.archive
    }

    /// Name as it was requested
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Either a plain name, resolved against the whole set, or an entry that is
/// already pinned to one archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileRef<'r> {
    /// Resolve the name in priority order
    Name(&'r str),
    /// Use the archive recorded in the entry, skipping resolution
    Resolved(&'r Entry),
}

impl<'r> FileRef<'r> {
    /// The requested name
    pub fn name(&self) -> &'r str {
        match *self {
            FileRef::Name(name) => name,
            FileRef::Resolved(entry) => &entry.name,
        }
    }
}

impl<'r> From<&'r str> for FileRef<'r> {
    fn from(name: &'r str) -> Self {
        FileRef::Name(name)
    }
}

impl<'r> From<&'r String> for FileRef<'r> {
    fn from(name: &'r String) -> Self {
        FileRef::Name(name)
    }
}

impl<'r> From<&'r Entry> for FileRef<'r> {
    fn from(entry: &'r Entry) -> Self {
        FileRef::Resolved(entry)
    }
}

/// An open entry of an archive
///
/// The engine handle is released by [`ArchiveFile::close`] or, on every
/// other path, when the value is dropped.
pub struct ArchiveFile<'a, E: ArchiveEngine> {
    engine: &'a E,
    handle: Option<E::File>,
    entry: Entry,
}

impl<'a, E: ArchiveEngine> ArchiveFile<'a, E> {
    pub(crate) fn new(engine: &'a E, handle: E::File, entry: Entry) -> Self {
        Self {
            engine,
            handle: Some(handle),
            entry,
        }
    }

    /// The archive and name this file was opened from
    pub fn entry(&self) -> &Entry {
        &self.entry
    }

    pub(crate) fn engine(&self) -> &'a E {
        self.engine
    }

    pub(crate) fn handle(&self) -> Result<&E::File> {
        self.handle.as_ref().ok_or(Error::Closed)
    }

    /// Read up to `len` bytes from the cursor
    ///
    /// Fewer bytes are returned only at the end of the entry.
    pub fn read(&mut self, len: usize) -> Result<Vec<u8>> {
        let engine = self.engine;
        let handle = self.handle.as_mut().ok_or(Error::Closed)?;

        let mut buf = vec![0u8; len];
        let mut filled = 0;
        while filled < len {
            let count = engine.read(handle, &mut buf[filled..])?;
            if count == 0 {
                break;
            }
            filled += count;
        }

        buf.truncate(filled);
        Ok(buf)
    }

    /// Read from the cursor to the end of the entry
    pub fn read_remaining(&mut self) -> Result<Vec<u8>> {
        let remaining = self.size()?.saturating_sub(self.tell()?);
        let len = usize::try_from(remaining)
            .map_err(|_| Error::engine("read", format!("{remaining} bytes do not fit in memory")))?;
        self.read(len)
    }

    /// Move the cursor, returning the new position
    ///
    /// Seeking past the end is allowed and a following read returns no
    /// bytes. Whether the returned position is clamped to the size depends
    /// on the engine.
    pub fn seek(&mut self, offset: i64, origin: SeekOrigin) -> Result<u64> {
        if origin == SeekOrigin::Start && offset < 0 {
            return Err(Error::NegativeSeek { position: offset });
        }

        let engine = self.engine;
        let handle = self.handle.as_mut().ok_or(Error::Closed)?;
        engine.seek(handle, offset, origin)
    }

    /// Current cursor position, as reported by the engine
    pub fn tell(&mut self) -> Result<u64> {
        self.seek(0, SeekOrigin::Current)
    }

    /// Total size of the entry in bytes
    pub fn size(&self) -> Result<u64> {
        self.engine.file_size(self.handle()?)
    }

    /// Stream everything from the cursor to the end into `writer`
    pub fn copy_to<W: Write>(&mut self, writer: &mut W) -> Result<u64> {
        let mut written = 0u64;
        loop {
            let chunk = self.read(COPY_CHUNK_SIZE)?;
            if chunk.is_empty() {
                break;
            }
            writer.write_all(&chunk)?;
            written += chunk.len() as u64;
        }
        Ok(written)
    }

    /// Metadata projection over this handle
    pub fn info(&self) -> FileInfo<'_, E> {
        FileInfo::new(self)
    }

    /// Release the engine handle, reporting any failure
    pub fn close(mut self) -> Result<()> {
        match self.handle.take() {
            Some(handle) => self.engine.close_file(handle),
            None => Ok(()),
        }
    }
}

impl<E: ArchiveEngine> Drop for ArchiveFile<'_, E> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Err(e) = self.engine.close_file(handle) {
                log::warn!("Failed to close {}: {}", self.entry.name, e);
            }
        }
    }
}

impl<E: ArchiveEngine> fmt::Debug for ArchiveFile<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveFile")
            .field("entry", &self.entry)
            .field("open", &self.handle.is_some())
            .finish()
    }
}
