//! Read-only metadata over an open entry
//!
//! Every accessor queries the engine again; nothing is cached, so values
//! always reflect the live handle.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::engine::ArchiveEngine;
use crate::file::{ArchiveFile, Entry};
use crate::flags::InfoField;
use crate::path::{base_name, normalize};
use crate::{Error, Result};

/// Seconds between 1601-01-01 (FILETIME epoch) and 1970-01-01
const FILETIME_UNIX_OFFSET_SECS: u64 = 11_644_473_600;

/// FILETIME ticks per second (100ns resolution)
const FILETIME_TICKS_PER_SEC: u64 = 10_000_000;

/// Metadata projection borrowed from an [`ArchiveFile`]
pub struct FileInfo<'f, E: ArchiveEngine> {
    file: &'f ArchiveFile<'f, E>,
}

impl<'f, E: ArchiveEngine> FileInfo<'f, E> {
    pub(crate) fn new(file: &'f ArchiveFile<'f, E>) -> Self {
        Self { file }
    }

    /// The archive and name the underlying file was opened from
    pub fn entry(&self) -> &'f Entry {
        self.file.entry()
    }

    /// Name stored in the archive, with `/` separators
    pub fn filename(&self) -> Result<String> {
        let name = self.file.engine().file_name(self.file.handle()?)?;
        Ok(normalize(&name))
    }

    /// Final path component of [`filename`](Self::filename)
    pub fn basename(&self) -> Result<String> {
        Ok(base_name(&self.filename()?).to_string())
    }

    /// Stored (compressed) size in bytes
    pub fn compress_size(&self) -> Result<u64> {
        self.query(InfoField::CompressedSize)
    }

    /// Uncompressed size in bytes
    pub fn file_size(&self) -> Result<u64> {
        self.query(InfoField::FileSize)
    }

    /// Raw modification time as a Windows FILETIME
    pub fn file_time(&self) -> Result<u64> {
        self.query(InfoField::FileTime)
    }

    /// Modification time, or `None` when the archive records none
    pub fn date_time(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(filetime_to_datetime(self.file_time()?))
    }

    /// Compression method of the entry
    ///
    /// Engines do not expose this per entry, so it is always
    /// [`Error::Unsupported`].
    pub fn compress_type(&self) -> Result<u8> {
        Err(Error::Unsupported("compress_type"))
    }

    /// CRC32 of the entry
    ///
    /// Engines do not expose this per entry, so it is always
    /// [`Error::Unsupported`].
    pub fn crc(&self) -> Result<u32> {
        Err(Error::Unsupported("crc"))
    }

    fn query(&self, field: InfoField) -> Result<u64> {
        self.file.engine().file_info(self.file.handle()?, field)
    }
}

impl<E: ArchiveEngine> fmt::Debug for FileInfo<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileInfo")
            .field("entry", self.file.entry())
            .finish()
    }
}

/// Convert a Windows FILETIME to a UTC timestamp
///
/// Zero means "not recorded". Times before the Unix epoch are clamped out
/// as `None`; MPQ tools never wrote them.
pub fn filetime_to_datetime(file_time: u64) -> Option<DateTime<Utc>> {
    if file_time == 0 {
        return None;
    }

    let secs = (file_time / FILETIME_TICKS_PER_SEC).checked_sub(FILETIME_UNIX_OFFSET_SECS)?;
    let nanos = (file_time % FILETIME_TICKS_PER_SEC) * 100;
    DateTime::from_timestamp(i64::try_from(secs).ok()?, nanos as u32)
}
