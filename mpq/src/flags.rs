//! Flags and selectors passed through to the archive engine

use bitflags::bitflags;

bitflags! {
    /// Flags used when opening an archive
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct OpenFlags: u32 {
        /// Don't load the internal listfile
        const NO_LISTFILE = 0x0000_0010;
        /// Don't open the (attributes) file
        const NO_ATTRIBUTES = 0x0000_0020;
        /// Only look for the header at offset 0 (`FORCE_MPQ_V1` in older engines)
        const NO_HEADER_SEARCH = 0x0000_0040;
        /// Check sector CRCs while reading
        const CHECK_SECTOR_CRC = 0x0000_0080;
        /// Open the archive for reading only
        const READ_ONLY = 0x0000_0100;
    }
}

impl Default for OpenFlags {
    fn default() -> Self {
        OpenFlags::READ_ONLY
    }
}

/// Whether the engine applies its own patch overlay when opening an entry
///
/// This is independent of the archive set's multi-archive resolution: the
/// set decides *which* archive is asked, the scope decides whether that
/// archive's engine-level patches are consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchScope {
    /// Apply every patch archive attached to the archive
    #[default]
    Patched,
    /// Read the unpatched entry from the archive itself
    BaseOnly,
}

/// Origin for file seeks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeekOrigin {
    /// From the start of the entry
    Start,
    /// From the current cursor
    Current,
    /// From the end of the entry
    End,
}

/// Per-file information fields the engine can be queried for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoField {
    /// Last modification time as a Windows FILETIME
    FileTime,
    /// Stored (compressed) size in bytes
    CompressedSize,
    /// Uncompressed size in bytes
    FileSize,
}
