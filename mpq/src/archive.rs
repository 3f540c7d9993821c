//! Archives attached to an [`ArchiveSet`](crate::ArchiveSet)

use std::fmt;
use std::path::{Path, PathBuf};

use crate::flags::OpenFlags;

/// Identifier of an archive within one archive set
///
/// Ids are assigned in attach order starting at zero and are never reused
/// by the set that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchiveId(pub(crate) usize);

impl ArchiveId {
    /// Position of the archive in attach order
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ArchiveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Order in which an archive set asks its archives for a name
///
/// The first archive in priority order that contains a name is the one
/// that serves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum Priority {
    /// Later-attached archives are checked first, so patches attached after
    /// their base archive override it
    #[default]
    LastAttachedFirst,
    /// Archives are checked in the order they were attached
    FirstAttachedFirst,
}

/// One opened archive owned by an archive set
pub struct Archive<H> {
    id: ArchiveId,
    path: PathBuf,
    flags: OpenFlags,
    pub(crate) handle: H,
}

impl<H> Archive<H> {
    pub(crate) fn new(id: ArchiveId, path: PathBuf, flags: OpenFlags, handle: H) -> Self {
        Self {
            id,
            path,
            flags,
            handle,
        }
    }

    /// Identifier within the owning set
    pub fn id(&self) -> ArchiveId {
        self.id
    }

    /// Path the archive was opened from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name of the archive, without directories
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Flags the archive was opened with
    pub fn flags(&self) -> OpenFlags {
        self.flags
    }
}

impl<H> fmt::Debug for Archive<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Archive")
            .field("id", &self.id)
            .field("path", &self.path)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}
