//! # mpq - Patch-chain aware MPQ access
//!
//! A thin, safe layer over an MPQ archive engine. The archive format itself
//! (hash and block tables, sector compression, encryption) is provided by an
//! engine implementing [`ArchiveEngine`]; this crate manages the handles it
//! returns.
//!
//! ## Features
//!
//! - Ordered archive sets with an explicit [`Priority`] policy
//! - Combined, lazily rebuilt `(listfile)` listing across every archive
//! - Owned file and archive handles released on drop
//! - Read-only metadata projections bound to their file handle
//! - An in-memory engine for tests and embedded data
//!
//! ## Example
//!
//! ```
//! use mpq::engine::memory::{ArchiveImage, MemoryEngine};
//! use mpq::{ArchiveSet, OpenFlags};
//!
//! # fn main() -> Result<(), mpq::Error> {
//! let engine = MemoryEngine::new();
//! engine.insert_archive(
//!     "base.mpq",
//!     ArchiveImage::new()
//!         .with_file("Interface\\readme.txt", b"base".to_vec())
//!         .with_listfile(),
//! );
//! engine.insert_archive(
//!     "patch.mpq",
//!     ArchiveImage::new()
//!         .with_file("Interface\\readme.txt", b"patched".to_vec())
//!         .with_listfile(),
//! );
//!
//! let mut set = ArchiveSet::new(engine);
//! set.attach("base.mpq", OpenFlags::default())?;
//! set.attach("patch.mpq", OpenFlags::default())?;
//!
//! // Later archives win by default
//! assert_eq!(set.read_all("Interface/readme.txt")?, b"patched");
//!
//! for name in set.list()? {
//!     println!("{name}");
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod archive;
pub mod archive_set;
pub mod engine;
pub mod error;
pub mod file;
pub mod flags;
pub mod info;
pub mod path;
pub mod special_files;

// Re-export commonly used types
pub use archive::{Archive, ArchiveId, Priority};
pub use archive_set::{ArchiveSet, ExtractSummary};
pub use engine::ArchiveEngine;
pub use error::{Error, Result};
pub use file::{ArchiveFile, Entry, FileRef};
pub use flags::{InfoField, OpenFlags, SearchScope, SeekOrigin};
pub use info::FileInfo;

/// Reserved entry names consumed by this crate
pub mod reserved {
    /// Newline separated list of every other entry in an archive
    pub const LISTFILE: &str = "(listfile)";

    /// Extended attributes; referenced but never parsed here
    pub const ATTRIBUTES: &str = "(attributes)";
}
