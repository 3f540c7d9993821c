//! # storm-ffi - StormLib as an mpq archive engine
//!
//! Binds the [StormLib](http://www.zezula.net/en/mpq/stormlib.html) C
//! library at run time and exposes it through [`mpq::ArchiveEngine`], so an
//! [`mpq::ArchiveSet`] can read real MPQ archives.
//!
//! StormLib is opened with the platform dynamic loader when
//! [`StormEngine::load`] is called. Nothing links against it at build time,
//! and a missing library is an ordinary [`LoadError`].
//!
//! ```no_run
//! use mpq::{ArchiveSet, OpenFlags};
//! use storm_ffi::StormEngine;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = StormEngine::load_from("/usr/local/lib/libstorm.so")?;
//! let mut set = ArchiveSet::new(engine);
//! set.attach("Data/expansion1.MPQ", OpenFlags::default())?;
//! println!("{} listed files", set.list()?.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod engine;
pub mod error;
pub mod library;
pub mod raw;

pub use engine::{StormArchive, StormEngine, StormFile};
pub use error::LoadError;
pub use library::{StormLib, DEFAULT_LIBRARY_NAMES};
