//! Loading StormLib and attaching the archives named on the command line

use anyhow::{Context, Result};
use mpq::{ArchiveEngine, ArchiveSet, OpenFlags, Priority};
use std::path::{Path, PathBuf};
use storm_ffi::StormEngine;

use crate::output;

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Explicit StormLib location; the loader search path otherwise
    pub library: Option<PathBuf>,
    pub priority: Priority,
}

impl SessionOptions {
    /// Load StormLib and attach `archives` in order
    pub fn open(&self, archives: &[PathBuf]) -> Result<ArchiveSet<StormEngine>> {
        let engine = match &self.library {
            Some(path) => StormEngine::load_from(path)
                .with_context(|| format!("Failed to load StormLib from {}", path.display()))?,
            None => StormEngine::load().context("Failed to load StormLib")?,
        };
        output::verbose_println(1, &format!("Using StormLib from {}", engine.library().location()));

        attach_all(ArchiveSet::with_priority(engine, self.priority), archives)
    }
}

/// Attach every archive, failing on the first one that cannot be opened
pub fn attach_all<E: ArchiveEngine>(
    mut set: ArchiveSet<E>,
    archives: &[PathBuf],
) -> Result<ArchiveSet<E>> {
    for path in archives {
        attach(&mut set, path)?;
    }
    Ok(set)
}

fn attach<E: ArchiveEngine>(set: &mut ArchiveSet<E>, path: &Path) -> Result<()> {
    let id = set
        .attach(path, OpenFlags::default())
        .with_context(|| format!("Failed to open archive: {}", path.display()))?;
    output::verbose_println(2, &format!("Attached {} as {}", path.display(), id));
    Ok(())
}
