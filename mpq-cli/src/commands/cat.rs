//! Cat command implementation

use anyhow::{Context, Result};
use mpq::{ArchiveEngine, ArchiveSet, SearchScope};
use std::io::{self, Write};

/// Stream a file from the set into `writer`, returning the byte count
pub fn copy_file<E: ArchiveEngine, W: Write>(
    set: &ArchiveSet<E>,
    filename: &str,
    base_only: bool,
    writer: &mut W,
) -> Result<u64> {
    let scope = if base_only {
        SearchScope::BaseOnly
    } else {
        SearchScope::Patched
    };

    let mut file = set
        .open_with(filename, scope)
        .with_context(|| format!("Failed to open {}", filename))?;
    let written = file
        .copy_to(writer)
        .with_context(|| format!("Failed to read {}", filename))?;
    file.close()?;

    Ok(written)
}

/// Write a file's contents to stdout
pub fn cat<E: ArchiveEngine>(set: &ArchiveSet<E>, filename: &str, base_only: bool) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let written = copy_file(set, filename, base_only, &mut handle)?;
    handle.flush()?;

    log::debug!("Wrote {} bytes of {}", written, filename);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpq::engine::memory::{ArchiveImage, MemoryEngine};
    use mpq::OpenFlags;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_copy_patched_and_base() {
        let engine = MemoryEngine::new();
        engine.insert_archive("base.mpq", ArchiveImage::new().with_file("a.txt", b"base".to_vec()));
        engine.insert_archive(
            "overlay.mpq",
            ArchiveImage::new().with_file("a.txt", b"overlay".to_vec()),
        );
        let mut set = ArchiveSet::new(&engine);
        let base = set.attach("base.mpq", OpenFlags::default()).unwrap();
        set.patch(base, "overlay.mpq", None).unwrap();

        let mut out = Vec::new();
        assert_eq!(copy_file(&set, "a.txt", false, &mut out).unwrap(), 7);
        assert_eq!(out, b"overlay");

        let mut out = Vec::new();
        copy_file(&set, "a.txt", true, &mut out).unwrap();
        assert_eq!(out, b"base");
    }

    #[test]
    fn test_copy_missing_file() {
        let engine = MemoryEngine::new();
        engine.insert_archive("base.mpq", ArchiveImage::new());
        let mut set = ArchiveSet::new(&engine);
        set.attach("base.mpq", OpenFlags::default()).unwrap();

        let err = copy_file(&set, "missing.txt", false, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("missing.txt"));
    }
}
