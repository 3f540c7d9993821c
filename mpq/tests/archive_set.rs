//! Archive set resolution, listing and lifecycle

mod common;

use mpq::engine::memory::{ArchiveImage, MemoryEngine};
use mpq::{ArchiveSet, Error, OpenFlags, Priority, SearchScope};
use pretty_assertions::assert_eq;

fn attach_chain(set: &mut ArchiveSet<&MemoryEngine>) {
    set.attach("base.mpq", OpenFlags::default()).unwrap();
    set.attach("patch.mpq", OpenFlags::default()).unwrap();
}

#[test]
fn test_attach_missing_archive_is_open_error() {
    let engine = common::chain_engine();
    let mut set = ArchiveSet::new(&engine);

    let err = set
        .attach("does-not-exist.mpq", OpenFlags::default())
        .unwrap_err();
    assert!(matches!(err, Error::Open { .. }));
    assert!(set.is_empty());
}

#[test]
fn test_attach_corrupt_archive_is_open_error() {
    let engine = MemoryEngine::new();
    engine.insert_archive("broken.mpq", ArchiveImage::corrupt());
    let mut set = ArchiveSet::new(&engine);

    assert!(matches!(
        set.attach("broken.mpq", OpenFlags::default()),
        Err(Error::Open { .. })
    ));
}

#[test]
fn test_patches_take_priority_by_default() {
    let engine = common::chain_engine();
    let mut set = ArchiveSet::new(&engine);
    attach_chain(&mut set);

    assert_eq!(set.priority(), Priority::LastAttachedFirst);
    assert_eq!(set.resolve("shared.txt").unwrap().name(), "patch.mpq");
    assert_eq!(set.read_all("shared.txt").unwrap(), b"v2");
}

#[test]
fn test_first_attached_priority() {
    let engine = common::chain_engine();
    let mut set = ArchiveSet::with_priority(&engine, Priority::FirstAttachedFirst);
    attach_chain(&mut set);

    assert_eq!(set.resolve("shared.txt").unwrap().name(), "base.mpq");
    assert_eq!(set.read_all("shared.txt").unwrap(), b"v1");
}

#[test]
fn test_resolve_skips_archives_without_the_name() {
    let engine = common::chain_engine();
    let mut set = ArchiveSet::new(&engine);
    attach_chain(&mut set);
    set.attach("nolist.mpq", OpenFlags::default()).unwrap();

    // Only present in the first attached archive, which is checked last
    let archive = set.resolve("a.txt").unwrap();
    assert_eq!(archive.name(), "base.mpq");
    assert_eq!(archive.id().index(), 0);

    let archive = set.resolve("hidden.txt").unwrap();
    assert_eq!(archive.name(), "nolist.mpq");
}

#[test]
fn test_missing_name_is_not_found() {
    let engine = common::chain_engine();
    let mut set = ArchiveSet::new(&engine);
    attach_chain(&mut set);

    assert!(matches!(
        set.open("missing.txt"),
        Err(Error::FileNotFound(name)) if name == "missing.txt"
    ));
    assert!(!set.contains("missing.txt").unwrap());
}

#[test]
fn test_empty_set_is_not_found() {
    let engine = common::chain_engine();
    let set = ArchiveSet::new(&engine);

    assert!(matches!(set.resolve("a.txt"), Err(Error::FileNotFound(_))));
    assert!(!set.contains("a.txt").unwrap());
}

#[test]
fn test_contains_sees_archives_attached_after_listing() {
    let engine = common::chain_engine();
    let mut set = ArchiveSet::new(&engine);
    attach_chain(&mut set);

    set.list().unwrap();
    assert!(!set.contains("hidden.txt").unwrap());

    set.attach("nolist.mpq", OpenFlags::default()).unwrap();
    assert!(set.contains("hidden.txt").unwrap());
}

#[test]
fn test_list_unions_and_normalizes() {
    let engine = common::chain_engine();
    let mut set = ArchiveSet::new(&engine);
    attach_chain(&mut set);

    let names: Vec<&str> = set.list().unwrap().iter().map(String::as_str).collect();
    assert_eq!(names, vec!["Dir/nested.txt", "a.txt", "shared.txt"]);
}

#[test]
fn test_list_tolerates_missing_listfile() {
    let engine = common::chain_engine();
    let mut set = ArchiveSet::new(&engine);
    set.attach("nolist.mpq", OpenFlags::default()).unwrap();

    assert!(set.list().unwrap().is_empty());
}

#[test]
fn test_attach_invalidates_listing() {
    let engine = common::chain_engine();
    engine.insert_archive(
        "new.mpq",
        ArchiveImage::new()
            .with_file("newfile.txt", b"new".to_vec())
            .with_listfile(),
    );
    let mut set = ArchiveSet::new(&engine);
    attach_chain(&mut set);

    assert!(!set.list().unwrap().contains("newfile.txt"));
    set.attach("new.mpq", OpenFlags::default()).unwrap();
    assert!(set.list().unwrap().contains("newfile.txt"));
}

#[test]
fn test_list_handles_raw_listfile_content() {
    let engine = MemoryEngine::new();
    engine.insert_archive(
        "raw.mpq",
        ArchiveImage::new().with_file(
            "(listfile)",
            b"Dir\\a.txt\r\n\r\nb.txt\r\nDir\\a.txt\r\n".to_vec(),
        ),
    );
    let mut set = ArchiveSet::new(&engine);
    set.attach("raw.mpq", OpenFlags::default()).unwrap();

    let names = set.list().unwrap();
    assert_eq!(names.len(), 2);
    assert!(names.contains("Dir/a.txt"));
    assert!(names.contains("b.txt"));
    assert!(!names.contains(""));
}

#[test]
fn test_reopen_resolved_entry() {
    let engine = common::chain_engine();
    let mut set = ArchiveSet::new(&engine);
    attach_chain(&mut set);

    let entry = {
        let file = set.open("shared.txt").unwrap();
        file.entry().clone()
    };
    assert_eq!(set.archive(entry.archive()).unwrap().name(), "patch.mpq");

    let mut again = set.open(&entry).unwrap();
    assert_eq!(again.read_remaining().unwrap(), b"v2");
}

#[test]
fn test_engine_patch_is_distinct_from_set_priority() {
    let engine = common::chain_engine();
    engine.insert_archive(
        "locale-patch.mpq",
        ArchiveImage::new()
            .with_file("base\\a.txt", b"alpha (patched)".to_vec())
            .with_listfile(),
    );
    let mut set = ArchiveSet::new(&engine);
    let base = set.attach("base.mpq", OpenFlags::default()).unwrap();

    assert!(!set.is_patched(base).unwrap());
    set.patch(base, "locale-patch.mpq", Some("base")).unwrap();
    assert!(set.is_patched(base).unwrap());

    assert_eq!(set.read_all("a.txt").unwrap(), b"alpha (patched)");

    let mut unpatched = set.open_with("a.txt", SearchScope::BaseOnly).unwrap();
    assert_eq!(unpatched.read_remaining().unwrap(), b"alpha");
}

#[test]
fn test_close_then_list_is_closed_error() {
    let engine = common::chain_engine();
    let mut set = ArchiveSet::new(&engine);
    attach_chain(&mut set);

    set.close().unwrap();
    assert_eq!(engine.open_archive_count(), 0);
    assert!(matches!(set.list(), Err(Error::Closed)));
    assert!(matches!(set.open("a.txt"), Err(Error::Closed)));
    assert!(matches!(set.contains("a.txt"), Err(Error::Closed)));
    assert!(matches!(
        set.attach("base.mpq", OpenFlags::default()),
        Err(Error::Closed)
    ));
}

#[test]
fn test_drop_releases_every_handle() {
    let engine = common::chain_engine();
    {
        let mut set = ArchiveSet::new(&engine);
        attach_chain(&mut set);
        let _file = set.open("a.txt").unwrap();
        assert_eq!(engine.open_archive_count(), 2);
        assert_eq!(engine.open_file_count(), 1);
    }
    assert_eq!(engine.open_archive_count(), 0);
    assert_eq!(engine.open_file_count(), 0);
}

#[test]
fn test_read_all_closes_its_handle() {
    let engine = common::chain_engine();
    let mut set = ArchiveSet::new(&engine);
    attach_chain(&mut set);

    assert_eq!(set.read_all("Dir/nested.txt").unwrap(), b"nested");
    assert_eq!(engine.open_file_count(), 0);
}

#[test]
fn test_extract_single_file() {
    let engine = common::chain_engine();
    let mut set = ArchiveSet::new(&engine);
    attach_chain(&mut set);

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out").join("shared.txt");
    set.extract("shared.txt", &dest).unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"v2");
}

#[test]
fn test_extract_all_uses_listing() {
    let engine = common::chain_engine();
    let mut set = ArchiveSet::new(&engine);
    attach_chain(&mut set);

    let dir = tempfile::tempdir().unwrap();
    let summary = set.extract_all(dir.path()).unwrap();

    assert!(summary.is_complete());
    assert!(summary.skipped.is_empty());
    assert_eq!(summary.written.len(), 3);
    assert_eq!(
        std::fs::read(dir.path().join("Dir").join("nested.txt")).unwrap(),
        b"nested"
    );
    assert_eq!(std::fs::read(dir.path().join("shared.txt")).unwrap(), b"v2");
}

#[test]
fn test_extract_all_skips_names_missing_from_archives() {
    let engine = MemoryEngine::new();
    engine.insert_archive(
        "stale.mpq",
        ArchiveImage::new()
            .with_file("a.txt", b"a".to_vec())
            .with_file("z.txt", b"z".to_vec())
            .with_file("(listfile)", b"a.txt\r\nghost.txt\r\nz.txt".to_vec()),
    );
    let mut set = ArchiveSet::new(&engine);
    set.attach("stale.mpq", OpenFlags::default()).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let summary = set.extract_all(dir.path()).unwrap();

    assert!(summary.is_complete());
    assert_eq!(summary.skipped, vec!["ghost.txt".to_string()]);
    assert_eq!(
        summary.written,
        vec![dir.path().join("a.txt"), dir.path().join("z.txt")]
    );
    assert_eq!(std::fs::read(dir.path().join("z.txt")).unwrap(), b"z");
    assert!(!dir.path().join("ghost.txt").exists());
    assert_eq!(engine.open_file_count(), 0);
}

#[test]
fn test_extract_missing_name() {
    let engine = common::chain_engine();
    let mut set = ArchiveSet::new(&engine);
    attach_chain(&mut set);

    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        set.extract("missing.txt", dir.path().join("missing.txt")),
        Err(Error::FileNotFound(_))
    ));
}
