//! Property tests for the combined listing

use std::collections::BTreeSet;

use mpq::engine::memory::{ArchiveImage, MemoryEngine};
use mpq::{ArchiveSet, OpenFlags};
use proptest::prelude::*;

/// Archive-style names: one to three segments joined by `\`
fn archive_name() -> impl Strategy<Value = String> {
    prop::collection::vec("[A-Za-z0-9_]{1,8}", 1..4)
        .prop_map(|parts| format!("{}.dat", parts.join("\\")))
}

fn archive_contents() -> impl Strategy<Value = Vec<Vec<String>>> {
    prop::collection::vec(prop::collection::vec(archive_name(), 0..12), 1..5)
}

fn build_set(contents: &[Vec<String>]) -> ArchiveSet<MemoryEngine> {
    let engine = MemoryEngine::new();
    for (i, names) in contents.iter().enumerate() {
        let image = names
            .iter()
            .fold(ArchiveImage::new(), |image, name| {
                image.with_file(name.as_str(), name.as_bytes().to_vec())
            })
            .with_listfile();
        engine.insert_archive(format!("archive-{i}.mpq"), image);
    }

    let mut set = ArchiveSet::new(engine);
    for i in 0..contents.len() {
        set.attach(format!("archive-{i}.mpq"), OpenFlags::default())
            .unwrap();
    }
    set
}

proptest! {
    #[test]
    fn listing_is_normalized_and_unique(contents in archive_contents()) {
        let mut set = build_set(&contents);
        let names = set.list().map_err(|e| TestCaseError::fail(e.to_string()))?;

        for name in names {
            prop_assert!(!name.is_empty());
            prop_assert!(!name.contains('\\'));
        }
    }

    #[test]
    fn listing_is_union_of_archives(contents in archive_contents()) {
        let mut set = build_set(&contents);
        let names = set
            .list()
            .map_err(|e| TestCaseError::fail(e.to_string()))?
            .clone();

        // Names differing only by case collapse to one entry inside an archive
        for listed in &names {
            prop_assert!(set.contains(listed).map_err(|e| TestCaseError::fail(e.to_string()))?);
        }

        let expected_upper: BTreeSet<String> = contents
            .iter()
            .flatten()
            .map(|name| name.replace('\\', "/").to_uppercase())
            .collect();
        let listed_upper: BTreeSet<String> =
            names.iter().map(|name| name.to_uppercase()).collect();
        prop_assert_eq!(listed_upper, expected_upper);
    }

    #[test]
    fn listing_is_stable_between_calls(contents in archive_contents()) {
        let mut set = build_set(&contents);
        let first = set
            .list()
            .map_err(|e| TestCaseError::fail(e.to_string()))?
            .clone();
        let second = set
            .list()
            .map_err(|e| TestCaseError::fail(e.to_string()))?
            .clone();
        prop_assert_eq!(first, second);
    }
}
