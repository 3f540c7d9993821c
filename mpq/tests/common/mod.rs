//! Common test utilities and fixtures

#![allow(dead_code)]

use mpq::engine::memory::{ArchiveImage, MemoryEngine};

/// Route `log` output through the test harness
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Generate test data of a specific size
pub fn generate_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// Engine with the two-archive patch chain used by most scenarios
///
/// - `base.mpq`: `a.txt`, `shared.txt` ("v1"), `Dir\nested.txt`
/// - `patch.mpq`: `shared.txt` ("v2")
/// - `nolist.mpq`: `hidden.txt`, no `(listfile)`
pub fn chain_engine() -> MemoryEngine {
    init_logging();
    let engine = MemoryEngine::new();
    engine.insert_archive(
        "base.mpq",
        ArchiveImage::new()
            .with_file("a.txt", b"alpha".to_vec())
            .with_file("shared.txt", b"v1".to_vec())
            .with_file("Dir\\nested.txt", b"nested".to_vec())
            .with_listfile(),
    );
    engine.insert_archive(
        "patch.mpq",
        ArchiveImage::new()
            .with_file("shared.txt", b"v2".to_vec())
            .with_listfile(),
    );
    engine.insert_archive(
        "nolist.mpq",
        ArchiveImage::new().with_file("hidden.txt", b"hidden".to_vec()),
    );
    engine
}

/// Engine with a single archive holding `name` = `data`
pub fn single_file_engine(name: &str, data: Vec<u8>) -> MemoryEngine {
    let engine = MemoryEngine::new();
    engine.insert_archive(
        "single.mpq",
        ArchiveImage::new().with_file(name, data).with_listfile(),
    );
    engine
}
