//! Path utilities for archive entry names
//!
//! Archives store entry names with backslashes (`\`). Names handed out by
//! this crate use forward slashes; names passed in may use either.

use std::path::{Path, PathBuf};

/// Convert an archive name to the forward slash form used for listings
///
/// # Examples
///
/// ```
/// use mpq::path::normalize;
///
/// assert_eq!(normalize("Interface\\Icons\\a.blp"), "Interface/Icons/a.blp");
/// assert_eq!(normalize("already/normal.txt"), "already/normal.txt");
/// ```
pub fn normalize(name: &str) -> String {
    name.replace('\\', "/")
}

/// Convert a name to the backslash form stored inside archives
///
/// # Examples
///
/// ```
/// use mpq::path::to_archive_name;
///
/// assert_eq!(to_archive_name("dir/file.txt"), "dir\\file.txt");
/// ```
pub fn to_archive_name(name: &str) -> String {
    name.replace('/', "\\")
}

/// Final component of an archive name, accepting either separator
///
/// # Examples
///
/// ```
/// use mpq::path::base_name;
///
/// assert_eq!(base_name("World\\Maps\\Azeroth.wdt"), "Azeroth.wdt");
/// assert_eq!(base_name("plain.txt"), "plain.txt");
/// ```
pub fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Lookup key for case-insensitive, separator-insensitive name comparison
pub fn lookup_key(name: &str) -> String {
    to_archive_name(name).to_ascii_uppercase()
}

/// Local path for an archive name below `dir`
///
/// Empty, `.` and `..` components are dropped so names cannot escape `dir`.
///
/// # Examples
///
/// ```
/// use mpq::path::local_path;
/// use std::path::Path;
///
/// let out = Path::new("out");
/// assert_eq!(local_path(out, "Dir\\a.txt"), out.join("Dir").join("a.txt"));
/// assert_eq!(local_path(out, "../up.txt"), out.join("up.txt"));
/// ```
pub fn local_path(dir: &Path, name: &str) -> PathBuf {
    name.split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .fold(dir.to_path_buf(), |path, part| path.join(part))
}
