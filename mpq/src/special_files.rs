//! Special MPQ files handling: (listfile)

use crate::path::normalize;

/// Parse a (listfile) into normalized filenames
///
/// The (listfile) format is:
/// - One filename per line, lines separated by CRLF (bare LF is accepted too)
/// - Backslash separated paths, returned with forward slashes
/// - Empty lines are ignored
pub fn parse_listfile(data: &[u8]) -> Vec<String> {
    let content = match std::str::from_utf8(data) {
        Ok(s) => s.to_string(),
        Err(_) => {
            log::warn!("(listfile) contains invalid UTF-8, using lossy conversion");
            String::from_utf8_lossy(data).into_owned()
        }
    };

    let files: Vec<String> = content
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(normalize)
        .collect();

    log::debug!("Parsed {} files from (listfile)", files.len());
    files
}
