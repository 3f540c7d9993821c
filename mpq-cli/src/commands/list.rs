//! List command implementation

use crate::output;
use anyhow::{Context, Result};
use colored::*;
use glob::{MatchOptions, Pattern};
use mpq::{ArchiveEngine, ArchiveSet};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ListReport {
    archives: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pattern: Option<String>,
    total: usize,
    files: Vec<String>,
}

/// Names in the combined listing, optionally filtered by a glob
pub fn matching_names<E: ArchiveEngine>(
    set: &mut ArchiveSet<E>,
    pattern: Option<&str>,
) -> Result<Vec<String>> {
    let pattern = pattern
        .map(Pattern::new)
        .transpose()
        .context("Invalid glob pattern")?;
    let options = MatchOptions {
        case_sensitive: false,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };

    let names = set.list().context("Failed to read (listfile)")?;
    Ok(names
        .iter()
        .filter(|name| {
            pattern
                .as_ref()
                .map_or(true, |p| p.matches_with(name, options))
        })
        .cloned()
        .collect())
}

/// List files in a set of archives
pub fn list<E: ArchiveEngine>(set: &mut ArchiveSet<E>, pattern: Option<&str>) -> Result<()> {
    let files = matching_names(set, pattern)?;
    let report = ListReport {
        archives: set.archives().map(|a| a.path().display().to_string()).collect(),
        pattern: pattern.map(str::to_string),
        total: files.len(),
        files,
    };

    if output::print_output(&report)? {
        return Ok(());
    }

    for name in &report.files {
        println!("{}", name);
    }

    if output::use_color() {
        eprintln!(
            "{} {} from {} archive(s)",
            report.total.to_string().green().bold(),
            "file(s)".bold(),
            report.archives.len()
        );
    } else {
        eprintln!(
            "{} file(s) from {} archive(s)",
            report.total,
            report.archives.len()
        );
    }

    if report.total == 0 && pattern.is_none() {
        eprintln!(
            "{} {}",
            "⚠".yellow(),
            "No (listfile) names found; archives without a (listfile) cannot be listed".yellow()
        );
    }

    Ok(())
}
