//! Find command implementation

use crate::output;
use anyhow::{bail, Result};
use colored::*;
use mpq::{ArchiveEngine, ArchiveSet};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ArchiveMatch {
    archive: String,
    id: usize,
    serves: bool,
}

#[derive(Debug, Serialize)]
struct FindReport {
    filename: String,
    found: bool,
    /// Every archive containing the name, in priority order
    matches: Vec<ArchiveMatch>,
}

fn search<E: ArchiveEngine>(set: &ArchiveSet<E>, filename: &str) -> Result<FindReport> {
    let matches: Vec<ArchiveMatch> = set
        .archives_containing(filename)?
        .into_iter()
        .enumerate()
        .map(|(i, archive)| ArchiveMatch {
            archive: archive.path().display().to_string(),
            id: archive.id().index(),
            serves: i == 0,
        })
        .collect();

    Ok(FindReport {
        filename: filename.to_string(),
        found: !matches.is_empty(),
        matches,
    })
}

/// Find which archives contain a file and which one serves it
pub fn find<E: ArchiveEngine>(set: &ArchiveSet<E>, filename: &str) -> Result<()> {
    let report = search(set, filename)?;

    if !output::print_output(&report)? {
        if report.found {
            println!("{} {}", "✓".green().bold(), filename.cyan());
            for m in &report.matches {
                if m.serves {
                    println!("  {} {}", m.archive.bright_blue(), "(serves)".green());
                } else {
                    println!("  {} {}", m.archive.dimmed(), "(shadowed)".dimmed());
                }
            }
        } else {
            println!("{} {} not found", "✗".red().bold(), filename.cyan());
        }
    }

    if !report.found {
        bail!("File not found: {}", filename);
    }
    Ok(())
}
