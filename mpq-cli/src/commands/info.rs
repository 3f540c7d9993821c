//! Info command implementation

use crate::output::{self, format_size};
use anyhow::{Context, Result};
use colored::*;
use mpq::{ArchiveEngine, ArchiveSet, Error};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct InfoReport {
    filename: String,
    basename: String,
    archive: String,
    patched_archive: bool,
    file_size: u64,
    compressed_size: u64,
    compression_ratio: f64,
    file_time: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    date_time: Option<String>,
}

fn describe<E: ArchiveEngine>(set: &ArchiveSet<E>, filename: &str) -> Result<InfoReport> {
    let file = set
        .open(filename)
        .with_context(|| format!("Failed to open {}", filename))?;
    let archive = set.archive(file.entry().archive())?;
    let info = file.info();

    let file_size = info.file_size()?;
    let compressed_size = info.compress_size()?;
    let compression_ratio = if file_size > 0 {
        100.0 * compressed_size as f64 / file_size as f64
    } else {
        100.0
    };

    // Some engines cannot report a time; treat that as "not recorded"
    let (file_time, date_time) = match info.file_time() {
        Ok(raw) => (raw, mpq::info::filetime_to_datetime(raw)),
        Err(Error::Unsupported(_)) => (0, None),
        Err(e) => return Err(e.into()),
    };

    Ok(InfoReport {
        filename: info.filename()?,
        basename: info.basename()?,
        archive: archive.path().display().to_string(),
        patched_archive: set.is_patched(archive.id())?,
        file_size,
        compressed_size,
        compression_ratio,
        file_time,
        date_time: date_time.map(|dt| dt.to_rfc3339()),
    })
}

/// Show metadata of a file
pub fn info<E: ArchiveEngine>(set: &ArchiveSet<E>, filename: &str) -> Result<()> {
    let report = describe(set, filename)?;

    if output::print_output(&report)? {
        return Ok(());
    }

    println!("{}", "File Information:".bold().underline());
    println!("  {}: {}", "Filename".bold(), report.filename.cyan());
    println!("  {}: {}", "Basename".bold(), report.basename);
    println!(
        "  {}: {}{}",
        "Archive".bold(),
        report.archive.bright_blue(),
        if report.patched_archive {
            " (patched)".dimmed().to_string()
        } else {
            String::new()
        }
    );
    println!(
        "  {}: {} ({})",
        "File size".bold(),
        report.file_size.to_string().green(),
        format_size(report.file_size).dimmed()
    );
    println!(
        "  {}: {} ({})",
        "Compressed size".bold(),
        report.compressed_size.to_string().yellow(),
        format_size(report.compressed_size).dimmed()
    );
    println!(
        "  {}: {:.1}%",
        "Compression ratio".bold(),
        report.compression_ratio
    );
    match &report.date_time {
        Some(dt) => println!("  {}: {}", "Modified".bold(), dt),
        None => println!("  {}: {}", "Modified".bold(), "not recorded".dimmed()),
    }

    Ok(())
}
