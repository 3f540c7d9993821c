//! Extract command implementation

use crate::{global_opts, output, OutputFormat};
use anyhow::{bail, Context, Result};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use mpq::path::local_path;
use mpq::{ArchiveEngine, ArchiveSet};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct ExtractReport {
    output_dir: String,
    mode: String, // "selected" or "all"
    total_files: usize,
    extracted: usize,
    skipped: usize,
    failed: usize,
    files: Vec<FileExtractResult>,
}

#[derive(Debug, Serialize)]
struct FileExtractResult {
    filename: String,
    output_path: String,
    status: String, // "success", "skipped" or "failed"
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Local path for an archive name below `output_dir`
pub fn build_output_path(output_dir: &Path, archive_filename: &str) -> PathBuf {
    local_path(output_dir, archive_filename)
}

/// Extract `names` one by one, recording each outcome
///
/// With `skip_missing`, names no archive holds are reported as skipped
/// instead of failed.
fn extract_names<E: ArchiveEngine>(
    set: &ArchiveSet<E>,
    output_dir: &Path,
    names: &[String],
    skip_missing: bool,
    progress: Option<&ProgressBar>,
) -> Vec<FileExtractResult> {
    let mut results = Vec::with_capacity(names.len());

    for name in names {
        let dest = build_output_path(output_dir, name);
        if let Some(pb) = progress {
            pb.set_message(name.clone());
        }

        if skip_missing && !set.contains(name).unwrap_or(true) {
            log::warn!("Listed file {} is not in any archive", name);
            results.push(FileExtractResult {
                filename: name.clone(),
                output_path: dest.display().to_string(),
                status: "skipped".to_string(),
                error: None,
            });
            if let Some(pb) = progress {
                pb.inc(1);
            }
            continue;
        }

        let result = set.extract(name, &dest);
        if let Err(e) = &result {
            log::warn!("Failed to extract {}: {}", name, e);
        }
        output::verbose_println(2, &format!("{} -> {}", name, dest.display()));

        results.push(FileExtractResult {
            filename: name.clone(),
            output_path: dest.display().to_string(),
            status: if result.is_ok() { "success" } else { "failed" }.to_string(),
            error: result.err().map(|e| e.to_string()),
        });

        if let Some(pb) = progress {
            pb.inc(1);
        }
    }

    results
}

/// Extract the named files, or every listed file when `files` is empty
pub fn extract<E: ArchiveEngine>(
    set: &mut ArchiveSet<E>,
    output_dir: &Path,
    files: &[String],
) -> Result<()> {
    let opts = global_opts();

    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir.display()))?;

    let (mode, names) = if files.is_empty() {
        let names: Vec<String> = set
            .list()
            .context("Failed to read (listfile)")?
            .iter()
            .cloned()
            .collect();
        ("all", names)
    } else {
        ("selected", files.to_vec())
    };

    let progress = if mode == "all" && !opts.quiet && opts.output == OutputFormat::Text {
        let pb = ProgressBar::new(names.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let results = extract_names(set, output_dir, &names, mode == "all", progress.as_ref());
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }

    let failed = results.iter().filter(|r| r.status == "failed").count();
    let skipped = results.iter().filter(|r| r.status == "skipped").count();
    let report = ExtractReport {
        output_dir: output_dir.display().to_string(),
        mode: mode.to_string(),
        total_files: results.len(),
        extracted: results.len() - failed - skipped,
        skipped,
        failed,
        files: results,
    };

    if !output::print_output(&report)? {
        for file in report.files.iter().filter(|f| f.status == "failed") {
            eprintln!(
                "{} {}: {}",
                "✗".red().bold(),
                file.filename,
                file.error.as_deref().unwrap_or("unknown error")
            );
        }

        if report.skipped > 0 {
            output::verbose_println(
                1,
                &format!("Skipped {} listed file(s) missing from every archive", report.skipped),
            );
        }

        if output::use_color() {
            println!(
                "{} Extracted {} of {} file(s) to {}",
                "✓".green().bold(),
                report.extracted.to_string().green(),
                report.total_files,
                report.output_dir.cyan()
            );
        } else {
            println!(
                "✓ Extracted {} of {} file(s) to {}",
                report.extracted, report.total_files, report.output_dir
            );
        }
    }

    if report.failed > 0 {
        bail!("{} file(s) could not be extracted", report.failed);
    }
    Ok(())
}
