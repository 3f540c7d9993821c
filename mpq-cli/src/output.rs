use crate::{global_opts, OutputFormat};
use colored::*;
use serde::Serialize;
use std::io;

/// Print output according to the global format settings
///
/// Returns `false` when the caller should print its text rendering.
pub fn print_output<T: Serialize>(data: &T) -> Result<bool, io::Error> {
    let opts = global_opts();

    if opts.quiet {
        return Ok(true);
    }

    match opts.output {
        OutputFormat::Json => {
            print_json(data)?;
            Ok(true)
        }
        OutputFormat::Text => Ok(false),
    }
}

/// Print JSON output
pub fn print_json<T: Serialize>(data: &T) -> Result<(), io::Error> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{}", json);
    Ok(())
}

/// Print verbose message (only if verbose mode is on)
pub fn verbose_println(level: u8, message: &str) {
    let opts = global_opts();

    if !opts.quiet && opts.verbose >= level {
        eprintln!("{} {}", "[VERBOSE]".dimmed(), message);
    }
}

/// Check if we should use color
pub fn use_color() -> bool {
    let opts = global_opts();
    !opts.no_color && opts.output == OutputFormat::Text
}

/// Format a byte count for humans
pub fn format_size(size: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = size as f64;
    let mut unit = 0;

    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", size as u64, UNITS[unit])
    } else {
        format!("{:.2} {}", size, UNITS[unit])
    }
}
