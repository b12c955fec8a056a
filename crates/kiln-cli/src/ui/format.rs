//! Formatting utilities for sizes, durations, and build summaries.

use console::Term;
use kiln_bundler::{Artifact, BuildOutput, format_messages};
use owo_colors::OwoColorize;
use std::path::Path;
use std::time::Duration;

/// Format file size in human-readable format.
///
/// ```
/// use kiln_cli::ui::format_size;
///
/// assert_eq!(format_size(0), "0 B");
/// assert_eq!(format_size(500), "500 B");
/// assert_eq!(format_size(1024), "1.00 KB");
/// assert_eq!(format_size(1_048_576), "1.00 MB");
/// ```
pub fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;

    match bytes {
        b if b < KIB => format!("{b} B"),
        b if b < KIB.pow(2) => format!("{:.2} KB", b as f64 / KIB as f64),
        b if b < KIB.pow(3) => format!("{:.2} MB", b as f64 / KIB.pow(2) as f64),
        b => format!("{:.2} GB", b as f64 / KIB.pow(3) as f64),
    }
}

/// Format duration in human-readable format.
///
/// ```
/// use std::time::Duration;
/// use kiln_cli::ui::format_duration;
///
/// assert_eq!(format_duration(Duration::from_millis(50)), "50ms");
/// assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
/// assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
/// ```
pub fn format_duration(duration: Duration) -> String {
    match duration.as_millis() {
        ms if ms < 1_000 => format!("{ms}ms"),
        ms if ms < 60_000 => format!("{:.2}s", duration.as_secs_f64()),
        _ => {
            let secs = duration.as_secs();
            format!("{}m {}s", secs / 60, secs % 60)
        }
    }
}

/// Print the files a build wrote, relative to `root`, with a total.
pub fn print_artifacts(artifacts: &[Artifact], root: &Path) {
    if artifacts.is_empty() {
        return;
    }

    let width = (Term::stderr().size().1 as usize).min(80);
    eprintln!();
    for artifact in artifacts {
        let name = artifact
            .path
            .strip_prefix(root)
            .unwrap_or(&artifact.path)
            .display()
            .to_string();
        let size = format_size(artifact.bytes);
        let pad = width.saturating_sub(name.len() + size.len() + 4).max(1);
        eprintln!("  {}{}{}", name.cyan(), " ".repeat(pad), size.dimmed());
    }

    let total: u64 = artifacts.iter().map(|a| a.bytes).sum();
    eprintln!(
        "  {} {} file(s), {}",
        "Total:".bold(),
        artifacts.len(),
        format_size(total)
    );
}

/// Print warnings and errors of a bundler pass to stderr.
pub fn print_diagnostics(output: &BuildOutput) {
    for warning in format_messages(&output.warnings) {
        super::warning(&warning);
    }
    for message in format_messages(&output.diagnostics) {
        eprintln!("{message}\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(5 * 1024 * 1024 * 1024), "5.00 GB");
    }

    #[test]
    fn test_format_duration_boundaries() {
        assert_eq!(format_duration(Duration::from_millis(999)), "999ms");
        assert_eq!(format_duration(Duration::from_millis(1000)), "1.00s");
        assert_eq!(format_duration(Duration::from_secs(60)), "1m 0s");
    }
}
