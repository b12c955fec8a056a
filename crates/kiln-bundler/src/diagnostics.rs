//! Diagnostic extraction from bundler log output.
//!
//! esbuild reports problems as human-readable blocks on stderr. This module
//! turns those blocks into [`Diagnostic`] values and renders them back into
//! the formatted strings that are shown in the terminal and in the browser
//! overlay.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// Source position a diagnostic points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

/// One problem reported by the bundler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Headline message
    pub text: String,
    pub location: Option<Location>,
    /// Code frame and notes that followed the headline, dedented
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub detail: String,
}

impl Diagnostic {
    /// Create an error diagnostic with no location.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
            location: None,
            detail: String::new(),
        }
    }

    /// Render as `file:line:column: severity: text`, followed by the detail
    /// block when present.
    pub fn format(&self) -> String {
        let mut out = match &self.location {
            Some(loc) => format!(
                "{}:{}:{}: {}: {}",
                loc.file, loc.line, loc.column, self.severity, self.text
            ),
            None => format!("{}: {}", self.severity, self.text),
        };

        if !self.detail.is_empty() {
            out.push('\n');
            out.push_str(&self.detail);
        }

        out
    }
}

/// Format diagnostics into display strings, one per diagnostic, in order.
pub fn format_messages(diagnostics: &[Diagnostic]) -> Vec<String> {
    diagnostics.iter().map(Diagnostic::format).collect()
}

/// Parse esbuild log output into diagnostics.
///
/// Every unindented line starting with an `[ERROR]` or `[WARNING]` marker
/// (optionally after esbuild's glyph) starts a new diagnostic; following
/// lines up to the next marker (or the trailing `N errors` summary) belong
/// to it. The first `path:line:column:` line of a
/// block becomes its [`Location`].
pub fn parse_diagnostics(output: &str) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();
    let mut current: Option<(Diagnostic, Vec<&str>)> = None;

    for line in output.lines() {
        if let Some((severity, text)) = parse_headline(line) {
            if let Some(done) = current.take() {
                diagnostics.push(finish(done));
            }
            current = Some((
                Diagnostic {
                    severity,
                    text: text.to_string(),
                    location: None,
                    detail: String::new(),
                },
                Vec::new(),
            ));
            continue;
        }

        if is_summary(line) {
            if let Some(done) = current.take() {
                diagnostics.push(finish(done));
            }
            continue;
        }

        if let Some((diagnostic, body)) = current.as_mut() {
            if diagnostic.location.is_none() {
                if let Some(location) = parse_location(line) {
                    diagnostic.location = Some(location);
                    continue;
                }
            }
            body.push(line);
        }
    }

    if let Some(done) = current.take() {
        diagnostics.push(finish(done));
    }

    diagnostics
}

/// Glyphs esbuild prints before the severity marker (`X` on Windows).
const HEADLINE_GLYPHS: &[&str] = &["✘", "▲", "X", "⚠"];

/// A headline starts at column 0: an optional glyph, then the marker.
/// Quoted source lines are indented, so a marker inside them never matches.
fn parse_headline(line: &str) -> Option<(Severity, &str)> {
    let marked = match line.split_once(' ') {
        Some((glyph, rest)) if HEADLINE_GLYPHS.contains(&glyph) => rest,
        _ => line,
    };

    if let Some(text) = marked.strip_prefix("[ERROR]") {
        return Some((Severity::Error, text.trim()));
    }
    if let Some(text) = marked.strip_prefix("[WARNING]") {
        return Some((Severity::Warning, text.trim()));
    }
    None
}

/// Matches esbuild's trailing `1 error` / `2 warnings and 1 error` line.
fn is_summary(line: &str) -> bool {
    fn is_count(w: &str) -> bool {
        !w.is_empty() && w.chars().all(|c| c.is_ascii_digit())
    }
    fn is_kind(w: &str) -> bool {
        matches!(w, "error" | "errors" | "warning" | "warnings")
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        [n, kind] => is_count(n) && is_kind(kind),
        [n1, k1, "and", n2, k2] => is_count(n1) && is_kind(k1) && is_count(n2) && is_kind(k2),
        _ => false,
    }
}

fn parse_location(line: &str) -> Option<Location> {
    let trimmed = line.trim().strip_suffix(':')?;
    let mut parts = trimmed.rsplitn(3, ':');
    let column = parts.next()?.parse().ok()?;
    let line_no = parts.next()?.parse().ok()?;
    let file = parts.next()?;
    if file.is_empty() || file.contains(char::is_whitespace) {
        return None;
    }

    Some(Location {
        file: file.to_string(),
        line: line_no,
        column,
    })
}

fn finish((mut diagnostic, body): (Diagnostic, Vec<&str>)) -> Diagnostic {
    // esbuild indents with ASCII spaces; other whitespace is content.
    let indent = body
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start_matches(' ').len())
        .min()
        .unwrap_or(0);

    let lines: Vec<&str> = body
        .iter()
        .map(|l| l.get(indent..).unwrap_or_else(|| l.trim_start()))
        .collect();

    diagnostic.detail = lines.join("\n").trim_matches('\n').trim_end().to_string();
    diagnostic
}
