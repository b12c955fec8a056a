//! # kiln-bundler
//!
//! External build collaborators for the kiln development loop.
//!
//! Kiln does not transpile or resolve modules itself. This crate wraps the
//! tools that do behind small, testable Rust types:
//!
//! - [`Builder`] - the incremental bundler contract (`build` / `rebuild`)
//! - [`EsbuildBuilder`] - a [`Builder`] that drives the `esbuild` binary
//! - [`StyleCompiler`] - the `sass` subprocess in watch or one-shot mode
//! - [`copy_index_html`] - the HTML stage that publishes `index.html`
//!
//! ## Quick Start
//!
//! ```no_run
//! use kiln_bundler::{BuildOptions, Builder, EsbuildBuilder, format_messages};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let options = BuildOptions::development(["src/app.tsx"], "build/js");
//! let mut builder = EsbuildBuilder::new(options);
//!
//! let output = builder.build().await?;
//! for line in format_messages(&output.diagnostics) {
//!     eprintln!("{line}");
//! }
//! # Ok(()) }
//! ```

pub mod builder;
pub mod diagnostics;
pub mod esbuild;
pub mod html;
pub mod options;
pub mod style;

pub use builder::{Artifact, BuildOutput, Builder};
pub use diagnostics::{Diagnostic, Location, Severity, format_messages, parse_diagnostics};
pub use esbuild::EsbuildBuilder;
pub use html::{INDEX_HTML_NAME, copy_index_html};
pub use options::{BuildOptions, Platform, SourceMapMode};
pub use style::{StyleCompiler, StyleWatch};

use std::path::PathBuf;

/// Error types for the external build collaborators.
///
/// These describe failures to *run* a tool. Source errors reported by a tool
/// that ran fine are [`Diagnostic`]s, not errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The external program could not be started.
    #[error("Failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program ran and exited unsuccessfully.
    #[error("'{program}' exited with {status}: {stderr}")]
    ProcessFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The esbuild metafile could not be read or parsed.
    #[error("Invalid metafile {}: {reason}", .path.display())]
    Metafile { path: PathBuf, reason: String },

    /// A required input file does not exist.
    #[error("Input not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for kiln-bundler operations.
pub type Result<T> = std::result::Result<T, Error>;
