//! Command implementations for the kiln CLI.
//!
//! - [`dev`] - development server with live reload
//! - [`build`] - release build
//!
//! Each command provides an `execute` function that takes the parsed
//! arguments and returns a Result.

pub mod build;
pub mod dev;

// Re-export execute functions for convenience
pub use build::execute as build_execute;
pub use dev::execute as dev_execute;

use crate::error::{BuildError, CliError, Result};
use std::path::Path;

/// Fail early when an entry point is missing, before spawning the bundler.
pub(crate) fn check_entries(root: &Path, entries: &[String]) -> Result<()> {
    for entry in entries {
        let path = root.join(entry);
        if !path.is_file() {
            return Err(BuildError::EntryNotFound(path).into());
        }
    }
    Ok(())
}

/// Map a missing template to a build error with a hint.
pub(crate) fn template_error(err: kiln_bundler::Error) -> CliError {
    match err {
        kiln_bundler::Error::MissingInput(path) => BuildError::TemplateNotFound(path).into(),
        other => other.into(),
    }
}
