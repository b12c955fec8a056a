//! The incremental bundler contract.

use crate::diagnostics::{Diagnostic, Severity};
use crate::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// A file written by the bundler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Result of one bundler pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildOutput {
    /// Files the pass wrote, when the bundler reports them
    pub artifacts: Vec<Artifact>,
    /// Error diagnostics; non-empty means the pass failed
    pub diagnostics: Vec<Diagnostic>,
    /// Warnings reported alongside a successful or failed pass
    pub warnings: Vec<Diagnostic>,
}

impl BuildOutput {
    /// Split parsed diagnostics by severity.
    pub fn from_diagnostics(artifacts: Vec<Artifact>, all: Vec<Diagnostic>) -> Self {
        let (diagnostics, warnings) = all
            .into_iter()
            .partition(|d| d.severity == Severity::Error);
        Self {
            artifacts,
            diagnostics,
            warnings,
        }
    }

    pub fn is_success(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// An external bundler that can build once and then rebuild incrementally.
///
/// `Err` is reserved for failures to run the bundler at all. Problems in the
/// bundled source come back as [`BuildOutput::diagnostics`].
#[async_trait]
pub trait Builder: Send {
    /// Perform the initial build.
    async fn build(&mut self) -> Result<BuildOutput>;

    /// Rebuild, reusing whatever the previous build left behind.
    ///
    /// Must be safe to call any number of times, including after a failed
    /// build. Callers never invoke it concurrently with itself.
    async fn rebuild(&mut self) -> Result<BuildOutput>;
}

#[async_trait]
impl<B: Builder + ?Sized> Builder for Box<B> {
    async fn build(&mut self) -> Result<BuildOutput> {
        (**self).build().await
    }

    async fn rebuild(&mut self) -> Result<BuildOutput> {
        (**self).rebuild().await
    }
}
