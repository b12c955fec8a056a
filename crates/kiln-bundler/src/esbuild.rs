//! [`Builder`] implementation backed by the `esbuild` command-line binary.
//!
//! Each pass runs esbuild once with the same resolved arguments. esbuild is
//! fast enough that re-running it from scratch keeps the rebuild contract
//! without holding a long-lived child process.

use crate::builder::{Artifact, BuildOutput, Builder};
use crate::diagnostics::{Diagnostic, parse_diagnostics};
use crate::options::BuildOptions;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;

/// Drives `esbuild` as a subprocess.
#[derive(Debug, Clone)]
pub struct EsbuildBuilder {
    options: BuildOptions,
    args: Vec<String>,
    passes: u64,
}

impl EsbuildBuilder {
    /// Resolve the command line once; every pass reuses it.
    pub fn new(options: BuildOptions) -> Self {
        let args = command_args(&options);
        Self {
            options,
            args,
            passes: 0,
        }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Arguments passed to the esbuild binary.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Number of completed passes (initial build included).
    pub fn passes(&self) -> u64 {
        self.passes
    }

    async fn run(&mut self) -> Result<BuildOutput> {
        if self.options.entry_points.is_empty() {
            return Err(Error::InvalidConfig(
                "at least one entry point is required".to_string(),
            ));
        }

        let program = self.options.esbuild.display().to_string();
        let start = Instant::now();

        let mut command = Command::new(&self.options.esbuild);
        command
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &self.options.cwd {
            command.current_dir(cwd);
        }

        let output = command.output().await.map_err(|source| Error::Spawn {
            program: program.clone(),
            source,
        })?;
        self.passes += 1;

        let stderr = String::from_utf8_lossy(&output.stderr);
        let mut diagnostics = parse_diagnostics(&stderr);

        if !output.status.success() && !diagnostics.iter().any(is_error) {
            let text = stderr.trim();
            diagnostics.push(Diagnostic::error(if text.is_empty() {
                format!("{program} exited with {}", output.status)
            } else {
                text.to_string()
            }));
        }

        let artifacts = match (&self.options.metafile, output.status.success()) {
            (Some(metafile), true) => self.read_artifacts(metafile).await?,
            _ => Vec::new(),
        };

        let result = BuildOutput::from_diagnostics(artifacts, diagnostics);
        tracing::debug!(
            pass = self.passes,
            elapsed_ms = start.elapsed().as_millis() as u64,
            errors = result.diagnostics.len(),
            warnings = result.warnings.len(),
            artifacts = result.artifacts.len(),
            "esbuild pass finished"
        );

        Ok(result)
    }

    async fn read_artifacts(&self, metafile: &Path) -> Result<Vec<Artifact>> {
        let path = self.resolve(metafile);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| Error::Metafile {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        parse_metafile(&raw, self.options.cwd.as_deref()).map_err(|reason| Error::Metafile {
            path,
            reason,
        })
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match &self.options.cwd {
            Some(cwd) if path.is_relative() => cwd.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[async_trait]
impl Builder for EsbuildBuilder {
    async fn build(&mut self) -> Result<BuildOutput> {
        self.run().await
    }

    async fn rebuild(&mut self) -> Result<BuildOutput> {
        self.run().await
    }
}

fn is_error(diagnostic: &Diagnostic) -> bool {
    diagnostic.severity == crate::Severity::Error
}

/// Translate [`BuildOptions`] into esbuild CLI arguments.
pub(crate) fn command_args(options: &BuildOptions) -> Vec<String> {
    let mut args: Vec<String> = options.entry_points.clone();

    if options.bundle {
        args.push("--bundle".to_string());
    }
    args.push(format!("--outdir={}", options.out_dir.display()));
    args.push(format!("--entry-names={}", options.entry_names));
    for module in &options.inject {
        args.push(format!("--inject:{module}"));
    }
    if let Some(mode) = options.sourcemap {
        args.push(format!("--sourcemap={}", mode.as_str()));
    }
    for (key, value) in &options.define {
        args.push(format!("--define:{key}={value}"));
    }
    args.push(format!("--platform={}", options.platform.as_str()));
    args.push(format!("--target={}", options.target));
    if options.minify {
        args.push("--minify".to_string());
    }
    if let Some(metafile) = &options.metafile {
        args.push(format!("--metafile={}", metafile.display()));
    }
    args.push("--log-level=warning".to_string());
    args.push("--color=false".to_string());

    args
}

#[derive(Debug, Deserialize)]
struct Metafile {
    #[serde(default)]
    outputs: BTreeMap<String, MetafileOutput>,
}

#[derive(Debug, Deserialize)]
struct MetafileOutput {
    bytes: u64,
}

fn parse_metafile(raw: &str, cwd: Option<&Path>) -> std::result::Result<Vec<Artifact>, String> {
    let meta: Metafile = serde_json::from_str(raw).map_err(|e| e.to_string())?;

    Ok(meta
        .outputs
        .into_iter()
        .map(|(path, output)| Artifact {
            path: match cwd {
                Some(cwd) => cwd.join(path),
                None => PathBuf::from(path),
            },
            bytes: output.bytes,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::SourceMapMode;

    #[test]
    fn test_command_args_development() {
        let options = BuildOptions::development(["src/app.tsx"], "build/js")
            .inject("./node_modules/react/index.js");
        let args = command_args(&options);

        assert_eq!(args[0], "src/app.tsx");
        assert!(args.contains(&"--bundle".to_string()));
        assert!(args.contains(&"--outdir=build/js".to_string()));
        assert!(args.contains(&"--entry-names=[dir]/[name]".to_string()));
        assert!(args.contains(&"--inject:./node_modules/react/index.js".to_string()));
        assert!(args.contains(&"--sourcemap=linked".to_string()));
        assert!(args.contains(&"--define:process.env.NODE_ENV=\"development\"".to_string()));
        assert!(args.contains(&"--platform=browser".to_string()));
        assert!(args.contains(&"--target=es2021".to_string()));
        assert!(args.contains(&"--metafile=build/.kiln-meta.json".to_string()));
        assert!(!args.contains(&"--minify".to_string()));
    }

    #[test]
    fn test_command_args_release() {
        let options = BuildOptions::release(["src/app.tsx"], "dist/js");
        let args = command_args(&options);

        assert!(args.contains(&"--minify".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("--sourcemap")));
        assert!(!args.iter().any(|a| a.starts_with("--metafile")));
    }

    #[test]
    fn test_command_args_no_bundle() {
        let options = BuildOptions::new(["a.ts", "b.ts"], "out")
            .bundle(false)
            .sourcemap(SourceMapMode::Inline);
        let args = command_args(&options);

        assert_eq!(&args[..2], &["a.ts".to_string(), "b.ts".to_string()]);
        assert!(!args.contains(&"--bundle".to_string()));
        assert!(args.contains(&"--sourcemap=inline".to_string()));
    }

    #[test]
    fn test_parse_metafile_outputs() {
        let raw = r#"{
            "inputs": {},
            "outputs": {
                "build/js/app.js": { "bytes": 1024, "imports": [] },
                "build/js/app.js.map": { "bytes": 2048 }
            }
        }"#;

        let artifacts = parse_metafile(raw, Some(Path::new("/project"))).unwrap();

        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].path, PathBuf::from("/project/build/js/app.js"));
        assert_eq!(artifacts[0].bytes, 1024);
    }

    #[test]
    fn test_parse_metafile_invalid() {
        assert!(parse_metafile("not json", None).is_err());
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_error() {
        let options = BuildOptions::new(["src/app.tsx"], "out")
            .esbuild("/definitely/not/a/real/esbuild-binary");
        let mut builder = EsbuildBuilder::new(options);

        let err = builder.build().await.unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }));
        assert_eq!(builder.passes(), 0);
    }

    #[tokio::test]
    async fn test_empty_entries_rejected() {
        let mut builder = EsbuildBuilder::new(BuildOptions::new(Vec::<String>::new(), "out"));

        let err = builder.rebuild().await.unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
