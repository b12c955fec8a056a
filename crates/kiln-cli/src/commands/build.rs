//! Release build command implementation.
//!
//! Runs each stage once, in order: styles, the minified bundle, then
//! index.html. Any failure stops the command with a non-zero exit.

use crate::cli::BuildArgs;
use crate::commands::{check_entries, template_error};
use crate::config::{KilnConfig, project_root};
use crate::error::{BuildError, Result};
use crate::ui::{self, Spinner};
use kiln_bundler::{BuildOptions, Builder, EsbuildBuilder, StyleCompiler, copy_index_html};
use std::path::Path;
use std::time::Instant;

const METAFILE_NAME: &str = ".kiln-meta.json";

/// Execute the build command.
///
/// # Errors
///
/// Returns errors for invalid configuration, a missing entry point or
/// template, a tool that cannot run, or a bundle with error diagnostics.
pub async fn execute(args: BuildArgs) -> Result<()> {
    let root = project_root(args.cwd.as_deref())?;
    let config = KilnConfig::load(&root, args.config.as_deref(), &args.overrides())?;

    run(&config, &root).await
}

/// Produce a release build of the project at `root`.
pub async fn run(config: &KilnConfig, root: &Path) -> Result<()> {
    check_entries(root, &config.entry)?;

    let out_dir = KilnConfig::resolve(root, &config.release_out_dir);
    let start = Instant::now();

    if config.styles {
        let spinner = Spinner::new("Compiling styles...");
        let compiler = StyleCompiler::new(
            KilnConfig::resolve(root, &config.styles_dir),
            out_dir.join("css"),
        )
        .program(&config.sass)
        .cwd(root);

        if let Err(e) = compiler.compile().await {
            spinner.fail("Style compilation failed");
            return Err(e.into());
        }
        spinner.finish("Styles compiled");
    }

    let spinner = Spinner::new("Bundling...");
    let metafile = out_dir.join(METAFILE_NAME);
    let mut options = BuildOptions::release(&config.entry, out_dir.join("js"))
        .target(&config.target)
        .cwd(root)
        .esbuild(&config.esbuild)
        .metafile(&metafile);
    for module in &config.inject {
        options = options.inject(module);
    }

    let mut builder = EsbuildBuilder::new(options);
    let output = match builder.build().await {
        Ok(output) => output,
        Err(e) => {
            spinner.fail("Bundling failed");
            return Err(e.into());
        }
    };
    if !output.is_success() {
        spinner.fail("Bundling failed");
        ui::print_diagnostics(&output);
        return Err(BuildError::ReleaseBuildFailed {
            count: output.diagnostics.len(),
        }
        .into());
    }
    spinner.finish("Bundle written");
    ui::print_diagnostics(&output);

    copy_index_html(&KilnConfig::resolve(root, &config.public_dir), &out_dir)
        .await
        .map_err(template_error)?;

    // The metafile is only needed to list artifacts; keep it out of the release.
    if let Err(e) = tokio::fs::remove_file(&metafile).await {
        tracing::debug!(path = %metafile.display(), error = %e, "Metafile not removed");
    }

    ui::print_artifacts(&output.artifacts, root);
    ui::success(&format!(
        "Release build written to {} in {}",
        out_dir.display(),
        ui::format_duration(start.elapsed())
    ));

    Ok(())
}
