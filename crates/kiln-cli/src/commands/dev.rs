//! Development server command implementation.
//!
//! Orchestrates the dev loop:
//! - copy index.html and run the initial build (errors abort startup)
//! - start sass in watch mode
//! - start the hub, the rebuild loop and the file watcher
//! - serve HTTP and WebSocket clients until Ctrl+C

use crate::cli::DevArgs;
use crate::commands::{check_entries, template_error};
use crate::dev::config::server_url;
use crate::dev::{BuildTrigger, ChangeWatcher, DevConfig, Hub, ReloadServer};
use crate::error::{BuildError, CliError, Result, ResultExt};
use crate::ui;
use kiln_bundler::{Builder, EsbuildBuilder, StyleWatch, copy_index_html};
use std::future::Future;
use std::time::Instant;
use tokio::sync::oneshot;

/// Execute the dev command.
///
/// # Errors
///
/// Returns errors for invalid configuration, a failed initial build, a
/// watcher that cannot start, or a port that cannot be bound. Everything
/// after startup is reported to the browser and the terminal instead.
pub async fn execute(args: DevArgs) -> Result<()> {
    ui::info("Starting development server...");

    let config = DevConfig::from_args(&args)?;
    ui::info(&format!("Project root: {}", config.root.display()));

    run(config, shutdown_signal()).await
}

/// Run the dev loop until `shutdown` resolves.
pub async fn run<F>(config: DevConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    check_entries(&config.root, &config.entry)?;
    copy_index_html(&config.public_dir, &config.out_dir)
        .await
        .map_err(template_error)?;

    // Initial build
    let mut builder = EsbuildBuilder::new(config.build_options());
    let start = Instant::now();
    let output = builder.build().await?;
    ui::print_diagnostics(&output);
    if !output.is_success() {
        ui::error("Initial build failed");
        return Err(BuildError::InitialBuildFailed {
            count: output.diagnostics.len(),
        }
        .into());
    }
    ui::success(&format!(
        "Initial build completed in {}",
        ui::format_duration(start.elapsed())
    ));

    let styles = start_styles(&config);

    let (hub, hub_task) = Hub::spawn();
    let (signal, trigger_task) = BuildTrigger::new(builder).spawn(hub.clone());

    let watcher = ChangeWatcher::watch(&config.watch_dir, config.debounce, signal)?;

    let listener = ReloadServer::bind(config.addr)
        .await
        .with_hint("Choose another port with --port or KILN_PORT")?;
    let url = server_url(listener.local_addr().context("Reading server address")?);
    let server = ReloadServer::new(&config.out_dir, hub.clone())
        .client_queue(config.client_queue)
        .send_timeout(config.send_timeout);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let mut server_task = tokio::spawn(server.serve(listener, async move {
        let _ = stop_rx.await;
    }));

    ui::success(&format!("Development server running at {}", url));
    ui::info(&format!(
        "Watching for changes in: {}",
        watcher.root().display()
    ));
    if config.open {
        open_browser(&url);
    }
    ui::info("Press Ctrl+C to stop");

    let outcome = tokio::select! {
        _ = shutdown => {
            ui::info("Shutting down development server...");
            Ok(())
        }
        result = &mut server_task => match result {
            Ok(Ok(())) => Err(CliError::Server("server stopped unexpectedly".to_string())),
            Ok(Err(e)) => Err(e),
            Err(e) => Err(CliError::Server(e.to_string())),
        },
    };

    drop(watcher);
    trigger_task.abort();
    let _ = hub.shutdown().await;
    let _ = hub_task.await;
    let _ = stop_tx.send(());
    if !server_task.is_finished() {
        let _ = server_task.await;
    }
    if let Some(styles) = styles {
        if let Err(e) = styles.stop().await {
            tracing::debug!(error = %e, "Style compiler already stopped");
        }
    }

    if outcome.is_ok() {
        ui::success("Development server stopped");
    }
    outcome
}

/// Start sass in watch mode. Failure only costs style rebuilds.
fn start_styles(config: &DevConfig) -> Option<StyleWatch> {
    if !config.styles {
        return None;
    }
    if !config.styles_dir.is_dir() {
        ui::warning(&format!(
            "Styles directory not found, skipping sass: {}",
            config.styles_dir.display()
        ));
        return None;
    }

    match config.style_compiler().watch() {
        Ok(watch) => Some(watch),
        Err(e) => {
            ui::warning(&format!("Style compiler not started: {}", e));
            None
        }
    }
}

/// Resolve on Ctrl+C. Never resolves if the handler cannot be installed.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// Open the server URL in the default browser.
///
/// Uses platform-specific commands:
/// - macOS: `open`
/// - Windows: `start`
/// - Linux: `xdg-open`
fn open_browser(url: &str) {
    use std::process::Command;

    let result = if cfg!(target_os = "macos") {
        Command::new("open").arg(url).spawn()
    } else if cfg!(target_os = "windows") {
        Command::new("cmd").args(["/C", "start", url]).spawn()
    } else {
        Command::new("xdg-open").arg(url).spawn()
    };

    match result {
        Ok(_) => ui::info(&format!("Opened browser at {}", url)),
        Err(e) => ui::warning(&format!("Failed to open browser: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::KilnConfig;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn project(with_template: bool) -> TempDir {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("src")).unwrap();
        std::fs::create_dir_all(temp.path().join("public")).unwrap();
        std::fs::write(temp.path().join("src/app.tsx"), "export {}").unwrap();
        if with_template {
            std::fs::write(temp.path().join("public/index.html"), "<html></html>").unwrap();
        }
        temp
    }

    fn config(root: PathBuf) -> DevConfig {
        let config = KilnConfig {
            port: 0,
            styles: false,
            esbuild: PathBuf::from("/definitely/not/a/real/esbuild-binary"),
            ..KilnConfig::default()
        };
        DevConfig::from_config(config, root, false).unwrap()
    }

    #[tokio::test]
    async fn test_missing_template_aborts_startup() {
        let temp = project(false);
        let err = run(config(temp.path().to_path_buf()), std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Build(BuildError::TemplateNotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_bundler_aborts_startup() {
        let temp = project(true);
        let err = run(config(temp.path().to_path_buf()), std::future::pending())
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::Bundler(kiln_bundler::Error::Spawn { .. })));

        // The HTML stage ran before the build.
        assert!(temp.path().join("build/index.html").is_file());
    }
}
