//! Style-sheet compiler subprocess.
//!
//! Development runs `sass --watch` for the lifetime of the dev server and
//! forwards its output to the log; release builds run it once.

use crate::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

/// Compiles a styles directory into a CSS output directory.
#[derive(Debug, Clone)]
pub struct StyleCompiler {
    program: PathBuf,
    input: PathBuf,
    output: PathBuf,
    cwd: Option<PathBuf>,
}

impl StyleCompiler {
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from("sass"),
            input: input.into(),
            output: output.into(),
            cwd: None,
        }
    }

    /// Override the compiler executable (defaults to `sass`).
    pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    /// `input:output` directory mapping understood by sass.
    pub fn mapping(&self) -> String {
        format!("{}:{}", self.input.display(), self.output.display())
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.stdin(Stdio::null());
        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }
        command
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Compile once and wait for completion.
    pub async fn compile(&self) -> Result<()> {
        let output = self
            .command()
            .arg(self.mapping())
            .output()
            .await
            .map_err(|source| Error::Spawn {
                program: self.program_name(),
                source,
            })?;

        if !output.status.success() {
            return Err(Error::ProcessFailed {
                program: self.program_name(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(())
    }

    /// Start the compiler in watch mode.
    ///
    /// Stdout and stderr are merged into the log line by line. The child is
    /// killed when the returned [`StyleWatch`] is dropped.
    pub fn watch(&self) -> Result<StyleWatch> {
        let mut child = self
            .command()
            .arg("--watch")
            .arg(self.mapping())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| Error::Spawn {
                program: self.program_name(),
                source,
            })?;

        let mut forwarders = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            forwarders.push(tokio::spawn(forward_lines(stdout)));
        }
        if let Some(stderr) = child.stderr.take() {
            forwarders.push(tokio::spawn(forward_lines(stderr)));
        }

        tracing::info!(mapping = %self.mapping(), "Style compiler watching");

        Ok(StyleWatch { child, forwarders })
    }
}

/// A running `sass --watch` process.
#[derive(Debug)]
pub struct StyleWatch {
    child: Child,
    forwarders: Vec<JoinHandle<()>>,
}

impl StyleWatch {
    /// Wait for the compiler to exit on its own.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        Ok(self.child.wait().await?)
    }

    /// Stop the compiler.
    pub async fn stop(mut self) -> Result<()> {
        self.child.kill().await?;
        for forwarder in self.forwarders.drain(..) {
            forwarder.abort();
        }
        Ok(())
    }
}

async fn forward_lines<R>(reader: R)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) if !line.trim().is_empty() => {
                tracing::info!(target: "kiln::styles", "{line}");
            }
            Ok(Some(_)) => {}
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(error = %e, "Style compiler output closed");
                break;
            }
        }
    }
}
