//! Remote repository cloning.
//!
//! [`GitCloner`] shells out to `git clone --progress` and relays progress.
//! Git writes progress to stderr using `\r`-terminated updates. The relay
//! splits on both `\r` and `\n` and forwards each line to a [`CloneProgress`]
//! sink.

use std::future::Future;
use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::{ChildStderr, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use askctx_shared::{AcquisitionStage, AskCtxError, Result, SourceConfig, redact_url};

/// Receives clone progress lines (the diagnostic stream).
pub trait CloneProgress: Send + Sync {
    fn clone_progress(&self, line: &str);
}

/// Discards progress; used for headless runs and tests.
pub struct SilentCloneProgress;

impl CloneProgress for SilentCloneProgress {
    fn clone_progress(&self, _line: &str) {}
}

/// Populates an existing, empty directory with a clone of `url`.
pub trait RepositoryCloner: Send + Sync {
    fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        progress: &dyn CloneProgress,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<()>> + Send;
}

// ---------------------------------------------------------------------------
// GitCloner
// ---------------------------------------------------------------------------

/// Clones with the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCloner {
    program: String,
    depth: Option<u32>,
}

impl GitCloner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            depth: None,
        }
    }

    /// Limit history to `depth` commits.
    pub fn with_depth(mut self, depth: Option<u32>) -> Self {
        self.depth = depth;
        self
    }
}

impl From<&SourceConfig> for GitCloner {
    fn from(config: &SourceConfig) -> Self {
        Self::new(config.git_program.clone()).with_depth(config.clone_depth)
    }
}

impl RepositoryCloner for GitCloner {
    #[instrument(skip_all, fields(url = %redact_url(url), dest = %dest.display()))]
    async fn clone_repo(
        &self,
        url: &str,
        dest: &Path,
        progress: &dyn CloneProgress,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut cmd = Command::new(&self.program);
        cmd.arg("clone").arg("--progress");
        if let Some(depth) = self.depth {
            cmd.arg("--depth").arg(depth.to_string());
        }
        cmd.arg("--")
            .arg(url)
            .arg(dest)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(program = %self.program, depth = ?self.depth, "cloning repository");

        let mut child = cmd.spawn().map_err(|e| {
            clone_failed(
                url,
                format!("failed to spawn `{}`: {e}. Is git installed?", self.program),
            )
        })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| clone_failed(url, "failed to capture git stderr"))?;

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            done = async { tokio::join!(child.wait(), relay_progress(stderr, progress)) } => {
                Some(done)
            }
        };

        let Some((status, last_line)) = outcome else {
            if let Err(e) = child.kill().await {
                debug!(error = %e, "git already exited");
            }
            return Err(AskCtxError::cancelled("clone"));
        };

        let status = status.map_err(|e| clone_failed(url, format!("failed to wait for git: {e}")))?;
        if !status.success() {
            let cause = last_line.unwrap_or_else(|| {
                format!("git exited with status {}", status.code().unwrap_or(-1))
            });
            return Err(clone_failed(url, cause));
        }

        info!("clone complete");
        Ok(())
    }
}

fn clone_failed(url: &str, cause: impl Into<String>) -> AskCtxError {
    AskCtxError::AcquisitionFailed {
        url: redact_url(url),
        stage: AcquisitionStage::Clone,
        cause: cause.into(),
    }
}

/// Forward git's stderr to `progress`, returning the last non-empty line.
async fn relay_progress(mut stderr: ChildStderr, progress: &dyn CloneProgress) -> Option<String> {
    let mut lines = ProgressLines::default();
    let mut chunk = [0u8; 4096];
    let mut last = None;

    loop {
        let n = match stderr.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                debug!(error = %e, "stopped reading git stderr");
                break;
            }
        };
        for line in lines.push(&chunk[..n]) {
            progress.clone_progress(&line);
            last = Some(line);
        }
    }

    if let Some(line) = lines.finish() {
        progress.clone_progress(&line);
        last = Some(line);
    }
    last
}

/// Splits a byte stream into lines on `\r` or `\n`, dropping empty lines.
#[derive(Debug, Default)]
struct ProgressLines {
    pending: Vec<u8>,
}

impl ProgressLines {
    fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        let mut out = Vec::new();
        for &b in bytes {
            if b == b'\n' || b == b'\r' {
                if let Some(line) = self.take_line() {
                    out.push(line);
                }
            } else {
                self.pending.push(b);
            }
        }
        out
    }

    fn finish(&mut self) -> Option<String> {
        self.take_line()
    }

    fn take_line(&mut self) -> Option<String> {
        let line = String::from_utf8_lossy(&self.pending).trim().to_string();
        self.pending.clear();
        (!line.is_empty()).then_some(line)
    }
}
