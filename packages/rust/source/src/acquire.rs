//! Source acquisition: turn a [`SourceDescriptor`] into an aggregation root.

use std::io;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};

use askctx_shared::{AcquisitionStage, AskCtxError, Result, RunId, SourceDescriptor, redact_url};

use crate::clone::{CloneProgress, RepositoryCloner};
use crate::workspace::Workspace;

/// An acquired source: the root to aggregate plus the workspace owed disposal.
#[derive(Debug)]
pub struct AcquiredSource {
    root: PathBuf,
    workspace: Option<Workspace>,
}

impl AcquiredSource {
    /// Directory (or single file) to aggregate.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the ephemeral workspace, for remote sources.
    pub fn workspace_path(&self) -> Option<&Path> {
        self.workspace.as_ref().map(Workspace::path)
    }

    /// Dispose of the workspace, if any. Call once every consumer of
    /// [`root`](Self::root) has finished.
    pub fn release(self) -> Result<()> {
        match self.workspace {
            Some(workspace) => {
                let path = workspace.path().to_path_buf();
                workspace.dispose().map_err(|e| AskCtxError::io(path, e))
            }
            None => Ok(()),
        }
    }
}

/// Resolves descriptors, cloning remote ones into fresh workspaces.
pub struct SourceAcquirer<C> {
    cloner: C,
    run_id: RunId,
    workspace_parent: Option<PathBuf>,
}

impl<C: RepositoryCloner> SourceAcquirer<C> {
    pub fn new(cloner: C, run_id: RunId) -> Self {
        Self {
            cloner,
            run_id,
            workspace_parent: None,
        }
    }

    /// Create workspaces under `parent` instead of the system temp dir.
    pub fn with_workspace_parent(mut self, parent: Option<PathBuf>) -> Self {
        self.workspace_parent = parent;
        self
    }

    #[instrument(skip_all, fields(run_id = %self.run_id))]
    pub async fn acquire(
        &self,
        descriptor: &SourceDescriptor,
        progress: &dyn CloneProgress,
        cancel: &CancellationToken,
    ) -> Result<AcquiredSource> {
        match descriptor {
            SourceDescriptor::Remote { url } => self.acquire_remote(url, progress, cancel).await,
            SourceDescriptor::Local { path } => acquire_local(path),
        }
    }

    async fn acquire_remote(
        &self,
        url: &str,
        progress: &dyn CloneProgress,
        cancel: &CancellationToken,
    ) -> Result<AcquiredSource> {
        if cancel.is_cancelled() {
            return Err(AskCtxError::cancelled("acquisition"));
        }

        let workspace = Workspace::create(&self.run_id, self.workspace_parent.as_deref())
            .map_err(|e| AskCtxError::AcquisitionFailed {
                url: redact_url(url),
                stage: AcquisitionStage::Workspace,
                cause: e.to_string(),
            })?;

        info!(
            url = %redact_url(url),
            workspace = %workspace.path().display(),
            "acquiring remote source"
        );

        if let Err(e) = self
            .cloner
            .clone_repo(url, workspace.path(), progress, cancel)
            .await
        {
            let path = workspace.path().to_path_buf();
            if let Err(dispose_err) = workspace.dispose() {
                warn!(
                    path = %path.display(),
                    error = %dispose_err,
                    "failed to remove workspace after clone failure"
                );
            }
            return Err(e);
        }

        Ok(AcquiredSource {
            root: workspace.path().to_path_buf(),
            workspace: Some(workspace),
        })
    }
}

fn acquire_local(path: &Path) -> Result<AcquiredSource> {
    let local_read_failed = |source| AskCtxError::LocalReadFailed {
        path: path.to_path_buf(),
        source,
    };
    let meta = std::fs::metadata(path).map_err(local_read_failed)?;
    if !meta.is_file() && !meta.is_dir() {
        return Err(local_read_failed(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file or directory",
        )));
    }

    info!(path = %path.display(), "using local source");
    Ok(AcquiredSource {
        root: path.to_path_buf(),
        workspace: None,
    })
}
