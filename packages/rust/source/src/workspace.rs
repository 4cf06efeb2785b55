//! Ephemeral on-disk workspace for remote clones.
//!
//! A [`Workspace`] is created before the clone and removed exactly once.
//! [`Workspace::dispose`] consumes the handle. If a run unwinds before
//! reaching it, `Drop` removes the directory instead.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};

use askctx_shared::RunId;

/// Exclusively owned temp directory holding one run's cloned source.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Create a fresh, uniquely named directory under `parent` (or the system temp dir).
    pub fn create(run_id: &RunId, parent: Option<&Path>) -> io::Result<Self> {
        let prefix = format!("askctx-{run_id}-");
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);

        let dir = match parent {
            Some(parent) => builder.tempdir_in(parent)?,
            None => builder.tempdir()?,
        };
        let path = dir.path().to_path_buf();
        debug!(path = %path.display(), "workspace created");

        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the workspace directory and everything in it.
    pub fn dispose(mut self) -> io::Result<()> {
        match self.dir.take() {
            Some(dir) => {
                dir.close()?;
                debug!(path = %self.path.display(), "workspace removed");
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            warn!(path = %self.path.display(), "workspace dropped before dispose; removing");
            if let Err(e) = dir.close() {
                warn!(path = %self.path.display(), error = %e, "failed to remove workspace");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_dispose_removes_directory() {
        let ws = Workspace::create(&RunId::new(), None).unwrap();
        let path = ws.path().to_path_buf();
        std::fs::write(path.join("a.go"), "package a").unwrap();
        assert!(path.is_dir());

        ws.dispose().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn workspaces_are_uniquely_named() {
        let run_id = RunId::new();
        let a = Workspace::create(&run_id, None).unwrap();
        let b = Workspace::create(&run_id, None).unwrap();
        assert_ne!(a.path(), b.path());
        assert!(
            a.path()
                .file_name()
                .unwrap()
                .to_string_lossy()
                .starts_with("askctx-")
        );
        a.dispose().unwrap();
        b.dispose().unwrap();
    }

    #[test]
    fn drop_without_dispose_still_removes() {
        let path = {
            let ws = Workspace::create(&RunId::new(), None).unwrap();
            ws.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn create_in_parent_directory() {
        let parent = tempfile::tempdir().unwrap();
        let ws = Workspace::create(&RunId::new(), Some(parent.path())).unwrap();
        assert_eq!(ws.path().parent(), Some(parent.path()));
        ws.dispose().unwrap();
    }

    #[test]
    fn create_in_missing_parent_fails() {
        let parent = Path::new("/nonexistent/askctx-parent");
        let result = Workspace::create(&RunId::new(), Some(parent));
        assert!(result.is_err());
    }
}
