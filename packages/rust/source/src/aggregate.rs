//! Corpus aggregation: walk a tree and concatenate selected files.
//!
//! Entries are visited depth-first, sorted by file name within each
//! directory, so the same tree always yields the same corpus. File contents
//! are appended back to back with no separator. Any walk or read error aborts
//! the whole aggregation.

use std::ffi::OsStr;
use std::path::Path;

use regex::Regex;
use tracing::{debug, instrument, trace};
use walkdir::{DirEntry, WalkDir};

use askctx_shared::{AskCtxError, Corpus, Result};

/// Decides which files contribute to the corpus.
#[derive(Debug, Clone)]
pub struct FileSelector {
    extensions: Vec<String>,
    excludes: Vec<Regex>,
}

impl FileSelector {
    /// Select files by extension (`"go"` or `".go"`), skipping relative paths
    /// matching any of `exclude_patterns`. An empty extension list selects all files.
    pub fn new(extensions: &[String], exclude_patterns: &[String]) -> Result<Self> {
        let extensions = extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        let excludes = exclude_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    AskCtxError::config(format!("invalid exclude pattern '{p}': {e}"))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            extensions,
            excludes,
        })
    }

    /// Select every regular file.
    pub fn all() -> Self {
        Self {
            extensions: Vec::new(),
            excludes: Vec::new(),
        }
    }

    /// Whether the file at `relative` (to the aggregation root) is selected.
    pub fn matches(&self, relative: &Path) -> bool {
        let rel = relative.to_string_lossy().replace('\\', "/");
        if self.excludes.iter().any(|re| re.is_match(&rel)) {
            return false;
        }
        if self.extensions.is_empty() {
            return true;
        }
        relative
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

/// Build the corpus rooted at `root`.
///
/// A regular-file root is read as-is without consulting `selector`.
/// `max_bytes` of 0 disables the size bound.
#[instrument(skip_all, fields(root = %root.display()))]
pub fn aggregate(root: &Path, selector: &FileSelector, max_bytes: u64) -> Result<Corpus> {
    let meta = std::fs::metadata(root).map_err(|e| aggregation_failed(root, e))?;

    if meta.is_file() {
        check_bound(meta.len(), max_bytes)?;
        let bytes = std::fs::read(root).map_err(|e| aggregation_failed(root, e))?;
        check_bound(bytes.len() as u64, max_bytes)?;
        debug!(bytes = bytes.len(), "read single-file source");
        return Ok(Corpus::new(bytes, 1));
    }
    if !meta.is_dir() {
        return Err(AskCtxError::AggregationFailed {
            path: root.to_path_buf(),
            cause: "not a regular file or directory".into(),
        });
    }

    let mut buffer: Vec<u8> = Vec::new();
    let mut file_count = 0usize;

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry));

    for entry in walker {
        let entry = entry.map_err(|e| AskCtxError::AggregationFailed {
            path: e.path().unwrap_or(root).to_path_buf(),
            cause: e.to_string(),
        })?;

        // Directories, symlinks, sockets and the like are never content.
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        if !selector.matches(relative) {
            trace!(path = %relative.display(), "not selected");
            continue;
        }

        let data = std::fs::read(entry.path()).map_err(|e| aggregation_failed(entry.path(), e))?;
        check_bound((buffer.len() + data.len()) as u64, max_bytes)?;

        trace!(path = %relative.display(), bytes = data.len(), "appended");
        buffer.extend_from_slice(&data);
        file_count += 1;
    }

    let corpus = Corpus::new(buffer, file_count);
    debug!(
        files = corpus.file_count(),
        bytes = corpus.len(),
        fingerprint = %corpus.fingerprint(),
        "corpus aggregated"
    );
    Ok(corpus)
}

/// Hidden entries below the root (`.git`, `.github`, dotfiles) are pruned.
fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn check_bound(size: u64, max_bytes: u64) -> Result<()> {
    if max_bytes > 0 && size > max_bytes {
        return Err(AskCtxError::CorpusTooLarge {
            limit: max_bytes,
            size,
        });
    }
    Ok(())
}

fn aggregation_failed(path: &Path, e: std::io::Error) -> AskCtxError {
    AskCtxError::AggregationFailed {
        path: path.to_path_buf(),
        cause: e.to_string(),
    }
}
