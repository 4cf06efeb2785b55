//! Core domain types for an askctx run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::AskCtxError;

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying a single pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SourceDescriptor
// ---------------------------------------------------------------------------

/// Where the corpus comes from. Supplied once per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceDescriptor {
    /// A remote repository to clone into an ephemeral workspace.
    Remote { url: String },
    /// A local file or directory read in place.
    Local { path: PathBuf },
}

impl SourceDescriptor {
    /// Pick a source from the optional CLI inputs. The URL wins when both are set.
    pub fn select(url: Option<&str>, path: Option<&str>) -> Option<Self> {
        match (url.filter(|u| !u.is_empty()), path.filter(|p| !p.is_empty())) {
            (Some(url), _) => Some(Self::Remote { url: url.to_string() }),
            (None, Some(path)) => Some(Self::Local {
                path: PathBuf::from(path),
            }),
            (None, None) => None,
        }
    }
}

impl std::fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remote { url } => write!(f, "{}", redact_url(url)),
            Self::Local { path } => write!(f, "{}", path.display()),
        }
    }
}

/// Strip userinfo from a URL before it reaches logs or error messages.
///
/// Non-URL forms (e.g. `git@host:org/repo.git`) are returned unchanged.
pub fn redact_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) if !parsed.username().is_empty() || parsed.password().is_some() => {
            // Both setters only fail for cannot-be-a-base URLs, which carry no userinfo.
            let _ = parsed.set_username("");
            let _ = parsed.set_password(None);
            parsed.to_string()
        }
        _ => raw.to_string(),
    }
}

// ---------------------------------------------------------------------------
// InteractionMode
// ---------------------------------------------------------------------------

/// Shape of the backend exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InteractionMode {
    /// Single text prompt against the legacy completions endpoint.
    #[serde(alias = "raw")]
    RawCompletion,
    /// System + user messages against the chat endpoint.
    #[serde(alias = "chat")]
    ChatCompletion,
    /// Vectorize the corpus.
    Embedding,
}

impl InteractionMode {
    /// Short name used on the command line and in config.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RawCompletion => "raw",
            Self::ChatCompletion => "chat",
            Self::Embedding => "embedding",
        }
    }
}

impl std::fmt::Display for InteractionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InteractionMode {
    type Err = AskCtxError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "raw" | "raw-completion" | "completion" => Ok(Self::RawCompletion),
            "chat" | "chat-completion" => Ok(Self::ChatCompletion),
            "embedding" | "embeddings" => Ok(Self::Embedding),
            other => Err(AskCtxError::config(format!(
                "unknown mode '{other}': expected 'raw', 'chat', or 'embedding'"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Corpus
// ---------------------------------------------------------------------------

/// Concatenated file contents used as backend context. Immutable once built.
#[derive(Clone, PartialEq, Eq)]
pub struct Corpus {
    bytes: Vec<u8>,
    file_count: usize,
}

impl Corpus {
    /// Wrap an already-assembled buffer.
    pub fn new(bytes: Vec<u8>, file_count: usize) -> Self {
        Self { bytes, file_count }
    }

    /// An empty corpus (zero files).
    pub fn empty() -> Self {
        Self::new(Vec::new(), 0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of files that contributed to the corpus.
    pub fn file_count(&self) -> usize {
        self.file_count
    }

    /// Lossy UTF-8 view for embedding into prompts.
    pub fn to_text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    /// SHA-256 hex digest of the content.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        format!("{:x}", hasher.finalize())
    }
}

// Content can be large; keep debug output to a summary.
impl std::fmt::Debug for Corpus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Corpus")
            .field("len", &self.bytes.len())
            .field("file_count", &self.file_count)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Answer
// ---------------------------------------------------------------------------

/// Resolved result of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Answer {
    /// Completion or chat answer text.
    Text { text: String },
    /// Embedding vector for the sole input.
    Embedding {
        vector: Vec<f64>,
        /// Object kind reported by the backend (diagnostic only).
        object: String,
    },
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text { text } => f.write_str(text),
            Self::Embedding { vector, .. } => {
                let json = serde_json::to_string(vector).map_err(|_| std::fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}
