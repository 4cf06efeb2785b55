//! Shared types, error model, credential handling, and configuration for askctx.
//!
//! This crate is the foundation depended on by all other askctx crates.
//! It provides:
//! - [`AskCtxError`]: the unified error type
//! - Domain types ([`SourceDescriptor`], [`InteractionMode`], [`Corpus`], [`Answer`])
//! - Credential resolution ([`resolve_credential`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod credential;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, BackendConfig, DefaultsConfig, SourceConfig, config_dir, config_file_path,
    init_config, load_config, load_config_from,
};
pub use credential::{Credential, DEFAULT_API_KEY_ENV, FallbackCredential, resolve_credential};
pub use error::{AcquisitionStage, AskCtxError, Result};
pub use types::{Answer, Corpus, InteractionMode, RunId, SourceDescriptor, redact_url};
