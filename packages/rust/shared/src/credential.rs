//! API credential resolution.
//!
//! Precedence: explicit input first, then the named fallback variable. The
//! fallback is read once at the edge (see [`FallbackCredential::from_env`])
//! and passed in, so business logic never touches the process environment.

use crate::error::{AskCtxError, Result};

/// Default name of the fallback environment variable.
pub const DEFAULT_API_KEY_ENV: &str = "API_KEY";

/// A resolved API token. `Debug` is redacted; use [`Credential::expose`] only
/// at the point of building an `Authorization` header.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// The process-wide fallback: a variable name and whatever value it held.
#[derive(Clone)]
pub struct FallbackCredential {
    /// Variable name, reported in the `MissingCredential` diagnostic.
    pub var: String,
    /// Value read from the environment, if any.
    pub value: Option<String>,
}

impl FallbackCredential {
    /// Read `var` from the current process environment.
    pub fn from_env(var: &str) -> Self {
        Self {
            var: var.to_string(),
            value: std::env::var(var).ok(),
        }
    }
}

impl std::fmt::Debug for FallbackCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackCredential")
            .field("var", &self.var)
            .field("set", &self.value.as_deref().is_some_and(|v| !v.is_empty()))
            .finish()
    }
}

/// Resolve the credential for this run.
pub fn resolve_credential(
    explicit: Option<&str>,
    fallback: &FallbackCredential,
) -> Result<Credential> {
    if let Some(key) = explicit.filter(|k| !k.is_empty()) {
        tracing::debug!("using explicit API key");
        return Ok(Credential(key.to_string()));
    }

    match fallback.value.as_deref() {
        Some(key) if !key.is_empty() => {
            tracing::debug!(var = %fallback.var, "using API key from environment");
            Ok(Credential(key.to_string()))
        }
        _ => Err(AskCtxError::MissingCredential {
            var: fallback.var.clone(),
        }),
    }
}
