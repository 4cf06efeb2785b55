//! HTTP invoker for OpenAI-compatible completion, chat, and embedding APIs.
//!
//! One attempt per call, no automatic retry. The credential is only ever
//! placed in the `Authorization` header, and the tracing spans here skip both
//! the client and the payload.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};
use url::Url;

use askctx_shared::{AskCtxError, BackendConfig, Credential, Result};

use crate::prompt::BackendRequest;
use crate::response::BackendResponse;

/// User-Agent string for backend requests.
const USER_AGENT: &str = concat!("askctx/", env!("CARGO_PKG_VERSION"));

/// Longest error-body excerpt carried in a [`AskCtxError::BackendError`].
const MAX_ERROR_SNIPPET: usize = 512;

/// Client bound to one backend and one credential.
pub struct BackendClient {
    http: Client,
    base_url: Url,
    credential: Credential,
}

impl BackendClient {
    /// Create a client for `base_url` (e.g. `https://api.openai.com/v1`).
    pub fn new(base_url: &str, credential: Credential, timeout: Duration) -> Result<Self> {
        // Url::join replaces the last segment unless the base ends in '/'.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized).map_err(|e| {
            AskCtxError::config(format!("invalid backend base URL '{base_url}': {e}"))
        })?;

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| AskCtxError::backend(None, format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            credential,
        })
    }

    pub fn from_config(config: &BackendConfig, credential: Credential) -> Result<Self> {
        Self::new(
            &config.base_url,
            credential,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Issue the single backend call for this run.
    #[instrument(skip_all, fields(mode = %request.mode(), model = %request.model()))]
    pub async fn invoke(
        &self,
        request: &BackendRequest,
        cancel: &CancellationToken,
    ) -> Result<BackendResponse> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AskCtxError::cancelled("backend request")),
            result = self.call(request) => result,
        }
    }

    async fn call(&self, request: &BackendRequest) -> Result<BackendResponse> {
        let url = self
            .base_url
            .join(request.endpoint())
            .map_err(|e| AskCtxError::config(format!("invalid endpoint: {e}")))?;

        info!(%url, "calling backend");

        let builder = self
            .http
            .post(url.clone())
            .bearer_auth(self.credential.expose());
        let builder = match request {
            BackendRequest::Completion(body) => builder.json(body),
            BackendRequest::Chat(body) => builder.json(body),
            BackendRequest::Embedding(body) => builder.json(body),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| AskCtxError::backend(None, format!("{url}: {e}")))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            AskCtxError::backend(Some(status.as_u16()), format!("failed to read body: {e}"))
        })?;

        if !status.is_success() {
            return Err(AskCtxError::backend(
                Some(status.as_u16()),
                error_cause(&body),
            ));
        }

        debug!(status = status.as_u16(), bytes = body.len(), "backend responded");
        BackendResponse::decode(request.mode(), &body)
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Prefer the API's `error.message`; otherwise a bounded excerpt of the body.
fn error_cause(body: &[u8]) -> String {
    if let Ok(envelope) = serde_json::from_slice::<ErrorEnvelope>(body) {
        return envelope.error.message;
    }
    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return "empty error body".to_string();
    }
    let mut snippet: String = text.chars().take(MAX_ERROR_SNIPPET).collect();
    if text.chars().count() > MAX_ERROR_SNIPPET {
        snippet.push_str("...");
    }
    snippet
}
