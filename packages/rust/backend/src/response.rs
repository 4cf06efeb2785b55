//! Response decoding and answer extraction.

use serde::Deserialize;
use tracing::debug;

use askctx_shared::{Answer, AskCtxError, InteractionMode, Result};

/// `POST /completions` response.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub text: Option<String>,
}

/// `POST /chat/completions` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatChoice {
    pub message: ChatResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// `POST /embeddings` response.
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingResponse {
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub data: Vec<EmbeddingData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingData {
    #[serde(default)]
    pub object: Option<String>,
    pub embedding: Vec<f64>,
}

/// Raw backend response; the variant matches the request's mode.
#[derive(Debug, Clone)]
pub enum BackendResponse {
    Completion(CompletionResponse),
    Chat(ChatResponse),
    Embedding(EmbeddingResponse),
}

impl BackendResponse {
    /// Decode a 2xx body for `mode`. A body that doesn't fit is an empty response.
    pub fn decode(mode: InteractionMode, body: &[u8]) -> Result<Self> {
        let malformed =
            |e: serde_json::Error| AskCtxError::empty(format!("malformed {mode} response: {e}"));
        match mode {
            InteractionMode::RawCompletion => {
                serde_json::from_slice(body).map(Self::Completion).map_err(malformed)
            }
            InteractionMode::ChatCompletion => {
                serde_json::from_slice(body).map(Self::Chat).map_err(malformed)
            }
            InteractionMode::Embedding => {
                serde_json::from_slice(body).map(Self::Embedding).map_err(malformed)
            }
        }
    }
}

/// Extract the answer from the first choice / result.
pub fn resolve(response: BackendResponse) -> Result<Answer> {
    match response {
        BackendResponse::Completion(resp) => {
            let choice = resp
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| AskCtxError::empty("completion returned no choices"))?;
            let text = choice
                .text
                .ok_or_else(|| AskCtxError::empty("completion choice has no text"))?;
            Ok(Answer::Text { text })
        }
        BackendResponse::Chat(resp) => {
            let choice = resp
                .choices
                .into_iter()
                .next()
                .ok_or_else(|| AskCtxError::empty("chat completion returned no choices"))?;
            debug!(role = ?choice.message.role, "chat choice received");
            let text = choice
                .message
                .content
                .ok_or_else(|| AskCtxError::empty("chat message has no content"))?;
            Ok(Answer::Text { text })
        }
        BackendResponse::Embedding(resp) => {
            let list_object = resp.object;
            let data = resp
                .data
                .into_iter()
                .next()
                .ok_or_else(|| AskCtxError::empty("embedding returned no data"))?;
            let object = data
                .object
                .or(list_object)
                .unwrap_or_else(|| "embedding".to_string());
            debug!(%object, dimensions = data.embedding.len(), "embedding received");
            Ok(Answer::Embedding {
                vector: data.embedding,
                object,
            })
        }
    }
}
