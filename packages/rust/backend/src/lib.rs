//! Language-model backend: request building, invocation, and answer extraction.
//!
//! This crate provides:
//! - [`prompt`]: [`PromptBuilder`] turns corpus + question into a [`BackendRequest`]
//! - [`client`]: [`BackendClient`] performs the single HTTP call
//! - [`response`]: [`resolve`] extracts the [`Answer`](askctx_shared::Answer)

pub mod client;
pub mod prompt;
pub mod response;

pub use client::BackendClient;
pub use prompt::{
    BackendRequest, ChatMessage, ChatRequest, CompletionRequest, EmbeddingRequest, ModelSet,
    PromptBuilder, Role,
};
pub use response::{BackendResponse, resolve};
