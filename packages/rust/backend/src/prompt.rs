//! Request construction for each [`InteractionMode`].
//!
//! Building is pure: no I/O, no network, and no failure modes. An empty
//! corpus still yields a well-formed request.

use serde::Serialize;

use askctx_shared::{BackendConfig, Corpus, InteractionMode};

/// Preamble for raw completions.
const COMPLETION_PREAMBLE: &str = "You are a teacher taking questions from students about their \
    code. Answer the question using the code and data between the <context> tags.";

/// Instructional frame for the chat system message.
const CHAT_SYSTEM_FRAME: &str = "You are a teacher taking questions from students about their \
    code. You are answering questions about this code/data:";

// ---------------------------------------------------------------------------
// Wire payloads (OpenAI-compatible)
// ---------------------------------------------------------------------------

/// `POST /completions` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Chat message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One entry of a chat request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// `POST /chat/completions` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

/// `POST /embeddings` body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingRequest {
    pub model: String,
    pub input: Vec<String>,
}

/// A request for exactly one backend call; the variant is the mode.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendRequest {
    Completion(CompletionRequest),
    Chat(ChatRequest),
    Embedding(EmbeddingRequest),
}

impl BackendRequest {
    pub fn mode(&self) -> InteractionMode {
        match self {
            Self::Completion(_) => InteractionMode::RawCompletion,
            Self::Chat(_) => InteractionMode::ChatCompletion,
            Self::Embedding(_) => InteractionMode::Embedding,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::Completion(req) => &req.model,
            Self::Chat(req) => &req.model,
            Self::Embedding(req) => &req.model,
        }
    }

    /// Path relative to the backend base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Completion(_) => "completions",
            Self::Chat(_) => "chat/completions",
            Self::Embedding(_) => "embeddings",
        }
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Model identifiers per mode.
#[derive(Debug, Clone)]
pub struct ModelSet {
    pub completion: String,
    pub chat: String,
    pub embedding: String,
    /// Token cap for raw completions.
    pub max_tokens: Option<u32>,
}

impl ModelSet {
    /// Use `model` for whichever mode this run selects.
    pub fn with_override(mut self, mode: InteractionMode, model: Option<&str>) -> Self {
        if let Some(model) = model.filter(|m| !m.is_empty()) {
            match mode {
                InteractionMode::RawCompletion => self.completion = model.to_string(),
                InteractionMode::ChatCompletion => self.chat = model.to_string(),
                InteractionMode::Embedding => self.embedding = model.to_string(),
            }
        }
        self
    }
}

impl From<&BackendConfig> for ModelSet {
    fn from(config: &BackendConfig) -> Self {
        Self {
            completion: config.completion_model.clone(),
            chat: config.chat_model.clone(),
            embedding: config.embedding_model.clone(),
            max_tokens: config.max_tokens,
        }
    }
}

/// Combines corpus and question into a mode-specific request.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    models: ModelSet,
}

impl PromptBuilder {
    pub fn new(models: ModelSet) -> Self {
        Self { models }
    }

    pub fn build(&self, mode: InteractionMode, corpus: &Corpus, question: &str) -> BackendRequest {
        let context = corpus.to_text();
        match mode {
            InteractionMode::RawCompletion => BackendRequest::Completion(CompletionRequest {
                model: self.models.completion.clone(),
                prompt: format!(
                    "{COMPLETION_PREAMBLE}\n\n<context>\n{context}\n</context>\n\n\
                     Question: {question}\nAnswer:"
                ),
                max_tokens: self.models.max_tokens,
            }),
            InteractionMode::ChatCompletion => BackendRequest::Chat(ChatRequest {
                model: self.models.chat.clone(),
                messages: vec![
                    ChatMessage {
                        role: Role::System,
                        content: format!("{CHAT_SYSTEM_FRAME}\n\n<context>\n{context}\n</context>"),
                    },
                    ChatMessage {
                        role: Role::User,
                        content: question.to_string(),
                    },
                ],
            }),
            // The question plays no part in an embedding.
            InteractionMode::Embedding => BackendRequest::Embedding(EmbeddingRequest {
                model: self.models.embedding.clone(),
                input: vec![context],
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> PromptBuilder {
        PromptBuilder::new(ModelSet::from(&BackendConfig::default()))
    }

    fn csv_corpus() -> Corpus {
        Corpus::new(b"total,3\nhome,1\naway,2\n".to_vec(), 1)
    }

    #[test]
    fn chat_embeds_corpus_in_system_and_question_verbatim_in_user() {
        let req = builder().build(InteractionMode::ChatCompletion, &csv_corpus(), "who won?");
        let BackendRequest::Chat(chat) = req else {
            panic!("expected chat request");
        };

        assert_eq!(chat.model, "gpt-3.5-turbo");
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[0].role, Role::System);
        assert!(chat.messages[0].content.contains("total,3\nhome,1\naway,2\n"));
        assert!(chat.messages[0].content.starts_with(CHAT_SYSTEM_FRAME));
        assert_eq!(chat.messages[1].role, Role::User);
        assert_eq!(chat.messages[1].content, "who won?");
    }

    #[test]
    fn raw_prompt_separates_corpus_from_question() {
        let req = builder().build(InteractionMode::RawCompletion, &csv_corpus(), "who won?");
        let BackendRequest::Completion(completion) = req else {
            panic!("expected completion request");
        };

        let prompt = &completion.prompt;
        assert!(prompt.starts_with(COMPLETION_PREAMBLE));
        let ctx_end = prompt.find("</context>").unwrap();
        let question_at = prompt.find("Question: who won?").unwrap();
        assert!(prompt.find("total,3").unwrap() < ctx_end);
        assert!(ctx_end < question_at);
        assert!(prompt.ends_with("Answer:"));
    }

    #[test]
    fn embedding_of_empty_corpus_is_single_empty_input() {
        let req = builder().build(InteractionMode::Embedding, &Corpus::empty(), "ignored");
        assert_eq!(
            req,
            BackendRequest::Embedding(EmbeddingRequest {
                model: "text-embedding-ada-002".into(),
                input: vec![String::new()],
            })
        );
    }

    #[test]
    fn embedding_ignores_question() {
        let a = builder().build(InteractionMode::Embedding, &csv_corpus(), "who won?");
        let b = builder().build(InteractionMode::Embedding, &csv_corpus(), "who lost?");
        assert_eq!(a, b);
    }

    #[test]
    fn request_mode_matches_requested_mode() {
        for mode in [
            InteractionMode::RawCompletion,
            InteractionMode::ChatCompletion,
            InteractionMode::Embedding,
        ] {
            assert_eq!(builder().build(mode, &csv_corpus(), "q").mode(), mode);
        }
    }

    #[test]
    fn chat_request_serializes_to_openai_shape() {
        let req = builder().build(InteractionMode::ChatCompletion, &Corpus::empty(), "hi");
        let BackendRequest::Chat(chat) = req else {
            panic!("expected chat request");
        };
        let json = serde_json::to_value(&chat).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["role"], "user");
        assert_eq!(json["messages"][1]["content"], "hi");
    }

    #[test]
    fn model_override_applies_to_selected_mode_only() {
        let models = ModelSet::from(&BackendConfig::default())
            .with_override(InteractionMode::ChatCompletion, Some("gpt-4o-mini"));
        assert_eq!(models.chat, "gpt-4o-mini");
        assert_eq!(models.embedding, "text-embedding-ada-002");

        let unchanged = ModelSet::from(&BackendConfig::default())
            .with_override(InteractionMode::Embedding, Some(""));
        assert_eq!(unchanged.embedding, "text-embedding-ada-002");
    }

    #[test]
    fn max_tokens_omitted_when_unset() {
        let req = builder().build(InteractionMode::RawCompletion, &Corpus::empty(), "q");
        let BackendRequest::Completion(completion) = req else {
            panic!("expected completion request");
        };
        let json = serde_json::to_string(&completion).unwrap();
        assert!(!json.contains("max_tokens"));
    }
}
