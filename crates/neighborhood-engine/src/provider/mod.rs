//! Generative-response provider: prompt construction, the backend seam, and
//! the adapter that turns every failure into "zero replies".

pub mod gemini;
pub mod schema;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use neighborhood_types::models::CandidateReply;

use crate::config::{DropPolicy, EngineConfig};
use crate::context::ConversationContext;
use crate::error::ProviderError;

pub use gemini::GeminiBackend;
pub use schema::{parse_replies, reply_schema};

/// One outbound call: a single natural-language instruction plus the
/// structured-output directive.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f32,
    pub response_schema: Value,
}

/// Transport to a text-generation service. Returns the raw response text.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError>;
}

/// Sends a context window to the provider and validates what comes back.
///
/// Exactly one attempt per call, no retries, no local state.
pub struct ResponseProviderAdapter {
    backend: Option<Arc<dyn GenerativeBackend>>,
    temperature: f32,
    drop_policy: DropPolicy,
}

impl ResponseProviderAdapter {
    /// Build the Gemini-backed adapter, or a disabled one when no credential
    /// is configured. The missing credential is logged here, once.
    pub fn new(config: &EngineConfig) -> Self {
        match config.api_key.as_deref() {
            Some(key) => {
                let backend = GeminiBackend::new(key, &config.model, &config.provider_url);
                Self::with_backend(Arc::new(backend), config)
            }
            None => {
                warn!(
                    "{}; neighbors will stay quiet until a key is configured",
                    ProviderError::MissingCredential
                );
                Self {
                    drop_policy: config.drop_policy,
                    ..Self::disabled()
                }
            }
        }
    }

    pub fn with_backend(backend: Arc<dyn GenerativeBackend>, config: &EngineConfig) -> Self {
        Self {
            backend: Some(backend),
            temperature: config.temperature,
            drop_policy: config.drop_policy,
        }
    }

    /// An adapter that never contacts anything and always answers `[]`.
    pub fn disabled() -> Self {
        Self {
            backend: None,
            temperature: crate::config::DEFAULT_TEMPERATURE,
            drop_policy: DropPolicy::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// Ask the provider for replies to `context`. Never fails: transport,
    /// status and validation problems are logged and yield an empty batch.
    pub async fn request(&self, context: &ConversationContext) -> Vec<CandidateReply> {
        let Some(backend) = &self.backend else {
            return Vec::new();
        };

        let request = GenerationRequest {
            prompt: build_prompt(context),
            temperature: self.temperature,
            response_schema: reply_schema(),
        };

        let body = match backend.generate(&request).await {
            Ok(body) if body.trim().is_empty() => {
                warn!("{}", ProviderError::EmptyBody);
                return Vec::new();
            }
            Ok(body) => body,
            Err(e) => {
                warn!("{}", e);
                return Vec::new();
            }
        };

        match parse_replies(&body, self.drop_policy) {
            Ok(replies) => {
                debug!("Provider returned {} replies", replies.len());
                replies
            }
            Err(e) => {
                warn!("{}", e);
                Vec::new()
            }
        }
    }
}

/// Render the instruction sent to the provider.
pub fn build_prompt(context: &ConversationContext) -> String {
    format!(
        r#"You are the engine behind Neighborhood.ai, a simulated local community group chat.
A user just posted in the #{name} channel.
Channel description: {description}

Recent chat history:
{history}

The user's new message: "{message}"

Reply as fictional members of the community:
- Return between 0 and 2 replies, each from a different neighbor persona.
- If the user asks a question, have helpful neighbors answer it. If they share news, have neighbors react.
- Keep it conversational, like a real group chat: sometimes brief, sometimes detailed.
- Vary the personas: a grumpy old neighbor, a helpful techie, a busy parent, a local business owner.
- Do not always reply. An empty array is fine when the conversation naturally lulls, but usually return at least one reply.
- For each reply give the neighbor's name, the message text, and a single emoji for their mood."#,
        name = context.channel_name,
        description = context.channel_description,
        history = context.excerpt(),
        message = context.new_message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that answers from a fixed script and records prompts.
    struct Scripted {
        answer: Mutex<Option<Result<String, ProviderError>>>,
        calls: AtomicUsize,
        last: Mutex<Option<GenerationRequest>>,
    }

    impl Scripted {
        fn new(answer: Result<String, ProviderError>) -> Arc<Self> {
            Arc::new(Self {
                answer: Mutex::new(Some(answer)),
                calls: AtomicUsize::new(0),
                last: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl GenerativeBackend for Scripted {
        async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some(request.clone());
            self.answer
                .lock()
                .unwrap()
                .take()
                .unwrap_or(Err(ProviderError::EmptyBody))
        }
    }

    fn context() -> ConversationContext {
        ConversationContext {
            channel_name: "Neighborhood".into(),
            channel_description: "The pulse of the local community.".into(),
            history: vec!["Alex: Anyone know a good plumber?".into()],
            new_message: "Anyone know a good plumber?".into(),
        }
    }

    #[tokio::test]
    async fn disabled_adapter_answers_empty_without_calling_out() {
        let adapter = ResponseProviderAdapter::new(&EngineConfig::default());
        assert!(!adapter.is_enabled());
        for _ in 0..3 {
            assert!(adapter.request(&context()).await.is_empty());
        }
    }

    #[tokio::test]
    async fn valid_payload_becomes_replies() {
        let backend = Scripted::new(Ok(
            r#"[{"senderName":"Dave the Plumber","content":"That's me!","emoji":"🔧"}]"#.into(),
        ));
        let config = EngineConfig::default();
        let adapter = ResponseProviderAdapter::with_backend(backend.clone(), &config);

        let replies = adapter.request(&context()).await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].sender_name, "Dave the Plumber");
        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);

        let sent = backend.last.lock().unwrap().clone().unwrap();
        assert_eq!(sent.temperature, config.temperature);
        assert!(sent.prompt.contains("\"Anyone know a good plumber?\""));
        assert!(sent.prompt.contains("#Neighborhood"));
    }

    #[tokio::test]
    async fn failures_become_zero_replies() {
        let failures = vec![
            Err(ProviderError::Status { status: 503, message: "overloaded".into() }),
            Err(ProviderError::EmptyBody),
            Ok("   ".to_string()),
            Ok(r#"[{"senderName":"","content":"hi","emoji":"🙂"}]"#.to_string()),
            Ok(r#"{"oops": true}"#.to_string()),
        ];
        for answer in failures {
            let backend = Scripted::new(answer);
            let adapter = ResponseProviderAdapter::with_backend(backend.clone(), &EngineConfig::default());
            assert!(adapter.request(&context()).await.is_empty());
            assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test]
    async fn per_item_policy_is_honored() {
        let backend = Scripted::new(Ok(r#"[
            {"senderName":"Dave","content":"ok","emoji":"🔧"},
            {"senderName":"","content":"ignored","emoji":"🙂"}
        ]"#
        .into()));
        let config = EngineConfig {
            drop_policy: DropPolicy::PerItem,
            ..EngineConfig::default()
        };
        let adapter = ResponseProviderAdapter::with_backend(backend, &config);
        let replies = adapter.request(&context()).await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].sender_name, "Dave");
    }

    #[test]
    fn prompt_embeds_channel_history_and_message() {
        let prompt = build_prompt(&context());
        assert!(prompt.contains("Channel description: The pulse of the local community."));
        assert!(prompt.contains("Alex: Anyone know a good plumber?"));
        assert!(prompt.contains("between 0 and 2 replies"));
        assert!(prompt.contains("Do not always reply"));
    }
}
