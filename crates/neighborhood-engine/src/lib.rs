//! Conversation orchestration for the neighborhood chat.
//!
//! A user message is appended to the [`MessageLog`], a bounded context window
//! is sent to the generative provider, and the replies it returns are released
//! into the log one by one by the [`DeliveryScheduler`]. The
//! [`ActivityIndicator`] tracks the provider round trip only.

pub mod activity;
pub mod config;
pub mod context;
pub mod error;
pub mod identity;
pub mod message_log;
pub mod orchestrator;
pub mod provider;
pub mod scheduler;
pub mod session;

pub use activity::ActivityIndicator;
pub use config::{DropPolicy, EngineConfig};
pub use context::{ContextWindowBuilder, ConversationContext, HISTORY_WINDOW};
pub use error::{ChatError, IdentityError, ProviderError};
pub use identity::{Account, IdentityStore, InMemoryIdentityStore};
pub use message_log::MessageLog;
pub use orchestrator::{Orchestrator, PendingRound};
pub use provider::{GenerationRequest, GenerativeBackend, ResponseProviderAdapter};
pub use scheduler::{DeliveryScheduler, DeliverySink, Generation};
pub use session::{MemorySessionStore, Session, SessionStore};
