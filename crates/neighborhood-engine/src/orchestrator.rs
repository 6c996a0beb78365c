use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info};

use neighborhood_gateway::dispatcher::Dispatcher;
use neighborhood_types::events::ChatEvent;
use neighborhood_types::models::{ActivityState, Channel, Message, User};

use crate::activity::ActivityIndicator;
use crate::config::EngineConfig;
use crate::context::{ContextWindowBuilder, ConversationContext};
use crate::error::ChatError;
use crate::message_log::{MessageLog, user_message};
use crate::provider::ResponseProviderAdapter;
use crate::scheduler::{DeliveryScheduler, DeliverySink, Generation};

struct ConversationState {
    log: MessageLog,
    generation: Generation,
}

/// The log, the indicator and the event fan-out, shared with scheduled
/// deliveries. Every append is broadcast while the log lock is held so event
/// order matches log order.
struct Conversation {
    state: Mutex<ConversationState>,
    activity: ActivityIndicator,
    dispatcher: Dispatcher,
}

impl Conversation {
    fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_activity(&self) {
        if self.activity.start() {
            self.dispatcher.broadcast(ChatEvent::ActivityUpdate {
                state: ActivityState::AwaitingResponse,
            });
        }
    }

    fn stop_activity(&self) {
        if self.activity.stop() {
            self.dispatcher.broadcast(ChatEvent::ActivityUpdate {
                state: ActivityState::Idle,
            });
        }
    }
}

impl DeliverySink for Conversation {
    fn deliver(&self, generation: Generation, message: Message) -> bool {
        let mut state = self.lock();
        if state.generation != generation {
            return false;
        }
        state.log.append(message.clone());
        self.dispatcher.broadcast(ChatEvent::MessageCreate { message });
        true
    }
}

/// A user message that has been appended and is waiting for its provider
/// round trip. Produced by [`Orchestrator::post`], consumed by
/// [`Orchestrator::respond`].
#[derive(Debug)]
pub struct PendingRound {
    generation: Generation,
    context: ConversationContext,
    message: Message,
}

impl PendingRound {
    pub fn message(&self) -> &Message {
        &self.message
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }
}

/// Drives one conversation: user message in, staggered neighbor replies out.
pub struct Orchestrator {
    conversation: Arc<Conversation>,
    adapter: ResponseProviderAdapter,
    scheduler: DeliveryScheduler,
    channel: Channel,
}

impl Orchestrator {
    pub fn new(config: &EngineConfig, dispatcher: Dispatcher) -> Self {
        Self::with_adapter(ResponseProviderAdapter::new(config), config, dispatcher)
    }

    pub fn with_adapter(
        adapter: ResponseProviderAdapter,
        config: &EngineConfig,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            conversation: Arc::new(Conversation {
                state: Mutex::new(ConversationState {
                    log: MessageLog::new(),
                    generation: Generation::default(),
                }),
                activity: ActivityIndicator::new(),
                dispatcher,
            }),
            adapter,
            scheduler: DeliveryScheduler::new(config.reply_delay),
            channel: config.channel.clone(),
        }
    }

    /// Append `author`'s message and raise the indicator. Synchronous; the
    /// provider is not contacted until the round is passed to [`Self::respond`].
    pub fn post(&self, author: &User, text: &str) -> Result<PendingRound, ChatError> {
        let content = text.trim();
        if content.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let message = user_message(author, content.to_string());

        let (generation, context) = {
            let mut state = self.conversation.lock();
            state.log.append(message.clone());
            self.conversation.dispatcher.broadcast(ChatEvent::MessageCreate {
                message: message.clone(),
            });
            let context = ContextWindowBuilder::build(state.log.snapshot(), &self.channel, content);
            (state.generation, context)
        };
        self.conversation.start_activity();

        debug!(
            "{} posted {} ({} history lines)",
            author.username,
            message.id,
            context.history.len()
        );
        Ok(PendingRound {
            generation,
            context,
            message,
        })
    }

    /// Run the provider round trip for `round`, lower the indicator, and
    /// schedule whatever came back. Returns the number of replies scheduled.
    pub async fn respond(&self, round: PendingRound) -> usize {
        let replies = self.adapter.request(&round.context).await;

        if self.generation() != round.generation {
            // reset_session already lowered the indicator and cleared the log
            debug!(
                "Session reset during round trip; discarding {} replies",
                replies.len()
            );
            return 0;
        }
        self.conversation.stop_activity();

        self.scheduler
            .enqueue(round.generation, replies, self.conversation.clone())
    }

    /// [`Self::post`] followed by [`Self::respond`]. Returns the user's message.
    pub async fn send(&self, author: &User, text: &str) -> Result<Message, ChatError> {
        let round = self.post(author, text)?;
        let message = round.message.clone();
        self.respond(round).await;
        Ok(message)
    }

    /// Start a new conversation session: pending deliveries are canceled, the
    /// log is cleared and the indicator goes back to `Idle`.
    pub fn reset_session(&self) -> Generation {
        let generation = {
            let mut state = self.conversation.lock();
            state.generation = state.generation.next();
            state.log.clear();
            state.generation
        };
        let canceled = self.scheduler.cancel_all();
        self.conversation.stop_activity();
        self.conversation.dispatcher.broadcast(ChatEvent::SessionReset {
            generation: generation.value(),
        });

        info!(
            "Conversation reset to generation {} ({} pending replies canceled)",
            generation.value(),
            canceled
        );
        generation
    }

    /// Snapshot of the log in insertion order.
    pub fn messages(&self) -> Vec<Message> {
        self.conversation.lock().log.snapshot().to_vec()
    }

    pub fn activity(&self) -> ActivityState {
        self.conversation.activity.state()
    }

    pub fn watch_activity(&self) -> watch::Receiver<ActivityState> {
        self.conversation.activity.subscribe()
    }

    pub fn generation(&self) -> Generation {
        self.conversation.lock().generation
    }

    pub fn pending_deliveries(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn provider_enabled(&self) -> bool {
        self.adapter.is_enabled()
    }

    pub fn channel(&self) -> &Channel {
        &self.channel
    }
}
