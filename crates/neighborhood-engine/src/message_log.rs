use chrono::Utc;
use uuid::Uuid;

use neighborhood_types::models::{AI_SENDER_ID, CandidateReply, Message, User};

/// Append-only record of the active conversation.
///
/// Position is the only ordering; timestamps may collide.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Read-only view in insertion order.
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// Stamp a user-authored message. `content` must already be trimmed.
pub(crate) fn user_message(author: &User, content: String) -> Message {
    Message {
        id: Uuid::new_v4(),
        sender_id: author.id.to_string(),
        sender_name: author.username.clone(),
        content,
        created_at: Utc::now(),
        is_user_authored: true,
        avatar_color: Some(author.avatar_color.clone()),
        avatar_image: author.avatar_image.clone(),
    }
}

/// Turn a validated provider reply into a log entry with a fresh id.
pub(crate) fn reply_message(reply: CandidateReply) -> Message {
    Message {
        id: Uuid::new_v4(),
        sender_id: AI_SENDER_ID.to_string(),
        sender_name: reply.sender_name,
        content: reply.content,
        created_at: Utc::now(),
        is_user_authored: false,
        avatar_color: Some(reply.mood_emoji),
        avatar_image: None,
    }
}
