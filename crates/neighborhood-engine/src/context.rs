use neighborhood_types::models::{Channel, Message};

/// Number of most recent messages sent to the provider.
pub const HISTORY_WINDOW: usize = 10;

/// Bounded excerpt of the conversation for one provider request.
///
/// Derived per send, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationContext {
    pub channel_name: String,
    pub channel_description: String,
    /// `"<sender>: <content>"` lines, oldest first.
    pub history: Vec<String>,
    pub new_message: String,
}

impl ConversationContext {
    /// History lines joined with newlines; empty when there is no history.
    pub fn excerpt(&self) -> String {
        self.history.join("\n")
    }
}

pub struct ContextWindowBuilder;

impl ContextWindowBuilder {
    pub fn build(history: &[Message], channel: &Channel, new_message: &str) -> ConversationContext {
        let start = history.len().saturating_sub(HISTORY_WINDOW);
        let history = history[start..]
            .iter()
            .map(|m| format!("{}: {}", m.sender_name, m.content))
            .collect();

        ConversationContext {
            channel_name: channel.name.clone(),
            channel_description: channel.description.clone(),
            history,
            new_message: new_message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn history(count: usize) -> Vec<Message> {
        (0..count)
            .map(|i| Message {
                id: Uuid::new_v4(),
                sender_id: "ai".into(),
                sender_name: format!("n{}", i),
                content: format!("m{}", i),
                created_at: Utc::now(),
                is_user_authored: false,
                avatar_color: None,
                avatar_image: None,
            })
            .collect()
    }

    #[test]
    fn keeps_the_last_ten_oldest_first() {
        let ctx = ContextWindowBuilder::build(&history(13), &Channel::default(), "hello");
        assert_eq!(ctx.history.len(), HISTORY_WINDOW);
        assert_eq!(ctx.history.first().map(String::as_str), Some("n3: m3"));
        assert_eq!(ctx.history.last().map(String::as_str), Some("n12: m12"));
        assert_eq!(ctx.new_message, "hello");
    }

    #[test]
    fn short_history_is_used_whole() {
        for len in 0..=HISTORY_WINDOW {
            let ctx = ContextWindowBuilder::build(&history(len), &Channel::default(), "x");
            assert_eq!(ctx.history.len(), len);
        }
    }

    #[test]
    fn empty_history_gives_empty_excerpt() {
        let ctx = ContextWindowBuilder::build(&[], &Channel::default(), "first!");
        assert_eq!(ctx.excerpt(), "");
        assert_eq!(ctx.channel_name, "Neighborhood");
    }

    #[test]
    fn excerpt_joins_lines() {
        let ctx = ContextWindowBuilder::build(&history(2), &Channel::default(), "x");
        assert_eq!(ctx.excerpt(), "n0: m0\nn1: m1");
    }
}
