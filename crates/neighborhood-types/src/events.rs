use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ActivityState, Message};

/// Events pushed to the client over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ChatEvent {
    /// Server confirms the gateway connection for the logged-in user
    Ready { user_id: Uuid, username: String },

    /// A message was appended to the log (user-authored or a neighbor reply)
    MessageCreate { message: Message },

    /// The "someone is responding" indicator changed
    ActivityUpdate { state: ActivityState },

    /// The conversation was cleared (logout); pending replies were dropped
    SessionReset { generation: u64 },
}

impl ChatEvent {
    /// Events after which a gateway connection must not stay open: the
    /// session it was opened for is over.
    pub fn ends_session(&self) -> bool {
        matches!(self, Self::SessionReset { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_are_tagged_with_type_and_data() {
        let event = ChatEvent::ActivityUpdate {
            state: ActivityState::AwaitingResponse,
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({"type": "ActivityUpdate", "data": {"state": "awaiting_response"}})
        );

        let reset: ChatEvent =
            serde_json::from_value(json!({"type": "SessionReset", "data": {"generation": 3}}))
                .unwrap();
        assert!(matches!(reset, ChatEvent::SessionReset { generation: 3 }));
    }

    #[test]
    fn only_a_reset_ends_the_session() {
        assert!(ChatEvent::SessionReset { generation: 1 }.ends_session());
        assert!(!ChatEvent::ActivityUpdate { state: ActivityState::Idle }.ends_session());
        assert!(
            !ChatEvent::Ready {
                user_id: Uuid::nil(),
                username: "alex".into(),
            }
            .ends_session()
        );
    }
}
