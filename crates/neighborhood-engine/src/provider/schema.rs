use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use unicode_segmentation::UnicodeSegmentation;

use neighborhood_types::models::CandidateReply;

use crate::config::DropPolicy;
use crate::error::ProviderError;

/// Structured-output schema sent with every request: an array of
/// `{senderName, content, emoji}` objects, all required.
pub fn reply_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "senderName": {
                    "type": "STRING",
                    "description": "Name of the community member replying, e.g. 'Mrs. Higgins' or 'Dave the Plumber'."
                },
                "content": {
                    "type": "STRING",
                    "description": "The message text, concise and relevant to the chat."
                },
                "emoji": {
                    "type": "STRING",
                    "description": "A single emoji for the member's avatar or mood."
                }
            },
            "required": ["senderName", "content", "emoji"]
        }
    })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireReply {
    sender_name: String,
    content: String,
    emoji: String,
}

impl WireReply {
    fn validate(self) -> Result<CandidateReply, &'static str> {
        let sender_name = self.sender_name.trim();
        let content = self.content.trim();
        let emoji = self.emoji.trim();
        if sender_name.is_empty() {
            return Err("empty senderName");
        }
        if content.is_empty() {
            return Err("empty content");
        }
        if emoji.is_empty() {
            return Err("empty emoji");
        }
        if emoji.graphemes(true).count() != 1 {
            return Err("emoji is not a single glyph");
        }
        Ok(CandidateReply {
            sender_name: sender_name.to_string(),
            content: content.to_string(),
            mood_emoji: emoji.to_string(),
        })
    }
}

/// Deserialize a provider body into candidate replies.
///
/// The top level must be a JSON array. Item failures are handled per
/// `policy`: `WholeBatch` rejects everything, `PerItem` keeps the valid ones.
/// Unknown fields are ignored.
pub fn parse_replies(body: &str, policy: DropPolicy) -> Result<Vec<CandidateReply>, ProviderError> {
    let reject = |reason: String| ProviderError::Validation {
        reason,
        bytes: body.len(),
    };

    let items: Vec<Value> = match serde_json::from_str::<Value>(body) {
        Ok(Value::Array(items)) => items,
        Ok(other) => return Err(reject(format!("expected an array, got {}", shape_of(&other)))),
        Err(e) => return Err(reject(format!("not JSON: {}", e))),
    };

    let total = items.len();
    let mut replies = Vec::with_capacity(total);
    for (index, item) in items.into_iter().enumerate() {
        let checked = serde_json::from_value::<WireReply>(item)
            .map_err(|e| e.to_string())
            .and_then(|wire| wire.validate().map_err(str::to_string));

        match (checked, policy) {
            (Ok(reply), _) => replies.push(reply),
            (Err(reason), DropPolicy::WholeBatch) => {
                return Err(reject(format!("item {} of {}: {}", index, total, reason)));
            }
            (Err(reason), DropPolicy::PerItem) => {
                debug!("Dropping reply {} of {}: {}", index, total, reason);
            }
        }
    }

    Ok(replies)
}

fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
