use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sender id stamped on every generated neighbor reply.
pub const AI_SENDER_ID: &str = "ai";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// `#rrggbb`, assigned at signup.
    pub avatar_color: String,
    /// `data:<mime>;base64,<payload>` URL uploaded from the profile page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub name: String,
    pub description: String,
}

impl Default for Channel {
    fn default() -> Self {
        Self {
            name: "Neighborhood".into(),
            description: "The pulse of the local community.".into(),
        }
    }
}

/// A resident shown in the "online neighbors" sidebar. Purely cosmetic: the
/// roster is fixed and unrelated to who the provider replies as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: String,
    pub name: String,
    pub role: String,
    pub color: String,
}

const ROSTER: &[(&str, &str, &str)] = &[
    ("Mrs. Higgins", "Neighborhood Watch", "#ef4444"),
    ("Dave the Plumber", "Local Handyman", "#3b82f6"),
    ("Sarah (Baker)", "Sourdough Enthusiast", "#f59e0b"),
    ("Officer Miller", "Safety First", "#10b981"),
    ("Techie Tom", "Digital Nomad", "#8b5cf6"),
    ("Gardener Green", "Green Thumb", "#14b8a6"),
    ("Coach Carter", "High School Sports", "#f97316"),
    ("Dr. Patel", "General Practitioner", "#ec4899"),
];

/// The fixed roster, ids numbered from 1.
pub fn online_neighbors() -> Vec<Neighbor> {
    ROSTER
        .iter()
        .enumerate()
        .map(|(index, (name, role, color))| Neighbor {
            id: (index + 1).to_string(),
            name: name.to_string(),
            role: role.to_string(),
            color: color.to_string(),
        })
        .collect()
}

/// One entry of the conversation log. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    /// The author's user id, or [`AI_SENDER_ID`] for generated replies.
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_user_authored: bool,
    /// Color token for user messages; generated replies carry their mood emoji here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_image: Option<String>,
}

/// A validated reply produced by the generative provider, not yet in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateReply {
    pub sender_name: String,
    pub content: String,
    pub mood_emoji: String,
}

/// Whether a provider round trip is outstanding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    #[default]
    Idle,
    AwaitingResponse,
}

impl ActivityState {
    pub fn is_awaiting(self) -> bool {
        matches!(self, Self::AwaitingResponse)
    }
}
