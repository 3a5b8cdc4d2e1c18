use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::UserPublic;

#[derive(Debug, Deserialize)]
pub struct CreateConversationIn {
    #[serde(rename = "recipientId")]
    pub recipient_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct ConversationIdOut {
    #[serde(rename = "conversationId")]
    pub conversation_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageIn {
    pub content: String,
}

/// One entry in the conversation listing: the other member's public profile
/// and a preview of the most recent message. `last_message_time` falls back
/// to the conversation's creation time when no message exists yet.
#[derive(Debug, Serialize)]
pub struct ConversationSummary {
    pub conversation_id: Uuid,
    pub users: UserPublic,
    pub last_message: Option<String>,
    pub last_message_time: DateTime<Utc>,
    pub is_sender: bool,
}
