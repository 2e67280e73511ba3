use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{StudentId, TutorId, UserId};

/// Conversation ids are derived, not generated: the two participant ids
/// sorted and joined, so a (student, tutor) pair always maps to the same
/// conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConversationId(pub String);

pub fn conversation_id_for(student_id: &StudentId, tutor_id: &TutorId) -> ConversationId {
    let mut participants = [student_id.0.as_str(), tutor_id.0.as_str()];
    participants.sort_unstable();
    ConversationId(participants.join("_"))
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

static MESSAGE_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_message_id() -> MessageId {
    let id = MESSAGE_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    MessageId(format!("msg-{id:06}"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "booking_prompt")]
    BookingPrompt,
    #[serde(rename = "session_confirmation")]
    SessionConfirmation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub is_read: bool,
    pub message_type: MessageType,
}

impl Message {
    pub fn new(
        conversation_id: ConversationId,
        sender_id: UserId,
        recipient_id: UserId,
        content: &str,
        message_type: MessageType,
    ) -> Self {
        Message {
            id: next_message_id(),
            conversation_id,
            sender_id,
            recipient_id,
            content: content.to_string(),
            timestamp: Utc::now(),
            is_read: false,
            message_type,
        }
    }

    pub fn mark_read(&mut self) {
        self.is_read = true;
    }
}

/// One thread per (student, tutor) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: ConversationId,
    pub student_id: StudentId,
    pub tutor_id: TutorId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message_timestamp: Option<DateTime<Utc>>,
    pub unread_count: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(student_id: StudentId, tutor_id: TutorId) -> Self {
        Conversation {
            id: conversation_id_for(&student_id, &tutor_id),
            student_id,
            tutor_id,
            last_message: None,
            last_message_timestamp: None,
            unread_count: 0,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    /// Fold a delivered message into the thread preview and unread counter.
    pub fn register_message(&mut self, message: &Message) {
        self.last_message = Some(message.content.clone());
        self.last_message_timestamp = Some(message.timestamp);
        if !message.is_read {
            self.unread_count += 1;
        }
    }

    pub fn mark_all_read(&mut self) {
        self.unread_count = 0;
    }
}
