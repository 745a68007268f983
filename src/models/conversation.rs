use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::BookingInfo;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    Active,
    Completed,
    Cancelled,
}

impl ConversationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationStatus::Active => "active",
            ConversationStatus::Completed => "completed",
            ConversationStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => ConversationStatus::Completed,
            "cancelled" => ConversationStatus::Cancelled,
            _ => ConversationStatus::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub session_id: String,
    pub messages: Vec<ConversationMessage>,
    pub booking_info: BookingInfo,
    pub status: ConversationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl Conversation {
    /// Appends a message, keeping timestamps non-decreasing even if the
    /// wall clock steps backwards between turns.
    pub fn push_message(&mut self, role: MessageRole, content: impl Into<String>) {
        let now = Utc::now();
        let timestamp = match self.messages.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };
        self.messages.push(ConversationMessage {
            role,
            content: content.into(),
            timestamp,
        });
        self.updated_at = timestamp;
    }

    pub fn is_active(&self) -> bool {
        self.status == ConversationStatus::Active
    }

    pub fn last_content(&self) -> Option<&str> {
        self.messages.last().map(|m| m.content.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn empty() -> Conversation {
        let now = Utc::now();
        Conversation {
            id: "c1".to_string(),
            session_id: "s1".to_string(),
            messages: vec![],
            booking_info: BookingInfo::default(),
            status: ConversationStatus::Active,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            ConversationStatus::Active,
            ConversationStatus::Completed,
            ConversationStatus::Cancelled,
        ] {
            assert_eq!(ConversationStatus::parse(status.as_str()), status);
        }
        assert_eq!(ConversationStatus::parse("garbage"), ConversationStatus::Active);
    }

    #[test]
    fn test_push_message_never_goes_back_in_time() {
        let mut conv = empty();
        let future = Utc::now() + Duration::minutes(5);
        conv.messages.push(ConversationMessage {
            role: MessageRole::Assistant,
            content: "hello".to_string(),
            timestamp: future,
        });

        conv.push_message(MessageRole::User, "hi");

        assert_eq!(conv.messages.len(), 2);
        assert!(conv.messages[0].timestamp <= conv.messages[1].timestamp);
        assert_eq!(conv.last_content(), Some("hi"));
    }
}
