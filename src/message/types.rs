use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hop budget given to freshly built messages
pub const DEFAULT_RELAY_TTL: u8 = 5;

/// An immutable mesh message
///
/// `channel_id` is empty for direct messages and `recipient_id` is absent
/// for channel/broadcast messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub recipient_id: Option<String>,
    pub channel_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Remaining relay hops
    pub ttl: u8,
}

impl Message {
    /// Create a channel message with a fresh identifier
    pub fn channel(
        sender_id: impl Into<String>,
        channel_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        MessageBuilder::new(sender_id)
            .channel(channel_id)
            .content(content)
            .build()
    }

    /// Create a direct message with a fresh identifier
    pub fn direct(
        sender_id: impl Into<String>,
        recipient_id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        MessageBuilder::new(sender_id)
            .recipient(recipient_id)
            .content(content)
            .build()
    }

    pub fn is_channel(&self) -> bool {
        !self.channel_id.is_empty()
    }

    pub fn is_direct(&self) -> bool {
        self.channel_id.is_empty() && self.recipient_id.is_some()
    }

    /// Check if the relay hop budget is spent
    pub fn ttl_exhausted(&self) -> bool {
        self.ttl == 0
    }

    /// Copy of this message with one hop consumed
    pub fn next_hop(&self) -> Self {
        Self {
            ttl: self.ttl.saturating_sub(1),
            ..self.clone()
        }
    }

    /// Age of the message relative to `now` (zero if created in the future)
    pub fn age(&self, now: DateTime<Utc>) -> std::time::Duration {
        (now - self.created_at).to_std().unwrap_or_default()
    }
}

/// Builder for messages
pub struct MessageBuilder {
    message: Message,
}

impl MessageBuilder {
    pub fn new(sender_id: impl Into<String>) -> Self {
        Self {
            message: Message {
                id: uuid::Uuid::new_v4().to_string(),
                sender_id: sender_id.into(),
                recipient_id: None,
                channel_id: String::new(),
                content: String::new(),
                created_at: Utc::now(),
                ttl: DEFAULT_RELAY_TTL,
            },
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.message.id = id.into();
        self
    }

    pub fn recipient(mut self, recipient_id: impl Into<String>) -> Self {
        self.message.recipient_id = Some(recipient_id.into());
        self
    }

    pub fn channel(mut self, channel_id: impl Into<String>) -> Self {
        self.message.channel_id = channel_id.into();
        self
    }

    pub fn content(mut self, content: impl Into<String>) -> Self {
        self.message.content = content.into();
        self
    }

    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.message.created_at = created_at;
        self
    }

    pub fn ttl(mut self, ttl: u8) -> Self {
        self.message.ttl = ttl;
        self
    }

    pub fn build(self) -> Message {
        self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_message_kinds() {
        let channel = Message::channel("alice", "general", "hello");
        assert!(channel.is_channel());
        assert!(!channel.is_direct());

        let direct = Message::direct("alice", "bob", "hi bob");
        assert!(direct.is_direct());
        assert!(!direct.is_channel());

        let control = MessageBuilder::new("alice").content("ping").build();
        assert!(!control.is_channel());
        assert!(!control.is_direct());
    }

    #[test]
    fn test_next_hop_consumes_ttl() {
        let message = MessageBuilder::new("alice").channel("general").ttl(1).build();

        let relayed = message.next_hop();
        assert_eq!(relayed.ttl, 0);
        assert!(relayed.ttl_exhausted());
        assert_eq!(relayed.id, message.id);

        // Original untouched
        assert_eq!(message.ttl, 1);
        assert_eq!(relayed.next_hop().ttl, 0);
    }

    #[test]
    fn test_age() {
        let now = Utc::now();
        let message = MessageBuilder::new("alice")
            .created_at(now - Duration::minutes(10))
            .build();

        assert_eq!(message.age(now).as_secs(), 600);

        let future = MessageBuilder::new("alice")
            .created_at(now + Duration::minutes(1))
            .build();
        assert_eq!(future.age(now), std::time::Duration::ZERO);
    }

    #[test]
    fn test_unique_ids() {
        let a = Message::channel("alice", "general", "one");
        let b = Message::channel("alice", "general", "one");
        assert_ne!(a.id, b.id);
    }
}
