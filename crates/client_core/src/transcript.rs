use chrono::Utc;
use shared::domain::{Message, Sender, Sequence};

/// Append-only conversation log. Sequence numbers start at 0 and equal each
/// message's position.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, sender: Sender, text: impl Into<String>) -> &Message {
        let index = self.messages.len();
        self.messages.push(Message {
            sequence: Sequence(index as u64),
            sender,
            text: text.into(),
            sent_at: Utc::now(),
        });
        &self.messages[index]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
