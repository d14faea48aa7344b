use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };
use uuid::Uuid;

pub type MessageId = Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: MessageId,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_streaming: bool,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            is_streaming: false,
        }
    }

    /// Empty assistant message that receives streamed content.
    pub fn assistant_placeholder() -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: String::new(),
            timestamp: Utc::now(),
            is_streaming: true,
        }
    }

    /// Timestamp to show next to the message; hidden while content is still arriving.
    pub fn display_timestamp(&self) -> Option<DateTime<Utc>> {
        if self.is_streaming { None } else { Some(self.timestamp) }
    }
}

/// Ordered, in-memory message list for one session.
#[derive(Clone, Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn get(&self, id: &MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == *id)
    }

    fn get_mut(&mut self, id: &MessageId) -> Option<&mut ChatMessage> {
        self.messages.iter_mut().find(|m| m.id == *id)
    }

    /// Appends to a message that is still streaming. Returns false when the
    /// message is gone or already finished, in which case nothing changes.
    pub fn append_content(&mut self, id: &MessageId, chunk: &str) -> bool {
        match self.get_mut(id) {
            Some(message) if message.is_streaming => {
                message.content.push_str(chunk);
                true
            }
            _ => false,
        }
    }

    /// Ends streaming for a message. If it never received any content and
    /// `fallback` is non-empty, the fallback becomes its content.
    pub fn finish_streaming(&mut self, id: &MessageId, fallback: Option<&str>) -> bool {
        match self.get_mut(id) {
            Some(message) if message.is_streaming => {
                if message.content.is_empty() {
                    if let Some(text) = fallback.filter(|t| !t.is_empty()) {
                        message.content.push_str(text);
                    }
                }
                message.is_streaming = false;
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, id: &MessageId) -> Option<ChatMessage> {
        let index = self.messages.iter().position(|m| m.id == *id)?;
        Some(self.messages.remove(index))
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn streaming_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_streaming).count()
    }
}
