use chrono::{ DateTime, Utc };
use serde::{ Serialize, Deserialize };
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub content: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub messages: Vec<Message>,
    next_message_id: u64,
}

impl Conversation {
    pub fn new(title: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            created_at: Utc::now(),
            messages: Vec::new(),
            next_message_id: 1,
        }
    }

    /// Builds and appends a message, assigning the next id in this
    /// conversation's sequence. The message list is append-only.
    pub fn append(&mut self, sender: Sender, content: &str) -> &Message {
        let message = Message {
            id: self.next_message_id,
            content: content.to_string(),
            sender,
            timestamp: Utc::now(),
        };
        self.next_message_id += 1;
        self.messages.push(message);
        self.messages.last().expect("message was just pushed")
    }
}
