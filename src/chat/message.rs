// src/chat/message.rs

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
    Agent,
}

/// One transcript line. Never mutated after it is appended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub sender: String,
    pub content: String,
    pub role: Role,
    pub timestamp: DateTime<Local>,
    #[serde(default)]
    pub follow_up: Option<String>,
}

/// Append-only transcript owned by a single session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<Message>,
    next_id: u64,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(
        &mut self,
        sender: &str,
        content: &str,
        role: Role,
        timestamp: DateTime<Local>,
    ) -> &Message {
        self.push(sender, content, role, timestamp, None)
    }

    pub fn append_with_hint(
        &mut self,
        sender: &str,
        content: &str,
        role: Role,
        timestamp: DateTime<Local>,
        follow_up: Option<String>,
    ) -> &Message {
        self.push(sender, content, role, timestamp, follow_up)
    }

    fn push(
        &mut self,
        sender: &str,
        content: &str,
        role: Role,
        timestamp: DateTime<Local>,
        follow_up: Option<String>,
    ) -> &Message {
        let id = self.next_id;
        self.next_id += 1;
        self.messages.push(Message {
            id,
            sender: sender.to_string(),
            content: content.to_string(),
            role,
            timestamp,
            follow_up,
        });
        &self.messages[self.messages.len() - 1]
    }

    /// Drop the transcript and start over from a single welcome line.
    /// Ids keep counting up from where they were.
    pub fn reset(&mut self, sender: &str, welcome: &str, timestamp: DateTime<Local>) {
        self.messages.clear();
        self.push(sender, welcome, Role::Bot, timestamp, None);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

}
