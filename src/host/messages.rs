//! Outbound chat messages and UI notifications
//!
//! Collects messages for delivery by the host.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::ChatSink;

/// Who may read a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    Everyone,
    /// Whispered to the GM only
    Gm,
}

/// A chat card posted to the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    /// Speaker alias, if not the current user
    pub speaker: Option<String>,
    pub content: String,
    pub audience: Audience,
    pub sent_at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(speaker: Option<&str>, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            speaker: speaker.map(|s| s.to_string()),
            content: content.into(),
            audience: Audience::Everyone,
            sent_at: Utc::now(),
        }
    }

    /// Restrict the message to the GM
    pub fn whisper_gm(mut self) -> Self {
        self.audience = Audience::Gm;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

/// Something the host delivers: a chat card or a transient UI notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HostMessage {
    Chat(ChatMessage),
    Notice { level: NoticeLevel, text: String },
}

impl HostMessage {
    pub fn chat(speaker: Option<&str>, content: impl Into<String>) -> Self {
        HostMessage::Chat(ChatMessage::new(speaker, content))
    }

    pub fn info(text: impl Into<String>) -> Self {
        HostMessage::Notice {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        HostMessage::Notice {
            level: NoticeLevel::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        HostMessage::Notice {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }

    /// Text of the message, whichever kind it is
    pub fn text(&self) -> &str {
        match self {
            HostMessage::Chat(m) => &m.content,
            HostMessage::Notice { text, .. } => text,
        }
    }
}

/// Messages kept when nobody drains the queue
pub const DEFAULT_BACKLOG: usize = 1000;

/// Queue of outbound messages awaiting delivery
///
/// Holds at most `limit` messages; past that the oldest are dropped.
#[derive(Debug)]
pub struct MessageQueue {
    messages: RwLock<VecDeque<HostMessage>>,
    limit: usize,
}

impl Default for MessageQueue {
    fn default() -> Self {
        Self::with_limit(DEFAULT_BACKLOG)
    }
}

impl MessageQueue {
    /// Create a new message queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a queue holding at most `limit` messages
    pub fn with_limit(limit: usize) -> Self {
        Self {
            messages: RwLock::new(VecDeque::new()),
            limit: limit.max(1),
        }
    }

    /// Wrap in Arc for sharing
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Drain all messages from the queue
    pub async fn drain(&self) -> Vec<HostMessage> {
        let mut messages = self.messages.write().await;
        messages.drain(..).collect()
    }

    /// Get count of pending messages
    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    /// Check if queue is empty
    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

#[async_trait]
impl ChatSink for MessageQueue {
    async fn deliver(&self, message: HostMessage) {
        let mut messages = self.messages.write().await;
        if messages.len() >= self.limit {
            if let Some(dropped) = messages.pop_front() {
                debug!("message backlog full, dropping: {}", dropped.text());
            }
        }
        messages.push_back(message);
    }
}
