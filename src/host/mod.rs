//! Host platform collaborators
//!
//! The rules never own persistence, chat or combat tracking. They reach the
//! host through these traits:
//! - `ActorStore` / `ItemStore`: sheets and owned items, partial updates
//! - `CombatSessions`: the active combat and its durable flag store
//! - `ChatSink`: chat cards and notifications
//!
//! `MemoryHost` and `MessageQueue` implement them in memory.

mod memory;
mod messages;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::{Actor, ActorUpdate, Combat, Item, ItemUpdate};

pub use memory::MemoryHost;
pub use messages::{
    Audience, ChatMessage, HostMessage, MessageQueue, NoticeLevel, DEFAULT_BACKLOG,
};

/// Failure inside a host collaborator
#[derive(Debug, Error)]
pub enum HostError {
    #[error("storage error: {0}")]
    Storage(String),

    /// The record disappeared between read and write
    #[error("{kind} {id} no longer exists")]
    NotFound { kind: &'static str, id: String },

    #[error("invalid flag '{key}': {source}")]
    InvalidFlag {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Actor lookup and partial updates
#[async_trait]
pub trait ActorStore: Send + Sync {
    async fn get_actor(&self, id: &str) -> Result<Option<Actor>, HostError>;

    /// Apply `update` to the actor; unknown ids are ignored
    async fn update_actor(&self, id: &str, update: ActorUpdate) -> Result<(), HostError>;
}

/// Items, each owned by exactly one actor
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Locate an item together with the actor that owns it
    async fn find_item(&self, item_id: &str) -> Result<Option<(Actor, Item)>, HostError>;

    /// Shallow-merge `update` into the item
    async fn update_item(
        &self,
        actor_id: &str,
        item_id: &str,
        update: ItemUpdate,
    ) -> Result<(), HostError>;
}

/// The active combat and its key-value flag store
///
/// Flags are namespaced by `scope` and written in a single update call.
#[async_trait]
pub trait CombatSessions: Send + Sync {
    async fn active_combat(&self) -> Result<Option<Combat>, HostError>;

    async fn get_flag(
        &self,
        combat_id: &str,
        scope: &str,
        key: &str,
    ) -> Result<Option<Value>, HostError>;

    async fn set_flags(
        &self,
        combat_id: &str,
        scope: &str,
        flags: Map<String, Value>,
    ) -> Result<(), HostError>;
}

/// Fire-and-forget delivery of chat cards and notifications
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn deliver(&self, message: HostMessage);
}
