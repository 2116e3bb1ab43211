//! In-memory host: actors, items and a single active combat

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{ActorStore, CombatSessions, HostError, ItemStore};
use crate::model::{Actor, ActorId, ActorUpdate, Combat, Combatant, Item, ItemUpdate};

#[derive(Debug)]
struct CombatRecord {
    combat: Combat,
    /// Flags by "scope.key"
    flags: HashMap<String, Value>,
}

/// Host state held in memory
#[derive(Debug, Default)]
pub struct MemoryHost {
    actors: RwLock<HashMap<ActorId, Actor>>,
    combat: RwLock<Option<CombatRecord>>,
}

fn flag_key(scope: &str, key: &str) -> String {
    format!("{}.{}", scope, key)
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared instance
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Insert or replace an actor
    pub async fn put_actor(&self, actor: Actor) {
        let mut actors = self.actors.write().await;
        actors.insert(actor.id.clone(), actor);
    }

    /// Start a new combat, replacing any active one
    pub async fn start_combat(&self, combatants: Vec<Combatant>) -> Combat {
        let combat = Combat {
            id: uuid::Uuid::new_v4().to_string(),
            combatants,
        };
        debug!(
            "starting combat {} with {} combatants",
            combat.id,
            combat.combatants.len()
        );
        *self.combat.write().await = Some(CombatRecord {
            combat: combat.clone(),
            flags: HashMap::new(),
        });
        combat
    }

    /// End the active combat, if any
    pub async fn end_combat(&self) -> bool {
        self.combat.write().await.take().is_some()
    }
}

#[async_trait]
impl ActorStore for MemoryHost {
    async fn get_actor(&self, id: &str) -> Result<Option<Actor>, HostError> {
        Ok(self.actors.read().await.get(id).cloned())
    }

    async fn update_actor(&self, id: &str, update: ActorUpdate) -> Result<(), HostError> {
        let mut actors = self.actors.write().await;
        let Some(actor) = actors.get_mut(id) else {
            warn!("dropping update to actor {}: it was removed or replaced", id);
            return Err(HostError::NotFound {
                kind: "actor",
                id: id.to_string(),
            });
        };
        update.apply(actor);
        Ok(())
    }
}

#[async_trait]
impl ItemStore for MemoryHost {
    async fn find_item(&self, item_id: &str) -> Result<Option<(Actor, Item)>, HostError> {
        let actors = self.actors.read().await;
        Ok(actors.values().find_map(|actor| {
            actor
                .item(item_id)
                .map(|item| (actor.clone(), item.clone()))
        }))
    }

    async fn update_item(
        &self,
        actor_id: &str,
        item_id: &str,
        update: ItemUpdate,
    ) -> Result<(), HostError> {
        let mut actors = self.actors.write().await;
        let Some(item) = actors
            .get_mut(actor_id)
            .and_then(|actor| actor.item_mut(item_id))
        else {
            warn!(
                "dropping update to item {} of actor {}: it was removed or replaced",
                item_id, actor_id
            );
            return Err(HostError::NotFound {
                kind: "item",
                id: item_id.to_string(),
            });
        };
        update.apply(item);
        Ok(())
    }
}

#[async_trait]
impl CombatSessions for MemoryHost {
    async fn active_combat(&self) -> Result<Option<Combat>, HostError> {
        Ok(self.combat.read().await.as_ref().map(|r| r.combat.clone()))
    }

    async fn get_flag(
        &self,
        combat_id: &str,
        scope: &str,
        key: &str,
    ) -> Result<Option<Value>, HostError> {
        let combat = self.combat.read().await;
        Ok(combat
            .as_ref()
            .filter(|r| r.combat.id == combat_id)
            .and_then(|r| r.flags.get(&flag_key(scope, key)).cloned()))
    }

    async fn set_flags(
        &self,
        combat_id: &str,
        scope: &str,
        flags: Map<String, Value>,
    ) -> Result<(), HostError> {
        let mut combat = self.combat.write().await;
        let record = combat
            .as_mut()
            .filter(|r| r.combat.id == combat_id)
            .ok_or_else(|| HostError::Storage(format!("combat {} is not active", combat_id)))?;

        for (key, value) in flags {
            record.flags.insert(flag_key(scope, &key), value);
        }
        Ok(())
    }
}
