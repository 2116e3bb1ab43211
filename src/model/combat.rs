//! Combat encounters as seen by the host

use serde::{Deserialize, Serialize};

use super::actor::ActorId;

/// Who controls a combatant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombatantCategory {
    /// Controlled by a player; gets its own initiative token
    Player,
    /// Controlled by the GM; shares the adversaries token
    NonPlayer,
}

/// A participant in a combat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combatant {
    pub actor_id: ActorId,
    /// Display name
    pub name: String,
    pub category: CombatantCategory,
}

impl Combatant {
    pub fn player(actor_id: &str, name: &str) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            name: name.to_string(),
            category: CombatantCategory::Player,
        }
    }

    pub fn non_player(actor_id: &str, name: &str) -> Self {
        Self {
            actor_id: actor_id.to_string(),
            name: name.to_string(),
            category: CombatantCategory::NonPlayer,
        }
    }
}

/// An active combat: an ordered list of combatants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Combat {
    pub id: String,
    pub combatants: Vec<Combatant>,
}

impl Combat {
    /// Find the combatant played by `actor_id`
    pub fn combatant(&self, actor_id: &str) -> Option<&Combatant> {
        self.combatants.iter().find(|c| c.actor_id == actor_id)
    }

    /// Whether any GM-controlled combatant is present
    pub fn has_adversaries(&self) -> bool {
        self.combatants
            .iter()
            .any(|c| c.category == CombatantCategory::NonPlayer)
    }
}
