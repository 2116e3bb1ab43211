//! Resolution engine
//!
//! Turns a click on a sheet into a rolled, labelled result:
//! - Attack rolls with critical/fumble detection and deferred damage
//! - Attribute tests (roll under the score)
//! - Usage dice on consumables
//! - Armour dice, rests and attribute generation
//!
//! Every operation reads the current sheet, rolls through the `DiceSource`,
//! writes back a single update and posts a chat card.

mod armour;
mod attack;
mod attribute;
mod rest;
mod usage;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::config::RulesConfig;
use crate::dice::{check_modifier, DiceSource, DiceTerm, Formula, Keep, Roll};
use crate::error::{Result, RulesError};
use crate::host::{ActorStore, ChatSink, HostMessage, ItemStore};
use crate::model::{Actor, Item};

pub use attack::{DamageDescriptor, DamageResult};
pub use usage::{UsageDieResult, UsageOutcome};

/// Options chosen for a test or attack roll
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollModifiers {
    pub advantage: bool,
    pub disadvantage: bool,
    /// Flat amount added to the roll
    pub modifier: i32,
}

/// How many test dice are rolled and which one counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stance {
    Normal,
    /// Two dice, keep the lower (lower is better when rolling under)
    Advantage,
    /// Two dice, keep the higher
    Disadvantage,
}

impl RollModifiers {
    /// Disadvantage wins when both are requested
    pub fn stance(&self) -> Stance {
        if self.disadvantage {
            Stance::Disadvantage
        } else if self.advantage {
            Stance::Advantage
        } else {
            Stance::Normal
        }
    }

    /// Reject a modifier outside `MAX_MODIFIER` before anything is rolled
    pub fn validate(&self) -> Result<()> {
        check_modifier(self.modifier)?;
        Ok(())
    }
}

/// Outcome label of a roll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Critical,
    Fumble,
    Hit,
    Miss,
    Success,
    Failure,
}

impl Outcome {
    pub fn label(self) -> &'static str {
        match self {
            Outcome::Critical => "Critical!",
            Outcome::Fumble => "Fumble!",
            Outcome::Hit => "Hit",
            Outcome::Miss => "Miss",
            Outcome::Success => "Success",
            Outcome::Failure => "Failure",
        }
    }
}

/// Result of an attack roll or attribute test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    /// Card title, e.g. "Attack Roll" or "Strength Test"
    pub title: String,
    pub actor_id: String,
    pub actor: String,
    pub formula: String,
    /// Faces of the test dice
    pub faces: Vec<u32>,
    pub total: i32,
    /// Score the roll was compared against
    pub target: i32,
    pub outcome: Outcome,
    pub success: bool,
    pub critical: bool,
    pub fumble: bool,
    /// Damage to roll on request, for successful attacks
    pub damage: Option<DamageDescriptor>,
}

impl RollResult {
    fn card(&self) -> String {
        format!(
            "{}: {} = {} vs {} ({})",
            self.title,
            self.formula,
            self.total,
            self.target,
            self.outcome.label()
        )
    }
}

/// Formula for a test roll of `die` under `stance`, plus a flat modifier
pub fn test_formula(config: &RulesConfig, stance: Stance, modifier: i32) -> Formula {
    let sides = config.test_die.sides();
    let term = match stance {
        Stance::Normal => DiceTerm::new(1, sides),
        Stance::Advantage => DiceTerm::new(2, sides).keep(Keep::Lowest),
        Stance::Disadvantage => DiceTerm::new(2, sides).keep(Keep::Highest),
    };
    Formula::from(term).plus_flat(modifier)
}

/// Whether the test dice show `face` as the rules for `stance` require:
/// the single die, either die with advantage, both dice with disadvantage
fn shows(faces: &[u32], stance: Stance, face: u32) -> bool {
    match stance {
        Stance::Normal => faces.first() == Some(&face),
        Stance::Advantage => faces.contains(&face),
        Stance::Disadvantage => !faces.is_empty() && faces.iter().all(|f| *f == face),
    }
}

/// Natural 1 on the test dice
pub fn is_critical(roll: &Roll, stance: Stance) -> bool {
    shows(roll.first_faces(), stance, 1)
}

/// Maximum face on the test dice
pub fn is_fumble(roll: &Roll, stance: Stance) -> bool {
    match roll.first_sides() {
        Some(sides) => shows(roll.first_faces(), stance, sides),
        None => false,
    }
}

/// The resolution engine
pub struct Resolver {
    actors: Arc<dyn ActorStore>,
    items: Arc<dyn ItemStore>,
    dice: Arc<dyn DiceSource>,
    chat: Arc<dyn ChatSink>,
    config: Arc<RulesConfig>,
}

impl Resolver {
    pub fn new(
        actors: Arc<dyn ActorStore>,
        items: Arc<dyn ItemStore>,
        dice: Arc<dyn DiceSource>,
        chat: Arc<dyn ChatSink>,
        config: Arc<RulesConfig>,
    ) -> Self {
        Self {
            actors,
            items,
            dice,
            chat,
            config,
        }
    }

    /// Look up an actor, logging when it is missing
    async fn actor(&self, actor_id: &str) -> Result<Actor> {
        match self.actors.get_actor(actor_id).await? {
            Some(actor) => Ok(actor),
            None => {
                error!("unable to locate an actor with the id '{}'", actor_id);
                Err(RulesError::not_found("actor", actor_id))
            }
        }
    }

    /// Look up an item and its owner, logging when it is missing
    async fn owned_item(&self, item_id: &str) -> Result<(Actor, Item)> {
        match self.items.find_item(item_id).await? {
            Some(found) => Ok(found),
            None => {
                error!("failed to find the actor that owns item id '{}'", item_id);
                Err(RulesError::not_found("item", item_id))
            }
        }
    }

    /// Tell the user why nothing happened and return the matching error
    async fn reject(&self, reason: String) -> RulesError {
        warn!("{}", reason);
        self.chat.deliver(HostMessage::error(reason.clone())).await;
        RulesError::PreconditionFailed(reason)
    }

    async fn announce(&self, speaker: &str, content: String) {
        self.chat
            .deliver(HostMessage::chat(Some(speaker), content))
            .await;
    }

    async fn roll(&self, formula: &Formula) -> Result<Roll> {
        Ok(self.dice.roll(&formula.to_string()).await?)
    }
}
