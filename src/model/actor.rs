//! Actors: characters, NPCs and creatures

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::item::Item;
use crate::dice::{DamageDie, DieFace};

/// Unique actor identifier, as assigned by the host
///
/// Actor ids `"neutral"` and `"adversaries"` are reserved by the initiative bag
pub type ActorId = String;

/// What sort of sheet an actor has
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    #[default]
    Character,
    Npc,
    Creature,
}

/// Attribute scores tested by roll-under checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attribute {
    Strength,
    Dexterity,
    Intelligence,
    Charisma,
    Luck,
}

impl Attribute {
    /// Every attribute, in sheet order
    pub const ALL: [Attribute; 5] = [
        Attribute::Strength,
        Attribute::Dexterity,
        Attribute::Intelligence,
        Attribute::Charisma,
        Attribute::Luck,
    ];
}

impl FromStr for Attribute {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strength" | "str" => Ok(Attribute::Strength),
            "dexterity" | "dex" => Ok(Attribute::Dexterity),
            "intelligence" | "int" => Ok(Attribute::Intelligence),
            "charisma" | "cha" => Ok(Attribute::Charisma),
            "luck" | "lck" => Ok(Attribute::Luck),
            other => Err(format!("unknown attribute: {}", other)),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Attribute::Strength => "Strength",
            Attribute::Dexterity => "Dexterity",
            Attribute::Intelligence => "Intelligence",
            Attribute::Charisma => "Charisma",
            Attribute::Luck => "Luck",
        };
        write!(f, "{}", s)
    }
}

/// The five attribute scores of an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    pub strength: i32,
    pub dexterity: i32,
    pub intelligence: i32,
    pub charisma: i32,
    pub luck: i32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            intelligence: 10,
            charisma: 10,
            luck: 10,
        }
    }
}

impl Attributes {
    pub fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Strength => self.strength,
            Attribute::Dexterity => self.dexterity,
            Attribute::Intelligence => self.intelligence,
            Attribute::Charisma => self.charisma,
            Attribute::Luck => self.luck,
        }
    }

    pub fn set(&mut self, attribute: Attribute, score: i32) {
        match attribute {
            Attribute::Strength => self.strength = score,
            Attribute::Dexterity => self.dexterity = score,
            Attribute::Intelligence => self.intelligence = score,
            Attribute::Charisma => self.charisma = score,
            Attribute::Luck => self.luck = score,
        }
    }
}

/// Current and maximum hit points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub value: i32,
    pub max: i32,
}

impl Default for HitPoints {
    fn default() -> Self {
        Self { value: 5, max: 5 }
    }
}

/// Damage dice configured on the sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageDice {
    pub unarmed: DamageDie,
}

impl Default for DamageDice {
    fn default() -> Self {
        Self {
            unarmed: DamageDie::Die(DieFace::D4),
        }
    }
}

/// A character, NPC or creature sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    #[serde(default)]
    pub kind: ActorKind,
    /// Class name (e.g. "Warrior", "Illusionist"), if any
    #[serde(default)]
    pub class_name: Option<String>,
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub hit_points: HitPoints,
    #[serde(default)]
    pub damage_dice: DamageDice,
    /// Items owned by this actor
    #[serde(default)]
    pub items: Vec<Item>,
}

fn default_level() -> u32 {
    1
}

impl Actor {
    /// Create a level 1 actor with default scores and no items
    pub fn new(id: &str, name: &str, kind: ActorKind) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            class_name: None,
            level: default_level(),
            attributes: Attributes::default(),
            hit_points: HitPoints::default(),
            damage_dice: DamageDice::default(),
            items: Vec::new(),
        }
    }

    pub fn with_class(mut self, class_name: &str) -> Self {
        self.class_name = Some(class_name.to_string());
        self
    }

    pub fn with_item(mut self, item: Item) -> Self {
        self.items.push(item);
        self
    }

    /// Look up an owned item
    pub fn item(&self, item_id: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn item_mut(&mut self, item_id: &str) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.id == item_id)
    }

    /// Whether the actor's class matches `class_name`, ignoring case
    pub fn has_class(&self, class_name: &str) -> bool {
        self.class_name
            .as_deref()
            .is_some_and(|c| c.eq_ignore_ascii_case(class_name))
    }
}

/// Partial update to an actor; only `Some` fields change
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActorUpdate {
    pub hit_points: Option<i32>,
    pub attributes: Option<Attributes>,
}

impl ActorUpdate {
    pub fn apply(&self, actor: &mut Actor) {
        if let Some(value) = self.hit_points {
            actor.hit_points.value = value;
        }
        if let Some(attributes) = self.attributes {
            actor.attributes = attributes;
        }
    }
}
