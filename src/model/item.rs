//! Items owned by actors: weapons, consumable equipment and armour

use serde::{Deserialize, Serialize};

use super::actor::Attribute;
use crate::dice::UsageDieLevel;

/// Unique item identifier, as assigned by the host
pub type ItemId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponKind {
    #[default]
    Melee,
    Ranged,
    Unarmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponSize {
    Small,
    #[default]
    Medium,
    Big,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Weapon {
    /// Attribute the attack is tested against
    pub attribute: Attribute,
    #[serde(default)]
    pub kind: WeaponKind,
    #[serde(default)]
    pub size: WeaponSize,
}

/// Usage die of a consumable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UsageDie {
    pub current: UsageDieLevel,
    pub maximum: UsageDieLevel,
}

impl UsageDie {
    /// A fresh die at `maximum`, not yet rolled
    pub fn fresh(maximum: UsageDieLevel) -> Self {
        Self {
            current: UsageDieLevel::None,
            maximum,
        }
    }

    /// Whether the item tracks a usage die at all
    pub fn is_tracked(&self) -> bool {
        self.maximum != UsageDieLevel::None
    }

    /// The level the next roll uses: `current`, or `maximum` on first use
    pub fn active(&self) -> UsageDieLevel {
        if self.current == UsageDieLevel::None {
            self.maximum
        } else {
            self.current
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Equipment {
    #[serde(default)]
    pub quantity: u32,
    #[serde(default)]
    pub usage_die: UsageDie,
}

/// Armour dice: `broken` of `total` are currently unusable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ArmourValue {
    pub total: u32,
    #[serde(default)]
    pub broken: u32,
}

/// Type-specific item data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemData {
    Weapon(Weapon),
    Equipment(Equipment),
    Armour { armour_value: ArmourValue },
    /// Abilities, classes, spells and anything else the rules never touch
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    #[serde(flatten)]
    pub data: ItemData,
}

impl Item {
    pub fn weapon(id: &str, name: &str, weapon: Weapon) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            data: ItemData::Weapon(weapon),
        }
    }

    pub fn equipment(id: &str, name: &str, quantity: u32, usage_die: UsageDie) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            data: ItemData::Equipment(Equipment {
                quantity,
                usage_die,
            }),
        }
    }

    pub fn armour(id: &str, name: &str, total: u32) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            data: ItemData::Armour {
                armour_value: ArmourValue { total, broken: 0 },
            },
        }
    }

    pub fn as_weapon(&self) -> Option<&Weapon> {
        match &self.data {
            ItemData::Weapon(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_equipment(&self) -> Option<&Equipment> {
        match &self.data {
            ItemData::Equipment(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_armour(&self) -> Option<&ArmourValue> {
        match &self.data {
            ItemData::Armour { armour_value } => Some(armour_value),
            _ => None,
        }
    }
}

/// Partial update to an item with shallow-merge semantics
///
/// Only `Some` fields change, and only where the item has that field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemUpdate {
    pub quantity: Option<u32>,
    pub usage_die: Option<UsageDieLevel>,
    pub armour_broken: Option<u32>,
}

impl ItemUpdate {
    pub fn apply(&self, item: &mut Item) {
        match &mut item.data {
            ItemData::Equipment(e) => {
                if let Some(quantity) = self.quantity {
                    e.quantity = quantity;
                }
                if let Some(level) = self.usage_die {
                    e.usage_die.current = level;
                }
            }
            ItemData::Armour { armour_value } => {
                if let Some(broken) = self.armour_broken {
                    armour_value.broken = broken.min(armour_value.total);
                }
            }
            ItemData::Weapon(_) | ItemData::Other => {}
        }
    }
}
