//! Data model shared by the scheduler and the resolution engine

mod actor;
mod combat;
mod item;

pub use actor::{
    Actor, ActorId, ActorKind, ActorUpdate, Attribute, Attributes, DamageDice, HitPoints,
};
pub use combat::{Combat, Combatant, CombatantCategory};
pub use item::{
    ArmourValue, Equipment, Item, ItemData, ItemId, ItemUpdate, UsageDie, Weapon, WeaponKind,
    WeaponSize,
};
