//! Attack and damage rolls

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use super::{is_critical, is_fumble, test_formula, Outcome, Resolver, RollModifiers, RollResult};
use crate::dice::{DamageDie, DiceTerm, DieFace, Formula, Roll};
use crate::error::{Result, RulesError};
use crate::model::{Actor, ActorId, ItemId, Weapon, WeaponKind, WeaponSize};

/// A damage roll waiting to be triggered from an attack card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageDescriptor {
    pub actor_id: ActorId,
    /// Speaker for the damage card
    pub actor: String,
    pub weapon_id: ItemId,
    pub weapon: String,
    /// Base damage formula, without any critical bonus
    pub formula: String,
    #[serde(default)]
    pub critical: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageResult {
    pub actor_id: ActorId,
    pub weapon: String,
    pub critical: bool,
    pub roll: Roll,
}

/// Die a weapon deals damage with
fn damage_die(actor: &Actor, weapon: &Weapon) -> DamageDie {
    if weapon.kind == WeaponKind::Unarmed {
        return actor.damage_dice.unarmed;
    }
    DamageDie::Die(match weapon.size {
        WeaponSize::Small => DieFace::D4,
        WeaponSize::Big => DieFace::D8,
        WeaponSize::Medium => DieFace::D6,
    })
}

impl Resolver {
    /// Roll an attack with `weapon_id` against the weapon's attribute
    ///
    /// The attack hits when the attribute is strictly greater than the total.
    /// A hit that is not also a fumble carries a damage descriptor to roll
    /// later with [`Resolver::resolve_damage`].
    pub async fn resolve_attack(
        &self,
        actor_id: &str,
        weapon_id: &str,
        modifiers: RollModifiers,
    ) -> Result<RollResult> {
        modifiers.validate()?;
        let actor = self.actor(actor_id).await?;
        let Some(item) = actor.item(weapon_id) else {
            error!("actor {} has no item with the id '{}'", actor.id, weapon_id);
            return Err(RulesError::not_found("weapon", weapon_id));
        };
        let Some(weapon) = item.as_weapon() else {
            return Err(self
                .reject(format!("The '{}' item is not a weapon.", item.name))
                .await);
        };

        let stance = modifiers.stance();
        let formula = test_formula(&self.config, stance, modifiers.modifier);
        let roll = self.roll(&formula).await?;

        let critical = is_critical(&roll, stance);
        let fumble = is_fumble(&roll, stance);
        let target = actor.attributes.get(weapon.attribute);
        let success = target > roll.total;

        let outcome = if critical {
            Outcome::Critical
        } else if fumble {
            Outcome::Fumble
        } else if success {
            Outcome::Hit
        } else {
            Outcome::Miss
        };

        let damage = if success && !fumble {
            match damage_die(&actor, weapon) {
                DamageDie::Die(face) => Some(DamageDescriptor {
                    actor_id: actor.id.clone(),
                    actor: actor.name.clone(),
                    weapon_id: item.id.clone(),
                    weapon: item.name.clone(),
                    formula: face.roll(1).to_string(),
                    critical,
                }),
                DamageDie::Special => {
                    debug!("{} deals special damage; nothing to roll", item.name);
                    None
                }
            }
        } else {
            None
        };

        let result = RollResult {
            title: format!("{} Attack", item.name),
            actor_id: actor.id.clone(),
            actor: actor.name.clone(),
            formula: roll.formula.clone(),
            faces: roll.first_faces().to_vec(),
            total: roll.total,
            target,
            outcome,
            success,
            critical,
            fumble,
            damage,
        };
        info!(
            "{} attacks with {}: {} vs {} ({:?})",
            actor.name, item.name, roll.total, target, outcome
        );

        let mut card = result.card();
        if let Some(damage) = &result.damage {
            card.push_str(&format!("\nDamage: {}", damage.formula));
        }
        self.announce(&actor.name, card).await;

        Ok(result)
    }

    /// Roll the damage recorded by a successful attack
    ///
    /// Critical hits add the configured bonus die.
    pub async fn resolve_damage(&self, descriptor: &DamageDescriptor) -> Result<DamageResult> {
        let mut formula: Formula = descriptor.formula.parse()?;
        if descriptor.critical {
            formula = formula.plus_dice(DiceTerm::new(1, self.config.critical_bonus_die.sides()));
        }

        let roll = self.roll(&formula).await?;
        debug!("{} damage: {} = {}", descriptor.weapon, roll.formula, roll.total);

        let mut card = format!("{} Damage: {} = {}", descriptor.weapon, roll.formula, roll.total);
        if descriptor.critical {
            card.push_str(" (Critical!)");
        }
        self.announce(&descriptor.actor, card).await;

        Ok(DamageResult {
            actor_id: descriptor.actor_id.clone(),
            weapon: descriptor.weapon.clone(),
            critical: descriptor.critical,
            roll,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::DiceError;
    use crate::host::HostMessage;
    use crate::model::{ActorKind, Attribute, Item};
    use crate::resolution::testing::resolver_with;

    fn weapon(attribute: Attribute, kind: WeaponKind, size: WeaponSize) -> Weapon {
        Weapon {
            attribute,
            kind,
            size,
        }
    }

    fn fighter() -> Actor {
        Actor::new("a1", "Brannoc", ActorKind::Character)
            .with_item(Item::weapon(
                "sword",
                "Longsword",
                weapon(Attribute::Strength, WeaponKind::Melee, WeaponSize::Medium),
            ))
            .with_item(Item::weapon(
                "dagger",
                "Dagger",
                weapon(Attribute::Dexterity, WeaponKind::Melee, WeaponSize::Small),
            ))
            .with_item(Item::weapon(
                "fists",
                "Fists",
                weapon(Attribute::Strength, WeaponKind::Unarmed, WeaponSize::Big),
            ))
            .with_item(Item::armour("chain", "Chainmail", 2))
    }

    #[test]
    fn test_damage_die_by_size() {
        let actor = fighter();
        let die = |kind, size| damage_die(&actor, &weapon(Attribute::Strength, kind, size));
        assert_eq!(die(WeaponKind::Melee, WeaponSize::Small), DamageDie::Die(DieFace::D4));
        assert_eq!(die(WeaponKind::Ranged, WeaponSize::Medium), DamageDie::Die(DieFace::D6));
        assert_eq!(die(WeaponKind::Melee, WeaponSize::Big), DamageDie::Die(DieFace::D8));
        // unarmed ignores size
        assert_eq!(die(WeaponKind::Unarmed, WeaponSize::Big), DamageDie::Die(DieFace::D4));
    }

    #[tokio::test]
    async fn test_strength_ten_rolling_eight_hits() {
        let (host, chat, dice, resolver) = resolver_with(&[8]);
        host.put_actor(fighter()).await;

        let result = resolver
            .resolve_attack("a1", "sword", RollModifiers::default())
            .await
            .unwrap();

        assert_eq!(result.outcome, Outcome::Hit);
        assert!(result.success);
        assert_eq!(result.total, 8);
        assert_eq!(result.target, 10);
        let damage = result.damage.unwrap();
        assert_eq!(damage.formula, "1d6");
        assert!(!damage.critical);
        assert_eq!(dice.rolled(), vec!["1d20"]);

        let messages = chat.drain().await;
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            HostMessage::Chat(m) => assert_eq!(m.speaker.as_deref(), Some("Brannoc")),
            other => panic!("Expected chat card, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_equal_total_misses() {
        let (host, _chat, _dice, resolver) = resolver_with(&[10]);
        host.put_actor(fighter()).await;

        let result = resolver
            .resolve_attack("a1", "sword", RollModifiers::default())
            .await
            .unwrap();
        assert_eq!(result.outcome, Outcome::Miss);
        assert!(result.damage.is_none());
    }

    #[tokio::test]
    async fn test_critical_hit_with_advantage() {
        let (host, _chat, dice, resolver) = resolver_with(&[1, 17]);
        host.put_actor(fighter()).await;

        let mods = RollModifiers {
            advantage: true,
            ..Default::default()
        };
        let result = resolver.resolve_attack("a1", "dagger", mods).await.unwrap();

        assert_eq!(dice.rolled(), vec!["2d20kl"]);
        assert_eq!(result.outcome, Outcome::Critical);
        assert_eq!(result.faces, vec![1, 17]);
        let damage = result.damage.unwrap();
        assert_eq!(damage.formula, "1d4");
        assert!(damage.critical);
    }

    #[tokio::test]
    async fn test_fumble_never_deals_damage() {
        // modifier pulls the total under the attribute, but a natural 20 still fumbles
        let (host, _chat, _dice, resolver) = resolver_with(&[20]);
        host.put_actor(fighter()).await;

        let mods = RollModifiers {
            modifier: -15,
            ..Default::default()
        };
        let result = resolver.resolve_attack("a1", "sword", mods).await.unwrap();
        assert!(result.success);
        assert!(result.fumble);
        assert_eq!(result.outcome, Outcome::Fumble);
        assert!(result.damage.is_none());
    }

    #[tokio::test]
    async fn test_special_unarmed_damage_has_no_formula() {
        let (host, _chat, _dice, resolver) = resolver_with(&[3]);
        let mut actor = fighter();
        actor.damage_dice.unarmed = DamageDie::Special;
        host.put_actor(actor).await;

        let result = resolver
            .resolve_attack("a1", "fists", RollModifiers::default())
            .await
            .unwrap();
        assert_eq!(result.outcome, Outcome::Hit);
        assert!(result.damage.is_none());
    }

    #[tokio::test]
    async fn test_attack_lookup_failures() {
        let (host, chat, _dice, resolver) = resolver_with(&[]);
        host.put_actor(fighter()).await;

        let err = resolver
            .resolve_attack("nobody", "sword", RollModifiers::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RulesError::NotFound { kind: "actor", .. }));
        assert!(chat.is_empty().await);

        let err = resolver
            .resolve_attack("a1", "chain", RollModifiers::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RulesError::PreconditionFailed(_)));
        assert_eq!(chat.len().await, 1);
    }

    #[tokio::test]
    async fn test_critical_damage_adds_bonus_die() {
        let (_host, chat, dice, resolver) = resolver_with(&[5, 3]);
        let descriptor = DamageDescriptor {
            actor_id: "a1".into(),
            actor: "Brannoc".into(),
            weapon_id: "sword".into(),
            weapon: "Longsword".into(),
            formula: "1d6".into(),
            critical: true,
        };

        let result = resolver.resolve_damage(&descriptor).await.unwrap();
        assert_eq!(dice.rolled(), vec!["1d6+1d4"]);
        assert_eq!(result.roll.total, 8);
        assert!(chat.drain().await[0].text().contains("Critical!"));
    }

    #[tokio::test]
    async fn test_bad_damage_formula_is_a_dice_error() {
        let (_host, _chat, _dice, resolver) = resolver_with(&[]);
        let descriptor = DamageDescriptor {
            actor_id: "a1".into(),
            actor: "Brannoc".into(),
            weapon_id: "sword".into(),
            weapon: "Longsword".into(),
            formula: "1d".into(),
            critical: false,
        };
        assert!(matches!(
            resolver.resolve_damage(&descriptor).await,
            Err(RulesError::Dice(_))
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_modifier_rolls_nothing() {
        let (host, chat, dice, resolver) = resolver_with(&[5]);
        host.put_actor(fighter()).await;

        let mods = RollModifiers {
            modifier: i32::MAX,
            ..Default::default()
        };
        let err = resolver.resolve_attack("a1", "sword", mods).await.unwrap_err();
        assert!(matches!(err, RulesError::Dice(DiceError::InvalidModifier(_))));
        assert_eq!(dice.remaining(), 1);
        assert!(chat.is_empty().await);
    }

    #[tokio::test]
    async fn test_oversized_damage_formula_is_rejected() {
        let (_host, chat, dice, resolver) = resolver_with(&[u32::MAX, u32::MAX]);
        for formula in ["2d4294967295", "4294967295d6"] {
            let descriptor = DamageDescriptor {
                actor_id: "a1".into(),
                actor: "Brannoc".into(),
                weapon_id: "sword".into(),
                weapon: "Longsword".into(),
                formula: formula.into(),
                critical: false,
            };
            assert!(matches!(
                resolver.resolve_damage(&descriptor).await,
                Err(RulesError::Dice(_))
            ));
        }
        assert_eq!(dice.remaining(), 2);
        assert!(chat.is_empty().await);
    }
}
