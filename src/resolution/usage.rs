//! Usage dice and supply quantities on consumable equipment

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::Resolver;
use crate::dice::UsageDieLevel;
use crate::error::Result;
use crate::model::{ActorId, Equipment, Item, ItemId, ItemUpdate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageOutcome {
    /// Rolled at or over the threshold; nothing changes
    Success,
    /// Stepped down one face
    Downgraded,
    /// Stepped down past d4; one unit of supply is gone
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageDieResult {
    pub actor_id: ActorId,
    pub item_id: ItemId,
    pub item: String,
    /// Die that was rolled
    pub rolled: UsageDieLevel,
    pub face: i32,
    /// Die the item is left at
    pub die: UsageDieLevel,
    pub outcome: UsageOutcome,
    pub quantity: u32,
}

/// Whether a usage die can be reset to its maximum
enum ResetCheck {
    Ready,
    AlreadyFull,
    Refused(String),
}

fn check_reset(item: &Item, equipment: &Equipment) -> ResetCheck {
    if !equipment.usage_die.is_tracked() {
        return ResetCheck::Refused(format!(
            "The '{}' item does not have a usage die.",
            item.name
        ));
    }
    if equipment.quantity == 0 {
        return ResetCheck::Refused(format!(
            "Unable to reset the usage die for '{}' as your supply is depleted.",
            item.name
        ));
    }
    if equipment.usage_die.current == equipment.usage_die.maximum {
        return ResetCheck::AlreadyFull;
    }
    ResetCheck::Ready
}

impl Resolver {
    /// Equipment with a tracked usage die, or a rejection notice
    async fn tracked_equipment(&self, item: &Item) -> Result<Equipment> {
        match item.as_equipment() {
            Some(equipment) if equipment.usage_die.is_tracked() => Ok(*equipment),
            _ => Err(self
                .reject(format!("The '{}' item does not have a usage die.", item.name))
                .await),
        }
    }

    /// Roll the usage die of a consumable
    ///
    /// A result under the threshold steps the die down. Stepping down from d4
    /// exhausts the die and spends one unit of the item.
    pub async fn resolve_usage_die(&self, item_id: &str) -> Result<UsageDieResult> {
        let (actor, item) = self.owned_item(item_id).await?;
        let equipment = self.tracked_equipment(&item).await?;

        let active = equipment.usage_die.active();
        let Some(face) = active.face() else {
            return Err(self
                .reject(format!(
                    "The usage die for the '{}' item is already exhausted.",
                    item.name
                ))
                .await);
        };

        let roll = self.roll(&face.roll(1)).await?;
        let mut quantity = equipment.quantity;

        let (outcome, die) = if roll.total < self.config.usage_die_threshold as i32 {
            let next = active.step_down();
            let mut update = ItemUpdate {
                usage_die: Some(next),
                ..Default::default()
            };
            let outcome = if next == UsageDieLevel::Exhausted {
                quantity = quantity.saturating_sub(1);
                update.quantity = Some(quantity);
                UsageOutcome::Exhausted
            } else {
                UsageOutcome::Downgraded
            };
            self.items.update_item(&actor.id, &item.id, update).await?;
            info!("{} usage die {} -> {} (rolled {})", item.name, active, next, roll.total);
            (outcome, next)
        } else {
            debug!("{} usage die holds at {} (rolled {})", item.name, active, roll.total);
            (UsageOutcome::Success, active)
        };

        let card = match outcome {
            UsageOutcome::Success => format!(
                "{} Usage Die: {} rolled {}. The die holds.",
                item.name, active, roll.total
            ),
            UsageOutcome::Downgraded => format!(
                "{} Usage Die: {} rolled {}. Downgraded to {}.",
                item.name, active, roll.total, die
            ),
            UsageOutcome::Exhausted => format!(
                "{} Usage Die: {} rolled {}. Exhausted! {} remaining.",
                item.name, active, roll.total, quantity
            ),
        };
        self.announce(&actor.name, card).await;

        Ok(UsageDieResult {
            actor_id: actor.id,
            item_id: item.id,
            item: item.name,
            rolled: active,
            face: roll.total,
            die,
            outcome,
            quantity,
        })
    }

    /// Restore a usage die to its maximum
    ///
    /// Returns whether anything changed; a die already at its maximum is
    /// left alone.
    pub async fn reset_usage_die(&self, item_id: &str) -> Result<bool> {
        let (actor, item) = self.owned_item(item_id).await?;
        let equipment = self.tracked_equipment(&item).await?;

        match check_reset(&item, &equipment) {
            ResetCheck::Refused(reason) => Err(self.reject(reason).await),
            ResetCheck::AlreadyFull => {
                warn!("{} usage die is already at its maximum", item.name);
                Ok(false)
            }
            ResetCheck::Ready => {
                let maximum = equipment.usage_die.maximum;
                self.items
                    .update_item(
                        &actor.id,
                        &item.id,
                        ItemUpdate {
                            usage_die: Some(maximum),
                            ..Default::default()
                        },
                    )
                    .await?;
                info!("{} usage die reset to {}", item.name, maximum);
                self.announce(
                    &actor.name,
                    format!("{} usage die reset to {}.", item.name, maximum),
                )
                .await;
                Ok(true)
            }
        }
    }

    /// Reset every usage die the actor carries, skipping those that cannot be
    /// reset. Returns the number of dice reset.
    pub async fn reset_all_usage_dice(&self, actor_id: &str) -> Result<usize> {
        let actor = self.actor(actor_id).await?;

        let mut reset = Vec::new();
        for item in &actor.items {
            let Some(equipment) = item.as_equipment() else {
                continue;
            };
            if !equipment.usage_die.is_tracked() {
                continue;
            }
            match check_reset(item, equipment) {
                ResetCheck::Ready => {
                    self.items
                        .update_item(
                            &actor.id,
                            &item.id,
                            ItemUpdate {
                                usage_die: Some(equipment.usage_die.maximum),
                                ..Default::default()
                            },
                        )
                        .await?;
                    reset.push(format!("{} ({})", item.name, equipment.usage_die.maximum));
                }
                ResetCheck::AlreadyFull => {
                    debug!("skipping {}: usage die already at maximum", item.name)
                }
                ResetCheck::Refused(reason) => warn!("skipping {}: {}", item.name, reason),
            }
        }

        info!("reset {} usage dice for {}", reset.len(), actor.name);
        if !reset.is_empty() {
            self.announce(
                &actor.name,
                format!("Usage dice reset: {}", reset.join(", ")),
            )
            .await;
        }
        Ok(reset.len())
    }

    /// Add `delta` units to a consumable's supply, floored at zero
    ///
    /// Spending from an empty supply is refused.
    pub async fn adjust_quantity(&self, item_id: &str, delta: i32) -> Result<u32> {
        let (actor, item) = self.owned_item(item_id).await?;
        let equipment = self.tracked_equipment(&item).await?;

        if delta < 0 && equipment.quantity == 0 {
            return Err(self
                .reject(format!("The supply of '{}' is already depleted.", item.name))
                .await);
        }

        let quantity = equipment.quantity.saturating_add_signed(delta);
        self.items
            .update_item(
                &actor.id,
                &item.id,
                ItemUpdate {
                    quantity: Some(quantity),
                    ..Default::default()
                },
            )
            .await?;
        debug!("{} quantity {} -> {}", item.name, equipment.quantity, quantity);
        Ok(quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RulesError;
    use crate::host::{HostMessage, ItemStore, NoticeLevel};
    use crate::host::MemoryHost;
    use crate::model::{Actor, ActorKind, Attribute, UsageDie, Weapon};
    use crate::resolution::testing::resolver_with;

    fn torches(current: UsageDieLevel, quantity: u32) -> Item {
        Item::equipment(
            "torch",
            "Torches",
            quantity,
            UsageDie {
                current,
                maximum: UsageDieLevel::D8,
            },
        )
    }

    fn explorer(item: Item) -> Actor {
        Actor::new("a1", "Wendel", ActorKind::Character)
            .with_item(item)
            .with_item(Item::weapon(
                "spear",
                "Spear",
                Weapon {
                    attribute: Attribute::Strength,
                    kind: Default::default(),
                    size: Default::default(),
                },
            ))
    }

    async fn stored(host: &MemoryHost) -> Equipment {
        let (_, item) = host.find_item("torch").await.unwrap().unwrap();
        *item.as_equipment().unwrap()
    }

    #[tokio::test]
    async fn test_d6_rolling_two_downgrades() {
        let (host, _chat, dice, resolver) = resolver_with(&[2]);
        host.put_actor(explorer(torches(UsageDieLevel::D6, 3))).await;

        let result = resolver.resolve_usage_die("torch").await.unwrap();
        assert_eq!(dice.rolled(), vec!["1d6"]);
        assert_eq!(result.outcome, UsageOutcome::Downgraded);
        assert_eq!(result.die, UsageDieLevel::D4);

        let equipment = stored(&host).await;
        assert_eq!(equipment.usage_die.current, UsageDieLevel::D4);
        assert_eq!(equipment.quantity, 3);
    }

    #[tokio::test]
    async fn test_d4_rolling_one_exhausts_and_spends_supply() {
        let (host, _chat, _dice, resolver) = resolver_with(&[1]);
        host.put_actor(explorer(torches(UsageDieLevel::D4, 1))).await;

        let result = resolver.resolve_usage_die("torch").await.unwrap();
        assert_eq!(result.outcome, UsageOutcome::Exhausted);
        assert_eq!(result.quantity, 0);
        let equipment = stored(&host).await;
        assert_eq!(equipment.usage_die.current, UsageDieLevel::Exhausted);
        assert_eq!(equipment.quantity, 0);
    }

    #[tokio::test]
    async fn test_quantity_floors_at_zero() {
        let (host, _chat, _dice, resolver) = resolver_with(&[1]);
        host.put_actor(explorer(torches(UsageDieLevel::D4, 0))).await;

        let result = resolver.resolve_usage_die("torch").await.unwrap();
        assert_eq!(result.outcome, UsageOutcome::Exhausted);
        assert_eq!(result.quantity, 0);
    }

    #[tokio::test]
    async fn test_first_use_rolls_maximum_and_holds() {
        let (host, chat, dice, resolver) = resolver_with(&[5]);
        host.put_actor(explorer(torches(UsageDieLevel::None, 2))).await;

        let result = resolver.resolve_usage_die("torch").await.unwrap();
        assert_eq!(dice.rolled(), vec!["1d8"]);
        assert_eq!(result.outcome, UsageOutcome::Success);
        assert_eq!(result.die, UsageDieLevel::D8);
        // a success writes nothing back
        assert_eq!(stored(&host).await.usage_die.current, UsageDieLevel::None);
        assert!(chat.drain().await[0].text().contains("holds"));
    }

    #[tokio::test]
    async fn test_exhausted_die_is_refused() {
        let (host, chat, dice, resolver) = resolver_with(&[]);
        host.put_actor(explorer(torches(UsageDieLevel::Exhausted, 2))).await;

        let err = resolver.resolve_usage_die("torch").await.unwrap_err();
        assert!(matches!(err, RulesError::PreconditionFailed(_)));
        assert!(dice.rolled().is_empty());

        let messages = chat.drain().await;
        match &messages[0] {
            HostMessage::Notice { level, text } => {
                assert_eq!(*level, NoticeLevel::Error);
                assert!(text.contains("already exhausted"));
            }
            other => panic!("Expected notice, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_untracked_or_missing_items() {
        let (host, chat, _dice, resolver) = resolver_with(&[]);
        host.put_actor(explorer(torches(UsageDieLevel::D6, 1))).await;

        assert!(matches!(
            resolver.resolve_usage_die("spear").await,
            Err(RulesError::PreconditionFailed(_))
        ));
        assert!(matches!(
            resolver.resolve_usage_die("nothing").await,
            Err(RulesError::NotFound { kind: "item", .. })
        ));
        assert_eq!(chat.len().await, 1);
    }

    #[tokio::test]
    async fn test_reset_usage_die() {
        let (host, _chat, _dice, resolver) = resolver_with(&[]);
        host.put_actor(explorer(torches(UsageDieLevel::D4, 1))).await;

        assert!(resolver.reset_usage_die("torch").await.unwrap());
        assert_eq!(stored(&host).await.usage_die.current, UsageDieLevel::D8);
        // second reset is a no-op
        assert!(!resolver.reset_usage_die("torch").await.unwrap());
    }

    #[tokio::test]
    async fn test_reset_refused_on_depleted_supply() {
        let (host, chat, _dice, resolver) = resolver_with(&[]);
        host.put_actor(explorer(torches(UsageDieLevel::Exhausted, 0))).await;

        assert!(matches!(
            resolver.reset_usage_die("torch").await,
            Err(RulesError::PreconditionFailed(_))
        ));
        assert!(chat.drain().await[0].text().contains("supply is depleted"));
        assert_eq!(
            stored(&host).await.usage_die.current,
            UsageDieLevel::Exhausted
        );
    }

    #[tokio::test]
    async fn test_reset_all_skips_blocked_items() {
        let (host, _chat, _dice, resolver) = resolver_with(&[]);
        let rations = Item::equipment(
            "rations",
            "Rations",
            0,
            UsageDie {
                current: UsageDieLevel::D4,
                maximum: UsageDieLevel::D6,
            },
        );
        let rope = Item::equipment("rope", "Rope", 1, UsageDie::fresh(UsageDieLevel::D6));
        let actor = explorer(torches(UsageDieLevel::D6, 2))
            .with_item(rations)
            .with_item(rope);
        host.put_actor(actor).await;

        assert_eq!(resolver.reset_all_usage_dice("a1").await.unwrap(), 2);
        assert_eq!(stored(&host).await.usage_die.current, UsageDieLevel::D8);
        let (_, rations) = host.find_item("rations").await.unwrap().unwrap();
        assert_eq!(
            rations.as_equipment().unwrap().usage_die.current,
            UsageDieLevel::D4
        );
    }

    #[tokio::test]
    async fn test_adjust_quantity() {
        let (host, _chat, _dice, resolver) = resolver_with(&[]);
        host.put_actor(explorer(torches(UsageDieLevel::D6, 1))).await;

        assert_eq!(resolver.adjust_quantity("torch", 2).await.unwrap(), 3);
        assert_eq!(resolver.adjust_quantity("torch", -5).await.unwrap(), 0);
        assert!(matches!(
            resolver.adjust_quantity("torch", -1).await,
            Err(RulesError::PreconditionFailed(_))
        ));
        assert_eq!(stored(&host).await.quantity, 0);
    }
}
