//! Armour dice: breaking and repairing

use tracing::{debug, info};

use super::Resolver;
use crate::error::Result;
use crate::model::{Actor, ArmourValue, Item, ItemUpdate};

impl Resolver {
    async fn armour_of(&self, item: &Item) -> Result<ArmourValue> {
        match item.as_armour() {
            Some(armour) => Ok(*armour),
            None => Err(self
                .reject(format!("The '{}' item is not armour.", item.name))
                .await),
        }
    }

    async fn set_broken(&self, actor: &Actor, item: &Item, broken: u32) -> Result<()> {
        self.items
            .update_item(
                &actor.id,
                &item.id,
                ItemUpdate {
                    armour_broken: Some(broken),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }

    /// Mark one more armour die as broken
    pub async fn break_armour_die(&self, item_id: &str) -> Result<ArmourValue> {
        let (actor, item) = self.owned_item(item_id).await?;
        let mut armour = self.armour_of(&item).await?;

        if armour.broken >= armour.total {
            return Err(self
                .reject(format!(
                    "The '{}' armour die is already at minimum.",
                    item.name
                ))
                .await);
        }

        armour.broken += 1;
        self.set_broken(&actor, &item, armour.broken).await?;
        info!("{} armour: {}/{} broken", item.name, armour.broken, armour.total);
        self.announce(
            &actor.name,
            format!(
                "{} loses an armour die ({} of {} left).",
                item.name,
                armour.total - armour.broken,
                armour.total
            ),
        )
        .await;
        Ok(armour)
    }

    /// Repair one broken armour die
    pub async fn repair_armour_die(&self, item_id: &str) -> Result<ArmourValue> {
        let (actor, item) = self.owned_item(item_id).await?;
        let mut armour = self.armour_of(&item).await?;

        if armour.broken == 0 {
            return Err(self
                .reject(format!("The '{}' armour is not damaged.", item.name))
                .await);
        }

        armour.broken -= 1;
        self.set_broken(&actor, &item, armour.broken).await?;
        info!("{} armour: {}/{} broken", item.name, armour.broken, armour.total);
        self.announce(
            &actor.name,
            format!(
                "{} repaired ({} of {} armour dice).",
                item.name,
                armour.total - armour.broken,
                armour.total
            ),
        )
        .await;
        Ok(armour)
    }

    /// Repair every damaged armour item the actor owns, returning how many
    pub async fn repair_all_armour(&self, actor_id: &str) -> Result<usize> {
        let actor = self.actor(actor_id).await?;

        let mut repaired = 0;
        for item in &actor.items {
            match item.as_armour() {
                Some(armour) if armour.broken > 0 => {
                    self.set_broken(&actor, item, 0).await?;
                    repaired += 1;
                }
                _ => {}
            }
        }

        debug!("repaired {} armour items for {}", repaired, actor.name);
        if repaired > 0 {
            self.announce(&actor.name, "All armour repaired.".to_string())
                .await;
        }
        Ok(repaired)
    }
}
