//! Rests

use tracing::info;

use super::Resolver;
use crate::error::Result;
use crate::model::{ActorUpdate, HitPoints};

impl Resolver {
    /// Recover hit points equal to the actor's level, up to the maximum
    pub async fn short_rest(&self, actor_id: &str) -> Result<HitPoints> {
        let actor = self.actor(actor_id).await?;
        let hp = actor.hit_points;
        let value = hp.value.saturating_add(actor.level as i32).min(hp.max).max(hp.value);
        self.heal(&actor.id, value).await?;

        info!("{} short rest: {} -> {} hp", actor.name, hp.value, value);
        self.announce(
            &actor.name,
            format!(
                "{} takes a short rest and recovers {} hit points.",
                actor.name,
                value - hp.value
            ),
        )
        .await;
        Ok(HitPoints { value, max: hp.max })
    }

    /// Recover all hit points
    pub async fn long_rest(&self, actor_id: &str) -> Result<HitPoints> {
        let actor = self.actor(actor_id).await?;
        let hp = actor.hit_points;
        self.heal(&actor.id, hp.max).await?;

        info!("{} long rest: {} -> {} hp", actor.name, hp.value, hp.max);
        self.announce(
            &actor.name,
            format!("{} takes a long rest and is fully healed.", actor.name),
        )
        .await;
        Ok(HitPoints {
            value: hp.max,
            max: hp.max,
        })
    }

    async fn heal(&self, actor_id: &str, value: i32) -> Result<()> {
        self.actors
            .update_actor(
                actor_id,
                ActorUpdate {
                    hit_points: Some(value),
                    ..Default::default()
                },
            )
            .await?;
        Ok(())
    }
}
