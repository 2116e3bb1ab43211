//! Attribute tests and attribute generation

use tracing::{debug, info};

use super::{is_critical, is_fumble, test_formula, Outcome, Resolver, RollModifiers, RollResult};
use crate::dice::Formula;
use crate::error::Result;
use crate::model::{ActorUpdate, Attribute, Attributes};

/// Scores at or below this on every attribute earn a full reroll
const REROLL_CEILING: i32 = 10;
/// 3d4 results below this are replaced with 1d4+12
const LOW_SCORE: i32 = 6;

impl Resolver {
    /// Roll under `attribute`; succeeds when the score is at least the total
    pub async fn resolve_attribute_test(
        &self,
        actor_id: &str,
        attribute: Attribute,
        modifiers: RollModifiers,
    ) -> Result<RollResult> {
        modifiers.validate()?;
        let actor = self.actor(actor_id).await?;

        let stance = modifiers.stance();
        let formula = test_formula(&self.config, stance, modifiers.modifier);
        let roll = self.roll(&formula).await?;

        let critical = is_critical(&roll, stance);
        let fumble = is_fumble(&roll, stance);
        let target = actor.attributes.get(attribute);
        let success = target >= roll.total;

        let outcome = if critical {
            Outcome::Critical
        } else if fumble {
            Outcome::Fumble
        } else if success {
            Outcome::Success
        } else {
            Outcome::Failure
        };

        let result = RollResult {
            title: format!("{} Test", attribute),
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
            damage: None,
        };
        info!(
            "{} tests {}: {} vs {} ({:?})",
            actor.name, attribute, roll.total, target, outcome
        );
        self.announce(&actor.name, result.card()).await;

        Ok(result)
    }

    /// Generate a fresh set of attribute scores and store them on the actor
    ///
    /// Each score is 3d4, with results under 6 replaced by 1d4+12. A set
    /// where nothing exceeds 10 is rerolled once.
    pub async fn roll_attributes(&self, actor_id: &str) -> Result<Attributes> {
        let actor = self.actor(actor_id).await?;

        let mut scores = self.roll_attribute_set().await?;
        if !Attribute::ALL
            .iter()
            .any(|a| scores.get(*a) > REROLL_CEILING)
        {
            debug!("no attribute above {} for {}; rerolling", REROLL_CEILING, actor.name);
            scores = self.roll_attribute_set().await?;
        }

        self.actors
            .update_actor(
                &actor.id,
                ActorUpdate {
                    attributes: Some(scores),
                    ..Default::default()
                },
            )
            .await?;
        info!("rolled attributes for {}", actor.name);

        let lines: Vec<String> = Attribute::ALL
            .iter()
            .map(|a| format!("{}: {}", a, scores.get(*a)))
            .collect();
        self.announce(
            &actor.name,
            format!("Attributes rolled\n{}", lines.join("\n")),
        )
        .await;

        Ok(scores)
    }

    async fn roll_attribute_set(&self) -> Result<Attributes> {
        let mut scores = Attributes::default();
        for attribute in Attribute::ALL {
            let mut score = self.roll(&Formula::dice(3, 4)).await?.total;
            if score < LOW_SCORE {
                score = self.roll(&Formula::dice(1, 4).plus_flat(12)).await?.total;
            }
            scores.set(attribute, score);
        }
        Ok(scores)
    }
}
