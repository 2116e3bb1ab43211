//! Initiative bag scheduler
//!
//! Each round every player-controlled combatant puts a token in a bag, the
//! GM-controlled side puts in one shared "adversaries" token, and a single
//! "neutral" token ends the round when drawn. Tokens are drawn in shuffled
//! order.
//!
//! The bag lives in the combat's flag store; nothing is cached here.

mod token;

use std::sync::Arc;

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};

use crate::config::RulesConfig;
use crate::error::{Result, RulesError};
use crate::host::{ActorStore, ChatMessage, ChatSink, CombatSessions, HostError, HostMessage};
use crate::model::{ActorId, Combat, CombatantCategory};

pub use token::{RoundSnapshot, RoundState, Token};

const BAG_FLAG: &str = "initiativeBag";
const CURRENT_TURN_FLAG: &str = "currentTurn";
const ROUND_OVER_FLAG: &str = "roundOver";

/// What a draw produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "drawn", rename_all = "snake_case")]
pub enum DrawOutcome {
    Combatant { actor_id: ActorId, name: String },
    Adversaries,
    RoundEnded,
}

/// Builds and draws from the initiative bag of the active combat
pub struct InitiativeBag {
    combats: Arc<dyn CombatSessions>,
    actors: Arc<dyn ActorStore>,
    chat: Arc<dyn ChatSink>,
    config: Arc<RulesConfig>,
}

impl InitiativeBag {
    pub fn new(
        combats: Arc<dyn CombatSessions>,
        actors: Arc<dyn ActorStore>,
        chat: Arc<dyn ChatSink>,
        config: Arc<RulesConfig>,
    ) -> Self {
        Self {
            combats,
            actors,
            chat,
            config,
        }
    }

    /// Fill and shuffle a new bag, discarding any previous bag and turn
    pub async fn build_bag(&self) -> Result<Vec<Token>> {
        let combat = self.active_combat().await?;

        let mut bag = Vec::with_capacity(combat.combatants.len() + 2);
        for combatant in &combat.combatants {
            if combatant.category != CombatantCategory::Player {
                continue;
            }
            if Token::is_reserved(&combatant.actor_id) {
                warn!(
                    "skipping combatant {} in combat {}: '{}' is a reserved token id",
                    combatant.name, combat.id, combatant.actor_id
                );
                continue;
            }
            bag.push(Token::Actor(combatant.actor_id.clone()));
            if self.draws_twice(&combatant.actor_id).await? {
                bag.push(Token::Actor(combatant.actor_id.clone()));
            }
        }
        if combat.has_adversaries() {
            bag.push(Token::Adversaries);
        }
        bag.push(Token::Neutral);

        bag.shuffle(&mut rand::rng());

        self.persist(&combat, &bag, None, false).await?;
        info!("initiative bag for combat {} holds {} tokens", combat.id, bag.len());

        self.chat
            .deliver(HostMessage::info("Initiative bag shuffled."))
            .await;
        self.chat
            .deliver(HostMessage::Chat(
                ChatMessage::new(None, breakdown(&combat, &bag)).whisper_gm(),
            ))
            .await;

        Ok(bag)
    }

    /// Draw the next token and announce whose turn it is
    pub async fn draw(&self) -> Result<DrawOutcome> {
        let combat = self.active_combat().await?;
        let mut round = self.load(&combat).await?;

        if round.state == RoundState::RoundOver {
            warn!("draw refused: round already over in combat {}", combat.id);
            self.chat
                .deliver(HostMessage::warning(
                    "The neutral token has been drawn. Shuffle the bag to start a new round.",
                ))
                .await;
            return Err(RulesError::PreconditionFailed(
                "the round is over".to_string(),
            ));
        }

        if round.bag.is_empty() {
            warn!("draw refused: initiative bag empty in combat {}", combat.id);
            self.chat
                .deliver(HostMessage::warning("No tokens left. Start a new round."))
                .await;
            return Err(RulesError::EmptyResource(
                "the initiative bag is empty".to_string(),
            ));
        }

        let drawn = round.bag.remove(0);
        debug!("drew {} ({} tokens left)", drawn, round.bag.len());

        match drawn {
            Token::Neutral => {
                self.persist(&combat, &round.bag, None, true).await?;
                self.chat
                    .deliver(HostMessage::info("Neutral token drawn. Round ends."))
                    .await;
                Ok(DrawOutcome::RoundEnded)
            }
            Token::Adversaries => {
                self.persist(&combat, &round.bag, Some(&Token::Adversaries), false)
                    .await?;
                self.chat
                    .deliver(HostMessage::chat(
                        Some("Adversaries"),
                        "Adversaries act! GM determines order.",
                    ))
                    .await;
                Ok(DrawOutcome::Adversaries)
            }
            Token::Actor(actor_id) => {
                let Some(combatant) = combat.combatant(&actor_id) else {
                    // The token is spent either way; otherwise the bag would jam on it.
                    self.persist(&combat, &round.bag, round.current_turn.as_ref(), false)
                        .await?;
                    error!("drawn token {} matches no combatant in combat {}", actor_id, combat.id);
                    return Err(RulesError::not_found("combatant", &actor_id));
                };

                let token = Token::Actor(actor_id.clone());
                self.persist(&combat, &round.bag, Some(&token), false).await?;
                self.chat
                    .deliver(HostMessage::chat(
                        Some(&combatant.name),
                        format!("{}'s turn!", combatant.name),
                    ))
                    .await;
                Ok(DrawOutcome::Combatant {
                    actor_id,
                    name: combatant.name.clone(),
                })
            }
        }
    }

    /// Current round state of the active combat
    pub async fn snapshot(&self) -> Result<RoundSnapshot> {
        let combat = self.active_combat().await?;
        self.load(&combat).await
    }

    async fn active_combat(&self) -> Result<Combat> {
        match self.combats.active_combat().await? {
            Some(combat) => Ok(combat),
            None => {
                debug!("no active combat; initiative request ignored");
                Err(RulesError::NoActiveSession)
            }
        }
    }

    async fn draws_twice(&self, actor_id: &str) -> Result<bool> {
        match self.actors.get_actor(actor_id).await? {
            Some(actor) => Ok(actor.has_class(&self.config.double_token_class)),
            None => {
                warn!("combatant actor {} not found; adding a single token", actor_id);
                Ok(false)
            }
        }
    }

    async fn load(&self, combat: &Combat) -> Result<RoundSnapshot> {
        let bag: Option<Vec<Token>> = self.flag(combat, BAG_FLAG).await?;
        let current_turn: Option<Token> = self.flag(combat, CURRENT_TURN_FLAG).await?;
        let round_over: Option<bool> = self.flag(combat, ROUND_OVER_FLAG).await?;
        Ok(RoundSnapshot::from_flags(
            bag,
            current_turn,
            round_over.unwrap_or(false),
        ))
    }

    async fn flag<T: serde::de::DeserializeOwned>(
        &self,
        combat: &Combat,
        key: &str,
    ) -> Result<Option<T>> {
        let value = self
            .combats
            .get_flag(&combat.id, &self.config.flag_scope, key)
            .await?;
        match value {
            None | Some(Value::Null) => Ok(None),
            Some(v) => serde_json::from_value(v).map(Some).map_err(|source| {
                RulesError::Host(HostError::InvalidFlag {
                    key: key.to_string(),
                    source,
                })
            }),
        }
    }

    async fn persist(
        &self,
        combat: &Combat,
        bag: &[Token],
        current_turn: Option<&Token>,
        round_over: bool,
    ) -> Result<()> {
        let mut flags = Map::new();
        flags.insert(BAG_FLAG.to_string(), json!(bag));
        flags.insert(CURRENT_TURN_FLAG.to_string(), json!(current_turn));
        flags.insert(ROUND_OVER_FLAG.to_string(), json!(round_over));
        self.combats
            .set_flags(&combat.id, &self.config.flag_scope, flags)
            .await?;
        Ok(())
    }
}

/// GM-facing listing of the bag contents
fn breakdown(combat: &Combat, bag: &[Token]) -> String {
    let lines: Vec<String> = bag
        .iter()
        .map(|token| match token {
            Token::Neutral => "🟡 Neutral".to_string(),
            Token::Adversaries => "🔴 Adversaries".to_string(),
            Token::Actor(id) => match combat.combatant(id) {
                Some(c) => format!("🟢 {}", c.name),
                None => "❓ Unknown".to_string(),
            },
        })
        .collect();
    format!(
        "Initiative Bag ({} tokens):\n{}",
        bag.len(),
        lines.join("\n")
    )
}
