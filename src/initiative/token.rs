//! Initiative tokens and round state

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::ActorId;

const ADVERSARIES: &str = "adversaries";
const NEUTRAL: &str = "neutral";

/// A placeholder in the initiative bag
///
/// Stored in flags as a bare string: an actor id, `"adversaries"` or `"neutral"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Token {
    /// A player-controlled combatant
    Actor(ActorId),
    /// All GM-controlled combatants, ordered by the GM
    Adversaries,
    /// Ends the round when drawn
    Neutral,
}

impl Token {
    /// Ids that would read back as the shared tokens
    pub fn is_reserved(id: &str) -> bool {
        id == ADVERSARIES || id == NEUTRAL
    }
}

impl From<String> for Token {
    fn from(s: String) -> Self {
        match s.as_str() {
            ADVERSARIES => Token::Adversaries,
            NEUTRAL => Token::Neutral,
            _ => Token::Actor(s),
        }
    }
}

impl From<Token> for String {
    fn from(token: Token) -> Self {
        match token {
            Token::Actor(id) => id,
            Token::Adversaries => ADVERSARIES.to_string(),
            Token::Neutral => NEUTRAL.to_string(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Actor(id) => write!(f, "{}", id),
            Token::Adversaries => write!(f, "{}", ADVERSARIES),
            Token::Neutral => write!(f, "{}", NEUTRAL),
        }
    }
}

/// Where the current round stands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "token", rename_all = "snake_case")]
pub enum RoundState {
    /// No bag has been built for this combat
    Empty,
    /// Bag built, nothing drawn yet
    Ready,
    /// A combatant or the adversaries are acting
    Acting(Token),
    /// The neutral token was drawn
    RoundOver,
}

/// Round state as persisted on the combat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub state: RoundState,
    pub bag: Vec<Token>,
    pub current_turn: Option<Token>,
}

impl RoundSnapshot {
    pub(crate) fn from_flags(
        bag: Option<Vec<Token>>,
        current_turn: Option<Token>,
        round_over: bool,
    ) -> Self {
        let state = match (&bag, &current_turn) {
            (None, _) => RoundState::Empty,
            _ if round_over => RoundState::RoundOver,
            (Some(_), Some(token)) => RoundState::Acting(token.clone()),
            (Some(_), None) => RoundState::Ready,
        };
        Self {
            state,
            bag: bag.unwrap_or_default(),
            current_turn,
        }
    }
}
