//! Dice system
//!
//! - Formula parsing ("1d20", "2d20kl+2", "1d6+1d4")
//! - Die faces and the usage-die ladder
//! - Pluggable randomness (`RandomDice`, `ScriptedDice`)

mod face;
mod formula;
mod source;

pub use face::{DamageDie, DieFace, UsageDieLevel};
pub use formula::{
    check_modifier, parse_formula, DiceError, DiceTerm, Formula, Keep, Roll, Term, TermRoll,
    MAX_DICE, MAX_MODIFIER, MAX_SIDES,
};
pub use source::{DiceSource, RandomDice, ScriptedDice};
