//! Randomness sources
//!
//! The engine never rolls on its own; it hands a formula string to a
//! `DiceSource` and awaits the faces.

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;

use super::formula::{parse_formula, DiceError, Roll};

/// Evaluates dice formulas
#[async_trait]
pub trait DiceSource: Send + Sync {
    /// Roll `formula` and report every face plus the total
    async fn roll(&self, formula: &str) -> Result<Roll, DiceError>;
}

/// Uniform dice backed by the thread-local RNG
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomDice;

impl RandomDice {
    fn evaluate(formula: &str) -> Result<Roll, DiceError> {
        let formula = parse_formula(formula)?;
        let mut rng = rand::rng();
        formula.evaluate(|sides| Ok(rng.random_range(1..=sides)))
    }
}

#[async_trait]
impl DiceSource for RandomDice {
    async fn roll(&self, formula: &str) -> Result<Roll, DiceError> {
        Self::evaluate(formula)
    }
}

/// Dice that return pre-arranged faces, in order
///
/// Used by tests and demos where the outcome must be known in advance.
/// Faces larger than the die are clamped to its maximum.
#[derive(Debug, Default)]
pub struct ScriptedDice {
    faces: Mutex<VecDeque<u32>>,
    rolled: Mutex<Vec<String>>,
}

impl ScriptedDice {
    pub fn new(faces: impl IntoIterator<Item = u32>) -> Self {
        Self {
            faces: Mutex::new(faces.into_iter().collect()),
            rolled: Mutex::new(Vec::new()),
        }
    }

    /// Queue more faces
    pub fn push(&self, faces: impl IntoIterator<Item = u32>) {
        self.faces.lock().extend(faces);
    }

    /// Formulas rolled so far, in order
    pub fn rolled(&self) -> Vec<String> {
        self.rolled.lock().clone()
    }

    /// Faces not yet consumed
    pub fn remaining(&self) -> usize {
        self.faces.lock().len()
    }
}

#[async_trait]
impl DiceSource for ScriptedDice {
    async fn roll(&self, formula: &str) -> Result<Roll, DiceError> {
        let parsed = parse_formula(formula)?;
        let roll = {
            let mut faces = self.faces.lock();
            parsed.evaluate(|_| {
                faces
                    .pop_front()
                    .ok_or_else(|| DiceError::ScriptExhausted(formula.to_string()))
            })?
        };
        self.rolled.lock().push(roll.formula.clone());
        Ok(roll)
    }
}
