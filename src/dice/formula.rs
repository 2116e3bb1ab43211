//! Dice formula parsing and evaluation
//!
//! Parses and evaluates notation like "1d20", "2d20kl+1", "1d6+1d4", "1d4+12"

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Most dice a single group may roll
pub const MAX_DICE: u32 = 100;
/// Largest die a group may roll
pub const MAX_SIDES: u32 = 1000;
/// Largest flat modifier, either sign
pub const MAX_MODIFIER: i32 = 1000;

/// Errors raised while parsing or evaluating a dice formula
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("empty dice formula")]
    Empty,

    #[error("invalid dice count: {0}")]
    InvalidCount(String),

    #[error("invalid die sides: {0}")]
    InvalidSides(String),

    #[error("invalid modifier: {0}")]
    InvalidModifier(String),

    #[error("dice cannot be subtracted: {0}")]
    NegativeDice(String),

    #[error("dice total out of range: {0}")]
    Overflow(String),

    #[error("scripted dice ran out of faces while rolling {0}")]
    ScriptExhausted(String),
}

/// Which dice of a multi-die term count toward the total
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Keep {
    #[default]
    All,
    Highest,
    Lowest,
}

/// A group of identical dice, e.g. "2d20kl"
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceTerm {
    /// Number of dice to roll
    pub count: u32,
    /// Number of sides per die
    pub sides: u32,
    /// Keep rule applied to the rolled faces
    pub keep: Keep,
}

impl DiceTerm {
    pub fn new(count: u32, sides: u32) -> Self {
        Self {
            count,
            sides,
            keep: Keep::All,
        }
    }

    pub fn keep(mut self, keep: Keep) -> Self {
        self.keep = keep;
        self
    }

    /// Check the group against `MAX_DICE` and `MAX_SIDES`
    pub fn validate(&self) -> Result<(), DiceError> {
        if self.count == 0 || self.count > MAX_DICE {
            return Err(DiceError::InvalidCount(self.count.to_string()));
        }
        if self.sides == 0 || self.sides > MAX_SIDES {
            return Err(DiceError::InvalidSides(self.sides.to_string()));
        }
        Ok(())
    }
}

/// Reject flat modifiers beyond `MAX_MODIFIER`
pub fn check_modifier(modifier: i32) -> Result<i32, DiceError> {
    if modifier.unsigned_abs() > MAX_MODIFIER.unsigned_abs() {
        return Err(DiceError::InvalidModifier(modifier.to_string()));
    }
    Ok(modifier)
}

impl fmt::Display for DiceTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)?;
        match self.keep {
            Keep::All => Ok(()),
            Keep::Highest => write!(f, "kh"),
            Keep::Lowest => write!(f, "kl"),
        }
    }
}

/// One additive piece of a formula
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Term {
    Dice(DiceTerm),
    Flat(i32),
}

/// A parsed dice formula: a sum of dice groups and flat modifiers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    terms: Vec<Term>,
}

impl Formula {
    /// A formula made of a single dice group
    pub fn dice(count: u32, sides: u32) -> Self {
        Self {
            terms: vec![Term::Dice(DiceTerm::new(count, sides))],
        }
    }

    /// Append a dice group
    pub fn plus_dice(mut self, term: DiceTerm) -> Self {
        self.terms.push(Term::Dice(term));
        self
    }

    /// Append a flat modifier (zero is dropped)
    pub fn plus_flat(mut self, modifier: i32) -> Self {
        if modifier != 0 {
            self.terms.push(Term::Flat(modifier));
        }
        self
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Evaluate the formula, asking `next` for each die face in order.
    ///
    /// `next` receives the number of sides of the die being rolled.
    pub fn evaluate<F>(&self, mut next: F) -> Result<Roll, DiceError>
    where
        F: FnMut(u32) -> Result<u32, DiceError>,
    {
        let mut dice = Vec::new();
        let mut total: i32 = 0;
        let overflow = || DiceError::Overflow(self.to_string());

        for term in &self.terms {
            match term {
                Term::Dice(d) => {
                    d.validate()?;
                    let mut results = Vec::with_capacity(d.count as usize);
                    for _ in 0..d.count {
                        results.push(next(d.sides)?.clamp(1, d.sides));
                    }
                    let kept = match d.keep {
                        Keep::All => results.clone(),
                        Keep::Highest => results.iter().max().copied().into_iter().collect(),
                        Keep::Lowest => results.iter().min().copied().into_iter().collect(),
                    };
                    let sum = kept
                        .iter()
                        .try_fold(0u32, |acc, face| acc.checked_add(*face))
                        .and_then(|sum| i32::try_from(sum).ok())
                        .ok_or_else(overflow)?;
                    total = total.checked_add(sum).ok_or_else(overflow)?;
                    dice.push(TermRoll {
                        sides: d.sides,
                        results,
                        kept,
                    });
                }
                Term::Flat(k) => {
                    let k = check_modifier(*k)?;
                    total = total.checked_add(k).ok_or_else(overflow)?;
                }
            }
        }

        Ok(Roll {
            formula: self.to_string(),
            dice,
            total,
        })
    }
}

impl From<DiceTerm> for Formula {
    fn from(term: DiceTerm) -> Self {
        Self {
            terms: vec![Term::Dice(term)],
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            match term {
                Term::Dice(d) if i == 0 => write!(f, "{}", d)?,
                Term::Dice(d) => write!(f, "+{}", d)?,
                Term::Flat(k) if i == 0 => write!(f, "{}", k)?,
                Term::Flat(k) if *k < 0 => write!(f, "{}", k)?,
                Term::Flat(k) => write!(f, "+{}", k)?,
            }
        }
        Ok(())
    }
}

impl FromStr for Formula {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_formula(s)
    }
}

/// Faces rolled for one dice group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRoll {
    pub sides: u32,
    /// Every face rolled, in roll order
    pub results: Vec<u32>,
    /// Faces that count toward the total after the keep rule
    pub kept: Vec<u32>,
}

/// The outcome of evaluating a formula
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roll {
    pub formula: String,
    pub dice: Vec<TermRoll>,
    pub total: i32,
}

impl Roll {
    /// Faces of the first dice group, the one criticals and fumbles are read from
    pub fn first_faces(&self) -> &[u32] {
        self.dice.first().map(|t| t.results.as_slice()).unwrap_or(&[])
    }

    /// Sides of the first dice group
    pub fn first_sides(&self) -> Option<u32> {
        self.dice.first().map(|t| t.sides)
    }
}

/// Parse a dice formula string like "2d20kl+3"
pub fn parse_formula(notation: &str) -> Result<Formula, DiceError> {
    let notation: String = notation
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    if notation.is_empty() {
        return Err(DiceError::Empty);
    }

    let mut terms = Vec::new();
    for (negative, chunk) in split_signed(&notation) {
        if chunk.is_empty() {
            return Err(DiceError::InvalidModifier(notation.clone()));
        }
        if chunk.contains('d') {
            if negative {
                return Err(DiceError::NegativeDice(chunk.to_string()));
            }
            terms.push(Term::Dice(parse_dice_term(chunk)?));
        } else {
            let value: i32 = chunk
                .parse()
                .map_err(|_| DiceError::InvalidModifier(chunk.to_string()))?;
            let value = check_modifier(value)?;
            terms.push(Term::Flat(if negative { -value } else { value }));
        }
    }

    Ok(Formula { terms })
}

/// Split "1d6+2-1" into [(false, "1d6"), (false, "2"), (true, "1")]
fn split_signed(notation: &str) -> Vec<(bool, &str)> {
    let mut parts = Vec::new();
    let mut negative = false;
    let mut start = 0;

    for (i, c) in notation.char_indices() {
        if c == '+' || c == '-' {
            if i > 0 {
                parts.push((negative, &notation[start..i]));
            }
            negative = c == '-';
            start = i + 1;
        }
    }
    parts.push((negative, &notation[start..]));
    parts
}

fn parse_dice_term(chunk: &str) -> Result<DiceTerm, DiceError> {
    let d_pos = chunk
        .find('d')
        .ok_or_else(|| DiceError::InvalidSides(chunk.to_string()))?;

    let count_str = &chunk[..d_pos];
    let count: u32 = if count_str.is_empty() {
        1 // "d6" means "1d6"
    } else {
        count_str
            .parse()
            .map_err(|_| DiceError::InvalidCount(count_str.to_string()))?
    };
    if count == 0 || count > MAX_DICE {
        return Err(DiceError::InvalidCount(count_str.to_string()));
    }

    let rest = &chunk[d_pos + 1..];
    let (sides_str, keep) = if let Some(s) = rest.strip_suffix("kh") {
        (s, Keep::Highest)
    } else if let Some(s) = rest.strip_suffix("kl") {
        (s, Keep::Lowest)
    } else {
        (rest, Keep::All)
    };

    let sides: u32 = sides_str
        .parse()
        .map_err(|_| DiceError::InvalidSides(sides_str.to_string()))?;
    if sides == 0 || sides > MAX_SIDES {
        return Err(DiceError::InvalidSides(sides_str.to_string()));
    }

    Ok(DiceTerm { count, sides, keep })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(faces: &[u32]) -> impl FnMut(u32) -> Result<u32, DiceError> + '_ {
        let mut iter = faces.iter().copied();
        move |_| iter.next().ok_or(DiceError::ScriptExhausted("test".into()))
    }

    #[test]
    fn test_parse_basic() {
        let f = parse_formula("2d6").unwrap();
        assert_eq!(f.terms(), &[Term::Dice(DiceTerm::new(2, 6))]);
    }

    #[test]
    fn test_parse_keep_and_modifier() {
        let f = parse_formula("2d20kl+3").unwrap();
        assert_eq!(
            f.terms(),
            &[
                Term::Dice(DiceTerm::new(2, 20).keep(Keep::Lowest)),
                Term::Flat(3)
            ]
        );
    }

    #[test]
    fn test_parse_multiple_dice_groups() {
        let f = parse_formula("1d6 + 1D4").unwrap();
        assert_eq!(f.terms().len(), 2);
        assert_eq!(f.to_string(), "1d6+1d4");
    }

    #[test]
    fn test_parse_implicit_one_and_negative_modifier() {
        let f = parse_formula("d8-2").unwrap();
        assert_eq!(
            f.terms(),
            &[Term::Dice(DiceTerm::new(1, 8)), Term::Flat(-2)]
        );
        assert_eq!(f.to_string(), "1d8-2");
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(parse_formula(""), Err(DiceError::Empty));
        assert!(parse_formula("abc").is_err());
        assert!(parse_formula("2d").is_err());
        assert!(parse_formula("0d6").is_err());
        assert!(parse_formula("2d0").is_err());
        assert!(parse_formula("1d6+").is_err());
        assert!(matches!(
            parse_formula("1d6-1d4"),
            Err(DiceError::NegativeDice(_))
        ));
    }

    #[test]
    fn test_evaluate_keep_lowest() {
        let f = parse_formula("2d20kl+1").unwrap();
        let roll = f.evaluate(fixed(&[14, 6])).unwrap();
        assert_eq!(roll.first_faces(), &[14, 6]);
        assert_eq!(roll.dice[0].kept, vec![6]);
        assert_eq!(roll.total, 7);
        assert_eq!(roll.formula, "2d20kl+1");
    }

    #[test]
    fn test_evaluate_keep_highest() {
        let f = parse_formula("2d20kh").unwrap();
        let roll = f.evaluate(fixed(&[14, 6])).unwrap();
        assert_eq!(roll.total, 14);
    }

    #[test]
    fn test_evaluate_sums_groups_and_clamps_faces() {
        let f = parse_formula("1d6+1d4").unwrap();
        let roll = f.evaluate(fixed(&[9, 3])).unwrap();
        // 9 is out of range for a d6 and clamps to 6
        assert_eq!(roll.total, 9);
        assert_eq!(roll.first_sides(), Some(6));
    }

    #[test]
    fn test_evaluate_runs_out_of_faces() {
        let f = parse_formula("3d6").unwrap();
        assert!(f.evaluate(fixed(&[1, 2])).is_err());
    }

    #[test]
    fn test_parse_rejects_oversized_terms() {
        assert_eq!(
            parse_formula("1001d6"),
            Err(DiceError::InvalidCount("1001".into()))
        );
        assert_eq!(
            parse_formula("4294967295d6"),
            Err(DiceError::InvalidCount("4294967295".into()))
        );
        assert_eq!(
            parse_formula("2d4294967295"),
            Err(DiceError::InvalidSides("4294967295".into()))
        );
        assert!(parse_formula("100d1000").is_ok());
        assert_eq!(
            parse_formula("1d20+1001"),
            Err(DiceError::InvalidModifier("1001".into()))
        );
        assert!(parse_formula("1d20-1000").is_ok());
    }

    #[test]
    fn test_check_modifier() {
        assert_eq!(check_modifier(-1000), Ok(-1000));
        assert!(matches!(
            check_modifier(i32::MAX),
            Err(DiceError::InvalidModifier(_))
        ));
        assert!(matches!(
            check_modifier(i32::MIN),
            Err(DiceError::InvalidModifier(_))
        ));
    }

    #[test]
    fn test_evaluate_validates_built_formulas() {
        let f = Formula::dice(1, 20).plus_flat(i32::MAX);
        assert!(matches!(
            f.evaluate(fixed(&[5])),
            Err(DiceError::InvalidModifier(_))
        ));

        let f = Formula::dice(u32::MAX, 6);
        assert!(matches!(
            f.evaluate(fixed(&[])),
            Err(DiceError::InvalidCount(_))
        ));
    }

    #[test]
    fn test_evaluate_reports_overflow() {
        // 100 modifiers of 1000 each stay in range
        let mut f = Formula::dice(1, 6);
        for _ in 0..100 {
            f = f.plus_flat(MAX_MODIFIER);
        }
        assert_eq!(f.evaluate(fixed(&[1])).unwrap().total, 100_001);

        // each term is in range but the sum passes i32::MAX
        let f = Formula {
            terms: vec![Term::Flat(MAX_MODIFIER); 2_200_000],
        };
        assert!(matches!(
            f.evaluate(fixed(&[])),
            Err(DiceError::Overflow(_))
        ));
    }

    #[test]
    fn test_builder_display() {
        let f = Formula::dice(1, 20).plus_flat(0).plus_flat(-2);
        assert_eq!(f.to_string(), "1d20-2");
        let f = Formula::dice(1, 6).plus_dice(DiceTerm::new(1, 4));
        assert_eq!(f.to_string(), "1d6+1d4");
    }
}
