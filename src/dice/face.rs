//! Die faces and the usage-die ladder

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::formula::Formula;

/// A single polyhedral die
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DieFace {
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
}

impl DieFace {
    pub fn sides(self) -> u32 {
        match self {
            DieFace::D4 => 4,
            DieFace::D6 => 6,
            DieFace::D8 => 8,
            DieFace::D10 => 10,
            DieFace::D12 => 12,
            DieFace::D20 => 20,
        }
    }

    /// Next face down the usage ladder; `None` below d4
    pub fn step_down(self) -> Option<DieFace> {
        match self {
            DieFace::D20 => Some(DieFace::D12),
            DieFace::D12 => Some(DieFace::D10),
            DieFace::D10 => Some(DieFace::D8),
            DieFace::D8 => Some(DieFace::D6),
            DieFace::D6 => Some(DieFace::D4),
            DieFace::D4 => None,
        }
    }

    /// A formula rolling `count` of this die
    pub fn roll(self, count: u32) -> Formula {
        Formula::dice(count, self.sides())
    }
}

impl FromStr for DieFace {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "d4" => Ok(DieFace::D4),
            "d6" => Ok(DieFace::D6),
            "d8" => Ok(DieFace::D8),
            "d10" => Ok(DieFace::D10),
            "d12" => Ok(DieFace::D12),
            "d20" => Ok(DieFace::D20),
            other => Err(format!("unknown die: {}", other)),
        }
    }
}

impl fmt::Display for DieFace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "d{}", self.sides())
    }
}

/// State of an item's usage die
///
/// `None` means the item does not track a usage die.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageDieLevel {
    #[default]
    None,
    D4,
    D6,
    D8,
    D10,
    D12,
    D20,
    Exhausted,
}

impl UsageDieLevel {
    /// The die to roll at this level, if any
    pub fn face(self) -> Option<DieFace> {
        match self {
            UsageDieLevel::D4 => Some(DieFace::D4),
            UsageDieLevel::D6 => Some(DieFace::D6),
            UsageDieLevel::D8 => Some(DieFace::D8),
            UsageDieLevel::D10 => Some(DieFace::D10),
            UsageDieLevel::D12 => Some(DieFace::D12),
            UsageDieLevel::D20 => Some(DieFace::D20),
            UsageDieLevel::None | UsageDieLevel::Exhausted => None,
        }
    }

    /// One step down the ladder; d4 steps down to exhausted
    pub fn step_down(self) -> UsageDieLevel {
        match self.face() {
            Some(face) => face
                .step_down()
                .map(UsageDieLevel::from)
                .unwrap_or(UsageDieLevel::Exhausted),
            None => self,
        }
    }

    /// Position on the ladder: exhausted is 0, d20 is 6; untracked has none
    pub fn rank(self) -> Option<u8> {
        match self {
            UsageDieLevel::None => None,
            UsageDieLevel::Exhausted => Some(0),
            UsageDieLevel::D4 => Some(1),
            UsageDieLevel::D6 => Some(2),
            UsageDieLevel::D8 => Some(3),
            UsageDieLevel::D10 => Some(4),
            UsageDieLevel::D12 => Some(5),
            UsageDieLevel::D20 => Some(6),
        }
    }
}

impl From<DieFace> for UsageDieLevel {
    fn from(face: DieFace) -> Self {
        match face {
            DieFace::D4 => UsageDieLevel::D4,
            DieFace::D6 => UsageDieLevel::D6,
            DieFace::D8 => UsageDieLevel::D8,
            DieFace::D10 => UsageDieLevel::D10,
            DieFace::D12 => UsageDieLevel::D12,
            DieFace::D20 => UsageDieLevel::D20,
        }
    }
}

impl fmt::Display for UsageDieLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.face() {
            Some(face) => write!(f, "{}", face),
            None if *self == UsageDieLevel::Exhausted => write!(f, "exhausted"),
            None => write!(f, "none"),
        }
    }
}

/// A damage die as configured on an actor: a real die or "special"
/// (resolved by hand at the table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DamageDie {
    Die(DieFace),
    Special,
}

impl TryFrom<String> for DamageDie {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.trim().eq_ignore_ascii_case("special") {
            Ok(DamageDie::Special)
        } else {
            s.parse().map(DamageDie::Die)
        }
    }
}

impl From<DamageDie> for String {
    fn from(die: DamageDie) -> Self {
        match die {
            DamageDie::Die(face) => face.to_string(),
            DamageDie::Special => "special".to_string(),
        }
    }
}
