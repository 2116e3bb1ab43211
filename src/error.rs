//! Rules error taxonomy

use thiserror::Error;

use crate::dice::DiceError;
use crate::host::HostError;

/// Why a scheduler or resolution operation did nothing
///
/// None of these are fatal. `NotFound` and `NoActiveSession` are only logged;
/// `PreconditionFailed` and `EmptyResource` have already been shown to the
/// user as a notice by the time they are returned.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{0}")]
    PreconditionFailed(String),

    #[error("{0}")]
    EmptyResource(String),

    #[error("no active combat")]
    NoActiveSession,

    #[error("dice error: {0}")]
    Dice(#[from] DiceError),

    #[error("host error: {0}")]
    Host(#[from] HostError),
}

impl RulesError {
    pub fn not_found(kind: &'static str, id: &str) -> Self {
        RulesError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RulesError>;
