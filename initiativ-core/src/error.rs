//! Errors from encounter operations.
//!
//! Every refused request leaves the encounter exactly as it was.

use crate::creature::ActionType;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncounterError {
    #[error("No combatant at roster index {0}")]
    NoSuchCombatant(usize),

    #[error("Cannot begin combat with an empty roster")]
    EmptyRoster,

    #[error("Combat is already active")]
    CombatAlreadyActive,

    #[error("Combat is not active")]
    CombatNotActive,

    #[error("No combatant currently has the turn")]
    NoActiveTurn,

    #[error("Combatant name must not be empty")]
    EmptyName,

    #[error("No creature named {0:?} in the catalog")]
    UnknownCreature(String),

    #[error("{combatant} has no ability or spell named {name:?}")]
    UnknownCapability { combatant: String, name: String },

    #[error("{combatant} has already used their {action} this turn")]
    ActionSpent {
        combatant: String,
        action: ActionType,
    },

    #[error("{combatant} has no uses of {ability} remaining")]
    NoUsesRemaining { combatant: String, ability: String },

    #[error("{combatant} has no level {level} spell slots remaining")]
    NoSpellSlot { combatant: String, level: u8 },

    #[error("Spell level {0} is out of range (1-9)")]
    InvalidSpellLevel(u8),

    #[error("{0} is not a limited-use ability")]
    NotRechargeable(String),

    #[error("No targeting in progress")]
    NotTargeting,

    #[error("Already selected the maximum of {0} target(s)")]
    TargetLimitReached(usize),

    #[error("Select at least one target first")]
    NoTargets,
}

pub type Result<T, E = EncounterError> = std::result::Result<T, E>;
