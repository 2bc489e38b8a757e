//! Turn order and the per-turn action economy.

use crate::creature::ActionType;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CombatPhase {
    /// Roster is being assembled; no one has the turn.
    #[default]
    Setup,
    Active,
}

impl fmt::Display for CombatPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CombatPhase::Setup => write!(f, "setup"),
            CombatPhase::Active => write!(f, "active"),
        }
    }
}

/// Which of a combatant's per-turn slots are spent.
///
/// Only actions and bonus actions are tracked. Every other cost tag is free.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionEconomy {
    pub has_used_action: bool,
    pub has_used_bonus_action: bool,
}

impl ActionEconomy {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_spent(&self, action: ActionType) -> bool {
        match action {
            ActionType::Action => self.has_used_action,
            ActionType::BonusAction => self.has_used_bonus_action,
            _ => false,
        }
    }

    pub fn spend(&mut self, action: ActionType) {
        match action {
            ActionType::Action => self.has_used_action = true,
            ActionType::BonusAction => self.has_used_bonus_action = true,
            _ => {}
        }
    }
}

/// Where the turn pointer sits within the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TurnOrder {
    phase: CombatPhase,
    pointer: Option<usize>,
    round: u32,
}

impl TurnOrder {
    pub fn phase(&self) -> CombatPhase {
        self.phase
    }

    pub fn pointer(&self) -> Option<usize> {
        self.pointer
    }

    /// Current round, starting at 1. Zero outside of combat.
    pub fn round(&self) -> u32 {
        self.round
    }

    pub(crate) fn begin(&mut self) {
        self.phase = CombatPhase::Active;
        self.pointer = Some(0);
        self.round = 1;
    }

    pub(crate) fn end(&mut self) {
        self.phase = CombatPhase::Setup;
        self.pointer = None;
        self.round = 0;
    }

    /// Move the pointer by `step` places around a roster of `len`.
    ///
    /// Returns the new index, or `None` if there is no pointer or no roster.
    pub(crate) fn step(&mut self, len: usize, step: isize) -> Option<usize> {
        let current = self.pointer?;
        if len == 0 {
            return None;
        }
        let raw = current as isize + step;
        let next = raw.rem_euclid(len as isize) as usize;
        if raw >= len as isize {
            self.round += 1;
        } else if raw < 0 {
            self.round = self.round.saturating_sub(1).max(1);
        }
        self.pointer = Some(next);
        Some(next)
    }

    pub(crate) fn select(&mut self, index: usize) {
        self.pointer = Some(index);
        if self.round == 0 {
            self.round = 1;
        }
    }

    /// Keep the pointer on the same combatant after `removed` leaves the roster.
    ///
    /// Removing the combatant that holds the turn clears the pointer.
    pub(crate) fn rehome_after_removal(&mut self, removed: usize) {
        self.pointer = match self.pointer {
            Some(p) if p == removed => None,
            Some(p) if p > removed => Some(p - 1),
            other => other,
        };
    }
}
