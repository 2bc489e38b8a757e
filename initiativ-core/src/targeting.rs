//! Target selection for abilities and spells.
//!
//! Using a capability is a two-step affair: the operator first picks a
//! capability, putting the encounter into [`TargetingState::Selecting`], then
//! toggles roster entries on and off before confirming.

use crate::combatant::{Combatant, CombatantId};
use crate::creature::{Ability, ActionType, Contract, Spell};
use crate::error::{EncounterError, Result};
use serde::{Deserialize, Serialize};

/// Something a combatant can do on their turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Capability {
    Ability(Ability),
    Spell(Spell),
}

impl Capability {
    pub fn name(&self) -> &str {
        match self {
            Capability::Ability(a) => &a.name,
            Capability::Spell(s) => &s.name,
        }
    }

    pub fn action(&self) -> ActionType {
        match self {
            Capability::Ability(a) => a.action,
            Capability::Spell(s) => s.action,
        }
    }

    pub fn contract(&self) -> &Contract {
        match self {
            Capability::Ability(a) => &a.contract,
            Capability::Spell(s) => &s.contract,
        }
    }

    pub fn max_targets(&self) -> Option<usize> {
        match self {
            Capability::Ability(a) => a.max_targets,
            Capability::Spell(s) => s.max_targets,
        }
    }

    /// Verb phrase for the log, e.g. "uses Scimitar" or "casts Fire Bolt".
    pub fn describe(&self) -> String {
        match self {
            Capability::Ability(a) => format!("uses {}", a.name),
            Capability::Spell(s) => format!("casts {}", s.name),
        }
    }
}

/// Whether `actor` can pay for `capability` right now.
///
/// Checks the action slot, then limited uses or spell slots.
pub fn check_eligibility(actor: &Combatant, capability: &Capability) -> Result<()> {
    let action = capability.action();
    if actor.economy.is_spent(action) {
        return Err(EncounterError::ActionSpent {
            combatant: actor.display_name.clone(),
            action,
        });
    }

    match capability {
        Capability::Ability(ability) if !actor.resources.can_use(ability) => {
            Err(EncounterError::NoUsesRemaining {
                combatant: actor.display_name.clone(),
                ability: ability.name.clone(),
            })
        }
        Capability::Spell(spell) if !actor.resources.can_cast(spell) => {
            Err(EncounterError::NoSpellSlot {
                combatant: actor.display_name.clone(),
                level: spell.level,
            })
        }
        _ => Ok(()),
    }
}

/// A capability in progress and the targets picked so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub actor: CombatantId,
    pub capability: Capability,
    /// Roster indices, in the order they were picked.
    pub targets: Vec<usize>,
    pub max_targets: usize,
}

impl Selection {
    pub fn is_full(&self) -> bool {
        self.targets.len() >= self.max_targets
    }

    pub fn is_selected(&self, index: usize) -> bool {
        self.targets.contains(&index)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum TargetingState {
    #[default]
    Idle,
    Selecting(Selection),
}

impl TargetingState {
    pub fn is_selecting(&self) -> bool {
        matches!(self, TargetingState::Selecting(_))
    }

    pub fn selection(&self) -> Option<&Selection> {
        match self {
            TargetingState::Selecting(selection) => Some(selection),
            TargetingState::Idle => None,
        }
    }

    pub(crate) fn begin(&mut self, actor: CombatantId, capability: Capability, max_targets: usize) {
        *self = TargetingState::Selecting(Selection {
            actor,
            capability,
            targets: Vec::new(),
            max_targets: max_targets.max(1),
        });
    }

    /// Add `index` to the selection, or remove it if already picked.
    ///
    /// Returns whether the index is selected afterwards.
    pub(crate) fn toggle(&mut self, index: usize) -> Result<bool> {
        let TargetingState::Selecting(selection) = self else {
            return Err(EncounterError::NotTargeting);
        };
        if let Some(pos) = selection.targets.iter().position(|&t| t == index) {
            selection.targets.remove(pos);
            return Ok(false);
        }
        if selection.is_full() {
            return Err(EncounterError::TargetLimitReached(selection.max_targets));
        }
        selection.targets.push(index);
        Ok(true)
    }

    /// Drop any selection in progress. Returns true if there was one.
    pub(crate) fn cancel(&mut self) -> bool {
        std::mem::take(self).is_selecting()
    }

    pub(crate) fn take(&mut self) -> Option<Selection> {
        match std::mem::take(self) {
            TargetingState::Selecting(selection) => Some(selection),
            TargetingState::Idle => None,
        }
    }
}

/// Whether an ability or a spell, for listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapabilityKind {
    Ability,
    Spell,
}

/// One entry in the list of things the current combatant could do.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferedAction {
    pub name: String,
    pub kind: CapabilityKind,
    pub action: ActionType,
    pub eligible: bool,
    /// Why the action is unavailable, when it is.
    pub reason: Option<String>,
}

impl OfferedAction {
    pub fn for_capability(actor: &Combatant, capability: &Capability) -> Self {
        let verdict = check_eligibility(actor, capability);
        Self {
            name: capability.name().to_string(),
            kind: match capability {
                Capability::Ability(_) => CapabilityKind::Ability,
                Capability::Spell(_) => CapabilityKind::Spell,
            },
            action: capability.action(),
            eligible: verdict.is_ok(),
            reason: verdict.err().map(|e| e.to_string()),
        }
    }
}
