//! Per-encounter combatant state.

use crate::creature::{Ability, AbilityScore, Condition, CreatureTemplate, Spell};
use crate::resources::Resources;
use crate::turn::ActionEconomy;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for combatants. Stable across roster reordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombatantId(pub Uuid);

impl CombatantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CombatantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A participant in an encounter.
///
/// Monsters carry the template they were created from. Players carry none:
/// their stats live at the table, so the engine tracks only their name,
/// initiative and turn flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub id: CombatantId,
    pub base: Option<CreatureTemplate>,
    pub display_name: String,
    pub initiative: i32,
    pub current_hp: i32,
    pub max_hp: i32,
    pub is_player: bool,
    pub resources: Resources,
    pub economy: ActionEconomy,
    pub conditions: Vec<Condition>,
}

impl Combatant {
    /// Instantiate a template at full hit points with fresh resources.
    pub fn from_template(template: CreatureTemplate, display_name: impl Into<String>) -> Self {
        Self {
            id: CombatantId::new(),
            display_name: display_name.into(),
            initiative: 0,
            current_hp: template.hit_points,
            max_hp: template.hit_points,
            is_player: false,
            resources: Resources::from_template(&template),
            economy: ActionEconomy::default(),
            conditions: Vec::new(),
            base: Some(template),
        }
    }

    pub fn player(name: impl Into<String>, initiative: i32) -> Self {
        Self {
            id: CombatantId::new(),
            base: None,
            display_name: name.into(),
            initiative,
            current_hp: 0,
            max_hp: 0,
            is_player: true,
            resources: Resources::default(),
            economy: ActionEconomy::default(),
            conditions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.display_name
    }

    /// Whether this combatant has dropped to 0 hit points or below.
    pub fn is_down(&self) -> bool {
        !self.is_player && self.current_hp <= 0
    }

    pub fn armor_class(&self) -> Option<i32> {
        self.base.as_ref().map(|t| t.armor_class)
    }

    /// Modifier for `ability`. Players and missing keys give 0.
    pub fn modifier(&self, ability: Option<AbilityScore>) -> i32 {
        match (&self.base, ability) {
            (Some(template), Some(ability)) => template.modifier(ability),
            _ => 0,
        }
    }

    pub fn abilities(&self) -> &[Ability] {
        self.base.as_ref().map_or(&[], |t| t.abilities.as_slice())
    }

    pub fn spells(&self) -> &[Spell] {
        self.base.as_ref().map_or(&[], |t| t.spells.as_slice())
    }

    pub fn find_ability(&self, name: &str) -> Option<&Ability> {
        self.abilities().iter().find(|a| a.name == name)
    }

    pub fn find_spell(&self, name: &str) -> Option<&Spell> {
        self.spells().iter().find(|s| s.name == name)
    }

    /// Apply a signed hit point change, clamped above at `max_hp`.
    ///
    /// Returns the change actually applied. Players are untouched.
    pub fn adjust_hp(&mut self, delta: i32) -> i32 {
        if self.is_player {
            return 0;
        }
        let old = self.current_hp;
        self.current_hp = old.saturating_add(delta).min(self.max_hp.max(old));
        self.current_hp.saturating_sub(old)
    }

    /// Subtract damage. Hit points may go negative.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        self.adjust_hp(-amount.max(0))
    }

    /// Restore hit points up to the maximum. Returns the amount healed.
    pub fn heal(&mut self, amount: i32) -> i32 {
        self.adjust_hp(amount.max(0)).max(0)
    }

    pub fn has_condition(&self, condition: Condition) -> bool {
        self.conditions.contains(&condition)
    }

    pub fn is_immune_to(&self, condition: Condition) -> bool {
        self.base.as_ref().is_some_and(|t| t.is_immune_to(condition))
    }

    /// Add `condition` unless immune or already present. Returns true if it was added.
    pub fn add_condition(&mut self, condition: Condition) -> bool {
        if self.is_immune_to(condition) || self.has_condition(condition) {
            return false;
        }
        self.conditions.push(condition);
        true
    }

    pub fn remove_condition(&mut self, condition: Condition) -> bool {
        let before = self.conditions.len();
        self.conditions.retain(|&c| c != condition);
        self.conditions.len() != before
    }
}
