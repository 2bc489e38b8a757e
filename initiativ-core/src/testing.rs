//! Testing utilities for encounters.
//!
//! This module provides tools for integration testing:
//! - Stat block fixtures covering attacks, saves, spells and recharge
//! - `TestHarness` for scripted encounter scenarios
//! - Assertion helpers for verifying encounter state

use crate::config::EngineConfig;
use crate::creature::{
    Ability, AbilityScore, AbilityScores, ActionType, Check, Condition, CreatureTemplate,
    DamageRoll, DamageType, Spell,
};
use crate::encounter::Encounter;
use crate::error::Result;
use crate::log::LogCategory;
use crate::resolve::Resolution;

// ============================================================================
// Fixtures
// ============================================================================

/// AC 13, 7 hit points, DEX 14. Scimitar is a DEX attack for 1d6+2.
pub fn goblin() -> CreatureTemplate {
    CreatureTemplate::new("Goblin")
        .with_armor_class(13)
        .with_hit_points(7, "2d6")
        .with_scores(AbilityScores::new(8, 14, 10, 10, 8, 8))
        .with_ability(
            Ability::new("Scimitar", ActionType::Action)
                .with_kind("Melee Weapon Attack")
                .with_check(Check::AttackRoll {
                    ability: Some(AbilityScore::Dexterity),
                })
                .with_damage(
                    DamageRoll::new("1d6", DamageType::Slashing)
                        .with_modifier(AbilityScore::Dexterity),
                ),
        )
        .with_ability(
            Ability::new("Nimble Escape", ActionType::BonusAction)
                .with_description("The goblin can take the Disengage or Hide action."),
        )
}

/// AC 13, 15 hit points. Greataxe is a STR attack for 1d12+3.
pub fn orc() -> CreatureTemplate {
    CreatureTemplate::new("Orc")
        .with_armor_class(13)
        .with_hit_points(15, "2d8+6")
        .with_scores(AbilityScores::new(16, 12, 16, 7, 11, 10))
        .with_ability(
            Ability::new("Greataxe", ActionType::Action)
                .with_kind("Melee Weapon Attack")
                .with_check(Check::AttackRoll {
                    ability: Some(AbilityScore::Strength),
                })
                .with_damage(
                    DamageRoll::new("1d12", DamageType::Slashing)
                        .with_modifier(AbilityScore::Strength),
                ),
        )
}

/// A spellcaster with an at-will attack cantrip, a multi-target automatic
/// spell and a save-or-be-paralyzed spell.
pub fn mage() -> CreatureTemplate {
    CreatureTemplate::new("Mage")
        .with_armor_class(12)
        .with_hit_points(40, "9d8")
        .with_scores(AbilityScores::new(9, 14, 11, 17, 12, 11))
        .with_spell(
            Spell::new("Fire Bolt", 0, ActionType::Action)
                .with_check(Check::AttackRoll {
                    ability: Some(AbilityScore::Intelligence),
                })
                .with_damage(DamageRoll::new("2d10", DamageType::Fire)),
        )
        .with_spell(
            Spell::new("Magic Missile", 1, ActionType::Action)
                .with_damage(DamageRoll::new("3d4+3", DamageType::Force))
                .with_max_targets(3),
        )
        .with_spell(
            Spell::new("Hold Person", 2, ActionType::Action)
                .with_check(Check::SavingThrow {
                    ability: Some(AbilityScore::Wisdom),
                    dc: 14,
                })
                .with_condition(Condition::Paralyzed),
        )
        .with_spell_slots([4, 3, 3, 0, 0, 0, 0, 0, 0])
}

/// A dragon with a recharging DEX-save breath weapon that hits up to three targets.
pub fn red_dragon_wyrmling() -> CreatureTemplate {
    CreatureTemplate::new("Red Dragon Wyrmling")
        .with_armor_class(17)
        .with_hit_points(75, "10d8+30")
        .with_scores(AbilityScores::new(19, 10, 17, 12, 11, 15))
        .with_condition_immunity("Frightened")
        .with_ability(
            Ability::new("Bite", ActionType::Action)
                .with_check(Check::AttackRoll {
                    ability: Some(AbilityScore::Strength),
                })
                .with_damage(
                    DamageRoll::new("1d10", DamageType::Piercing)
                        .with_modifier(AbilityScore::Strength),
                ),
        )
        .with_ability(
            Ability::new("Fire Breath", ActionType::Action)
                .with_check(Check::SavingThrow {
                    ability: Some(AbilityScore::Dexterity),
                    dc: 13,
                })
                .with_damage(DamageRoll::new("7d6", DamageType::Fire))
                .with_recharge(5)
                .with_max_targets(3),
        )
}

// ============================================================================
// Harness
// ============================================================================

/// Test harness for running encounter scenarios.
pub struct TestHarness {
    pub encounter: Encounter,
}

impl TestHarness {
    /// A harness with a fixed dice seed.
    pub fn new() -> Self {
        Self::with_seed(0)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_config(EngineConfig::new().with_seed(seed))
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            encounter: Encounter::new(config),
        }
    }

    /// Add a monster. Returns its roster index.
    pub fn add(&mut self, template: CreatureTemplate) -> usize {
        self.encounter.add_from_template(template)
    }

    pub fn add_player(&mut self, name: &str, initiative: i32) -> Result<usize> {
        self.encounter.add_player(name, initiative)
    }

    pub fn begin(&mut self) -> Result<usize> {
        self.encounter.begin_combat()
    }

    /// Use an ability of the current combatant against `targets` in one go.
    pub fn use_ability(&mut self, name: &str, targets: &[usize]) -> Result<Resolution> {
        self.encounter.begin_ability(name)?;
        self.select_and_confirm(targets)
    }

    /// Cast a spell of the current combatant against `targets` in one go.
    pub fn cast(&mut self, name: &str, targets: &[usize]) -> Result<Resolution> {
        self.encounter.begin_spell(name)?;
        self.select_and_confirm(targets)
    }

    fn select_and_confirm(&mut self, targets: &[usize]) -> Result<Resolution> {
        let outcome = targets
            .iter()
            .try_for_each(|&t| self.encounter.toggle_target(t).map(|_| ()))
            .and_then(|()| self.encounter.confirm_targeting());
        if outcome.is_err() {
            self.encounter.cancel_targeting();
        }
        outcome
    }

    /// Roster index of the first combatant with `name`.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.encounter
            .roster()
            .iter()
            .position(|c| c.display_name == name)
    }

    pub fn hp(&self, index: usize) -> Option<i32> {
        self.encounter.combatant(index).map(|c| c.current_hp)
    }

    pub fn current_name(&self) -> Option<&str> {
        self.encounter.current().map(|c| c.name())
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Assertion Helpers
// ============================================================================

/// Assert the combatant at `index` has `expected` hit points.
#[track_caller]
pub fn assert_hp(harness: &TestHarness, index: usize, expected: i32) {
    let actual = harness.hp(index);
    assert_eq!(
        actual,
        Some(expected),
        "Expected combatant {index} to have {expected} HP, got {actual:?}"
    );
}

/// Assert some log entry of `category` contains `needle`.
#[track_caller]
pub fn assert_log_contains(harness: &TestHarness, category: LogCategory, needle: &str) {
    assert!(
        harness.encounter.log().contains(category, needle),
        "Expected a {category} entry containing '{needle}', log was:\n{}",
        harness
            .encounter
            .log()
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Assert which roster index holds the turn.
#[track_caller]
pub fn assert_turn(harness: &TestHarness, expected: Option<usize>) {
    assert_eq!(
        harness.encounter.turn_index(),
        expected,
        "Expected turn pointer {expected:?}"
    );
}

/// Assert the combatant at `index` has `condition`.
#[track_caller]
pub fn assert_has_condition(harness: &TestHarness, index: usize, condition: Condition) {
    let has = harness
        .encounter
        .combatant(index)
        .is_some_and(|c| c.has_condition(condition));
    assert!(has, "Expected combatant {index} to be {condition}");
}
