//! Limited-use abilities and spell slots.

use crate::creature::{Ability, CreatureTemplate, SlotTable, Spell, UsageType, SPELL_LEVELS};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Spell slot tracking: current counts and the ceiling they are clamped to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpellSlots {
    current: SlotTable,
    maximum: SlotTable,
}

impl SpellSlots {
    pub fn from_table(table: SlotTable) -> Self {
        Self {
            current: table,
            maximum: table,
        }
    }

    fn index(level: u8) -> Option<usize> {
        (1..=SPELL_LEVELS as u8)
            .contains(&level)
            .then(|| level as usize - 1)
    }

    /// Slots left at `level` (1-9). Out-of-range levels have none.
    pub fn available(&self, level: u8) -> u8 {
        Self::index(level).map_or(0, |i| self.current[i])
    }

    pub fn maximum(&self, level: u8) -> u8 {
        Self::index(level).map_or(0, |i| self.maximum[i])
    }

    pub fn current_table(&self) -> &SlotTable {
        &self.current
    }

    pub fn maximum_table(&self) -> &SlotTable {
        &self.maximum
    }

    /// Spend one slot of `level`. Returns false if none is left.
    pub fn consume(&mut self, level: u8) -> bool {
        match Self::index(level) {
            Some(i) if self.current[i] > 0 => {
                self.current[i] -= 1;
                true
            }
            _ => false,
        }
    }

    /// Set the slots at `level` to `value`, clamped into `[0, maximum]`.
    ///
    /// Returns the stored value, or `None` for an out-of-range level.
    pub fn set(&mut self, level: u8, value: i32) -> Option<u8> {
        let i = Self::index(level)?;
        let clamped = value.clamp(0, self.maximum[i] as i32) as u8;
        self.current[i] = clamped;
        Some(clamped)
    }

    pub fn recover_all(&mut self) {
        self.current = self.maximum;
    }

    pub fn is_spellcaster(&self) -> bool {
        self.maximum.iter().any(|&slots| slots > 0)
    }
}

/// Per-combatant resource state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    /// Remaining uses, keyed by ability name. Only limited abilities appear.
    ability_uses: HashMap<String, u32>,
    spell_slots: SpellSlots,
}

impl Resources {
    /// Seed uses and slots from a template.
    pub fn from_template(template: &CreatureTemplate) -> Self {
        let ability_uses = template
            .abilities
            .iter()
            .filter(|a| a.is_limited())
            .map(|a| (a.name.clone(), a.uses_max))
            .collect();

        Self {
            ability_uses,
            spell_slots: SpellSlots::from_table(template.spell_slots),
        }
    }

    /// Remaining uses of a limited ability; `None` for unlimited or unknown ones.
    pub fn remaining_uses(&self, ability: &str) -> Option<u32> {
        self.ability_uses.get(ability).copied()
    }

    pub fn ability_uses(&self) -> &HashMap<String, u32> {
        &self.ability_uses
    }

    pub fn can_use(&self, ability: &Ability) -> bool {
        !ability.is_limited() || self.remaining_uses(&ability.name).unwrap_or(0) > 0
    }

    /// Spend one use. Unlimited abilities always succeed.
    pub fn consume_ability(&mut self, ability: &Ability) -> bool {
        if !ability.is_limited() {
            return true;
        }
        match self.ability_uses.get_mut(&ability.name) {
            Some(uses) if *uses > 0 => {
                *uses -= 1;
                true
            }
            _ => false,
        }
    }

    /// Refill a limited ability to its maximum. Returns false for unlimited ones.
    pub fn restore_ability(&mut self, ability: &Ability) -> bool {
        if !ability.is_limited() {
            return false;
        }
        self.ability_uses.insert(ability.name.clone(), ability.uses_max);
        true
    }

    /// Whether a recharge roll of `face` would restore `ability`.
    pub fn recharges_on(ability: &Ability, face: u32) -> bool {
        ability.usage == UsageType::Recharge
            && ability
                .recharge
                .is_some_and(|threshold| face >= threshold as u32)
    }

    pub fn can_cast(&self, spell: &Spell) -> bool {
        spell.is_at_will() || self.spell_slots.available(spell.level) > 0
    }

    /// Spend the slot a spell needs. At-will spells never touch the table.
    pub fn consume_spell(&mut self, spell: &Spell) -> bool {
        spell.is_at_will() || self.spell_slots.consume(spell.level)
    }

    pub fn spell_slots(&self) -> &SpellSlots {
        &self.spell_slots
    }

    pub fn spell_slots_mut(&mut self) -> &mut SpellSlots {
        &mut self.spell_slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creature::ActionType;

    fn template() -> CreatureTemplate {
        CreatureTemplate::new("Cult Fanatic")
            .with_ability(Ability::new("Multiattack", ActionType::Action))
            .with_ability(Ability::new("Dark Devotion", ActionType::None).with_uses(2))
            .with_spell(Spell::new("Sacred Flame", 0, ActionType::Action))
            .with_spell(Spell::new("Hold Person", 2, ActionType::Action))
            .with_spell_slots([4, 3, 0, 0, 0, 0, 0, 0, 0])
    }

    #[test]
    fn test_seeded_from_template() {
        let resources = Resources::from_template(&template());
        assert_eq!(resources.remaining_uses("Dark Devotion"), Some(2));
        assert_eq!(resources.remaining_uses("Multiattack"), None);
        assert_eq!(resources.spell_slots().available(1), 4);
        assert_eq!(resources.spell_slots().maximum(2), 3);
        assert!(resources.spell_slots().is_spellcaster());
    }

    #[test]
    fn test_limited_ability_runs_out() {
        let t = template();
        let devotion = t.find_ability("Dark Devotion").unwrap();
        let mut resources = Resources::from_template(&t);

        assert!(resources.consume_ability(devotion));
        assert!(resources.consume_ability(devotion));
        assert!(!resources.can_use(devotion));
        assert!(!resources.consume_ability(devotion));
        assert_eq!(resources.remaining_uses("Dark Devotion"), Some(0));

        assert!(resources.restore_ability(devotion));
        assert_eq!(resources.remaining_uses("Dark Devotion"), Some(2));
    }

    #[test]
    fn test_unlimited_ability_never_runs_out() {
        let t = template();
        let multiattack = t.find_ability("Multiattack").unwrap();
        let mut resources = Resources::from_template(&t);
        for _ in 0..5 {
            assert!(resources.consume_ability(multiattack));
        }
        assert!(!resources.restore_ability(multiattack));
    }

    #[test]
    fn test_spell_slots() {
        let t = template();
        let mut resources = Resources::from_template(&t);
        let flame = t.find_spell("Sacred Flame").unwrap();
        let hold = t.find_spell("Hold Person").unwrap();

        assert!(resources.consume_spell(flame));
        assert_eq!(resources.spell_slots().current_table(), &[4, 3, 0, 0, 0, 0, 0, 0, 0]);

        for _ in 0..3 {
            assert!(resources.consume_spell(hold));
        }
        assert!(!resources.can_cast(hold));
        assert!(!resources.consume_spell(hold));
        assert!(resources.can_cast(flame));
    }

    #[test]
    fn test_slot_edits_are_clamped() {
        let mut slots = SpellSlots::from_table([4, 3, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(slots.set(1, 9), Some(4));
        assert_eq!(slots.set(2, -5), Some(0));
        assert_eq!(slots.set(3, 2), Some(0));
        assert_eq!(slots.set(10, 1), None);
        assert_eq!(slots.set(0, 1), None);

        slots.recover_all();
        assert_eq!(slots.available(2), 3);
    }

    #[test]
    fn test_recharge_threshold() {
        let breath = Ability::new("Fire Breath", ActionType::Action).with_recharge(5);
        assert!(!Resources::recharges_on(&breath, 4));
        assert!(Resources::recharges_on(&breath, 5));
        assert!(Resources::recharges_on(&breath, 6));

        let claws = Ability::new("Claws", ActionType::Action).with_uses(3);
        assert!(!Resources::recharges_on(&claws, 6));
    }
}
