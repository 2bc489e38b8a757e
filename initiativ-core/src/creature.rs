//! Creature templates and the capabilities they carry.
//!
//! Templates are supplied by a [`crate::catalog::CreatureCatalog`] and are
//! never mutated by the engine. Everything that changes during an encounter
//! lives on [`crate::combatant::Combatant`].

use crate::effects::EffectTree;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of spell levels tracked in a slot table.
pub const SPELL_LEVELS: usize = 9;

/// A per-level spell slot table. Index 0 holds level 1 slots.
pub type SlotTable = [u8; SPELL_LEVELS];

// ============================================================================
// Ability Scores
// ============================================================================

/// The six ability scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AbilityScore {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl AbilityScore {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            AbilityScore::Strength => "STR",
            AbilityScore::Dexterity => "DEX",
            AbilityScore::Constitution => "CON",
            AbilityScore::Intelligence => "INT",
            AbilityScore::Wisdom => "WIS",
            AbilityScore::Charisma => "CHA",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AbilityScore::Strength => "Strength",
            AbilityScore::Dexterity => "Dexterity",
            AbilityScore::Constitution => "Constitution",
            AbilityScore::Intelligence => "Intelligence",
            AbilityScore::Wisdom => "Wisdom",
            AbilityScore::Charisma => "Charisma",
        }
    }

    pub fn all() -> [AbilityScore; 6] {
        [
            AbilityScore::Strength,
            AbilityScore::Dexterity,
            AbilityScore::Constitution,
            AbilityScore::Intelligence,
            AbilityScore::Wisdom,
            AbilityScore::Charisma,
        ]
    }

    /// Look up a score by its full name or abbreviation, ignoring case.
    ///
    /// Catalog rows store keys such as `"dexterity"` or `"DEX"`; empty or
    /// unknown keys yield `None`, which every consumer treats as modifier 0.
    pub fn lookup(key: &str) -> Option<AbilityScore> {
        let key = key.trim();
        Self::all().into_iter().find(|ability| {
            key.eq_ignore_ascii_case(ability.name()) || key.eq_ignore_ascii_case(ability.abbreviation())
        })
    }
}

impl FromStr for AbilityScore {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AbilityScore::lookup(s).ok_or_else(|| format!("Unknown ability score: {s:?}"))
    }
}

impl fmt::Display for AbilityScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Modifier for a raw score: `(score - 10) / 2`, truncated toward zero.
pub fn ability_modifier(score: i32) -> i32 {
    (score - 10) / 2
}

/// Ability scores container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: i32,
    pub dexterity: i32,
    pub constitution: i32,
    pub intelligence: i32,
    pub wisdom: i32,
    pub charisma: i32,
}

impl AbilityScores {
    pub fn new(str: i32, dex: i32, con: i32, int: i32, wis: i32, cha: i32) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    pub fn get(&self, ability: AbilityScore) -> i32 {
        match ability {
            AbilityScore::Strength => self.strength,
            AbilityScore::Dexterity => self.dexterity,
            AbilityScore::Constitution => self.constitution,
            AbilityScore::Intelligence => self.intelligence,
            AbilityScore::Wisdom => self.wisdom,
            AbilityScore::Charisma => self.charisma,
        }
    }

    pub fn modifier(&self, ability: AbilityScore) -> i32 {
        ability_modifier(self.get(ability))
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self::new(10, 10, 10, 10, 10, 10)
    }
}

// ============================================================================
// Tags
// ============================================================================

/// The action-economy slot a capability costs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ActionType {
    #[default]
    None,
    Action,
    BonusAction,
    Reaction,
    Legendary,
    Lair,
}

impl ActionType {
    pub fn name(&self) -> &'static str {
        match self {
            ActionType::None => "free",
            ActionType::Action => "action",
            ActionType::BonusAction => "bonus action",
            ActionType::Reaction => "reaction",
            ActionType::Legendary => "legendary action",
            ActionType::Lair => "lair action",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Common damage types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    Slashing,
    Piercing,
    Bludgeoning,
    Fire,
    Cold,
    Lightning,
    Thunder,
    Acid,
    Poison,
    Necrotic,
    Radiant,
    Force,
    Psychic,
}

impl DamageType {
    pub fn name(&self) -> &'static str {
        match self {
            DamageType::Slashing => "slashing",
            DamageType::Piercing => "piercing",
            DamageType::Bludgeoning => "bludgeoning",
            DamageType::Fire => "fire",
            DamageType::Cold => "cold",
            DamageType::Lightning => "lightning",
            DamageType::Thunder => "thunder",
            DamageType::Acid => "acid",
            DamageType::Poison => "poison",
            DamageType::Necrotic => "necrotic",
            DamageType::Radiant => "radiant",
            DamageType::Force => "force",
            DamageType::Psychic => "psychic",
        }
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Conditions a capability can inflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Condition {
    Blinded,
    Charmed,
    Deafened,
    Frightened,
    Grappled,
    Incapacitated,
    Invisible,
    Paralyzed,
    Petrified,
    Poisoned,
    Prone,
    Restrained,
    Stunned,
    Unconscious,
}

impl Condition {
    pub fn name(&self) -> &'static str {
        match self {
            Condition::Blinded => "Blinded",
            Condition::Charmed => "Charmed",
            Condition::Deafened => "Deafened",
            Condition::Frightened => "Frightened",
            Condition::Grappled => "Grappled",
            Condition::Incapacitated => "Incapacitated",
            Condition::Invisible => "Invisible",
            Condition::Paralyzed => "Paralyzed",
            Condition::Petrified => "Petrified",
            Condition::Poisoned => "Poisoned",
            Condition::Prone => "Prone",
            Condition::Restrained => "Restrained",
            Condition::Stunned => "Stunned",
            Condition::Unconscious => "Unconscious",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How a limited ability comes back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum UsageType {
    #[default]
    Unlimited,
    PerDay,
    Recharge,
}

// ============================================================================
// Mechanical Contract
// ============================================================================

/// The roll that decides whether a capability lands on a target.
///
/// Attack rolls and saving throws are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Check {
    /// No roll; the capability always lands.
    #[default]
    None,
    /// The actor rolls `1d20 + modifier` against the target's armor class.
    AttackRoll { ability: Option<AbilityScore> },
    /// The target rolls `1d20 + modifier` against a fixed DC.
    SavingThrow {
        ability: Option<AbilityScore>,
        dc: i32,
    },
}

/// Damage dealt when a capability lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageRoll {
    /// Dice notation as stored in the catalog; evaluated lazily.
    pub dice: String,
    pub damage_type: DamageType,
    /// Score on the actor whose modifier is added to the roll.
    pub modifier: Option<AbilityScore>,
}

impl DamageRoll {
    pub fn new(dice: impl Into<String>, damage_type: DamageType) -> Self {
        Self {
            dice: dice.into(),
            damage_type,
            modifier: None,
        }
    }

    pub fn with_modifier(mut self, ability: AbilityScore) -> Self {
        self.modifier = Some(ability);
        self
    }
}

/// Everything the resolver needs to know about a capability.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Contract {
    pub check: Check,
    pub damage: Option<DamageRoll>,
    pub condition: Option<Condition>,
    /// Follow-up effects evaluated after the primary contract.
    #[serde(default)]
    pub effects: EffectTree,
}

// ============================================================================
// Abilities and Spells
// ============================================================================

/// A creature ability (attack, breath weapon, trait...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    pub name: String,
    pub description: String,
    /// Display label, e.g. "Melee Weapon Attack".
    #[serde(rename = "type")]
    pub kind: String,
    pub action: ActionType,
    pub contract: Contract,
    /// Maximum uses; 0 means unlimited.
    pub uses_max: u32,
    pub usage: UsageType,
    /// Lowest d6 face that recharges the ability ("Recharge 5-6" is 5).
    pub recharge: Option<u8>,
    /// How many targets one use may select; the engine default applies when absent.
    pub max_targets: Option<usize>,
}

impl Ability {
    pub fn new(name: impl Into<String>, action: ActionType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind: String::new(),
            action,
            contract: Contract::default(),
            uses_max: 0,
            usage: UsageType::Unlimited,
            recharge: None,
            max_targets: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_check(mut self, check: Check) -> Self {
        self.contract.check = check;
        self
    }

    pub fn with_damage(mut self, damage: DamageRoll) -> Self {
        self.contract.damage = Some(damage);
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.contract.condition = Some(condition);
        self
    }

    pub fn with_effects(mut self, effects: EffectTree) -> Self {
        self.contract.effects = effects;
        self
    }

    /// Limit the ability to `uses` per day.
    pub fn with_uses(mut self, uses: u32) -> Self {
        self.uses_max = uses;
        self.usage = UsageType::PerDay;
        self
    }

    /// A single-use ability that recharges on a d6 roll of `threshold` or higher.
    pub fn with_recharge(mut self, threshold: u8) -> Self {
        self.uses_max = self.uses_max.max(1);
        self.usage = UsageType::Recharge;
        self.recharge = Some(threshold);
        self
    }

    pub fn with_max_targets(mut self, max_targets: usize) -> Self {
        self.max_targets = Some(max_targets);
        self
    }

    pub fn is_limited(&self) -> bool {
        self.uses_max > 0
    }
}

/// A spell a creature can cast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spell {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// 0 for at-will spells, otherwise the slot level consumed.
    pub level: u8,
    pub action: ActionType,
    pub contract: Contract,
    pub max_targets: Option<usize>,
}

impl Spell {
    pub fn new(name: impl Into<String>, level: u8, action: ActionType) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind: String::new(),
            level,
            action,
            contract: Contract::default(),
            max_targets: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_check(mut self, check: Check) -> Self {
        self.contract.check = check;
        self
    }

    pub fn with_damage(mut self, damage: DamageRoll) -> Self {
        self.contract.damage = Some(damage);
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.contract.condition = Some(condition);
        self
    }

    pub fn with_effects(mut self, effects: EffectTree) -> Self {
        self.contract.effects = effects;
        self
    }

    pub fn with_max_targets(mut self, max_targets: usize) -> Self {
        self.max_targets = Some(max_targets);
        self
    }

    pub fn is_at_will(&self) -> bool {
        self.level == 0
    }
}

// ============================================================================
// Creature Template
// ============================================================================

/// An immutable stat block as supplied by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatureTemplate {
    pub name: String,
    pub size: String,
    #[serde(rename = "type")]
    pub creature_type: String,
    pub alignment: String,
    pub armor_class: i32,
    pub hit_points: i32,
    pub hit_dice: String,
    pub scores: AbilityScores,
    pub languages: String,
    pub challenge_rating: String,
    pub speeds: Vec<String>,
    pub skills: Vec<String>,
    pub saving_throws: Vec<String>,
    pub senses: Vec<String>,
    pub condition_immunities: Vec<String>,
    pub damage_immunities: Vec<String>,
    pub damage_resistances: Vec<String>,
    pub damage_vulnerabilities: Vec<String>,
    pub abilities: Vec<Ability>,
    pub spells: Vec<Spell>,
    pub spell_slots: SlotTable,
}

impl CreatureTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: String::new(),
            creature_type: String::new(),
            alignment: String::new(),
            armor_class: 10,
            hit_points: 1,
            hit_dice: String::new(),
            scores: AbilityScores::default(),
            languages: String::new(),
            challenge_rating: String::new(),
            speeds: Vec::new(),
            skills: Vec::new(),
            saving_throws: Vec::new(),
            senses: Vec::new(),
            condition_immunities: Vec::new(),
            damage_immunities: Vec::new(),
            damage_resistances: Vec::new(),
            damage_vulnerabilities: Vec::new(),
            abilities: Vec::new(),
            spells: Vec::new(),
            spell_slots: [0; SPELL_LEVELS],
        }
    }

    pub fn with_armor_class(mut self, armor_class: i32) -> Self {
        self.armor_class = armor_class;
        self
    }

    pub fn with_hit_points(mut self, hit_points: i32, hit_dice: impl Into<String>) -> Self {
        self.hit_points = hit_points;
        self.hit_dice = hit_dice.into();
        self
    }

    pub fn with_scores(mut self, scores: AbilityScores) -> Self {
        self.scores = scores;
        self
    }

    pub fn with_ability(mut self, ability: Ability) -> Self {
        self.abilities.push(ability);
        self
    }

    pub fn with_spell(mut self, spell: Spell) -> Self {
        self.spells.push(spell);
        self
    }

    pub fn with_spell_slots(mut self, slots: SlotTable) -> Self {
        self.spell_slots = slots;
        self
    }

    pub fn with_condition_immunity(mut self, condition: impl Into<String>) -> Self {
        self.condition_immunities.push(condition.into());
        self
    }

    pub fn modifier(&self, ability: AbilityScore) -> i32 {
        self.scores.modifier(ability)
    }

    pub fn is_immune_to(&self, condition: Condition) -> bool {
        self.condition_immunities
            .iter()
            .any(|c| c.trim().eq_ignore_ascii_case(condition.name()))
    }

    pub fn find_ability(&self, name: &str) -> Option<&Ability> {
        self.abilities.iter().find(|a| a.name == name)
    }

    pub fn find_spell(&self, name: &str) -> Option<&Spell> {
        self.spells.iter().find(|s| s.name == name)
    }
}
