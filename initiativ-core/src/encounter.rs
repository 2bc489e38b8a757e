//! The encounter context object.
//!
//! [`Encounter`] owns everything a fight needs: the roster, the turn pointer,
//! the targeting workflow, the combat log and the dice. Every operation takes
//! `&mut self`, runs to completion and either succeeds or leaves the
//! encounter untouched.

use crate::catalog::CreatureCatalog;
use crate::combatant::{Combatant, CombatantId};
use crate::config::EngineConfig;
use crate::creature::{Ability, AbilityScore, CreatureTemplate, UsageType, SPELL_LEVELS};
use crate::dice::DiceRoller;
use crate::error::{EncounterError, Result};
use crate::log::{CombatLog, LogEntry};
use crate::resolve::{Resolution, Resolver};
use crate::resources::Resources;
use crate::targeting::{check_eligibility, Capability, OfferedAction, TargetingState};
use crate::turn::{CombatPhase, TurnOrder};
use serde::Serialize;

/// A read-only, serializable view of an encounter for presentation layers.
#[derive(Debug, Clone, Serialize)]
pub struct EncounterSnapshot {
    pub phase: CombatPhase,
    pub round: u32,
    pub turn: Option<usize>,
    pub roster: Vec<Combatant>,
    pub targeting: TargetingState,
    pub log: Vec<LogEntry>,
}

#[derive(Debug, Clone)]
pub struct Encounter {
    config: EngineConfig,
    roster: Vec<Combatant>,
    order: TurnOrder,
    targeting: TargetingState,
    log: CombatLog,
    dice: DiceRoller,
}

impl Encounter {
    /// Create an empty encounter in the setup phase.
    ///
    /// The dice are seeded here, once, from `config.seed` or OS entropy.
    pub fn new(config: EngineConfig) -> Self {
        let dice = match config.seed {
            Some(seed) => DiceRoller::from_seed(seed),
            None => DiceRoller::from_entropy(),
        };
        Self {
            config,
            roster: Vec::new(),
            order: TurnOrder::default(),
            targeting: TargetingState::Idle,
            log: CombatLog::new(),
            dice,
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn roster(&self) -> &[Combatant] {
        &self.roster
    }

    pub fn combatant(&self, index: usize) -> Option<&Combatant> {
        self.roster.get(index)
    }

    /// Roster index of the combatant with `id`.
    pub fn index_of(&self, id: CombatantId) -> Option<usize> {
        self.roster.iter().position(|c| c.id == id)
    }

    pub fn phase(&self) -> CombatPhase {
        self.order.phase()
    }

    pub fn is_active(&self) -> bool {
        self.phase() == CombatPhase::Active
    }

    pub fn round(&self) -> u32 {
        self.order.round()
    }

    /// Index of the combatant whose turn it is.
    pub fn turn_index(&self) -> Option<usize> {
        self.order.pointer().filter(|&i| i < self.roster.len())
    }

    pub fn current(&self) -> Option<&Combatant> {
        self.turn_index().and_then(|i| self.roster.get(i))
    }

    pub fn targeting(&self) -> &TargetingState {
        &self.targeting
    }

    pub fn log(&self) -> &CombatLog {
        &self.log
    }

    pub fn snapshot(&self) -> EncounterSnapshot {
        EncounterSnapshot {
            phase: self.phase(),
            round: self.round(),
            turn: self.turn_index(),
            roster: self.roster.clone(),
            targeting: self.targeting.clone(),
            log: self.log.entries().to_vec(),
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index < self.roster.len() {
            Ok(())
        } else {
            Err(EncounterError::NoSuchCombatant(index))
        }
    }

    // ========================================================================
    // Roster
    // ========================================================================

    /// Add a combatant built from `template`. Returns its roster index.
    ///
    /// A name already taken on the roster gets the smallest free numeric
    /// suffix: the second goblin is "Goblin 2".
    pub fn add_from_template(&mut self, template: CreatureTemplate) -> usize {
        let display_name = self.free_display_name(&template.name);
        let combatant = Combatant::from_template(template, display_name);
        self.log
            .info(format!("{} joins the encounter.", combatant.display_name));
        self.roster.push(combatant);
        self.roster.len() - 1
    }

    fn free_display_name(&self, base: &str) -> String {
        let taken = |candidate: &str| self.roster.iter().any(|c| c.display_name == candidate);
        if !taken(base) {
            return base.to_string();
        }
        (2..)
            .map(|n: usize| format!("{base} {n}"))
            .find(|candidate| !taken(candidate.as_str()))
            .unwrap_or_else(|| base.to_string())
    }

    /// Look `name` up in `catalog` and add it.
    pub fn add_from_catalog(&mut self, catalog: &dyn CreatureCatalog, name: &str) -> Result<usize> {
        let template = catalog
            .lookup(name)
            .ok_or_else(|| EncounterError::UnknownCreature(name.to_string()))?;
        Ok(self.add_from_template(template))
    }

    pub fn add_player(&mut self, name: &str, initiative: i32) -> Result<usize> {
        let name = name.trim();
        if name.is_empty() {
            return Err(EncounterError::EmptyName);
        }
        self.log.info(format!(
            "{name} joins the encounter (initiative {initiative})."
        ));
        self.roster.push(Combatant::player(name, initiative));
        Ok(self.roster.len() - 1)
    }

    /// Remove the combatant at `index`.
    ///
    /// Cancels any targeting in progress. If the removed combatant held the
    /// turn, nobody does until the operator picks someone.
    pub fn remove(&mut self, index: usize) -> Result<Combatant> {
        self.check_index(index)?;
        self.targeting.cancel();
        let combatant = self.roster.remove(index);
        self.order.rehome_after_removal(index);
        self.log
            .info(format!("{} leaves the encounter.", combatant.display_name));
        Ok(combatant)
    }

    /// Edit initiative by hand. The roster is not re-sorted.
    pub fn set_initiative(&mut self, index: usize, initiative: i32) -> Result<()> {
        self.check_index(index)?;
        self.roster[index].initiative = initiative;
        Ok(())
    }

    /// Apply a manual hit point change. Returns the new hit point total.
    pub fn adjust_hp(&mut self, index: usize, delta: i32) -> Result<i32> {
        self.check_index(index)?;
        let combatant = &mut self.roster[index];
        let applied = combatant.adjust_hp(delta);
        let name = combatant.display_name.clone();
        let current = combatant.current_hp;

        if applied < 0 {
            self.log
                .damage(format!("{name} takes {} damage.", applied.unsigned_abs()));
        } else if applied > 0 {
            self.log
                .healing(format!("{name} regains {applied} hit points."));
        }
        Ok(current)
    }

    // ========================================================================
    // Turn Order
    // ========================================================================

    /// Roll initiative, sort the roster and give the first combatant the turn.
    pub fn begin_combat(&mut self) -> Result<usize> {
        if self.is_active() {
            return Err(EncounterError::CombatAlreadyActive);
        }
        if self.roster.is_empty() {
            return Err(EncounterError::EmptyRoster);
        }

        for combatant in self.roster.iter_mut().filter(|c| !c.is_player) {
            let roll = self.dice.d20();
            combatant.initiative = roll + combatant.modifier(Some(AbilityScore::Dexterity));
            self.log.info(format!(
                "{} rolls {} for initiative.",
                combatant.display_name, combatant.initiative
            ));
        }
        self.roster
            .sort_by(|a, b| b.initiative.cmp(&a.initiative));

        self.targeting.cancel();
        self.order.begin();
        self.start_turn(0);

        let first = &self.roster[0];
        tracing::info!(combatants = self.roster.len(), "combat started");
        self.log.event(format!(
            "Combat begins! It is {}'s turn (initiative {}).",
            first.display_name, first.initiative
        ));
        Ok(0)
    }

    pub fn end_combat(&mut self) -> Result<()> {
        if !self.is_active() {
            return Err(EncounterError::CombatNotActive);
        }
        tracing::info!(round = self.round(), "combat ended");
        self.order.end();
        self.targeting.cancel();
        self.log.event("Combat ends.");
        Ok(())
    }

    /// Hand the turn to the next combatant, wrapping around.
    pub fn next_turn(&mut self) -> Result<usize> {
        self.advance(1)
    }

    pub fn previous_turn(&mut self) -> Result<usize> {
        self.advance(-1)
    }

    fn advance(&mut self, step: isize) -> Result<usize> {
        if self.turn_index().is_none() {
            return Err(EncounterError::NoActiveTurn);
        }
        let index = self
            .order
            .step(self.roster.len(), step)
            .ok_or(EncounterError::NoActiveTurn)?;
        self.targeting.cancel();
        self.start_turn(index);
        self.announce_turn(index);
        Ok(index)
    }

    /// Give the turn to `index` directly. Per-turn flags are left alone.
    pub fn select_turn(&mut self, index: usize) -> Result<()> {
        if !self.is_active() {
            return Err(EncounterError::CombatNotActive);
        }
        self.check_index(index)?;
        self.targeting.cancel();
        self.order.select(index);
        self.announce_turn(index);
        Ok(())
    }

    fn start_turn(&mut self, index: usize) {
        self.roster[index].economy.reset();
        if self.config.auto_recharge {
            self.recharge_exhausted(index);
        }
    }

    fn announce_turn(&mut self, index: usize) {
        let message = format!(
            "It is {}'s turn (round {}).",
            self.roster[index].display_name,
            self.order.round()
        );
        self.log.event(message);
    }

    fn recharge_exhausted(&mut self, index: usize) {
        let exhausted: Vec<Ability> = self.roster[index]
            .abilities()
            .iter()
            .filter(|a| a.usage == UsageType::Recharge && a.recharge.is_some())
            .filter(|a| self.roster[index].resources.remaining_uses(&a.name) == Some(0))
            .cloned()
            .collect();
        for ability in &exhausted {
            self.recharge(index, ability);
        }
    }

    // ========================================================================
    // Resources
    // ========================================================================

    /// Set the current slots at `level`, clamped to the combatant's maximum.
    pub fn set_spell_slot(&mut self, index: usize, level: u8, value: i32) -> Result<u8> {
        self.check_index(index)?;
        if level == 0 || level as usize > SPELL_LEVELS {
            return Err(EncounterError::InvalidSpellLevel(level));
        }
        self.roster[index]
            .resources
            .spell_slots_mut()
            .set(level, value)
            .ok_or(EncounterError::InvalidSpellLevel(level))
    }

    /// Refill a limited ability, e.g. after a rest.
    pub fn restore_ability(&mut self, index: usize, ability: &str) -> Result<()> {
        self.check_index(index)?;
        let combatant = &mut self.roster[index];
        let found = combatant
            .find_ability(ability)
            .cloned()
            .ok_or_else(|| EncounterError::UnknownCapability {
                combatant: combatant.display_name.clone(),
                name: ability.to_string(),
            })?;
        if !combatant.resources.restore_ability(&found) {
            return Err(EncounterError::NotRechargeable(found.name));
        }
        let message = format!("{} regains the use of {}.", combatant.display_name, found.name);
        self.log.event(message);
        Ok(())
    }

    /// Roll a d6 for a recharge ability. Returns whether it came back.
    pub fn roll_recharge(&mut self, index: usize, ability: &str) -> Result<bool> {
        self.check_index(index)?;
        let found = self.roster[index]
            .find_ability(ability)
            .cloned()
            .ok_or_else(|| EncounterError::UnknownCapability {
                combatant: self.roster[index].display_name.clone(),
                name: ability.to_string(),
            })?;
        if found.usage != UsageType::Recharge || found.recharge.is_none() {
            return Err(EncounterError::NotRechargeable(found.name));
        }
        Ok(self.recharge(index, &found))
    }

    /// Roll 1d6 for a recharge ability and restore it on a success.
    fn recharge(&mut self, index: usize, ability: &Ability) -> bool {
        let face = self.dice.die(6);
        let combatant = &mut self.roster[index];
        let recharged = Resources::recharges_on(ability, face);
        if recharged {
            combatant.resources.restore_ability(ability);
            let message = format!(
                "{} recharges {} (rolled {}).",
                combatant.display_name, ability.name, face
            );
            self.log.event(message);
        } else {
            let message = format!(
                "{}'s {} does not recharge (rolled {}).",
                combatant.display_name, ability.name, face
            );
            self.log.info(message);
        }
        recharged
    }

    // ========================================================================
    // Targeting
    // ========================================================================

    /// Everything the current combatant could use, with eligibility.
    pub fn offered_actions(&self) -> Vec<OfferedAction> {
        let Some(actor) = self.current() else {
            return Vec::new();
        };
        let abilities = actor.abilities().iter().cloned().map(Capability::Ability);
        let spells = actor.spells().iter().cloned().map(Capability::Spell);
        abilities
            .chain(spells)
            .map(|capability| OfferedAction::for_capability(actor, &capability))
            .collect()
    }

    /// Start targeting for one of the current combatant's abilities.
    pub fn begin_ability(&mut self, name: &str) -> Result<()> {
        let actor = self.current().ok_or(EncounterError::NoActiveTurn)?;
        let capability = actor
            .find_ability(name)
            .cloned()
            .map(Capability::Ability);
        self.begin_targeting(capability, name)
    }

    /// Start targeting for one of the current combatant's spells.
    pub fn begin_spell(&mut self, name: &str) -> Result<()> {
        let actor = self.current().ok_or(EncounterError::NoActiveTurn)?;
        let capability = actor.find_spell(name).cloned().map(Capability::Spell);
        self.begin_targeting(capability, name)
    }

    fn begin_targeting(&mut self, capability: Option<Capability>, name: &str) -> Result<()> {
        let actor = self.current().ok_or(EncounterError::NoActiveTurn)?;
        let capability = capability.ok_or_else(|| EncounterError::UnknownCapability {
            combatant: actor.display_name.clone(),
            name: name.to_string(),
        })?;
        check_eligibility(actor, &capability)?;

        let max_targets = capability
            .max_targets()
            .unwrap_or(self.config.default_max_targets);
        let actor = actor.id;
        self.targeting.begin(actor, capability, max_targets);
        Ok(())
    }

    /// Select or deselect the combatant at `index`. Returns whether it is now selected.
    pub fn toggle_target(&mut self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        self.targeting.toggle(index)
    }

    /// Resolve the selected capability against the selected targets.
    ///
    /// Eligibility is checked again; on refusal the selection is kept.
    pub fn confirm_targeting(&mut self) -> Result<Resolution> {
        let selection = self
            .targeting
            .selection()
            .ok_or(EncounterError::NotTargeting)?;
        if selection.targets.is_empty() {
            return Err(EncounterError::NoTargets);
        }
        let actor = self
            .index_of(selection.actor)
            .filter(|&i| Some(i) == self.turn_index())
            .ok_or(EncounterError::NoActiveTurn)?;
        check_eligibility(&self.roster[actor], &selection.capability)?;

        let selection = self.targeting.take().ok_or(EncounterError::NotTargeting)?;
        let resolution = Resolver {
            roster: self.roster.as_mut_slice(),
            dice: &mut self.dice,
            log: &mut self.log,
            player_armor_class: self.config.player_armor_class,
        }
        .resolve(actor, &selection.capability, &selection.targets);
        Ok(resolution)
    }

    /// Abandon the selection in progress. Returns false if there was none.
    pub fn cancel_targeting(&mut self) -> bool {
        self.targeting.cancel()
    }
}

impl Default for Encounter {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
