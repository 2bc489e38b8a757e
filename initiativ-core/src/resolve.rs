//! Effect resolution.
//!
//! Turns a confirmed capability use into per-target outcomes: pays the cost,
//! rolls attacks or saves, applies damage and conditions, then walks the
//! capability's effect tree. Every step is written to the combat log.

use crate::combatant::{Combatant, CombatantId};
use crate::creature::{AbilityScore, Check, Condition, DamageRoll};
use crate::dice::DiceRoller;
use crate::effects::{EffectKind, EffectNodeId, EffectTree, Outcome};
use crate::log::CombatLog;
use crate::targeting::Capability;
use serde::{Deserialize, Serialize};

/// What happened to one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetOutcome {
    /// Roster index at the time of resolution.
    pub index: usize,
    pub target: CombatantId,
    pub name: String,
    pub outcome: Outcome,
    /// The d20 total, when a check was rolled.
    pub roll: Option<i32>,
    /// Total damage dealt, including follow-up effects.
    pub damage: i32,
    /// True when the primary damage was halved by a successful save.
    pub halved: bool,
    pub healed: i32,
    pub conditions_applied: Vec<Condition>,
}

/// The result of resolving one capability use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub actor: CombatantId,
    pub actor_name: String,
    pub capability: String,
    pub targets: Vec<TargetOutcome>,
}

impl Resolution {
    pub fn target(&self, index: usize) -> Option<&TargetOutcome> {
        self.targets.iter().find(|t| t.index == index)
    }

    pub fn total_damage(&self) -> i32 {
        self.targets
            .iter()
            .fold(0i32, |total, t| total.saturating_add(t.damage))
    }
}

/// Borrowed view of the encounter state the resolver mutates.
pub(crate) struct Resolver<'a> {
    pub roster: &'a mut [Combatant],
    pub dice: &'a mut DiceRoller,
    pub log: &'a mut CombatLog,
    pub player_armor_class: i32,
}

impl Resolver<'_> {
    /// Resolve `capability` used by the combatant at `actor` against `targets`.
    ///
    /// Eligibility has already been checked. Target indices that no longer
    /// exist are skipped.
    pub fn resolve(&mut self, actor: usize, capability: &Capability, targets: &[usize]) -> Resolution {
        self.commit_cost(actor, capability, targets);

        let mut resolution = Resolution {
            actor: self.roster[actor].id,
            actor_name: self.roster[actor].display_name.clone(),
            capability: capability.name().to_string(),
            targets: Vec::with_capacity(targets.len()),
        };

        for &target in targets {
            if target >= self.roster.len() {
                tracing::warn!(target, "skipping stale target index");
                continue;
            }
            let outcome = self.resolve_target(actor, capability, target);
            resolution.targets.push(outcome);
        }

        resolution
    }

    fn commit_cost(&mut self, actor: usize, capability: &Capability, targets: &[usize]) {
        let combatant = &mut self.roster[actor];
        let paid = match capability {
            Capability::Ability(ability) => combatant.resources.consume_ability(ability),
            Capability::Spell(spell) => combatant.resources.consume_spell(spell),
        };
        if !paid {
            tracing::warn!(
                actor = %combatant.display_name,
                capability = capability.name(),
                "resources ran out between selection and resolution"
            );
        }
        combatant.economy.spend(capability.action());

        let names: Vec<&str> = targets
            .iter()
            .filter_map(|&t| self.roster.get(t))
            .map(|c| c.display_name.as_str())
            .collect();
        let message = format!(
            "{} {} on {}.",
            self.roster[actor].display_name,
            capability.describe(),
            names.join(", ")
        );
        self.log.info(message);
    }

    fn resolve_target(&mut self, actor: usize, capability: &Capability, target: usize) -> TargetOutcome {
        let contract = capability.contract();
        let (outcome, roll) = self.roll_check(actor, target, &contract.check);

        let mut result = TargetOutcome {
            index: target,
            target: self.roster[target].id,
            name: self.roster[target].display_name.clone(),
            outcome,
            roll,
            damage: 0,
            halved: false,
            healed: 0,
            conditions_applied: Vec::new(),
        };

        let saving_throw = matches!(contract.check, Check::SavingThrow { .. });
        match &contract.damage {
            Some(damage) if outcome.lands() => {
                let amount = self.roll_damage(actor, damage);
                result.damage += self.deal_damage(target, amount, damage, capability.name(), false);
            }
            Some(damage) if outcome == Outcome::SaveSucceeded && saving_throw => {
                let amount = self.roll_damage(actor, damage) / 2;
                result.damage += self.deal_damage(target, amount, damage, capability.name(), true);
                result.halved = true;
            }
            _ => self.narrate(capability.name(), target, outcome),
        }

        if let Some(condition) = contract.condition {
            if outcome.lands() && self.inflict(target, condition) {
                result.conditions_applied.push(condition);
            }
        }

        self.walk_effects(actor, target, &contract.effects, capability.name(), outcome, &mut result);
        result
    }

    fn roll_check(&mut self, actor: usize, target: usize, check: &Check) -> (Outcome, Option<i32>) {
        match *check {
            Check::None => (Outcome::Automatic, None),
            Check::AttackRoll { ability } => {
                let total = self.dice.d20() + self.roster[actor].modifier(ability);
                let armor_class = self.roster[target]
                    .armor_class()
                    .unwrap_or(self.player_armor_class);
                let outcome = if total >= armor_class {
                    Outcome::Hit
                } else {
                    Outcome::Miss
                };
                self.log.info(format!(
                    "{} rolls {} to hit {} (AC {}): {}.",
                    self.roster[actor].display_name,
                    total,
                    self.roster[target].display_name,
                    armor_class,
                    outcome
                ));
                (outcome, Some(total))
            }
            Check::SavingThrow { ability, dc } => {
                let (outcome, total) = self.saving_throw(target, ability, dc);
                (outcome, Some(total))
            }
        }
    }

    fn saving_throw(&mut self, target: usize, ability: Option<AbilityScore>, dc: i32) -> (Outcome, i32) {
        let total = self.dice.d20() + self.roster[target].modifier(ability);
        let outcome = if total >= dc {
            Outcome::SaveSucceeded
        } else {
            Outcome::SaveFailed
        };
        let label = ability.map_or("saving throw".to_string(), |a| format!("{a} save"));
        self.log.info(format!(
            "{} rolls {} on a {} (DC {}): {}.",
            self.roster[target].display_name, total, label, dc, outcome
        ));
        (outcome, total)
    }

    fn roll_damage(&mut self, actor: usize, damage: &DamageRoll) -> i32 {
        let rolled = self.dice.evaluate_or_zero(&damage.dice);
        rolled
            .saturating_add(self.roster[actor].modifier(damage.modifier))
            .max(0)
    }

    fn deal_damage(&mut self, target: usize, amount: i32, damage: &DamageRoll, source: &str, halved: bool) -> i32 {
        let combatant = &mut self.roster[target];
        combatant.take_damage(amount);
        let suffix = if halved { " (halved)" } else { "" };
        let message = format!(
            "{} takes {} {} damage from {}{}.",
            combatant.display_name, amount, damage.damage_type, source, suffix
        );
        self.log.damage(message);
        amount
    }

    fn narrate(&mut self, source: &str, target: usize, outcome: Outcome) {
        let name = &self.roster[target].display_name;
        let message = match outcome {
            Outcome::Miss => format!("{source} misses {name}."),
            Outcome::SaveSucceeded => format!("{name} resists {source}."),
            Outcome::Hit | Outcome::SaveFailed | Outcome::Automatic => {
                format!("{source} affects {name}.")
            }
        };
        self.log.info(message);
    }

    fn inflict(&mut self, target: usize, condition: Condition) -> bool {
        let combatant = &mut self.roster[target];
        if combatant.is_immune_to(condition) {
            let message = format!("{} is immune to {}.", combatant.display_name, condition);
            self.log.info(message);
            return false;
        }
        if combatant.add_condition(condition) {
            let message = format!("{} is now {}.", combatant.display_name, condition);
            self.log.event(message);
            return true;
        }
        false
    }

    fn walk_effects(
        &mut self,
        actor: usize,
        target: usize,
        tree: &EffectTree,
        source: &str,
        outcome: Outcome,
        result: &mut TargetOutcome,
    ) {
        for &root in tree.roots() {
            self.apply_node(actor, target, tree, root, source, outcome, result);
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn apply_node(
        &mut self,
        actor: usize,
        target: usize,
        tree: &EffectTree,
        id: EffectNodeId,
        source: &str,
        parent: Outcome,
        result: &mut TargetOutcome,
    ) {
        let Some(node) = tree.node(id) else {
            return;
        };
        if !node.trigger.fires_on(parent) {
            return;
        }

        let mut outcome = parent;
        match &node.kind {
            EffectKind::Damage { roll, half_on_save } => {
                let halved = *half_on_save && parent == Outcome::SaveSucceeded;
                let mut amount = self.roll_damage(actor, roll);
                if halved {
                    amount /= 2;
                }
                result.damage += self.deal_damage(target, amount, roll, source, halved);
            }
            EffectKind::Heal { dice } => {
                let amount = self.dice.evaluate_or_zero(dice).max(0);
                let combatant = &mut self.roster[target];
                let healed = combatant.heal(amount);
                let message = format!("{} regains {} hit points from {}.", combatant.display_name, healed, source);
                self.log.healing(message);
                result.healed += healed;
            }
            EffectKind::ApplyCondition(condition) => {
                if self.inflict(target, *condition) {
                    result.conditions_applied.push(*condition);
                }
            }
            EffectKind::SavingThrow { ability, dc } => {
                outcome = self.saving_throw(target, *ability, *dc).0;
            }
        }

        for child in tree.children_of(id) {
            self.apply_node(actor, target, tree, child, source, outcome, result);
        }
    }
}
