//! Tests for capability resolution: attacks, saves, damage, conditions,
//! effect trees and resource costs.
//!
//! Deterministic scenarios use bare-integer damage and checks that cannot
//! fail (AC 0, DC 1) or cannot succeed (AC 100, DC 100).

use initiativ_core::testing::{
    assert_has_condition, assert_hp, assert_log_contains, goblin, mage, red_dragon_wyrmling,
    TestHarness,
};
use initiativ_core::{
    Ability, AbilityScore, AbilityScores, ActionType, Check, Condition, CreatureTemplate, DamageRoll,
    DamageType, EffectKind, EffectTree, EncounterError, EngineConfig, LogCategory, Outcome,
    Trigger,
};

/// Install a test subscriber so engine tracing shows up with `--nocapture`.
fn setup() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn free_ability(name: &str) -> Ability {
    Ability::new(name, ActionType::None)
}

fn trainer() -> CreatureTemplate {
    let mut venom = EffectTree::new();
    venom.add_root(
        Trigger::OnSuccess,
        EffectKind::Damage {
            roll: DamageRoll::new("2", DamageType::Poison),
            half_on_save: false,
        },
    );
    venom.add_root(Trigger::OnFailure, EffectKind::ApplyCondition(Condition::Prone));

    let mut drain = EffectTree::new();
    drain.add_root(Trigger::Always, EffectKind::Heal { dice: "10".into() });

    CreatureTemplate::new("Trainer")
        .with_hit_points(50, "")
        .with_ability(
            free_ability("Punch")
                .with_check(Check::AttackRoll { ability: None })
                .with_damage(DamageRoll::new("3", DamageType::Bludgeoning)),
        )
        .with_ability(
            free_ability("Venom Strike")
                .with_check(Check::AttackRoll { ability: None })
                .with_damage(DamageRoll::new("1", DamageType::Piercing))
                .with_effects(venom),
        )
        .with_ability(
            free_ability("Drain")
                .with_damage(DamageRoll::new("5", DamageType::Necrotic))
                .with_effects(drain),
        )
        .with_ability(
            free_ability("Blast")
                .with_check(Check::SavingThrow {
                    ability: Some(AbilityScore::Dexterity),
                    dc: 100,
                })
                .with_damage(DamageRoll::new("10", DamageType::Fire)),
        )
        .with_ability(
            free_ability("Fizzle Blast")
                .with_check(Check::SavingThrow {
                    ability: Some(AbilityScore::Dexterity),
                    dc: 1,
                })
                .with_damage(DamageRoll::new("11", DamageType::Fire)),
        )
        .with_ability(
            free_ability("Glare")
                .with_check(Check::SavingThrow {
                    ability: Some(AbilityScore::Wisdom),
                    dc: 1,
                })
                .with_condition(Condition::Frightened),
        )
        .with_ability(
            free_ability("Terrify")
                .with_check(Check::SavingThrow {
                    ability: Some(AbilityScore::Wisdom),
                    dc: 100,
                })
                .with_condition(Condition::Frightened),
        )
        .with_ability(free_ability("Shout").with_uses(2))
        .with_ability(Ability::new("Haymaker", ActionType::Action).with_damage(DamageRoll::new(
            "1",
            DamageType::Bludgeoning,
        )))
}

fn dummy() -> CreatureTemplate {
    CreatureTemplate::new("Dummy")
        .with_armor_class(0)
        .with_hit_points(100, "")
}

fn wall() -> CreatureTemplate {
    CreatureTemplate::new("Wall")
        .with_armor_class(100)
        .with_hit_points(100, "")
}

/// Trainer, dummy and wall, with the trainer holding the turn.
/// Returns (harness, trainer, dummy, wall) roster indices.
fn sparring(config: EngineConfig) -> (TestHarness, usize, usize, usize) {
    setup();
    let mut harness = TestHarness::with_config(config);
    harness.add(trainer());
    harness.add(dummy());
    harness.add(wall());
    harness.begin().unwrap();

    let trainer = harness.index_of("Trainer").unwrap();
    harness.encounter.select_turn(trainer).unwrap();
    let dummy = harness.index_of("Dummy").unwrap();
    let wall = harness.index_of("Wall").unwrap();
    (harness, trainer, dummy, wall)
}

/// Pass the turn along until `index` has it again, resetting their flags.
fn hand_turn_to(harness: &mut TestHarness, index: usize) {
    while harness.encounter.next_turn().unwrap() != index {}
}

// =============================================================================
// Attack rolls
// =============================================================================

#[test]
fn test_attack_against_ac_zero_always_hits() {
    let (mut harness, _, dummy, _) = sparring(EngineConfig::new().with_seed(11));

    for _ in 0..20 {
        let resolution = harness.use_ability("Punch", &[dummy]).unwrap();
        let target = &resolution.targets[0];
        assert_eq!(target.outcome, Outcome::Hit);
        assert!((1..=20).contains(&target.roll.unwrap()));
        assert_eq!(target.damage, 3);
    }
    assert_hp(&harness, dummy, 40);
    assert_log_contains(&harness, LogCategory::Damage, "Dummy takes 3 bludgeoning damage from Punch");
}

#[test]
fn test_attack_against_ac_hundred_always_misses() {
    let (mut harness, _, _, wall) = sparring(EngineConfig::new().with_seed(12));

    for _ in 0..20 {
        let resolution = harness.use_ability("Punch", &[wall]).unwrap();
        assert_eq!(resolution.targets[0].outcome, Outcome::Miss);
        assert_eq!(resolution.targets[0].damage, 0);
    }
    assert_hp(&harness, wall, 100);
    assert_log_contains(&harness, LogCategory::Info, "Punch misses Wall");
    assert_eq!(harness.encounter.log().of_category(LogCategory::Damage).count(), 0);
}

#[test]
fn test_players_use_configured_armor_class() {
    setup();
    for (armor_class, expected) in [(0, Outcome::Hit), (100, Outcome::Miss)] {
        let mut harness =
            TestHarness::with_config(EngineConfig::new().with_seed(3).with_player_armor_class(armor_class));
        harness.add(trainer());
        let aria = harness.add_player("Aria", -100).unwrap();
        harness.begin().unwrap();
        assert_eq!(harness.current_name(), Some("Trainer"));

        let resolution = harness.use_ability("Punch", &[aria]).unwrap();
        assert_eq!(resolution.targets[0].outcome, expected);
        // Player hit points live at the table, not in the engine.
        assert_hp(&harness, aria, 0);
    }
}

#[test]
fn test_oversized_damage_roll_saturates() {
    setup();
    let smasher = CreatureTemplate::new("Smasher")
        .with_hit_points(30, "")
        .with_scores(AbilityScores::new(18, 10, 10, 10, 10, 10))
        .with_ability(free_ability("Smash").with_damage(
            DamageRoll::new("2147483647", DamageType::Bludgeoning)
                .with_modifier(AbilityScore::Strength),
        ));
    let mut harness = TestHarness::with_seed(5);
    harness.add(smasher);
    harness.add(dummy());
    harness.begin().unwrap();
    let attacker = harness.index_of("Smasher").unwrap();
    let victim = harness.index_of("Dummy").unwrap();
    hand_turn_to(&mut harness, attacker);

    let resolution = harness.use_ability("Smash", &[victim]).unwrap();
    assert_eq!(resolution.total_damage(), i32::MAX);
    assert_hp(&harness, victim, 100 - i32::MAX);
}

#[test]
fn test_damage_to_players_is_logged() {
    setup();
    let mut harness = TestHarness::with_config(EngineConfig::new().with_seed(3).with_player_armor_class(0));
    harness.add(trainer());
    let aria = harness.add_player("Aria", -100).unwrap();
    harness.begin().unwrap();

    harness.use_ability("Punch", &[aria]).unwrap();
    assert_log_contains(&harness, LogCategory::Damage, "Aria takes 3 bludgeoning damage");
}

// =============================================================================
// Saving throws
// =============================================================================

#[test]
fn test_failed_save_takes_full_damage() {
    let (mut harness, _, dummy, _) = sparring(EngineConfig::new().with_seed(21));

    let resolution = harness.use_ability("Blast", &[dummy]).unwrap();
    let target = &resolution.targets[0];
    assert_eq!(target.outcome, Outcome::SaveFailed);
    assert!(!target.halved);
    assert_eq!(target.damage, 10);
    assert_hp(&harness, dummy, 90);
}

#[test]
fn test_successful_save_halves_damage() {
    let (mut harness, _, dummy, _) = sparring(EngineConfig::new().with_seed(22));

    let resolution = harness.use_ability("Fizzle Blast", &[dummy]).unwrap();
    let target = &resolution.targets[0];
    assert_eq!(target.outcome, Outcome::SaveSucceeded);
    assert!(target.halved);
    assert_eq!(target.damage, 5);
    assert_hp(&harness, dummy, 95);
    assert_log_contains(&harness, LogCategory::Damage, "(halved)");
}

#[test]
fn test_save_without_damage_is_narrated() {
    let (mut harness, _, dummy, _) = sparring(EngineConfig::new().with_seed(23));

    let resolution = harness.use_ability("Glare", &[dummy]).unwrap();
    assert_eq!(resolution.targets[0].outcome, Outcome::SaveSucceeded);
    assert!(resolution.targets[0].conditions_applied.is_empty());
    assert_log_contains(&harness, LogCategory::Info, "Dummy resists Glare");
}

// =============================================================================
// Conditions and effect trees
// =============================================================================

#[test]
fn test_condition_applied_on_failed_save() {
    let (mut harness, _, dummy, _) = sparring(EngineConfig::new().with_seed(31));

    let resolution = harness.use_ability("Terrify", &[dummy]).unwrap();
    assert_eq!(resolution.targets[0].conditions_applied, vec![Condition::Frightened]);
    assert_has_condition(&harness, dummy, Condition::Frightened);
    assert_log_contains(&harness, LogCategory::Event, "Dummy is now Frightened");
}

#[test]
fn test_condition_immunity_is_respected() {
    setup();
    let mut harness = TestHarness::with_seed(32);
    harness.add(trainer());
    harness.add(red_dragon_wyrmling());
    harness.begin().unwrap();
    let trainer = harness.index_of("Trainer").unwrap();
    let dragon = harness.index_of("Red Dragon Wyrmling").unwrap();
    harness.encounter.select_turn(trainer).unwrap();

    let resolution = harness.use_ability("Terrify", &[dragon]).unwrap();
    assert_eq!(resolution.targets[0].outcome, Outcome::SaveFailed);
    assert!(resolution.targets[0].conditions_applied.is_empty());
    assert!(harness.encounter.roster()[dragon].conditions.is_empty());
    assert_log_contains(&harness, LogCategory::Info, "immune to Frightened");
}

#[test]
fn test_effect_tree_follows_outcome() {
    let (mut harness, _, dummy, wall) = sparring(EngineConfig::new().with_seed(33));

    let hit = harness.use_ability("Venom Strike", &[dummy]).unwrap();
    assert_eq!(hit.targets[0].damage, 3);
    assert!(hit.targets[0].conditions_applied.is_empty());
    assert_hp(&harness, dummy, 97);
    assert_log_contains(&harness, LogCategory::Damage, "2 poison damage");

    let miss = harness.use_ability("Venom Strike", &[wall]).unwrap();
    assert_eq!(miss.targets[0].damage, 0);
    assert_eq!(miss.targets[0].conditions_applied, vec![Condition::Prone]);
    assert_hp(&harness, wall, 100);
}

#[test]
fn test_heal_effect_is_clamped_and_logged() {
    let (mut harness, _, dummy, _) = sparring(EngineConfig::new().with_seed(34));

    // 5 damage then up to 10 healing, capped at the maximum.
    let resolution = harness.use_ability("Drain", &[dummy]).unwrap();
    assert_eq!(resolution.targets[0].damage, 5);
    assert_eq!(resolution.targets[0].healed, 5);
    assert_hp(&harness, dummy, 100);
    assert_log_contains(&harness, LogCategory::Healing, "Dummy regains 5 hit points");

    harness.encounter.adjust_hp(dummy, -20).unwrap();
    let resolution = harness.use_ability("Drain", &[dummy]).unwrap();
    assert_eq!(resolution.targets[0].healed, 10);
    assert_hp(&harness, dummy, 85);
}

// =============================================================================
// Costs: action economy, limited uses, spell slots
// =============================================================================

#[test]
fn test_action_is_spent_once_per_turn() {
    let (mut harness, trainer, dummy, _) = sparring(EngineConfig::new().with_seed(41));

    harness.use_ability("Haymaker", &[dummy]).unwrap();
    assert!(harness.encounter.roster()[trainer].economy.has_used_action);

    let refused = harness.encounter.begin_ability("Haymaker");
    assert_eq!(
        refused,
        Err(EncounterError::ActionSpent {
            combatant: "Trainer".into(),
            action: ActionType::Action
        })
    );
    assert!(!harness.encounter.targeting().is_selecting());

    // Free abilities are still available.
    harness.use_ability("Punch", &[dummy]).unwrap();

    hand_turn_to(&mut harness, trainer);
    assert!(!harness.encounter.roster()[trainer].economy.has_used_action);
    harness.use_ability("Haymaker", &[dummy]).unwrap();
}

#[test]
fn test_limited_ability_refused_when_exhausted() {
    let (mut harness, trainer, dummy, _) = sparring(EngineConfig::new().with_seed(42));

    harness.use_ability("Shout", &[dummy]).unwrap();
    harness.use_ability("Shout", &[dummy]).unwrap();

    let log_len = harness.encounter.log().len();
    let refused = harness.use_ability("Shout", &[dummy]);
    assert_eq!(
        refused,
        Err(EncounterError::NoUsesRemaining {
            combatant: "Trainer".into(),
            ability: "Shout".into()
        })
    );
    assert_eq!(harness.encounter.log().len(), log_len);
    let resources = &harness.encounter.roster()[trainer].resources;
    assert_eq!(resources.remaining_uses("Shout"), Some(0));

    harness.encounter.restore_ability(trainer, "Shout").unwrap();
    assert_eq!(
        harness.encounter.roster()[trainer].resources.remaining_uses("Shout"),
        Some(2)
    );
    assert_eq!(
        harness.encounter.restore_ability(trainer, "Punch"),
        Err(EncounterError::NotRechargeable("Punch".into()))
    );
    assert_eq!(
        harness.encounter.roll_recharge(trainer, "Shout"),
        Err(EncounterError::NotRechargeable("Shout".into()))
    );
}

#[test]
fn test_spell_slots_are_consumed_by_level() {
    setup();
    let mut harness = TestHarness::with_seed(43);
    harness.add(mage());
    harness.add(goblin());
    harness.add(goblin());
    harness.add(goblin());
    harness.begin().unwrap();
    let mage = harness.index_of("Mage").unwrap();
    let goblins: Vec<usize> = ["Goblin", "Goblin 2", "Goblin 3"]
        .iter()
        .map(|name| harness.index_of(name).unwrap())
        .collect();
    harness.encounter.select_turn(mage).unwrap();

    let resolution = harness.cast("Magic Missile", &goblins).unwrap();
    assert_eq!(resolution.targets.len(), 3);
    for target in &resolution.targets {
        assert_eq!(target.outcome, Outcome::Automatic);
        assert!((6..=15).contains(&target.damage));
    }
    let slots = harness.encounter.roster()[mage].resources.spell_slots();
    assert_eq!(slots.available(1), 3);
    assert_eq!(slots.available(2), 3);

    hand_turn_to(&mut harness, mage);
    harness.cast("Fire Bolt", &[goblins[0]]).unwrap();
    let slots = harness.encounter.roster()[mage].resources.spell_slots();
    assert_eq!(slots.current_table(), &[3, 3, 3, 0, 0, 0, 0, 0, 0]);

    hand_turn_to(&mut harness, mage);
    assert_eq!(harness.encounter.set_spell_slot(mage, 1, 99), Ok(4));
    assert_eq!(harness.encounter.set_spell_slot(mage, 1, -1), Ok(0));
    assert_eq!(
        harness.encounter.begin_spell("Magic Missile"),
        Err(EncounterError::NoSpellSlot {
            combatant: "Mage".into(),
            level: 1
        })
    );
}

#[test]
fn test_target_limit() {
    setup();
    let mut harness = TestHarness::with_seed(44);
    harness.add(mage());
    for _ in 0..4 {
        harness.add(goblin());
    }
    harness.begin().unwrap();
    let mage = harness.index_of("Mage").unwrap();
    let others: Vec<usize> = (0..5).filter(|&i| i != mage).collect();
    harness.encounter.select_turn(mage).unwrap();

    harness.encounter.begin_spell("Magic Missile").unwrap();
    for &target in &others[..3] {
        assert_eq!(harness.encounter.toggle_target(target), Ok(true));
    }
    assert_eq!(
        harness.encounter.toggle_target(others[3]),
        Err(EncounterError::TargetLimitReached(3))
    );
    assert_eq!(harness.encounter.toggle_target(others[0]), Ok(false));
    assert_eq!(harness.encounter.toggle_target(others[3]), Ok(true));

    // Capabilities without their own bound use the configured default of one.
    harness.encounter.begin_spell("Fire Bolt").unwrap();
    assert_eq!(harness.encounter.toggle_target(others[0]), Ok(true));
    assert_eq!(
        harness.encounter.toggle_target(others[1]),
        Err(EncounterError::TargetLimitReached(1))
    );
}

#[test]
fn test_configured_default_target_bound() {
    let (mut harness, _, dummy, wall) =
        sparring(EngineConfig::new().with_seed(45).with_default_max_targets(2));

    let resolution = harness.use_ability("Punch", &[dummy, wall]).unwrap();
    assert_eq!(resolution.targets.len(), 2);
    assert_eq!(resolution.target(dummy).unwrap().outcome, Outcome::Hit);
    assert_eq!(resolution.target(wall).unwrap().outcome, Outcome::Miss);
}

#[test]
fn test_confirm_rechecks_eligibility() {
    setup();
    let mut harness = TestHarness::with_seed(46);
    harness.add(mage());
    harness.add(goblin());
    harness.begin().unwrap();
    let mage = harness.index_of("Mage").unwrap();
    let goblin = harness.index_of("Goblin").unwrap();
    harness.encounter.select_turn(mage).unwrap();

    harness.encounter.begin_spell("Magic Missile").unwrap();
    harness.encounter.toggle_target(goblin).unwrap();
    harness.encounter.set_spell_slot(mage, 1, 0).unwrap();

    assert!(matches!(
        harness.encounter.confirm_targeting(),
        Err(EncounterError::NoSpellSlot { level: 1, .. })
    ));
    assert!(harness.encounter.targeting().is_selecting());
    assert_hp(&harness, goblin, 7);
}

#[test]
fn test_confirm_requires_targets() {
    let (mut harness, _, _, _) = sparring(EngineConfig::new().with_seed(47));

    assert_eq!(harness.encounter.confirm_targeting(), Err(EncounterError::NotTargeting));
    harness.encounter.begin_ability("Punch").unwrap();
    assert_eq!(harness.encounter.confirm_targeting(), Err(EncounterError::NoTargets));
    assert!(harness.encounter.cancel_targeting());
    assert!(!harness.encounter.cancel_targeting());
}

// =============================================================================
// Recharge
// =============================================================================

#[test]
fn test_breath_weapon_recharge() {
    setup();
    let mut harness = TestHarness::with_seed(51);
    harness.add(red_dragon_wyrmling());
    harness.add(goblin());
    harness.add(goblin());
    harness.begin().unwrap();
    let dragon = harness.index_of("Red Dragon Wyrmling").unwrap();
    let goblins: Vec<usize> = (0..3).filter(|&i| i != dragon).collect();
    harness.encounter.select_turn(dragon).unwrap();

    let resolution = harness.use_ability("Fire Breath", &goblins).unwrap();
    for target in &resolution.targets {
        match target.outcome {
            Outcome::SaveFailed => assert!(!target.halved && (7..=42).contains(&target.damage)),
            Outcome::SaveSucceeded => assert!(target.halved && (3..=21).contains(&target.damage)),
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    hand_turn_to(&mut harness, dragon);
    assert!(matches!(
        harness.encounter.begin_ability("Fire Breath"),
        Err(EncounterError::NoUsesRemaining { .. })
    ));

    let mut recharged = false;
    for _ in 0..100 {
        if harness.encounter.roll_recharge(dragon, "Fire Breath").unwrap() {
            recharged = true;
            break;
        }
    }
    assert!(recharged);
    assert_log_contains(&harness, LogCategory::Event, "recharges Fire Breath");
    harness.encounter.begin_ability("Fire Breath").unwrap();
}

#[test]
fn test_auto_recharge_at_turn_start() {
    setup();
    let mut harness = TestHarness::with_config(EngineConfig::new().with_seed(52).with_auto_recharge(true));
    harness.add(red_dragon_wyrmling());
    let aria = harness.add_player("Aria", -100).unwrap();
    harness.begin().unwrap();
    assert_eq!(harness.current_name(), Some("Red Dragon Wyrmling"));

    harness.use_ability("Fire Breath", &[aria]).unwrap();
    let before = harness.encounter.log().len();
    hand_turn_to(&mut harness, 0);

    let rolled = harness
        .encounter
        .log()
        .since(before)
        .iter()
        .any(|e| e.message().contains("Fire Breath") && e.message().contains("rolled"));
    assert!(rolled, "expected a recharge roll when the dragon's turn started");
}

// =============================================================================
// Determinism
// =============================================================================

#[test]
fn test_same_seed_replays_identically() {
    let run = || {
        let (mut harness, _, dummy, wall) = sparring(EngineConfig::new().with_seed(99));
        for _ in 0..5 {
            harness.use_ability("Punch", &[dummy]).unwrap();
            harness.use_ability("Venom Strike", &[wall]).unwrap();
        }
        harness
            .encounter
            .log()
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}
