//! Run a short scripted skirmish and print the combat log.
//!
//! Run with: `RUST_LOG=initiativ_core=debug cargo run -p initiativ-core --example skirmish`

use initiativ_core::testing::{goblin, mage, red_dragon_wyrmling};
use initiativ_core::{CreatureCatalog, Encounter, EngineConfig, InMemoryCatalog};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let catalog: InMemoryCatalog = [goblin(), mage(), red_dragon_wyrmling()].into_iter().collect();
    println!("=== Bestiary: {} ===\n", catalog.names().join(", "));

    let mut encounter = Encounter::new(EngineConfig::new().with_seed(1337).with_auto_recharge(true));
    encounter.add_from_catalog(&catalog, "Red Dragon Wyrmling")?;
    encounter.add_from_catalog(&catalog, "Goblin")?;
    encounter.add_from_catalog(&catalog, "Goblin")?;
    encounter.add_from_catalog(&catalog, "Mage")?;
    encounter.add_player("Aria", 14)?;
    encounter.begin_combat()?;

    for _ in 0..2 * encounter.roster().len() {
        take_turn(&mut encounter);
        encounter.next_turn()?;
    }
    encounter.end_combat()?;

    println!("=== Combat Log ===");
    for entry in encounter.log().iter() {
        println!("{entry}");
    }

    println!("\n=== Final Roster ===");
    for combatant in encounter.roster() {
        println!(
            "{:<22} init {:>3}  hp {:>3}/{:<3} {:?}",
            combatant.display_name,
            combatant.initiative,
            combatant.current_hp,
            combatant.max_hp,
            combatant.conditions
        );
    }
    Ok(())
}

/// Use the first eligible capability against the first other combatants that fit.
fn take_turn(encounter: &mut Encounter) {
    let Some(actor) = encounter.turn_index() else {
        return;
    };
    let Some(offered) = encounter.offered_actions().into_iter().find(|o| o.eligible) else {
        println!("{} has nothing to do.", encounter.roster()[actor].display_name);
        return;
    };

    let started = match offered.kind {
        initiativ_core::targeting::CapabilityKind::Ability => encounter.begin_ability(&offered.name),
        initiativ_core::targeting::CapabilityKind::Spell => encounter.begin_spell(&offered.name),
    };
    if let Err(err) = started {
        println!("{err}");
        return;
    }

    for target in (0..encounter.roster().len()).filter(|&i| i != actor) {
        if encounter.toggle_target(target).is_err() {
            break;
        }
    }
    match encounter.confirm_targeting() {
        Ok(resolution) => println!(
            "{} used {}: {} total damage",
            resolution.actor_name,
            resolution.capability,
            resolution.total_damage()
        ),
        Err(err) => println!("{err}"),
    }
}
