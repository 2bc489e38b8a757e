//! Combat resolution engine for tabletop RPG encounters.
//!
//! This crate provides:
//! - A dice expression evaluator with a seedable random source
//! - A combatant roster built from read-only creature templates
//! - Turn order and action-economy tracking
//! - Limited-use ability and spell slot tracking
//! - A targeting workflow and a resolver for attacks, saves, damage and conditions
//! - An append-only combat log
//!
//! # Quick Start
//!
//! ```
//! use initiativ_core::testing::goblin;
//! use initiativ_core::{Encounter, EngineConfig};
//!
//! let mut encounter = Encounter::new(EngineConfig::new().with_seed(7));
//! encounter.add_from_template(goblin());
//! encounter.add_player("Aria", 15).unwrap();
//! encounter.begin_combat().unwrap();
//!
//! for offered in encounter.offered_actions() {
//!     println!("{} ({}): eligible = {}", offered.name, offered.action, offered.eligible);
//! }
//! for entry in encounter.log().iter() {
//!     println!("{entry}");
//! }
//! ```

pub mod catalog;
pub mod combatant;
pub mod config;
pub mod creature;
pub mod dice;
pub mod effects;
pub mod encounter;
pub mod error;
pub mod log;
pub mod resolve;
pub mod resources;
pub mod targeting;
pub mod testing;
pub mod turn;

// Primary public API
pub use catalog::{CreatureCatalog, InMemoryCatalog};
pub use combatant::{Combatant, CombatantId};
pub use config::EngineConfig;
pub use creature::{
    Ability, AbilityScore, AbilityScores, ActionType, Check, Condition, CreatureTemplate,
    DamageRoll, DamageType, Spell, UsageType,
};
pub use dice::{DiceError, DiceExpression, DiceRoller, RollResult};
pub use effects::{EffectKind, EffectNodeId, EffectTree, Outcome, Trigger};
pub use encounter::{Encounter, EncounterSnapshot};
pub use error::EncounterError;
pub use log::{CombatLog, LogCategory, LogEntry};
pub use resolve::{Resolution, TargetOutcome};
pub use targeting::{Capability, OfferedAction, TargetingState};
pub use turn::CombatPhase;
