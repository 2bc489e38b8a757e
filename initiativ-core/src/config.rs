//! Engine configuration.

use serde::{Deserialize, Serialize};

/// Configuration for creating a new encounter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed seed for the dice. `None` seeds from OS entropy.
    pub seed: Option<u64>,

    /// Target bound for capabilities that do not declare their own.
    pub default_max_targets: usize,

    /// Roll recharge for exhausted recharge abilities when a combatant's turn starts.
    pub auto_recharge: bool,

    /// Armor class used for combatants without a stat block.
    pub player_armor_class: i32,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            seed: None,
            default_max_targets: 1,
            auto_recharge: false,
            player_armor_class: 10,
        }
    }

    /// Use a fixed dice seed so every roll can be replayed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the default target bound. Values below 1 are raised to 1.
    pub fn with_default_max_targets(mut self, max_targets: usize) -> Self {
        self.default_max_targets = max_targets.max(1);
        self
    }

    pub fn with_auto_recharge(mut self, enabled: bool) -> Self {
        self.auto_recharge = enabled;
        self
    }

    pub fn with_player_armor_class(mut self, armor_class: i32) -> Self {
        self.player_armor_class = armor_class;
        self
    }

    /// Read a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
