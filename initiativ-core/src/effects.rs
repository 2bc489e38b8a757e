//! Chained effect trees.
//!
//! A capability can carry follow-up effects that fire depending on how its
//! primary check went ("on hit, also knock the target prone"). Nodes live in
//! an arena owned by [`EffectTree`] and refer to their children by
//! [`EffectNodeId`]. A child always has a larger id than its parent, so
//! walking the tree can never loop.

use crate::creature::{AbilityScore, Condition, DamageRoll};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a check resolved for one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Hit,
    Miss,
    SaveFailed,
    SaveSucceeded,
    /// No check was rolled.
    Automatic,
}

impl Outcome {
    /// True when the capability takes full effect.
    pub fn lands(self) -> bool {
        matches!(self, Outcome::Hit | Outcome::SaveFailed | Outcome::Automatic)
    }

    pub fn describe(self) -> &'static str {
        match self {
            Outcome::Hit => "hit",
            Outcome::Miss => "miss",
            Outcome::SaveFailed => "failed save",
            Outcome::SaveSucceeded => "successful save",
            Outcome::Automatic => "automatic",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.describe())
    }
}

/// When a node fires, judged against its parent's outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Trigger {
    #[default]
    Always,
    /// The parent landed (hit, failed save, or no check).
    OnSuccess,
    /// The parent missed or the target saved.
    OnFailure,
}

impl Trigger {
    pub fn fires_on(self, outcome: Outcome) -> bool {
        match self {
            Trigger::Always => true,
            Trigger::OnSuccess => outcome.lands(),
            Trigger::OnFailure => !outcome.lands(),
        }
    }
}

/// What a node does when it fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    Damage {
        roll: DamageRoll,
        /// Apply half damage when the parent outcome is a successful save.
        half_on_save: bool,
    },
    Heal {
        dice: String,
    },
    ApplyCondition(Condition),
    /// A fresh saving throw; its outcome is what this node's children see.
    SavingThrow {
        ability: Option<AbilityScore>,
        dc: i32,
    },
}

/// Index of a node inside its [`EffectTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectNodeId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectNode {
    pub trigger: Trigger,
    pub kind: EffectKind,
    pub children: Vec<EffectNodeId>,
}

/// Arena of effect nodes.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EffectTree {
    nodes: Vec<EffectNode>,
    roots: Vec<EffectNodeId>,
}

impl EffectTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> &[EffectNodeId] {
        &self.roots
    }

    pub fn node(&self, id: EffectNodeId) -> Option<&EffectNode> {
        self.nodes.get(id.0)
    }

    /// Add a top-level node, evaluated against the primary outcome.
    pub fn add_root(&mut self, trigger: Trigger, kind: EffectKind) -> EffectNodeId {
        let id = self.push(trigger, kind);
        self.roots.push(id);
        id
    }

    /// Attach a node under `parent`. Returns `None` if `parent` does not exist.
    pub fn add_child(
        &mut self,
        parent: EffectNodeId,
        trigger: Trigger,
        kind: EffectKind,
    ) -> Option<EffectNodeId> {
        if parent.0 >= self.nodes.len() {
            return None;
        }
        let id = self.push(trigger, kind);
        self.nodes[parent.0].children.push(id);
        Some(id)
    }

    /// Children of `id` that respect the parent-before-child ordering.
    ///
    /// Trees built through [`EffectTree::add_child`] always do; a deserialized
    /// tree that points backwards has those edges ignored.
    pub fn children_of(&self, id: EffectNodeId) -> impl Iterator<Item = EffectNodeId> + '_ {
        self.node(id)
            .into_iter()
            .flat_map(|node| node.children.iter().copied())
            .filter(move |child| child.0 > id.0 && child.0 < self.nodes.len())
    }

    fn push(&mut self, trigger: Trigger, kind: EffectKind) -> EffectNodeId {
        let id = EffectNodeId(self.nodes.len());
        self.nodes.push(EffectNode {
            trigger,
            kind,
            children: Vec::new(),
        });
        id
    }
}
