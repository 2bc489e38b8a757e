//! Creature catalogs.
//!
//! The engine reads stat blocks from a [`CreatureCatalog`] and never writes
//! back. [`InMemoryCatalog`] is the adapter used by tests and by hosts that
//! load their bestiary up front.

use crate::creature::CreatureTemplate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A read-only source of creature templates.
pub trait CreatureCatalog {
    /// Every creature name, sorted ascending.
    fn names(&self) -> Vec<String>;

    fn lookup(&self, name: &str) -> Option<CreatureTemplate>;

    /// Names containing `filter`, ignoring case. An empty filter matches everything.
    fn search(&self, filter: &str) -> Vec<String> {
        let needle = filter.trim().to_lowercase();
        self.names()
            .into_iter()
            .filter(|name| needle.is_empty() || name.to_lowercase().contains(&needle))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryCatalog {
    templates: BTreeMap<String, CreatureTemplate>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a template, keyed by its name.
    pub fn insert(&mut self, template: CreatureTemplate) -> Option<CreatureTemplate> {
        self.templates.insert(template.name.clone(), template)
    }

    pub fn with(mut self, template: CreatureTemplate) -> Self {
        self.insert(template);
        self
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Parse a JSON array of templates.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let templates: Vec<CreatureTemplate> = serde_json::from_str(json)?;
        Ok(templates.into_iter().collect())
    }
}

impl CreatureCatalog for InMemoryCatalog {
    fn names(&self) -> Vec<String> {
        self.templates.keys().cloned().collect()
    }

    fn lookup(&self, name: &str) -> Option<CreatureTemplate> {
        self.templates.get(name).cloned()
    }
}

impl FromIterator<CreatureTemplate> for InMemoryCatalog {
    fn from_iter<I: IntoIterator<Item = CreatureTemplate>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for template in iter {
            catalog.insert(template);
        }
        catalog
    }
}
