//! Catalog of the mutators PIT can apply.
//!
//! The definitions are embedded from `mutators.json` and parsed once, on first
//! use. A mutator key found in a report can be the mutator ID, its class name,
//! or the class name followed by a variant suffix (for example
//! `RemoveConditionalMutator_EQUAL_ELSE`).

use crate::error::{ReportError, Result};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

const MUTATOR_DEFINITIONS: &str = include_str!("mutators.json");

pub const UNKNOWN_MUTATOR_ID: &str = "UNKNOWN";

static BUILTIN_CATALOG: Lazy<MutatorCatalog> = Lazy::new(|| {
    MutatorCatalog::from_json(MUTATOR_DEFINITIONS).unwrap_or_else(|e| {
        error!("Could not load mutator definitions: {}", e);
        MutatorCatalog::empty()
    })
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mutator {
    pub id: String,
    #[serde(rename = "class")]
    pub class_name: String,
    pub name: String,
    #[serde(rename = "violationDescription")]
    pub violation_description: String,
}

impl Mutator {
    fn unknown() -> Self {
        Mutator {
            id: UNKNOWN_MUTATOR_ID.to_string(),
            class_name: String::new(),
            name: "Unknown mutator".to_string(),
            violation_description: "An unknown mutator has been applied".to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.id == UNKNOWN_MUTATOR_ID
    }
}

#[derive(Debug)]
pub struct MutatorCatalog {
    mutators: Vec<Arc<Mutator>>,
    by_id: HashMap<String, usize>,
    by_class: HashMap<String, usize>,
    unknown: Arc<Mutator>,
}

impl MutatorCatalog {
    pub fn empty() -> Self {
        MutatorCatalog {
            mutators: Vec::new(),
            by_id: HashMap::new(),
            by_class: HashMap::new(),
            unknown: Arc::new(Mutator::unknown()),
        }
    }

    /// The catalog built from the embedded definitions.
    pub fn builtin() -> &'static MutatorCatalog {
        &BUILTIN_CATALOG
    }

    /// Builds a catalog from a JSON array of mutator definitions.
    ///
    /// Entries that cannot be read, lack an ID, class or name, or repeat an
    /// ID already in the table are logged and skipped. Only a document that is
    /// not a JSON array at all is an error.
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<serde_json::Value> = serde_json::from_str(json)?;
        let mut catalog = MutatorCatalog::empty();

        for (position, entry) in entries.into_iter().enumerate() {
            let mutator: Mutator = match serde_json::from_value(entry) {
                Ok(mutator) => mutator,
                Err(e) => {
                    warn!("Skipping mutator definition #{}: {}", position, e);
                    continue;
                }
            };

            if let Err(e) = catalog.insert(mutator) {
                warn!("Skipping mutator definition #{}: {}", position, e);
            }
        }

        debug!("Loaded {} mutator definitions", catalog.len());
        Ok(catalog)
    }

    fn insert(&mut self, mutator: Mutator) -> Result<()> {
        if mutator.id.trim().is_empty()
            || mutator.class_name.trim().is_empty()
            || mutator.name.trim().is_empty()
        {
            return Err(ReportError::InvalidInput(
                "id, class and name are required".to_string(),
            ));
        }
        if mutator.id == UNKNOWN_MUTATOR_ID || self.by_id.contains_key(&mutator.id) {
            return Err(ReportError::InvalidInput(format!(
                "duplicate mutator id {}",
                mutator.id
            )));
        }

        let slot = self.mutators.len();
        self.by_id.insert(mutator.id.clone(), slot);
        self.by_class.entry(mutator.class_name.clone()).or_insert(slot);
        self.mutators.push(Arc::new(mutator));
        Ok(())
    }

    /// Finds the mutator for `key`, or the shared unknown mutator.
    pub fn lookup(&self, key: &str) -> Arc<Mutator> {
        self.find(key)
            .map(Arc::clone)
            .unwrap_or_else(|| Arc::clone(&self.unknown))
    }

    /// Matches by ID, then by exact class name, then by class-name prefix.
    /// When several class names prefix the key, the longest one wins and ties
    /// go to the entry listed first.
    pub fn find(&self, key: &str) -> Option<&Arc<Mutator>> {
        if let Some(&slot) = self.by_id.get(key) {
            return Some(&self.mutators[slot]);
        }
        if let Some(&slot) = self.by_class.get(key) {
            return Some(&self.mutators[slot]);
        }

        self.mutators
            .iter()
            .filter(|m| key.starts_with(m.class_name.as_str()))
            .fold(None, |best: Option<&Arc<Mutator>>, candidate| match best {
                Some(current) if current.class_name.len() >= candidate.class_name.len() => {
                    Some(current)
                }
                _ => Some(candidate),
            })
    }

    pub fn unknown(&self) -> Arc<Mutator> {
        Arc::clone(&self.unknown)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mutator> {
        self.mutators.iter().map(|m| m.as_ref())
    }

    pub fn len(&self) -> usize {
        self.mutators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutators.is_empty()
    }
}

/// Looks `key` up in the built-in catalog.
pub fn lookup(key: &str) -> Arc<Mutator> {
    MutatorCatalog::builtin().lookup(key)
}
