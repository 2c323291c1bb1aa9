//! Ancestor-aware constructor suppression.
//!
//! When `Derived.<init>` runs, the runtime also reports the chained
//! `Base.<init>` call as a nested activation. Sequence diagrams read better
//! without it, so this filter drops a constructor nested directly in another
//! constructor when the outer one is synthetic or the inner owner is a strict
//! superclass of the outer owner.
//!
//! Type relationships come from a [`TypeHierarchy`]. Lookups that cannot be
//! resolved keep the activation and log a warning.

use super::predicate::ActivationPredicate;
use crate::model::ActivationRef;
use log::warn;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

/// Outcome of a hierarchy lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AncestorLookup {
    /// Both types are known; `true` when the first is a strict ancestor
    Found(bool),
    /// At least one type could not be resolved
    Unresolved(String),
}

/// Source of type relationships
pub trait TypeHierarchy {
    fn is_strict_ancestor(&self, ancestor: &str, descendant: &str) -> AncestorLookup;
}

/// Hierarchy built from `type -> direct superclass` entries
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuperclassTable {
    superclasses: HashMap<String, String>,
}

impl SuperclassTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(superclasses: HashMap<String, String>) -> Self {
        Self { superclasses }
    }

    pub fn insert(&mut self, class: impl Into<String>, superclass: impl Into<String>) {
        self.superclasses.insert(class.into(), superclass.into());
    }

    /// A type is known when it appears on either side of an entry
    pub fn knows(&self, class: &str) -> bool {
        self.superclasses.contains_key(class) || self.superclasses.values().any(|s| s == class)
    }

    pub fn len(&self) -> usize {
        self.superclasses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.superclasses.is_empty()
    }
}

impl TypeHierarchy for SuperclassTable {
    fn is_strict_ancestor(&self, ancestor: &str, descendant: &str) -> AncestorLookup {
        for class in [ancestor, descendant] {
            if !self.knows(class) {
                return AncestorLookup::Unresolved(format!("unknown type {}", class));
            }
        }

        let mut seen = HashSet::new();
        let mut current = descendant;
        while let Some(superclass) = self.superclasses.get(current) {
            if superclass == ancestor {
                return AncestorLookup::Found(true);
            }
            if !seen.insert(superclass.as_str()) {
                return AncestorLookup::Unresolved(format!(
                    "cyclic superclass chain at {}",
                    superclass
                ));
            }
            current = superclass;
        }
        AncestorLookup::Found(false)
    }
}

/// Predicate hiding constructor calls chained from a subclass constructor
#[derive(Clone)]
pub struct ConstructorFilter {
    hierarchy: Arc<dyn TypeHierarchy + Send + Sync>,
}

impl ConstructorFilter {
    pub fn new(hierarchy: Arc<dyn TypeHierarchy + Send + Sync>) -> Self {
        Self { hierarchy }
    }

    fn is_declared_in_superclass(&self, owner: &str, parent_owner: &str) -> bool {
        match self.hierarchy.is_strict_ancestor(owner, parent_owner) {
            AncestorLookup::Found(found) => found,
            AncestorLookup::Unresolved(reason) => {
                warn!(
                    "Cannot resolve whether {} is a superclass of {}: {}",
                    owner, parent_owner, reason
                );
                false
            }
        }
    }
}

impl ActivationPredicate for ConstructorFilter {
    fn accept(&self, activation: ActivationRef<'_>) -> bool {
        if !activation.member().is_constructor() {
            return true;
        }
        let Some(parent) = activation.parent() else {
            return true;
        };
        if !parent.member().is_constructor() {
            return true;
        }
        if parent.member().synthetic {
            return false;
        }
        !self.is_declared_in_superclass(activation.owner(), parent.owner())
    }
}

impl fmt::Debug for ConstructorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorFilter").finish_non_exhaustive()
    }
}
