//! Diagram column assignment.
//!
//! Every distinct owner gets a 0-based column the first time it is seen in a
//! depth-first, pre-order walk. Renderers use the columns as lifelines.

use super::activation::{ActivationList, ActivationRef};
use serde::Serialize;
use std::collections::HashMap;

/// One diagram participant and its column
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub name: String,
    pub column: usize,
}

/// Mapping from owner name to column index
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: HashMap<String, usize>,
    order: Vec<String>,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Columns for every owner in `list`, in depth-first first-seen order
    pub fn from_activations(list: &ActivationList) -> Self {
        let mut map = Self::new();
        map.add_activations(list);
        map
    }

    /// Columns for a single subtree
    pub fn from_activation(activation: ActivationRef<'_>) -> Self {
        let mut map = Self::new();
        map.add_subtree(activation);
        map
    }

    pub fn add_activations(&mut self, list: &ActivationList) {
        for root in list.roots() {
            self.add_subtree(root);
        }
    }

    fn add_subtree(&mut self, top: ActivationRef<'_>) {
        let mut stack = vec![top];
        while let Some(activation) = stack.pop() {
            self.column_for(activation.owner());
            let children: Vec<_> = activation.children().collect();
            stack.extend(children.into_iter().rev());
        }
    }

    /// Append every owner of `other` in its column order
    pub fn merge(&mut self, other: &ColumnMap) {
        for name in &other.order {
            self.column_for(name);
        }
    }

    fn column_for(&mut self, owner: &str) -> usize {
        if let Some(&column) = self.columns.get(owner) {
            return column;
        }
        let column = self.order.len();
        self.columns.insert(owner.to_string(), column);
        self.order.push(owner.to_string());
        column
    }

    pub fn column(&self, owner: &str) -> Option<usize> {
        self.columns.get(owner).copied()
    }

    /// Participants ordered by column
    pub fn participants(&self) -> Vec<Participant> {
        self.order
            .iter()
            .enumerate()
            .map(|(column, name)| Participant {
                name: name.clone(),
                column,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
