//! Local view of the product-category taxonomy.
//!
//! Manual overrides always take precedence over classifier output: merging
//! automatic results never replaces a manual entry.

use std::collections::BTreeMap;

use crate::models::{CategoryAssignment, ManualCategory};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryCatalog {
    entries: BTreeMap<String, CategoryAssignment>,
}

impl CategoryCatalog {
    /// Build from the server's listing; later duplicates win.
    pub fn from_assignments(assignments: impl IntoIterator<Item = CategoryAssignment>) -> Self {
        let entries = assignments
            .into_iter()
            .map(|a| (a.product.clone(), a))
            .collect();
        Self { entries }
    }

    /// Record a manual override. Returns whether anything changed; applying
    /// the same override again is a no-op.
    pub fn apply_manual(&mut self, assignment: &ManualCategory) -> bool {
        let next = CategoryAssignment::manual(&assignment.product, &assignment.category);
        match self.entries.get(&assignment.product) {
            Some(current) if *current == next => false,
            _ => {
                self.entries.insert(assignment.product.clone(), next);
                true
            }
        }
    }

    /// Merge classifier output. Manual entries are kept. Returns how many
    /// entries changed.
    pub fn merge_inferred(
        &mut self,
        assignments: impl IntoIterator<Item = CategoryAssignment>,
    ) -> usize {
        let mut changed = 0;
        for incoming in assignments {
            let replace = match self.entries.get(&incoming.product) {
                Some(current) if current.manual && !incoming.manual => false,
                Some(current) => *current != incoming,
                None => true,
            };
            if replace {
                self.entries.insert(incoming.product.clone(), incoming);
                changed += 1;
            }
        }
        changed
    }

    pub fn get(&self, product: &str) -> Option<&CategoryAssignment> {
        self.entries.get(product)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CategoryAssignment> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn manual_count(&self) -> usize {
        self.entries.values().filter(|a| a.manual).count()
    }

    /// Products without any category.
    pub fn uncategorized(&self) -> Vec<&str> {
        self.entries
            .values()
            .filter(|a| a.category.is_none())
            .map(|a| a.product.as_str())
            .collect()
    }

    /// Products grouped by category label.
    pub fn by_category(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for a in self.entries.values() {
            groups
                .entry(a.category_label())
                .or_default()
                .push(a.product.as_str());
        }
        groups
    }

    pub fn to_vec(&self) -> Vec<CategoryAssignment> {
        self.entries.values().cloned().collect()
    }
}
