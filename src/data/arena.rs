use std::collections::HashMap;

use tracing::warn;

use crate::data::row::{Row, RowId};

/// Precomputed adjacency over a row forest.
///
/// Rebuilt wholesale on every dataset change so that tree operations
/// (cascade selection, expand-all, flattening) are lookups rather than
/// repeated walks over the nested structure.
#[derive(Debug, Clone, Default)]
pub struct RowArena {
    /// Every id in the forest, in depth-first order
    order: Vec<RowId>,
    nodes: HashMap<RowId, RowNode>,
}

#[derive(Debug, Clone)]
struct RowNode {
    parent: Option<RowId>,
    children: Vec<RowId>,
    depth: usize,
}

impl RowArena {
    pub fn build(forest: &[Row]) -> Self {
        let mut arena = Self::default();
        for row in forest {
            arena.insert(row, None, 0);
        }
        arena
    }

    fn insert(&mut self, row: &Row, parent: Option<&RowId>, depth: usize) {
        if self.nodes.contains_key(&row.id) {
            // Invariant violation in the supplied data; first occurrence wins
            warn!(target: "arena", "duplicate row id {}, keeping first occurrence", row.id);
            return;
        }

        self.order.push(row.id.clone());
        self.nodes.insert(
            row.id.clone(),
            RowNode {
                parent: parent.cloned(),
                children: row.children.iter().map(|c| c.id.clone()).collect(),
                depth,
            },
        );

        for child in &row.children {
            self.insert(child, Some(&row.id), depth + 1);
        }
    }

    pub fn contains(&self, id: &RowId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Count of every row at every level
    pub fn total_count(&self) -> usize {
        self.order.len()
    }

    pub fn depth_of(&self, id: &RowId) -> Option<usize> {
        self.nodes.get(id).map(|n| n.depth)
    }

    pub fn parent_of(&self, id: &RowId) -> Option<&RowId> {
        self.nodes.get(id).and_then(|n| n.parent.as_ref())
    }

    pub fn children_of(&self, id: &RowId) -> &[RowId] {
        self.nodes
            .get(id)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    /// Transitive descendant ids of `id`, depth-first. Unknown ids
    /// yield an empty list.
    pub fn descendants(&self, id: &RowId) -> Vec<RowId> {
        let mut result = Vec::new();
        let mut stack: Vec<&RowId> = self.children_of(id).iter().rev().collect();

        while let Some(current) = stack.pop() {
            result.push(current.clone());
            for child in self.children_of(current).iter().rev() {
                stack.push(child);
            }
        }

        result
    }

    /// DFS flattening of the whole forest.
    pub fn flatten(&self) -> Vec<RowId> {
        self.order.clone()
    }

    /// Every id reachable up to `max_depth`; `-1` means unlimited.
    /// Top-level rows sit at depth 0.
    pub fn ids_to_depth(&self, max_depth: i32) -> Vec<RowId> {
        self.order
            .iter()
            .filter(|id| {
                max_depth < 0
                    || self
                        .nodes
                        .get(*id)
                        .map(|n| n.depth as i32 <= max_depth)
                        .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}

/// DFS flattening of a forest by reference. Select-all consumes this
/// shape directly.
pub fn flatten_forest(forest: &[Row]) -> Vec<RowId> {
    let mut result = Vec::new();
    for row in forest {
        result.push(row.id.clone());
        result.extend(flatten_forest(&row.children));
    }
    result
}

/// Locate a row anywhere in a forest by id.
pub fn find_row<'a>(forest: &'a [Row], id: &RowId) -> Option<&'a Row> {
    for row in forest {
        if row.id == *id {
            return Some(row);
        }
        if let Some(found) = find_row(&row.children, id) {
            return Some(found);
        }
    }
    None
}

pub fn find_row_mut<'a>(forest: &'a mut [Row], id: &RowId) -> Option<&'a mut Row> {
    for row in forest {
        if row.id == *id {
            return Some(row);
        }
        if let Some(found) = find_row_mut(&mut row.children, id) {
            return Some(found);
        }
    }
    None
}
