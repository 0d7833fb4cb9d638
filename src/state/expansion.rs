use std::collections::HashSet;

use crate::data::arena::RowArena;
use crate::data::row::RowId;

/// Expanded row ids. Governs which descendants render; never touches
/// selection.
#[derive(Debug, Clone, Default)]
pub struct ExpansionState {
    expanded: HashSet<RowId>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_expanded(&self, id: &RowId) -> bool {
        self.expanded.contains(id)
    }

    pub fn expanded_count(&self) -> usize {
        self.expanded.len()
    }

    /// Returns the row's new state.
    pub fn toggle(&mut self, id: &RowId) -> bool {
        if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.clone());
            true
        }
    }

    /// Assign the set wholesale: every id reachable up to `max_depth`
    /// (`-1` = unlimited), depth-first.
    pub fn expand_all(&mut self, arena: &RowArena, max_depth: i32) {
        self.expanded = arena.ids_to_depth(max_depth).into_iter().collect();
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// A row renders iff every ancestor is expanded. Top-level rows
    /// are always visible.
    pub fn is_visible(&self, arena: &RowArena, id: &RowId) -> bool {
        let mut current = arena.parent_of(id);
        while let Some(parent) = current {
            if !self.expanded.contains(parent) {
                return false;
            }
            current = arena.parent_of(parent);
        }
        true
    }
}
