use std::collections::HashSet;

use tracing::debug;

use crate::data::arena::{flatten_forest, RowArena};
use crate::data::row::{Row, RowId};

/// Selected row ids.
///
/// Toggling a row with children cascades the new state to every
/// transitive descendant; toggling a child never propagates upward.
/// Ids survive dataset replacement: missing ids are not pruned and
/// stay inert until a matching id reappears.
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    selected: HashSet<RowId>,
}

impl SelectionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_selected(&self, id: &RowId) -> bool {
        self.selected.contains(id)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = &RowId> {
        self.selected.iter()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Flip `id` and force every transitive descendant to the new
    /// state. Returns the row's new state.
    pub fn toggle(&mut self, arena: &RowArena, id: &RowId) -> bool {
        let now_selected = !self.selected.remove(id);
        if now_selected {
            self.selected.insert(id.clone());
        }

        for descendant in arena.descendants(id) {
            if now_selected {
                self.selected.insert(descendant);
            } else {
                self.selected.remove(&descendant);
            }
        }

        debug!(
            target: "selection",
            "row {} now {}, {} selected total",
            id,
            if now_selected { "selected" } else { "deselected" },
            self.selected.len()
        );
        now_selected
    }

    /// Replace the selection with the exact DFS flattening of
    /// `forest`, collapsed and hidden descendants included. An empty
    /// forest clears the selection entirely.
    pub fn select_all(&mut self, forest: &[Row]) {
        self.selected = flatten_forest(forest).into_iter().collect();
    }

    /// Header indicator: every row in the dataset selected. Binary;
    /// there is no indeterminate state here.
    pub fn all_selected(&self, arena: &RowArena) -> bool {
        arena.total_count() > 0 && self.selected.len() == arena.total_count()
    }
}
