use crossterm::event::{KeyCode, KeyModifiers};
use tracing::trace;

/// Result of dispatching one key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavOutcome {
    /// Active cell moved or was seeded
    Moved,
    /// Active cell (and any multi-cell range) cleared
    Cleared,
    /// Enter passthrough; starting an edit is the editor's business
    Submitted,
    /// Key not handled, or movement clamped in place
    Ignored,
}

/// Keyboard focus over the rendered page grid: at most one active
/// cell, addressed by (row, column) position within the projection.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    active: Option<(usize, usize)>,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_position(&self) -> Option<(usize, usize)> {
        self.active
    }

    pub fn set_active(&mut self, row: usize, column: usize) {
        self.active = Some((row, column));
    }

    pub fn clear(&mut self) {
        self.active = None;
    }

    /// Keep the active cell inside a grid that shrank under it.
    pub fn clamp_to(&mut self, rows: usize, columns: usize) {
        if rows == 0 || columns == 0 {
            self.active = None;
            return;
        }
        if let Some((row, column)) = self.active {
            self.active = Some((row.min(rows - 1), column.min(columns - 1)));
        }
    }

    /// Dispatch one key press against a `rows` × `columns` grid.
    ///
    /// Arrows clamp at the data/column bounds (no wraparound); Tab
    /// wraps to the first column of the next row, Shift+Tab mirrors
    /// backward; Escape clears; Enter passes through.
    pub fn handle_key(
        &mut self,
        key: KeyCode,
        modifiers: KeyModifiers,
        rows: usize,
        columns: usize,
    ) -> NavOutcome {
        trace!(target: "input", "key {:?} {:?}", key, modifiers);

        if key == KeyCode::Esc {
            let had_active = self.active.is_some();
            self.active = None;
            return if had_active {
                NavOutcome::Cleared
            } else {
                NavOutcome::Ignored
            };
        }
        if key == KeyCode::Enter {
            return NavOutcome::Submitted;
        }
        if rows == 0 || columns == 0 {
            return NavOutcome::Ignored;
        }

        let Some((row, column)) = self.active else {
            // first navigation key seeds the origin
            return match key {
                KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right | KeyCode::Tab
                | KeyCode::BackTab => {
                    self.active = Some((0, 0));
                    NavOutcome::Moved
                }
                _ => NavOutcome::Ignored,
            };
        };

        let backward_tab =
            key == KeyCode::BackTab || (key == KeyCode::Tab && modifiers.contains(KeyModifiers::SHIFT));

        let next = if backward_tab {
            if column > 0 {
                Some((row, column - 1))
            } else if row > 0 {
                Some((row - 1, columns - 1))
            } else {
                None
            }
        } else {
            match key {
                KeyCode::Up => (row > 0).then(|| (row - 1, column)),
                KeyCode::Down => (row + 1 < rows).then(|| (row + 1, column)),
                KeyCode::Left => (column > 0).then(|| (row, column - 1)),
                KeyCode::Right => (column + 1 < columns).then(|| (row, column + 1)),
                KeyCode::Tab => {
                    if column + 1 < columns {
                        Some((row, column + 1))
                    } else if row + 1 < rows {
                        Some((row + 1, 0))
                    } else {
                        None
                    }
                }
                _ => return NavOutcome::Ignored,
            }
        };

        match next {
            Some(position) => {
                self.active = Some(position);
                NavOutcome::Moved
            }
            None => NavOutcome::Ignored,
        }
    }
}
