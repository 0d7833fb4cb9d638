use std::mem;

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use crate::data::column::{CellKind, ColumnSpec};
use crate::data::row::{display_text, RowId};

/// Address of one cell: row id plus column key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellAddress {
    pub row_id: RowId,
    pub column_key: String,
}

/// A committed edit, ready for the host callback and the optimistic
/// row patch.
#[derive(Debug, Clone, PartialEq)]
pub struct CellCommit {
    pub cell: CellAddress,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
enum EditorPhase {
    Viewing,
    Editing {
        cell: CellAddress,
        draft: String,
        committed: Value,
    },
}

/// Per-cell edit state machine: Viewing → Editing → Viewing, leaving
/// via commit (focus loss / Enter) or cancel (Escape). At most one
/// cell edits at a time.
#[derive(Debug, Clone)]
pub struct CellEditor {
    phase: EditorPhase,
}

impl Default for CellEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl CellEditor {
    pub fn new() -> Self {
        Self {
            phase: EditorPhase::Viewing,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.phase, EditorPhase::Editing { .. })
    }

    pub fn editing_cell(&self) -> Option<&CellAddress> {
        match &self.phase {
            EditorPhase::Editing { cell, .. } => Some(cell),
            EditorPhase::Viewing => None,
        }
    }

    pub fn draft(&self) -> Option<&str> {
        match &self.phase {
            EditorPhase::Editing { draft, .. } => Some(draft),
            EditorPhase::Viewing => None,
        }
    }

    /// Double-activation entry. Refused when the column is not
    /// editable; a refused entry leaves the current phase untouched.
    pub fn begin(&mut self, column: &ColumnSpec, row_id: RowId, committed: Value) -> bool {
        if !column.editable {
            return false;
        }

        let draft = display_text(&committed);
        debug!(
            target: "editor",
            "editing {}:{} (draft '{}')", row_id, column.data_index, draft
        );
        self.phase = EditorPhase::Editing {
            cell: CellAddress {
                row_id,
                column_key: column.data_index.clone(),
            },
            draft,
            committed,
        };
        true
    }

    /// Replace the in-progress draft. Ignored while viewing.
    pub fn set_draft(&mut self, text: &str) {
        if let EditorPhase::Editing { draft, .. } = &mut self.phase {
            *draft = text.to_string();
        }
    }

    /// Commit trigger (focus loss or Enter). Returns the edit to apply,
    /// or `None` when the draft equals the committed value or fails its
    /// kind's parse. Either way the editor returns to Viewing.
    pub fn commit(&mut self, column: &ColumnSpec) -> Option<CellCommit> {
        let phase = mem::replace(&mut self.phase, EditorPhase::Viewing);
        let EditorPhase::Editing {
            cell,
            draft,
            committed,
        } = phase
        else {
            return None;
        };

        let parsed = parse_draft(column, &draft)?;
        if parsed == committed {
            return None;
        }

        debug!(target: "editor", "commit {}:{} = {:?}", cell.row_id, cell.column_key, parsed);
        Some(CellCommit {
            cell,
            value: parsed,
        })
    }

    /// Cancel trigger (Escape): discard the draft, no callback.
    pub fn cancel(&mut self) {
        if self.is_editing() {
            debug!(target: "editor", "edit cancelled");
        }
        self.phase = EditorPhase::Viewing;
    }
}

/// Interpret a draft according to the column's cell kind.
///
/// Number coercion keeps an unparseable draft as its raw string; a
/// Select draft that matches no option and an invalid Date are lookup
/// misses, so the commit becomes a no-op.
fn parse_draft(column: &ColumnSpec, draft: &str) -> Option<Value> {
    match column.cell_kind {
        CellKind::Text => Some(Value::String(draft.to_string())),
        CellKind::Number => match draft.trim().parse::<f64>() {
            Ok(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .or(Some(Value::String(draft.to_string()))),
            Err(_) => Some(Value::String(draft.to_string())),
        },
        CellKind::Select => column
            .options
            .iter()
            .find(|option| display_text(&option.value) == draft)
            .map(|option| option.value.clone()),
        CellKind::Date => NaiveDate::parse_from_str(draft.trim(), "%Y-%m-%d")
            .ok()
            .map(|date| Value::String(date.format("%Y-%m-%d").to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::column::SelectOption;
    use serde_json::json;

    fn text_column() -> ColumnSpec {
        ColumnSpec::new("name", "Name").editable(true)
    }

    #[test]
    fn entry_refused_on_readonly_column() {
        let column = ColumnSpec::new("name", "Name");
        let mut editor = CellEditor::new();
        assert!(!editor.begin(&column, RowId::Int(1), json!("a")));
        assert!(!editor.is_editing());
    }

    #[test]
    fn commit_requires_a_changed_draft() {
        let column = text_column();
        let mut editor = CellEditor::new();

        editor.begin(&column, RowId::Int(1), json!("alice"));
        assert_eq!(editor.commit(&column), None);
        assert!(!editor.is_editing());

        editor.begin(&column, RowId::Int(1), json!("alice"));
        editor.set_draft("bob");
        let commit = editor.commit(&column).expect("changed draft commits");
        assert_eq!(commit.value, json!("bob"));
        assert_eq!(commit.cell.row_id, RowId::Int(1));
    }

    #[test]
    fn cancel_discards_the_draft() {
        let column = text_column();
        let mut editor = CellEditor::new();

        editor.begin(&column, RowId::Int(1), json!("alice"));
        editor.set_draft("bob");
        editor.cancel();
        assert!(!editor.is_editing());
        // nothing left to commit
        assert_eq!(editor.commit(&column), None);
    }

    #[test]
    fn number_drafts_coerce() {
        let column = ColumnSpec::new("age", "Age")
            .with_kind(CellKind::Number)
            .editable(true);
        let mut editor = CellEditor::new();

        editor.begin(&column, RowId::Int(1), json!(30));
        editor.set_draft("42.5");
        assert_eq!(editor.commit(&column).unwrap().value, json!(42.5));

        // unparseable input stays a raw string rather than vanishing
        editor.begin(&column, RowId::Int(1), json!(30));
        editor.set_draft("forty");
        assert_eq!(editor.commit(&column).unwrap().value, json!("forty"));
    }

    #[test]
    fn select_drafts_resolve_against_options() {
        let column = ColumnSpec::new("status", "Status")
            .with_kind(CellKind::Select)
            .with_options(vec![
                SelectOption::new("On", 1),
                SelectOption::new("Off", 0),
            ])
            .editable(true);
        let mut editor = CellEditor::new();

        editor.begin(&column, RowId::Int(1), json!(0));
        editor.set_draft("1");
        assert_eq!(editor.commit(&column).unwrap().value, json!(1));

        // unknown option value is a lookup miss; commit is a no-op
        editor.begin(&column, RowId::Int(1), json!(0));
        editor.set_draft("9");
        assert_eq!(editor.commit(&column), None);
    }

    #[test]
    fn date_drafts_validate_iso_format() {
        let column = ColumnSpec::new("joined", "Joined")
            .with_kind(CellKind::Date)
            .editable(true);
        let mut editor = CellEditor::new();

        editor.begin(&column, RowId::Int(1), json!("2024-01-01"));
        editor.set_draft("2024-02-29");
        assert_eq!(
            editor.commit(&column).unwrap().value,
            json!("2024-02-29")
        );

        editor.begin(&column, RowId::Int(1), json!("2024-01-01"));
        editor.set_draft("2023-02-29");
        assert_eq!(editor.commit(&column), None);
    }
}
