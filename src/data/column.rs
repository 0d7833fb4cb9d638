use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::data::row::{display_text, Row};

/// Closed set of cell renderings. Every dispatch site matches
/// exhaustively, so adding a variant is a compile-time exercise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellKind {
    #[default]
    Text,
    Number,
    Select,
    Date,
}

/// Which filter control a column carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterKind {
    Sort,
    Date,
    Select,
    Number,
    Text,
    Toggle,
}

/// One entry of a Select column's option list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Row-level action rendered in the operations column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnAction {
    pub key: String,
    pub label: String,
}

/// Maps a raw cell value (plus its row) to a display value.
pub type CellParser = Arc<dyn Fn(&Value, &Row) -> Value + Send + Sync>;

/// Reserved names marking the operations column, matched
/// case-insensitively against both `data_index` and `title`.
const OPERATIONS_SENTINELS: &[&str] = &["operation", "operations", "action", "actions", "操作"];

fn is_operations_name(name: &str) -> bool {
    let lower = name.trim().to_lowercase();
    OPERATIONS_SENTINELS.iter().any(|s| *s == lower)
}

/// Column descriptor supplied at table construction.
#[derive(Clone)]
pub struct ColumnSpec {
    pub data_index: String,
    pub title: String,
    /// Tri-state at the data level: `None` behaves as shown
    pub visible: Option<bool>,
    pub editable: bool,
    pub cell_kind: CellKind,
    pub options: Vec<SelectOption>,
    pub filter_kind: Option<FilterKind>,
    pub actions: Vec<ColumnAction>,
    pub parser: Option<CellParser>,
}

impl fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("data_index", &self.data_index)
            .field("title", &self.title)
            .field("visible", &self.visible)
            .field("editable", &self.editable)
            .field("cell_kind", &self.cell_kind)
            .field("options", &self.options)
            .field("filter_kind", &self.filter_kind)
            .field("actions", &self.actions)
            .field("parser", &self.parser.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl ColumnSpec {
    pub fn new(data_index: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            data_index: data_index.into(),
            title: title.into(),
            visible: None,
            editable: false,
            cell_kind: CellKind::Text,
            options: Vec::new(),
            filter_kind: None,
            actions: Vec::new(),
            parser: None,
        }
    }

    pub fn with_kind(mut self, kind: CellKind) -> Self {
        self.cell_kind = kind;
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = editable;
        self
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    pub fn with_options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    pub fn with_filter(mut self, kind: FilterKind) -> Self {
        self.filter_kind = Some(kind);
        self
    }

    pub fn with_actions(mut self, actions: Vec<ColumnAction>) -> Self {
        self.actions = actions;
        self
    }

    pub fn with_parser(mut self, parser: CellParser) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Whether this is the reserved operations column: excluded from
    /// visibility toggling and always rendered last.
    pub fn is_operations(&self) -> bool {
        is_operations_name(&self.data_index) || is_operations_name(&self.title)
    }

    /// Value of this column's cell in `row`, with the per-column
    /// parser applied when present.
    pub fn cell_value(&self, row: &Row) -> Value {
        let raw = row.get(&self.data_index).cloned().unwrap_or(Value::Null);
        match &self.parser {
            Some(parse) => parse(&raw, row),
            None => raw,
        }
    }

    /// Display text for a committed value, dispatched on the cell kind.
    pub fn display_value(&self, value: &Value) -> String {
        match self.cell_kind {
            CellKind::Text => display_text(value),
            CellKind::Number => display_text(value),
            CellKind::Select => self
                .options
                .iter()
                .find(|o| o.value == *value)
                .map(|o| o.label.clone())
                .unwrap_or_else(|| display_text(value)),
            CellKind::Date => display_text(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn operations_column_detected_case_insensitively() {
        assert!(ColumnSpec::new("actions", "Row actions").is_operations());
        assert!(ColumnSpec::new("ops", "Operation").is_operations());
        assert!(ColumnSpec::new("操作", "操作").is_operations());
        assert!(!ColumnSpec::new("name", "Name").is_operations());
    }

    #[test]
    fn select_display_resolves_option_label() {
        let column = ColumnSpec::new("status", "Status")
            .with_kind(CellKind::Select)
            .with_options(vec![
                SelectOption::new("Enabled", 1),
                SelectOption::new("Disabled", 0),
            ]);

        assert_eq!(column.display_value(&json!(1)), "Enabled");
        // unknown option values fall back to their raw text
        assert_eq!(column.display_value(&json!(9)), "9");
    }

    #[test]
    fn parser_overrides_raw_value() {
        let column = ColumnSpec::new("amount", "Amount")
            .with_parser(Arc::new(|value, _row| {
                json!(format!("${}", display_text(value)))
            }));
        let row = Row::new(1).with_field("amount", 250);

        assert_eq!(column.cell_value(&row), json!("$250"));
    }
}
