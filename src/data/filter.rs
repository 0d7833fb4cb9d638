use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::data::row::{display_text, Row};

/// Comparison operators available to advanced column filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Contains,
    Equals,
    StartsWith,
    EndsWith,
    GreaterThan,
    LessThan,
    Between,
    In,
}

/// One advanced filter condition. Conditions on the same column
/// AND-combine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub column: String,
    pub operator: FilterOperator,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_end: Option<Value>,
}

impl FilterCondition {
    pub fn new(
        column: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
            value_end: None,
        }
    }

    pub fn with_end(mut self, value_end: impl Into<Value>) -> Self {
        self.value_end = Some(value_end.into());
        self
    }
}

/// Per-column filter: either a simple containment value (an array
/// value means match-any) or a list of advanced conditions. The
/// `enabled` flag gates application without losing the configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnFilter {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<FilterCondition>,
}

impl ColumnFilter {
    pub fn simple(value: impl Into<Value>) -> Self {
        Self {
            enabled: true,
            value: Some(value.into()),
            conditions: Vec::new(),
        }
    }

    pub fn advanced(conditions: Vec<FilterCondition>) -> Self {
        Self {
            enabled: true,
            value: None,
            conditions,
        }
    }

    /// Nothing to apply: disabled or holding no constraint at all.
    pub fn is_empty(&self) -> bool {
        !self.enabled || (self.value.is_none() && self.conditions.is_empty())
    }

    /// Whether `row` passes this filter when attached to `column`.
    /// Advanced conditions take precedence over the simple value.
    pub fn matches(&self, row: &Row, column: &str) -> bool {
        if self.is_empty() {
            return true;
        }
        if !self.conditions.is_empty() {
            return self.conditions.iter().all(|c| condition_matches(row, c));
        }
        let cell = row.get(column).cloned().unwrap_or(Value::Null);
        match &self.value {
            Some(Value::Array(candidates)) => {
                candidates.iter().any(|c| contains_insensitive(&cell, c))
            }
            Some(single) => contains_insensitive(&cell, single),
            None => true,
        }
    }
}

fn contains_insensitive(cell: &Value, needle: &Value) -> bool {
    display_text(cell)
        .to_lowercase()
        .contains(&display_text(needle).to_lowercase())
}

/// Coerce a cell or filter value to a number for range operators.
fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn condition_matches(row: &Row, condition: &FilterCondition) -> bool {
    let cell = row.get(&condition.column).cloned().unwrap_or(Value::Null);
    let cell_text = display_text(&cell);
    let value_text = display_text(&condition.value);

    match condition.operator {
        FilterOperator::Contains => cell_text.contains(&value_text),
        FilterOperator::StartsWith => cell_text.starts_with(&value_text),
        FilterOperator::EndsWith => cell_text.ends_with(&value_text),
        FilterOperator::Equals => match (to_number(&cell), to_number(&condition.value)) {
            (Some(a), Some(b)) => a == b,
            _ => cell_text == value_text,
        },
        // A non-numeric filter value is no constraint on that bound; a
        // non-numeric cell fails the coercion and does not match.
        FilterOperator::GreaterThan => match to_number(&condition.value) {
            Some(bound) => to_number(&cell).map(|n| n > bound).unwrap_or(false),
            None => true,
        },
        FilterOperator::LessThan => match to_number(&condition.value) {
            Some(bound) => to_number(&cell).map(|n| n < bound).unwrap_or(false),
            None => true,
        },
        FilterOperator::Between => {
            let lower_ok = match to_number(&condition.value) {
                Some(lower) => to_number(&cell).map(|n| n >= lower).unwrap_or(false),
                None => true,
            };
            let upper_ok = match condition.value_end.as_ref().and_then(to_number) {
                Some(upper) => to_number(&cell).map(|n| n <= upper).unwrap_or(false),
                None => true,
            };
            lower_ok && upper_ok
        }
        FilterOperator::In => value_text
            .split(',')
            .map(|token| token.trim())
            .any(|token| token == cell_text),
    }
}

/// The table's per-column filter assignment. Enabled filters
/// AND-combine across columns.
#[derive(Debug, Clone, Default)]
pub struct FilterSet {
    filters: HashMap<String, ColumnFilter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, column: impl Into<String>, filter: ColumnFilter) {
        let column = column.into();
        debug!(target: "filter", "filter set on column {}", column);
        self.filters.insert(column, filter);
    }

    pub fn remove(&mut self, column: &str) {
        self.filters.remove(column);
    }

    pub fn clear(&mut self) {
        self.filters.clear();
    }

    pub fn get(&self, column: &str) -> Option<&ColumnFilter> {
        self.filters.get(column)
    }

    pub fn is_empty(&self) -> bool {
        self.filters.values().all(|f| f.is_empty())
    }

    /// A row passes when every enabled column filter accepts it.
    pub fn matches(&self, row: &Row) -> bool {
        self.filters
            .iter()
            .all(|(column, filter)| filter.matches(row, column))
    }

    /// Wire form forwarded to a cursor-paging collaborator, which owns
    /// filtering in that mode. `None` when nothing is enabled.
    pub fn to_request_expr(&self) -> Option<String> {
        let enabled: HashMap<&String, &ColumnFilter> = self
            .filters
            .iter()
            .filter(|(_, f)| !f.is_empty())
            .collect();
        if enabled.is_empty() {
            return None;
        }
        serde_json::to_string(&enabled).ok()
    }
}

/// Case-insensitive search across every primitive-valued field of a
/// row, independent of the per-column filters.
#[derive(Debug, Clone)]
pub struct SearchFilter {
    pattern: String,
    matcher: Option<Regex>,
}

impl SearchFilter {
    pub fn new(pattern: &str) -> Self {
        let matcher = if pattern.is_empty() {
            None
        } else {
            RegexBuilder::new(&regex::escape(pattern))
                .case_insensitive(true)
                .build()
                .ok()
        };
        Self {
            pattern: pattern.to_string(),
            matcher,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, row: &Row) -> bool {
        let Some(matcher) = &self.matcher else {
            return true;
        };
        row.primitive_fields()
            .any(|(_, value)| matcher.is_match(&display_text(value)))
    }
}
