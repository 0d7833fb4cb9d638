use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Stable row identifier, unique within a dataset.
///
/// Backends key records by integers or by opaque strings, so both
/// deserialize transparently from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowId::Int(n) => write!(f, "{}", n),
            RowId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for RowId {
    fn from(n: i64) -> Self {
        RowId::Int(n)
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self {
        RowId::Text(s.to_string())
    }
}

impl From<String> for RowId {
    fn from(s: String) -> Self {
        RowId::Text(s)
    }
}

/// One record in the table's forest: arbitrary keyed fields plus the
/// invariant `id`; `children` defines a subtree. The children form a
/// forest, never a graph: no shared references, no cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub id: RowId,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Row>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Row {
    pub fn new(id: impl Into<RowId>) -> Self {
        Self {
            id: id.into(),
            children: Vec::new(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_children(mut self, children: Vec<Row>) -> Self {
        self.children = children;
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Fields holding primitive values (strings, numbers, booleans).
    /// This is the domain of the global search predicate; nested
    /// objects, arrays, and nulls are never searched.
    pub fn primitive_fields(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields
            .iter()
            .filter(|(_, v)| matches!(v, Value::String(_) | Value::Number(_) | Value::Bool(_)))
    }
}

/// Render a cell value the way it prints in a cell: strings verbatim,
/// null as empty, everything else via its JSON text.
pub fn display_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn row_id_deserializes_from_number_and_string() {
        let numeric: Row = serde_json::from_value(json!({"id": 7, "name": "a"})).unwrap();
        assert_eq!(numeric.id, RowId::Int(7));

        let text: Row = serde_json::from_value(json!({"id": "r-7", "name": "a"})).unwrap();
        assert_eq!(text.id, RowId::Text("r-7".to_string()));
    }

    #[test]
    fn children_deserialize_recursively() {
        let row: Row = serde_json::from_value(json!({
            "id": 1,
            "name": "root",
            "children": [{"id": 2, "name": "leaf"}]
        }))
        .unwrap();

        assert_eq!(row.children.len(), 1);
        assert_eq!(row.children[0].id, RowId::Int(2));
        assert!(row.children[0].children.is_empty());
    }

    #[test]
    fn primitive_fields_skip_structured_values() {
        let row = Row::new(1)
            .with_field("name", "alice")
            .with_field("age", 30)
            .with_field("active", true)
            .with_field("tags", json!(["a", "b"]))
            .with_field("meta", json!({"k": "v"}))
            .with_field("gone", Value::Null);

        let keys: Vec<&str> = row.primitive_fields().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["active", "age", "name"]);
    }

    #[test]
    fn display_text_renders_null_as_empty() {
        assert_eq!(display_text(&Value::Null), "");
        assert_eq!(display_text(&json!("x")), "x");
        assert_eq!(display_text(&json!(3.5)), "3.5");
        assert_eq!(display_text(&json!(true)), "true");
    }
}
