use serde::{Deserialize, Serialize};

/// Per-table behavior configuration, supplied at construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Table-wide inline editing; per-column `editable` still gates
    /// which cells enter edit mode
    pub editable: bool,

    /// Column resize capability
    pub resizable: bool,

    /// Depth bound for expand-all, -1 = unlimited
    pub max_expand_depth: i32,

    /// Rows per page
    pub page_size: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            editable: false,
            resizable: true,
            max_expand_depth: -1,
            page_size: 10,
        }
    }
}
