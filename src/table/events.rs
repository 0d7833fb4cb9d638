use serde_json::Value;

use crate::data::row::{Row, RowId};

/// Host-side callbacks for mutations the engine cannot complete on
/// its own (persisting an edited cell, reacting to selection). Every
/// method defaults to a no-op so hosts implement only what they need.
pub trait TableHooks {
    fn on_cell_value_change(&mut self, _column_key: &str, _new_value: &Value, _row_id: &RowId) {}

    fn on_select_row(&mut self, _row: &Row) {}

    fn on_select_all_rows(&mut self, _rows: &[Row]) {}
}
