use std::collections::HashMap;

use tracing::debug;

use crate::data::column::ColumnSpec;

/// Widths are floor-clamped here so a drag can never collapse a
/// column to nothing.
pub const MIN_COLUMN_WIDTH: u16 = 50;

/// Visibility and width state layered over the column specs.
///
/// Visibility is tri-state at the data level but binary in effect:
/// an undeclared column behaves as shown; only an explicit `false`
/// hides it.
#[derive(Debug, Clone, Default)]
pub struct ColumnLayout {
    visibility: HashMap<String, bool>,
    widths: HashMap<String, u16>,
    resizable: bool,
}

impl ColumnLayout {
    pub fn new(columns: &[ColumnSpec], resizable: bool) -> Self {
        let visibility = columns
            .iter()
            .filter_map(|c| c.visible.map(|v| (c.data_index.clone(), v)))
            .collect();
        Self {
            visibility,
            widths: HashMap::new(),
            resizable,
        }
    }

    pub fn is_visible(&self, column_key: &str) -> bool {
        self.visibility.get(column_key).copied().unwrap_or(true)
    }

    /// Toggling an undeclared column hides it; a declared one flips.
    /// Returns the new effective visibility.
    pub fn toggle_visibility(&mut self, column_key: &str) -> bool {
        let next = match self.visibility.get(column_key) {
            Some(current) => !current,
            None => false,
        };
        self.visibility.insert(column_key.to_string(), next);
        debug!(target: "columns", "column {} now {}", column_key, if next { "shown" } else { "hidden" });
        next
    }

    /// Columns offered in the visibility toggle list. The operations
    /// column is reserved and excluded.
    pub fn toggleable<'a>(&self, columns: &'a [ColumnSpec]) -> Vec<&'a ColumnSpec> {
        columns.iter().filter(|c| !c.is_operations()).collect()
    }

    /// Display order: visible columns in declaration order, with the
    /// operations column always last.
    pub fn ordered<'a>(&self, columns: &'a [ColumnSpec]) -> Vec<&'a ColumnSpec> {
        let mut shown: Vec<&ColumnSpec> = columns
            .iter()
            .filter(|c| !c.is_operations() && self.is_visible(&c.data_index))
            .collect();
        shown.extend(columns.iter().filter(|c| c.is_operations()));
        shown
    }

    pub fn width_of(&self, column_key: &str) -> Option<u16> {
        self.widths.get(column_key).copied()
    }

    /// Begin a resize drag. `None` when the resize capability is off.
    ///
    /// The returned guard applies width updates live and releases the
    /// gesture unconditionally when dropped, the analogue of
    /// document-scoped pointer listeners that must detach on release
    /// even if the pointer left the viewport.
    pub fn begin_resize(&mut self, column_key: &str) -> Option<ResizeDrag<'_>> {
        if !self.resizable {
            return None;
        }
        debug!(target: "columns", "resize started on {}", column_key);
        Some(ResizeDrag {
            layout: self,
            column_key: column_key.to_string(),
        })
    }
}

/// An in-progress column resize gesture.
pub struct ResizeDrag<'a> {
    layout: &'a mut ColumnLayout,
    column_key: String,
}

impl ResizeDrag<'_> {
    pub fn column_key(&self) -> &str {
        &self.column_key
    }

    /// Track the pointer: apply the new width, floor-clamped.
    pub fn drag_to(&mut self, width: u16) {
        self.layout
            .widths
            .insert(self.column_key.clone(), width.max(MIN_COLUMN_WIDTH));
    }
}

impl Drop for ResizeDrag<'_> {
    fn drop(&mut self) {
        debug!(target: "columns", "resize released on {}", self.column_key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new("name", "Name"),
            ColumnSpec::new("age", "Age").with_visible(true),
            ColumnSpec::new("notes", "Notes").with_visible(false),
            ColumnSpec::new("actions", "Actions"),
        ]
    }

    #[test]
    fn undeclared_visibility_behaves_as_shown() {
        let specs = columns();
        let layout = ColumnLayout::new(&specs, true);
        assert!(layout.is_visible("name"));
        assert!(layout.is_visible("age"));
        assert!(!layout.is_visible("notes"));
    }

    #[test]
    fn toggling_undeclared_hides_then_flips() {
        let specs = columns();
        let mut layout = ColumnLayout::new(&specs, true);

        assert!(!layout.toggle_visibility("name"));
        assert!(!layout.is_visible("name"));
        assert!(layout.toggle_visibility("name"));
        assert!(layout.is_visible("name"));
    }

    #[test]
    fn operations_column_is_not_toggleable_and_orders_last() {
        let specs = columns();
        let layout = ColumnLayout::new(&specs, true);

        let toggleable: Vec<&str> = layout
            .toggleable(&specs)
            .iter()
            .map(|c| c.data_index.as_str())
            .collect();
        assert_eq!(toggleable, vec!["name", "age", "notes"]);

        let ordered: Vec<&str> = layout
            .ordered(&specs)
            .iter()
            .map(|c| c.data_index.as_str())
            .collect();
        assert_eq!(ordered, vec!["name", "age", "actions"]);
    }

    #[test]
    fn resize_clamps_to_minimum_width() {
        let specs = columns();
        let mut layout = ColumnLayout::new(&specs, true);

        {
            let mut drag = layout.begin_resize("name").expect("resizable");
            drag.drag_to(400);
            drag.drag_to(8);
        }
        assert_eq!(layout.width_of("name"), Some(MIN_COLUMN_WIDTH));
    }

    #[test]
    fn resize_disabled_when_capability_is_off() {
        let specs = columns();
        let mut layout = ColumnLayout::new(&specs, false);
        assert!(layout.begin_resize("name").is_none());
    }
}
