#[cfg(test)]
mod tests {
    use datagrid_engine::{ColumnSpec, Row, RowId, TableConfig, TableController};

    fn columns() -> Vec<ColumnSpec> {
        vec![ColumnSpec::new("name", "Name")]
    }

    fn tree() -> Vec<Row> {
        vec![
            Row::new(1).with_field("name", "parent").with_children(vec![
                Row::new(2).with_field("name", "child a"),
                Row::new(3).with_field("name", "child b").with_children(vec![
                    Row::new(4).with_field("name", "grandchild"),
                ]),
            ]),
            Row::new(5).with_field("name", "loner"),
        ]
    }

    #[test]
    fn selecting_a_parent_selects_the_whole_subtree() {
        let mut controller = TableController::with_rows(columns(), TableConfig::default(), tree());

        controller.toggle_row_selection(&RowId::Int(1));
        for id in [1, 2, 3, 4] {
            assert!(controller.is_row_selected(&RowId::Int(id)), "id {} selected", id);
        }
        assert!(!controller.is_row_selected(&RowId::Int(5)));

        controller.toggle_row_selection(&RowId::Int(1));
        assert_eq!(controller.selected_count(), 0);
    }

    #[test]
    fn cascade_ignores_expansion_state() {
        let mut controller = TableController::with_rows(columns(), TableConfig::default(), tree());

        // everything stays collapsed; the cascade reaches hidden rows anyway
        controller.toggle_row_selection(&RowId::Int(1));
        assert!(controller.is_row_selected(&RowId::Int(4)));

        // and expanding afterwards changes nothing about selection
        controller.expand_all();
        assert_eq!(controller.selected_count(), 4);
    }

    #[test]
    fn deselecting_a_child_leaves_the_parent_alone() {
        let mut controller = TableController::with_rows(columns(), TableConfig::default(), tree());

        controller.toggle_row_selection(&RowId::Int(1));
        controller.toggle_row_selection(&RowId::Int(3));

        assert!(controller.is_row_selected(&RowId::Int(1)));
        assert!(controller.is_row_selected(&RowId::Int(2)));
        assert!(!controller.is_row_selected(&RowId::Int(3)));
        assert!(!controller.is_row_selected(&RowId::Int(4)));
    }

    #[test]
    fn select_all_includes_collapsed_descendants() {
        let mut controller = TableController::with_rows(columns(), TableConfig::default(), tree());

        controller.select_all_current();
        assert_eq!(controller.selected_count(), 5);
        assert!(controller.is_all_selected());

        controller.clear_selection();
        assert_eq!(controller.selected_count(), 0);
    }

    #[test]
    fn header_indicator_needs_every_row() {
        let mut controller = TableController::with_rows(columns(), TableConfig::default(), tree());

        controller.toggle_row_selection(&RowId::Int(1));
        assert!(!controller.is_all_selected());
        controller.toggle_row_selection(&RowId::Int(5));
        assert!(controller.is_all_selected());
    }

    #[test]
    fn expansion_governs_rendering_not_selection() {
        let mut controller = TableController::with_rows(columns(), TableConfig::default(), tree());

        // collapsed: only top-level rows render
        assert_eq!(controller.visible_page_rows().len(), 2);

        controller.toggle_row_expanded(&RowId::Int(1));
        assert_eq!(controller.visible_page_rows().len(), 4);

        controller.expand_all();
        assert_eq!(controller.visible_page_rows().len(), 5);

        controller.collapse_all();
        assert_eq!(controller.visible_page_rows().len(), 2);
        assert_eq!(controller.selected_count(), 0);
    }

    #[test]
    fn unknown_ids_are_no_ops() {
        let mut controller = TableController::with_rows(columns(), TableConfig::default(), tree());

        controller.toggle_row_selection(&RowId::Int(99));
        controller.toggle_row_expanded(&RowId::Int(99));
        assert_eq!(controller.selected_count(), 0);
        assert!(!controller.is_row_expanded(&RowId::Int(99)));
    }
}
