use anyhow::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::TableConfig;
use crate::data::arena::{find_row, find_row_mut, RowArena};
use crate::data::column::ColumnSpec;
use crate::data::filter::{ColumnFilter, FilterSet, SearchFilter};
use crate::data::interchange::{self, Record, RecordCodec};
use crate::data::row::{Row, RowId};
use crate::data::sort::{sort_forest, SortState};
use crate::fetch::{FetchDirection, FetchRequest, FetchResponse, PageFetcher};
use crate::state::columns::{ColumnLayout, ResizeDrag};
use crate::state::editor::{CellAddress, CellEditor};
use crate::state::expansion::ExpansionState;
use crate::state::navigation::{NavOutcome, Navigator};
use crate::state::selection::SelectionState;
use crate::table::events::TableHooks;
use crate::table::pagination::{ClientPager, CursorPager, PageMode};

/// What a completed fetch does to the cursor position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchKind {
    Reload,
    First,
    Next,
    Prev,
}

#[derive(Debug, Clone)]
struct PendingFetch {
    seq: u64,
    cursor: Option<String>,
    kind: FetchKind,
}

/// The owning per-mount table state.
///
/// Holds the untouched `original_data` and derives `filtered_data`
/// (filters + sort) and the page slice from it; selection, expansion,
/// editing, and keyboard focus live alongside the projection pipeline,
/// addressed by row id. One instance per table mount, constructed
/// with the initial configuration and dropped with the view; never
/// shared, never global.
pub struct TableController {
    config: TableConfig,
    columns: Vec<ColumnSpec>,
    layout: ColumnLayout,

    original_data: Vec<Row>,
    filtered_data: Vec<Row>,
    arena: RowArena,

    filters: FilterSet,
    search: Option<SearchFilter>,
    sort: SortState,
    mode: PageMode,

    selection: SelectionState,
    expansion: ExpansionState,
    editor: CellEditor,
    navigator: Navigator,

    fetcher: Option<Box<dyn PageFetcher>>,
    hooks: Option<Box<dyn TableHooks>>,
    issued_seq: u64,
    pending: Option<PendingFetch>,
}

impl TableController {
    /// The paging strategy is decided once, here: cursor paging iff a
    /// fetch collaborator is supplied without a non-empty initial
    /// dataset; otherwise everything is client-side.
    pub fn new(
        columns: Vec<ColumnSpec>,
        config: TableConfig,
        rows: Vec<Row>,
        fetcher: Option<Box<dyn PageFetcher>>,
    ) -> Self {
        let cursor_mode = fetcher.is_some() && rows.is_empty();
        let mode = if cursor_mode {
            PageMode::Cursor(CursorPager::new(config.page_size))
        } else {
            PageMode::Client(ClientPager::new(config.page_size))
        };
        info!(
            target: "table",
            "table mounted: {} columns, {} initial rows, {} paging",
            columns.len(),
            rows.len(),
            if cursor_mode { "cursor" } else { "client" }
        );

        let layout = ColumnLayout::new(&columns, config.resizable);
        let arena = RowArena::build(&rows);
        let mut controller = Self {
            config,
            columns,
            layout,
            original_data: rows,
            filtered_data: Vec::new(),
            arena,
            filters: FilterSet::new(),
            search: None,
            sort: SortState::new(),
            mode,
            selection: SelectionState::new(),
            expansion: ExpansionState::new(),
            editor: CellEditor::new(),
            navigator: Navigator::new(),
            fetcher,
            hooks: None,
            issued_seq: 0,
            pending: None,
        };

        if controller.mode.is_cursor() {
            controller.run_fetch(None, FetchDirection::Forward, FetchKind::First);
        } else {
            controller.reproject();
        }
        controller
    }

    pub fn with_rows(columns: Vec<ColumnSpec>, config: TableConfig, rows: Vec<Row>) -> Self {
        Self::new(columns, config, rows, None)
    }

    pub fn with_fetcher(
        columns: Vec<ColumnSpec>,
        config: TableConfig,
        fetcher: Box<dyn PageFetcher>,
    ) -> Self {
        Self::new(columns, config, Vec::new(), Some(fetcher))
    }

    pub fn set_hooks(&mut self, hooks: Box<dyn TableHooks>) {
        self.hooks = Some(hooks);
    }

    // ---- data supply ---------------------------------------------------

    /// Wholesale dataset replacement. Selection, expansion, and the
    /// active cell survive only by id coincidence; ids that vanished
    /// are not pruned.
    pub fn set_rows(&mut self, rows: Vec<Row>) {
        self.original_data = rows;
        self.arena = RowArena::build(&self.original_data);
        self.reproject();
    }

    pub fn original_rows(&self) -> &[Row] {
        &self.original_data
    }

    pub fn filtered_rows(&self) -> &[Row] {
        &self.filtered_data
    }

    /// Recompute `filtered_data` and the page window from the
    /// untouched original. Pure derivation, called after every
    /// filter, sort, page, or data change.
    fn reproject(&mut self) {
        let Self {
            mode,
            original_data,
            filtered_data,
            filters,
            search,
            sort,
            ..
        } = self;

        match mode {
            PageMode::Client(pager) => {
                let mut rows: Vec<Row> = original_data
                    .iter()
                    .filter(|row| {
                        filters.matches(row)
                            && search.as_ref().map_or(true, |s| s.matches(row))
                    })
                    .cloned()
                    .collect();
                if let Some(column) = sort.column.clone() {
                    sort_forest(&mut rows, &column, sort.order);
                }
                *filtered_data = rows;
                let total = filtered_data.len();
                pager.set_page(pager.page, total);
            }
            PageMode::Cursor(_) => {
                // the collaborator already filtered and windowed
                *filtered_data = original_data.clone();
            }
        }

        let rows = self.visible_page_rows().len();
        let columns = self.layout.ordered(&self.columns).len();
        self.navigator.clamp_to(rows, columns);
    }

    // ---- projection queries --------------------------------------------

    /// Top-level rows of the current page.
    pub fn page_rows(&self) -> &[Row] {
        match &self.mode {
            PageMode::Client(pager) => {
                let (start, end) = pager.slice_bounds(self.filtered_data.len());
                &self.filtered_data[start..end]
            }
            PageMode::Cursor(_) => &self.filtered_data,
        }
    }

    /// The rendered sequence: page rows flattened depth-first, pausing
    /// at collapsed subtrees.
    pub fn visible_page_rows(&self) -> Vec<&Row> {
        let mut out = Vec::new();
        for row in self.page_rows() {
            self.collect_visible(row, &mut out);
        }
        out
    }

    fn collect_visible<'a>(&'a self, row: &'a Row, out: &mut Vec<&'a Row>) {
        out.push(row);
        if self.expansion.is_expanded(&row.id) {
            for child in &row.children {
                self.collect_visible(child, out);
            }
        }
    }

    pub fn total_rows(&self) -> usize {
        match &self.mode {
            PageMode::Client(_) => self.filtered_data.len(),
            PageMode::Cursor(pager) => pager.total,
        }
    }

    pub fn page(&self) -> usize {
        self.mode.page()
    }

    pub fn page_size(&self) -> usize {
        self.mode.page_size()
    }

    /// Total page count; unknowable under cursor paging.
    pub fn page_count(&self) -> Option<usize> {
        match &self.mode {
            PageMode::Client(pager) => Some(pager.page_count(self.filtered_data.len())),
            PageMode::Cursor(_) => None,
        }
    }

    pub fn is_cursor_mode(&self) -> bool {
        self.mode.is_cursor()
    }

    pub fn has_next_page(&self) -> bool {
        match &self.mode {
            PageMode::Client(pager) => pager.page < pager.page_count(self.filtered_data.len()),
            PageMode::Cursor(pager) => pager.has_next,
        }
    }

    pub fn has_prev_page(&self) -> bool {
        match &self.mode {
            PageMode::Client(pager) => pager.page > 1,
            PageMode::Cursor(pager) => pager.has_prev,
        }
    }

    // ---- filters, search, sort -----------------------------------------

    pub fn set_column_filter(&mut self, column: &str, filter: ColumnFilter) {
        self.filters.set(column, filter);
        self.on_filter_change();
    }

    /// Clearing a filter restores from the original data (through the
    /// sort engine when a sort is active).
    pub fn clear_column_filter(&mut self, column: &str) {
        self.filters.remove(column);
        self.on_filter_change();
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
        self.on_filter_change();
    }

    pub fn column_filter(&self, column: &str) -> Option<&ColumnFilter> {
        self.filters.get(column)
    }

    /// Global search across every primitive field, independent of the
    /// per-column filters. An empty pattern clears it.
    pub fn set_search(&mut self, pattern: &str) {
        self.search = if pattern.is_empty() {
            None
        } else {
            Some(SearchFilter::new(pattern))
        };
        self.on_filter_change();
    }

    fn on_filter_change(&mut self) {
        if self.mode.is_cursor() {
            if let PageMode::Cursor(pager) = &mut self.mode {
                pager.reset();
            }
            self.run_fetch(None, FetchDirection::Forward, FetchKind::First);
        } else {
            self.reproject();
        }
    }

    /// Header activation: ascending → descending → cleared. Clearing
    /// restores the pre-sort ordering from the original data.
    pub fn cycle_sort(&mut self, column: &str) {
        self.sort.cycle_column(column);
        self.reproject();
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    // ---- pagination -----------------------------------------------------

    pub fn next_page(&mut self) {
        match &mut self.mode {
            PageMode::Client(pager) => {
                let total = self.filtered_data.len();
                pager.next(total);
            }
            PageMode::Cursor(pager) => {
                if !pager.has_next {
                    return;
                }
                let token = pager.next_cursor.clone();
                self.run_fetch(token, FetchDirection::Forward, FetchKind::Next);
            }
        }
    }

    pub fn prev_page(&mut self) {
        match &mut self.mode {
            PageMode::Client(pager) => pager.prev(),
            PageMode::Cursor(pager) => {
                if !pager.has_prev {
                    return;
                }
                let token = pager.prev_cursor.clone();
                self.run_fetch(token, FetchDirection::Backward, FetchKind::Prev);
            }
        }
    }

    pub fn first_page(&mut self) {
        match &mut self.mode {
            PageMode::Client(pager) => pager.first(),
            PageMode::Cursor(_) => {
                self.run_fetch(None, FetchDirection::Forward, FetchKind::First);
            }
        }
    }

    /// Client mode only; the last page is unknowable under cursor
    /// paging, so this is a no-op there.
    pub fn last_page(&mut self) {
        if let PageMode::Client(pager) = &mut self.mode {
            let total = self.filtered_data.len();
            pager.last(total);
        }
    }

    /// Bounded page jump; client mode only.
    pub fn set_page(&mut self, page: usize) {
        if let PageMode::Client(pager) = &mut self.mode {
            let total = self.filtered_data.len();
            pager.set_page(page, total);
        }
    }

    /// Changing the page size always restarts from the first page; in
    /// cursor mode it refetches from cursor = none.
    pub fn set_page_size(&mut self, page_size: usize) {
        match &mut self.mode {
            PageMode::Client(pager) => {
                pager.set_page_size(page_size);
                self.reproject();
            }
            PageMode::Cursor(pager) => {
                pager.page_size = page_size.max(1);
                pager.reset();
                self.run_fetch(None, FetchDirection::Forward, FetchKind::First);
            }
        }
    }

    /// Re-run the current projection (client) or refetch the current
    /// page (cursor).
    pub fn refresh(&mut self) {
        match &self.mode {
            PageMode::Client(_) => self.reproject(),
            PageMode::Cursor(pager) => {
                let cursor = pager.cursor.clone();
                self.run_fetch(cursor, FetchDirection::Forward, FetchKind::Reload);
            }
        }
    }

    // ---- fetch plumbing -------------------------------------------------

    /// Tag a request for an externally driven (async) fetch. The host
    /// calls the collaborator itself and hands the outcome to
    /// [`apply_fetch`](Self::apply_fetch) with the returned tag.
    pub fn begin_fetch(
        &mut self,
        cursor: Option<String>,
        direction: FetchDirection,
    ) -> (u64, FetchRequest) {
        self.begin_tagged(cursor, direction, FetchKind::Reload)
    }

    fn begin_tagged(
        &mut self,
        cursor: Option<String>,
        direction: FetchDirection,
        kind: FetchKind,
    ) -> (u64, FetchRequest) {
        self.issued_seq += 1;
        let request = FetchRequest {
            cursor: cursor.clone(),
            limit: self.mode.page_size(),
            direction,
            filter: self.filters.to_request_expr(),
        };
        self.pending = Some(PendingFetch {
            seq: self.issued_seq,
            cursor,
            kind,
        });
        (self.issued_seq, request)
    }

    /// Complete a fetch. Responses older than the latest issued
    /// request are discarded; failures are contained here and
    /// normalized to an empty page (the host surfaces them, not the
    /// engine). Returns whether the response was applied.
    pub fn apply_fetch(&mut self, seq: u64, outcome: Result<FetchResponse>) -> bool {
        if seq < self.issued_seq {
            debug!(target: "fetch", "discarding stale response (seq {} < {})", seq, self.issued_seq);
            return false;
        }

        let response = match outcome {
            Ok(response) => response,
            Err(error) => {
                warn!(target: "fetch", "page fetch failed, presenting empty page: {:#}", error);
                FetchResponse::empty()
            }
        };

        let pending = self.pending.take().filter(|p| p.seq == seq);
        if let PageMode::Cursor(pager) = &mut self.mode {
            if let Some(pending) = pending {
                pager.cursor = pending.cursor;
                match pending.kind {
                    FetchKind::Next => pager.page += 1,
                    FetchKind::Prev => pager.page = pager.page.saturating_sub(1).max(1),
                    FetchKind::First => pager.page = 1,
                    FetchKind::Reload => {}
                }
            }
            pager.absorb(&response);
        }

        self.original_data = response.items;
        self.arena = RowArena::build(&self.original_data);
        self.reproject();
        true
    }

    fn run_fetch(&mut self, cursor: Option<String>, direction: FetchDirection, kind: FetchKind) {
        if self.fetcher.is_none() {
            return;
        }
        let (seq, request) = self.begin_tagged(cursor, direction, kind);
        let outcome = match &self.fetcher {
            Some(fetcher) => fetcher.fetch(&request),
            None => return,
        };
        self.apply_fetch(seq, outcome);
    }

    // ---- selection ------------------------------------------------------

    /// Toggle one row; the new state cascades to every transitive
    /// descendant. Unknown ids are no-ops.
    pub fn toggle_row_selection(&mut self, id: &RowId) {
        if !self.arena.contains(id) {
            return;
        }
        self.selection.toggle(&self.arena, id);
        if let Some(hooks) = &mut self.hooks {
            if let Some(row) = find_row(&self.original_data, id) {
                hooks.on_select_row(row);
            }
        }
    }

    /// Select every row of the current filtered forest: the exact
    /// depth-first flattening, expansion state notwithstanding.
    pub fn select_all_current(&mut self) {
        let forest = self.filtered_data.clone();
        self.selection.select_all(&forest);
        if let Some(hooks) = &mut self.hooks {
            hooks.on_select_all_rows(&forest);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection.select_all(&[]);
        if let Some(hooks) = &mut self.hooks {
            hooks.on_select_all_rows(&[]);
        }
    }

    pub fn is_row_selected(&self, id: &RowId) -> bool {
        self.selection.is_selected(id)
    }

    pub fn selected_count(&self) -> usize {
        self.selection.selected_count()
    }

    pub fn is_all_selected(&self) -> bool {
        self.selection.all_selected(&self.arena)
    }

    // ---- expansion ------------------------------------------------------

    pub fn toggle_row_expanded(&mut self, id: &RowId) {
        if !self.arena.contains(id) {
            return;
        }
        self.expansion.toggle(id);
    }

    pub fn expand_all(&mut self) {
        self.expansion.expand_all(&self.arena, self.config.max_expand_depth);
    }

    pub fn collapse_all(&mut self) {
        self.expansion.collapse_all();
    }

    pub fn is_row_expanded(&self, id: &RowId) -> bool {
        self.expansion.is_expanded(id)
    }

    // ---- editing --------------------------------------------------------

    /// Double-activation on a cell. Entry requires the column to be
    /// editable; unknown rows or columns are no-ops.
    pub fn begin_edit(&mut self, id: &RowId, column_key: &str) -> bool {
        let Some(column) = self
            .columns
            .iter()
            .find(|c| c.data_index == column_key)
            .cloned()
        else {
            return false;
        };
        let Some(row) = find_row(&self.original_data, id) else {
            return false;
        };
        let committed = row.get(column_key).cloned().unwrap_or(Value::Null);
        self.editor.begin(&column, id.clone(), committed)
    }

    pub fn edit_draft(&mut self, text: &str) {
        self.editor.set_draft(text);
    }

    pub fn editing_cell(&self) -> Option<&CellAddress> {
        self.editor.editing_cell()
    }

    /// Commit trigger (focus loss or Enter). Fires the host callback
    /// only for a changed draft; when table-wide editing is enabled the
    /// in-memory row is patched optimistically. Commits against rows
    /// removed since editing began are no-ops.
    pub fn commit_edit(&mut self) -> bool {
        let Some(cell) = self.editor.editing_cell().cloned() else {
            return false;
        };
        let Some(column) = self
            .columns
            .iter()
            .find(|c| c.data_index == cell.column_key)
            .cloned()
        else {
            self.editor.cancel();
            return false;
        };
        let Some(commit) = self.editor.commit(&column) else {
            return false;
        };

        if !self.arena.contains(&commit.cell.row_id) {
            return false;
        }

        if self.config.editable {
            if let Some(row) = find_row_mut(&mut self.original_data, &commit.cell.row_id) {
                row.set(commit.cell.column_key.clone(), commit.value.clone());
            }
            if let Some(row) = find_row_mut(&mut self.filtered_data, &commit.cell.row_id) {
                row.set(commit.cell.column_key.clone(), commit.value.clone());
            }
        }

        if let Some(hooks) = &mut self.hooks {
            hooks.on_cell_value_change(&commit.cell.column_key, &commit.value, &commit.cell.row_id);
        }
        true
    }

    /// Escape: discard the draft without a callback.
    pub fn cancel_edit(&mut self) {
        self.editor.cancel();
    }

    // ---- keyboard -------------------------------------------------------

    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> NavOutcome {
        let rows = self.visible_page_rows().len();
        let columns = self.layout.ordered(&self.columns).len();
        self.navigator.handle_key(key, modifiers, rows, columns)
    }

    /// The single keyboard-focused cell, resolved against the rendered
    /// projection.
    pub fn active_cell(&self) -> Option<CellAddress> {
        let (row_index, column_index) = self.navigator.active_position()?;
        let rows = self.visible_page_rows();
        let columns = self.layout.ordered(&self.columns);
        Some(CellAddress {
            row_id: rows.get(row_index)?.id.clone(),
            column_key: columns.get(column_index)?.data_index.clone(),
        })
    }

    // ---- columns --------------------------------------------------------

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Columns in display order: visible first, operations last.
    pub fn visible_columns(&self) -> Vec<&ColumnSpec> {
        self.layout.ordered(&self.columns)
    }

    /// Toggle a column's visibility; the reserved operations column is
    /// excluded and stays shown. Returns the new effective visibility.
    pub fn toggle_column_visibility(&mut self, column_key: &str) -> bool {
        let reserved = self
            .columns
            .iter()
            .any(|c| c.data_index == column_key && c.is_operations());
        if reserved {
            return true;
        }
        let shown = self.layout.toggle_visibility(column_key);

        let rows = self.visible_page_rows().len();
        let columns = self.layout.ordered(&self.columns).len();
        self.navigator.clamp_to(rows, columns);
        shown
    }

    pub fn column_width(&self, column_key: &str) -> Option<u16> {
        self.layout.width_of(column_key)
    }

    /// Begin a resize drag; `None` when resizing is disabled. The
    /// guard releases the gesture when dropped.
    pub fn begin_column_resize(&mut self, column_key: &str) -> Option<ResizeDrag<'_>> {
        self.layout.begin_resize(column_key)
    }

    // ---- interchange ----------------------------------------------------

    /// Flat export records of the filtered forest: visible data
    /// columns in display order, operations column excluded, column
    /// parsers applied.
    pub fn export_records(&self) -> Vec<Record> {
        let columns: Vec<&ColumnSpec> = self
            .layout
            .ordered(&self.columns)
            .into_iter()
            .filter(|c| !c.is_operations())
            .collect();
        interchange::export_records(&self.filtered_data, &columns)
    }

    /// Hand the export records to an encoder collaborator; the payload
    /// passes through untouched.
    pub fn export_with(&self, codec: &dyn RecordCodec) -> Result<String> {
        let columns: Vec<&ColumnSpec> = self
            .layout
            .ordered(&self.columns)
            .into_iter()
            .filter(|c| !c.is_operations())
            .collect();
        let headers: Vec<String> = columns.iter().map(|c| c.data_index.clone()).collect();
        codec.encode(&headers, &interchange::export_records(&self.filtered_data, &columns))
    }

    /// Replace the dataset from decoded records.
    pub fn import_records(&mut self, records: Vec<Record>) {
        self.set_rows(interchange::import_records(records));
    }
}
