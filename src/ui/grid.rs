//! The grid host surface.
//!
//! `Grid` owns every arena (records, columns, display rows) plus the
//! viewport and the row factory, and is the only thing a host talks to.
//! Data loads, pipeline changes and resizes all end the same way: the
//! display sequence is rebuilt if needed, columns are laid out, and the
//! window is re-filled.

use std::ops::Range;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::data::capabilities::Capabilities;
use crate::data::column::{ColumnDefinition, ColumnSet};
use crate::data::display_row::{DisplayKind, DisplayRow, DisplaySequence};
use crate::data::pipeline::{
    DisplayPipeline, FilterSpec, GroupSpec, PipelineStage, SortOrder, SortSpec,
};
use crate::data::record::{Record, RowStore};
use crate::error::{GridError, Result};
use crate::ui::row_factory::{RenderPass, RowFactory};
use crate::ui::scroll_coordinator::{HorizontalSync, ScrollCoordinator};
use crate::ui::viewport::column_width_solver::{
    natural_width, sample_indices, ColumnWidthSolver, LayoutMode,
};
use crate::ui::viewport::window::{
    FillRequest, RowPosition, ScrollOutcome, ViewportWindow, WindowState,
};

/// Assembles configuration, columns and capabilities once
pub struct GridBuilder {
    config: Config,
    columns: Vec<ColumnDefinition>,
    capabilities: Capabilities,
    width: u32,
    height: u32,
}

impl GridBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            columns: Vec::new(),
            capabilities: Capabilities::builtin(),
            width: 0,
            height: 0,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn columns(mut self, columns: Vec<ColumnDefinition>) -> Self {
        self.columns = columns;
        self
    }

    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn build<F: RowFactory>(self, factory: F) -> Result<Grid<F>> {
        self.config.validate()?;
        let columns = ColumnSet::build(
            self.columns,
            &self.capabilities,
            self.config.layout.default_min_width,
        )?;

        let mut window = ViewportWindow::new(self.config.viewport.clone());
        window.set_container_height(self.height);

        info!(
            target: "grid",
            "Grid built: {} columns, {}x{}, {:?} layout",
            columns.len(),
            self.width,
            self.height,
            self.config.layout.mode
        );

        let mut grid = Grid {
            solver: ColumnWidthSolver::new(self.config.layout.mode),
            config: self.config,
            capabilities: self.capabilities,
            store: RowStore::new(),
            columns,
            pipeline: DisplayPipeline::new(),
            window,
            scroll: ScrollCoordinator::new(),
            factory,
            width: self.width,
            height: self.height,
            vertical_overflow: false,
        };
        grid.rebuild(PipelineStage::Filter, false);
        Ok(grid)
    }
}

impl Default for GridBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Grid<F: RowFactory> {
    config: Config,
    capabilities: Capabilities,
    store: RowStore,
    columns: ColumnSet,
    pipeline: DisplayPipeline,
    window: ViewportWindow,
    scroll: ScrollCoordinator,
    solver: ColumnWidthSolver,
    factory: F,
    width: u32,
    height: u32,
    /// Content is taller than the container, so a scrollbar takes width
    vertical_overflow: bool,
}

impl<F: RowFactory> Grid<F> {
    /// Load a new set of records
    pub fn set_data(&mut self, records: Vec<Record>, preserve_scroll: bool) {
        info!(target: "grid", "Loading {} records (preserve_scroll={})", records.len(), preserve_scroll);

        let anchor = preserve_scroll.then(|| self.window.anchor(self.pipeline.display_rows()));
        self.detach_rows();

        self.store.load(records);
        self.pipeline.reset();
        self.window.reset_heights();
        self.pipeline
            .refresh(&self.store, &self.columns, PipelineStage::Filter);
        self.window.adopt_sequence(self.pipeline.display_rows());
        self.measure_columns();
        self.layout_columns();
        self.fill_at(anchor);
    }

    /// Replace the column definitions
    pub fn set_columns(&mut self, definitions: Vec<ColumnDefinition>) -> Result<()> {
        let columns = ColumnSet::build(
            definitions,
            &self.capabilities,
            self.config.layout.default_min_width,
        )?;
        self.detach_rows();
        self.columns = columns;
        self.rebuild(PipelineStage::Sort, false);
        Ok(())
    }

    /// The container changed size
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        debug!(target: "grid", "Resize {}x{} -> {}x{}", self.width, self.height, width, height);
        self.width = width;
        self.height = height;
        self.window.set_container_height(height);
        self.layout_columns();
        self.rerender();
    }

    /// Re-lay out columns; `force` also re-renders every materialized row
    pub fn redraw(&mut self, force: bool) {
        self.measure_columns();
        if self.layout_columns() || force {
            self.rerender();
        }
    }

    pub fn scroll_vertical_to(&mut self, scroll_top: u32) -> Option<ScrollOutcome> {
        let mut pass = RenderPass::new(
            self.pipeline.sequence_mut(),
            &mut self.factory,
            &self.store,
            &self.columns,
        );
        self.scroll
            .scroll_vertical(&mut self.window, &mut pass, scroll_top)
    }

    pub fn scroll_vertical_by(&mut self, delta: i64) -> Option<ScrollOutcome> {
        let mut pass = RenderPass::new(
            self.pipeline.sequence_mut(),
            &mut self.factory,
            &self.store,
            &self.columns,
        );
        self.scroll.scroll_by(&mut self.window, &mut pass, delta)
    }

    pub fn scroll_horizontal_to(&mut self, left: u32) -> HorizontalSync {
        self.scroll.scroll_horizontal(left)
    }

    /// Bring a display row into view; out of range indices are an error
    pub fn scroll_to_row(&mut self, index: usize, position: RowPosition, if_visible: bool) -> Result<()> {
        let mut pass = RenderPass::new(
            self.pipeline.sequence_mut(),
            &mut self.factory,
            &self.store,
            &self.columns,
        );
        let result = self
            .window
            .scroll_to_row(&mut pass, index, position, if_visible);
        self.scroll.sync_vertical(&self.window);
        if let Err(e) = &result {
            warn!(target: "grid", "Scroll to row rejected: {}", e);
        }
        result
    }

    pub fn set_filters(&mut self, filters: Vec<FilterSpec>) {
        for filter in &filters {
            if let Some(field) = filter.field() {
                if self.columns.by_field(field).is_none() {
                    warn!(target: "pipeline", "Filter on unknown column '{}'", field);
                }
            }
        }
        self.pipeline.set_filters(filters);
        self.rebuild(PipelineStage::Filter, false);
    }

    pub fn set_sort(&mut self, sorters: Vec<SortSpec>) {
        self.pipeline.set_sort(sorters);
        self.rebuild(PipelineStage::Sort, false);
    }

    /// Cycle the sort on one column: ascending, descending, off
    pub fn cycle_sort(&mut self, field: &str) -> Option<SortOrder> {
        let next = match self.pipeline.sorters().first() {
            Some(spec) if spec.field == field => match spec.order {
                SortOrder::Ascending => Some(SortOrder::Descending),
                SortOrder::Descending => None,
            },
            _ => Some(SortOrder::Ascending),
        };
        let sorters = next
            .map(|order| vec![SortSpec::new(field, order)])
            .unwrap_or_default();
        self.set_sort(sorters);
        next
    }

    pub fn set_group_by(&mut self, field: Option<&str>) {
        let footers = self.config.display.group_footers;
        self.pipeline
            .set_group_by(field.map(|f| GroupSpec::new(f).with_footers(footers)));
        self.rebuild(PipelineStage::Group, false);
    }

    /// Collapse or expand a group, keeping the scroll position
    pub fn toggle_group(&mut self, key: &str) -> bool {
        let collapsed = self.pipeline.toggle_group(key);
        self.rebuild(PipelineStage::Group, true);
        collapsed
    }

    pub fn set_page_size(&mut self, size: Option<usize>) {
        self.pipeline.set_page_size(size);
        self.rebuild(PipelineStage::Page, false);
    }

    pub fn set_page(&mut self, page: usize) {
        self.pipeline.set_page(page);
        self.rebuild(PipelineStage::Page, false);
    }

    pub fn set_layout_mode(&mut self, mode: LayoutMode) {
        self.solver.set_mode(mode);
        self.config.layout.mode = mode;
        self.layout_columns();
        self.rerender();
    }

    pub fn cycle_layout_mode(&mut self) -> LayoutMode {
        let mode = self.solver.mode().cycle();
        self.set_layout_mode(mode);
        mode
    }

    pub fn set_column_visible(&mut self, field: &str, visible: bool) -> Result<()> {
        self.columns.set_visible(field, visible)?;
        self.layout_columns();
        self.rerender();
        Ok(())
    }

    pub fn move_column(&mut self, field: &str, to_position: usize) -> Result<()> {
        self.columns.move_column(field, to_position)?;
        self.layout_columns();
        self.rerender();
        Ok(())
    }

    // Queries

    /// Display rows intersecting the viewport
    pub fn visible_range(&self) -> Range<usize> {
        self.window.visible_range(self.pipeline.display_rows())
    }

    pub fn materialized_range(&self) -> Range<usize> {
        self.window.state().rows.clone()
    }

    /// Visible display rows with their top edge relative to the viewport
    pub fn visible_rows(&self) -> Vec<(usize, i64)> {
        let rows = self.pipeline.display_rows();
        let scroll_top = self.window.scroll_top() as i64;
        self.visible_range()
            .filter_map(|idx| {
                self.window
                    .row_offset(rows, idx)
                    .map(|offset| (idx, offset as i64 - scroll_top))
            })
            .collect()
    }

    pub fn display_row_count(&self) -> usize {
        self.pipeline.display_rows().len()
    }

    pub fn data_row_count(&self) -> usize {
        self.store.len()
    }

    pub fn filtered_row_count(&self) -> usize {
        self.pipeline.filtered_count()
    }

    pub fn display_row(&self, index: usize) -> Option<&DisplayRow> {
        self.pipeline.display_rows().get(index)
    }

    pub fn display_rows(&self) -> &DisplaySequence {
        self.pipeline.display_rows()
    }

    pub fn column_width(&self, field: &str) -> Result<u32> {
        self.columns
            .by_field(field)
            .map(|c| if c.visible() { c.width } else { 0 })
            .ok_or_else(|| GridError::UnknownColumn(field.to_string()))
    }

    /// Widths of visible columns in display order
    pub fn column_widths(&self) -> Vec<(String, u32)> {
        self.columns
            .visible()
            .map(|c| (c.field().to_string(), c.width))
            .collect()
    }

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn window_state(&self) -> &WindowState {
        self.window.state()
    }

    pub fn window(&self) -> &ViewportWindow {
        &self.window
    }

    /// Placeholder text when there is nothing to display
    pub fn placeholder(&self) -> Option<&str> {
        if self.display_row_count() == 0 {
            Some(self.config.display.placeholder.as_str())
        } else {
            None
        }
    }

    pub fn scroll_height(&self) -> u32 {
        self.window.scroll_height()
    }

    pub fn scroll_top(&self) -> u32 {
        self.window.scroll_top()
    }

    pub fn horizontal(&self) -> HorizontalSync {
        self.scroll.horizontal()
    }

    /// Width available to columns
    pub fn layout_width(&self) -> u32 {
        if self.vertical_overflow {
            self.width.saturating_sub(self.config.layout.scrollbar_width)
        } else {
            self.width
        }
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.solver.mode()
    }

    pub fn sorters(&self) -> &[SortSpec] {
        self.pipeline.sorters()
    }

    pub fn page(&self) -> Option<usize> {
        self.pipeline.page()
    }

    pub fn page_count(&self) -> usize {
        self.pipeline.page_count()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Formatted text of one cell
    pub fn cell_text(&self, index: usize, field: &str) -> Result<String> {
        let count = self.display_row_count();
        let row = self
            .display_row(index)
            .ok_or(GridError::RowOutOfRange { index, count })?;
        let column = self
            .columns
            .by_field(field)
            .ok_or_else(|| GridError::UnknownColumn(field.to_string()))?;

        Ok(match &row.kind {
            DisplayKind::Data(id) => (column.formatter)(self.store.value(*id, field)),
            DisplayKind::GroupHeader { .. } | DisplayKind::GroupFooter { .. } => String::new(),
        })
    }

    fn detach_rows(&mut self) {
        let mut pass = RenderPass::new(
            self.pipeline.sequence_mut(),
            &mut self.factory,
            &self.store,
            &self.columns,
        );
        self.window.clear(&mut pass);
    }

    /// Re-run the pipeline from `stage` and re-fill
    fn rebuild(&mut self, stage: PipelineStage, keep_position: bool) {
        let anchor = keep_position.then(|| self.window.anchor(self.pipeline.display_rows()));
        self.detach_rows();
        self.pipeline.refresh(&self.store, &self.columns, stage);
        self.measure_columns();
        if self.layout_columns() {
            // carried heights were measured at the old widths
            for row in self.pipeline.sequence_mut().rows_mut() {
                row.deinitialize_height();
            }
        }
        self.window.adopt_sequence(self.pipeline.display_rows());
        self.fill_at(anchor);
    }

    fn fill_at(&mut self, anchor: Option<(usize, i64)>) {
        let request = match anchor {
            Some((index, offset)) if index > 0 || offset > 0 => FillRequest::aligned(index, offset),
            _ => FillRequest::at(0),
        };
        {
            let mut pass = RenderPass::new(
                self.pipeline.sequence_mut(),
                &mut self.factory,
                &self.store,
                &self.columns,
            );
            self.window.fill(&mut pass, request);
        }
        self.after_render();
    }

    fn rerender(&mut self) {
        {
            let mut pass = RenderPass::new(
                self.pipeline.sequence_mut(),
                &mut self.factory,
                &self.store,
                &self.columns,
            );
            self.window.rerender_rows(&mut pass);
        }
        self.after_render();
    }

    /// Scrollbar appearing or disappearing changes the layout width once
    fn after_render(&mut self) {
        self.scroll.sync_vertical(&self.window);
        let overflow = self.window.scroll_height() > self.height && self.height > 0;
        if overflow != self.vertical_overflow {
            self.vertical_overflow = overflow;
            if self.config.layout.scrollbar_width > 0 {
                debug!(target: "grid", "Vertical overflow {}: re-laying out", overflow);
                self.layout_columns();
                let mut pass = RenderPass::new(
                    self.pipeline.sequence_mut(),
                    &mut self.factory,
                    &self.store,
                    &self.columns,
                );
                self.window.rerender_rows(&mut pass);
                self.scroll.sync_vertical(&self.window);
            }
        }
    }

    /// Measure natural content widths from a sample of the display rows
    fn measure_columns(&mut self) {
        let padding = self.config.layout.cell_padding;
        let ids: Vec<_> = self
            .pipeline
            .display_rows()
            .iter()
            .filter_map(|r| r.row_id())
            .collect();
        let sample: Vec<_> = sample_indices(ids.len(), self.config.layout.sample_rows)
            .into_iter()
            .map(|i| ids[i])
            .collect();

        let measured: Vec<_> = self
            .columns
            .iter()
            .map(|column| {
                let cells: Vec<String> = sample
                    .iter()
                    .map(|id| (column.formatter)(self.store.value(*id, column.field())))
                    .collect();
                let width = natural_width(column.title(), cells.iter().map(String::as_str), padding);
                (column.id, width)
            })
            .collect();

        for (id, width) in measured {
            self.columns.set_natural_width(id, width);
        }
    }

    /// Solve and apply column widths; true when any width changed
    fn layout_columns(&mut self) -> bool {
        let width = self.layout_width();
        let specs = self.columns.specs(width);
        let result = self.solver.solve(width, &specs);
        let before: Vec<u32> = self.columns.iter().map(|c| c.width).collect();
        self.columns.apply_widths(&result.widths);
        self.scroll.set_widths(result.total(), width);

        if result.overflow(width) > 0 {
            debug!(target: "column_layout", "Columns overflow container by {}", result.overflow(width));
        }
        before != result.widths
    }
}
