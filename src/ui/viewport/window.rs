//! Virtual row window.
//!
//! Only a contiguous range of display rows is materialized at a time. The
//! space taken by rows above and below that range is stood in for by a top
//! and a bottom pad, so that
//!
//! ```text
//! top_pad + Σ height(materialized) + bottom_pad == total_height
//! ```
//!
//! holds after every operation. `total_height` is what the scrollbar is
//! sized from. Pads start as estimates (average row height times row count)
//! and are rebased whenever an estimate runs out, always by moving
//! `total_height` and the scroll positions together so nothing on screen
//! jumps.
//!
//! Scrolling is steered from two remembered offsets: `scroll_pos_top` and
//! `scroll_pos_bottom`, the scroll offsets at which each edge of the window
//! was last brought into line. The distance from the current offset to
//! each of them decides whether rows are added or removed at that edge, or
//! whether the move is far enough to re-fill from scratch.

use std::ops::Range;
use tracing::{debug, info, trace};

use crate::config::{RenderMode, ViewportConfig};
use crate::data::display_row::{DisplayRow, DisplaySequence};
use crate::error::{GridError, Result};
use crate::ui::row_factory::{RenderPass, RowFactory};
use crate::ui::viewport::row_height::RowHeightModel;

/// Extra steering passes allowed when a render chain is cut short
const MAX_RESTEER: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
}

/// Where a revealed row should land in the viewport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowPosition {
    #[default]
    Top,
    Center,
    Bottom,
    /// Top if the row is above the viewport, bottom otherwise
    Nearest,
}

/// Arguments for a full fill
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FillRequest {
    /// First display row to show
    pub start: usize,
    /// Put `start` at the top of the viewport (plus `offset`) instead of
    /// keeping the current scroll offset
    pub force_align: bool,
    pub offset: i64,
}

impl FillRequest {
    pub fn at(start: usize) -> Self {
        Self {
            start,
            ..Default::default()
        }
    }

    pub fn aligned(start: usize, offset: i64) -> Self {
        Self {
            start,
            force_align: true,
            offset,
        }
    }
}

/// Geometry of the materialized window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowState {
    /// Materialized display rows; `top` is `rows.start`, `bottom` is `rows.end - 1`
    pub rows: Range<usize>,
    pub top_pad: u32,
    pub bottom_pad: u32,
    pub scroll_top: u32,
    pub scroll_pos_top: i64,
    pub scroll_pos_bottom: i64,
    pub estimated_row_height: u32,
    pub total_height: u32,
}

impl WindowState {
    pub fn top(&self) -> usize {
        self.rows.start
    }

    /// Last materialized row, `None` for an empty window
    pub fn bottom(&self) -> Option<usize> {
        self.rows.end.checked_sub(1).filter(|b| *b >= self.rows.start)
    }

    pub fn materialized(&self) -> usize {
        self.rows.len()
    }
}

/// What one vertical scroll did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOutcome {
    pub direction: ScrollDirection,
    pub jumped: bool,
    pub added: usize,
    pub removed: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Edge {
    Top,
    Bottom,
    Fill,
}

pub struct ViewportWindow {
    config: ViewportConfig,
    heights: RowHeightModel,
    state: WindowState,
    container_height: u32,
    window_buffer: u32,
    /// Rows added since the last normalization pass
    pending: Vec<(usize, Edge)>,
    /// Set when the last extend or trim stopped at `max_render_chain`
    chain_cut: bool,
}

impl ViewportWindow {
    pub fn new(config: ViewportConfig) -> Self {
        let heights = RowHeightModel::new(config.default_row_height);
        let state = WindowState {
            estimated_row_height: heights.average(),
            ..Default::default()
        };
        Self {
            window_buffer: config.window_buffer.unwrap_or(0),
            config,
            heights,
            state,
            container_height: 0,
            pending: Vec::new(),
            chain_cut: false,
        }
    }

    pub fn state(&self) -> &WindowState {
        &self.state
    }

    pub fn config(&self) -> &ViewportConfig {
        &self.config
    }

    pub fn heights(&self) -> &RowHeightModel {
        &self.heights
    }

    pub fn container_height(&self) -> u32 {
        self.container_height
    }

    pub fn window_buffer(&self) -> u32 {
        self.window_buffer
    }

    pub fn scroll_top(&self) -> u32 {
        self.state.scroll_top
    }

    /// Full scrollable extent
    pub fn scroll_height(&self) -> u32 {
        self.state.total_height
    }

    pub fn max_scroll(&self) -> u32 {
        self.state.total_height.saturating_sub(self.container_height)
    }

    /// Every row is materialized: basic mode, or no height to window over
    pub fn is_classic(&self) -> bool {
        self.config.render_mode == RenderMode::Basic || self.container_height == 0
    }

    /// New container height; the buffer follows it unless configured
    pub fn set_container_height(&mut self, height: u32) {
        self.container_height = height;
        self.window_buffer = self.config.window_buffer.unwrap_or(height);
        debug!(target: "viewport", "Container height {} (window buffer {})", height, self.window_buffer);
    }

    pub fn set_config(&mut self, config: ViewportConfig) {
        self.config = config;
        self.window_buffer = self.config.window_buffer.unwrap_or(self.container_height);
    }

    /// Tear down every materialized row and forget the geometry
    pub fn clear<F: RowFactory + ?Sized>(&mut self, pass: &mut RenderPass<'_, F>) {
        self.teardown_all(pass);
        self.pending.clear();
        let average = self.heights.average();
        self.state = WindowState {
            estimated_row_height: average,
            ..Default::default()
        };
    }

    /// Start over for a new data set
    pub fn reset_heights(&mut self) {
        self.heights.reset();
        self.state.estimated_row_height = self.heights.average();
    }

    /// Recount measurements after the pipeline replaced the sequence
    pub fn adopt_sequence(&mut self, rows: &DisplaySequence) {
        self.heights.rebuild(rows);
    }

    /// Materialize a window starting at `request.start`
    pub fn fill<F: RowFactory + ?Sized>(&mut self, pass: &mut RenderPass<'_, F>, request: FillRequest) {
        self.teardown_all(pass);
        self.pending.clear();

        let len = pass.len();
        let prev_total = self.state.total_height;

        if len == 0 {
            let average = self.heights.average();
            self.state = WindowState {
                estimated_row_height: average,
                ..Default::default()
            };
            debug!(target: "viewport", "Fill over empty sequence");
            return;
        }

        if self.is_classic() {
            self.fill_classic(pass);
            return;
        }

        let container = self.container_height as u64;
        let requested = request.start.min(len - 1);
        let mut start = requested;
        let cold = start == 0;
        let mut average = self.heights.average() as u64;

        if !cold {
            // Too close to the end to fill the viewport: start earlier
            let occupancy = (len - start) as u64 * average;
            if occupancy < container {
                let shift = (container - occupancy).div_ceil(average) as usize;
                start = start.saturating_sub(shift);
            }
        }

        let margin_rows = if start == 0 {
            0
        } else {
            ((self.window_buffer as u64 / average) as usize)
                .max(self.config.min_margin_rows)
                .min(start)
        };
        let first = start - margin_rows;
        self.state.rows = first..first;
        // an aligned fill must cover the viewport from the requested row down
        let measure_from = if request.force_align { requested } else { start };

        // Walk forward in batches, normalizing each batch before re-checking
        loop {
            let target = container + self.window_buffer as u64;
            let (_, mut content) = self.measure_split(pass.rows, measure_from);
            if !self.needs_more(len, measure_from, content, target) {
                break;
            }

            let batch = target.div_ceil(average).max(1) as usize;
            let mut added = 0;
            while added < batch && self.state.rows.end < len {
                let idx = self.state.rows.end;
                let height = self.materialize(pass, idx);
                self.state.rows.end += 1;
                self.pending.push((idx, Edge::Fill));
                added += 1;
                if idx >= measure_from {
                    content += height as u64;
                }
                let target = container + self.window_buffer as u64;
                if !self.needs_more(len, measure_from, content, target) {
                    break;
                }
            }
            self.normalize(pass, false);
            average = self.heights.average() as u64;
        }

        self.settle(pass, measure_from, container);
        if !cold {
            self.cover_from_above(pass, requested, request, container);
        }

        let first = self.state.rows.start;
        let (tph, content) = self.measure_split(pass.rows, start);
        let end = self.state.rows.end;

        let (top_pad, bottom_pad, scroll_top) = if cold {
            self.heights
                .reset_average_from(pass.rows.rows()[self.state.rows.clone()].iter());
            let average = self.heights.average() as u64;
            let scroll_top = if request.force_align {
                request.offset.max(0) as u64
            } else {
                0
            };
            (0, average * (len - end) as u64, scroll_top)
        } else {
            let average = self.heights.average() as u64;
            let top_pad = if first == 0 {
                0
            } else if request.force_align {
                average * first as u64
            } else {
                (self.state.scroll_top as i64 - tph as i64).max(0) as u64
            };
            let scroll_top = if request.force_align {
                // land on the requested row even if the start moved up
                let (lead, _) = self.measure_split(pass.rows, requested);
                (top_pad as i64 + lead as i64 + request.offset).max(0) as u64
            } else {
                top_pad + tph
            };
            let bottom_pad = if end == len {
                0
            } else {
                let carried = (prev_total as u64).saturating_sub(top_pad + tph + content);
                if carried >= average {
                    carried
                } else {
                    average * (len - end) as u64
                }
            };
            (top_pad, bottom_pad, scroll_top)
        };

        self.state.top_pad = units(top_pad);
        self.state.bottom_pad = units(bottom_pad);
        self.state.total_height = units(top_pad + tph + content + bottom_pad);
        self.state.estimated_row_height = self.heights.average();
        self.state.scroll_top = units(scroll_top).min(self.max_scroll());
        self.state.scroll_pos_top = self.state.scroll_top as i64;
        self.state.scroll_pos_bottom = self.state.scroll_top as i64;

        info!(
            target: "viewport",
            "Fill from {} ({}): rows {}..{} top_pad={} bottom_pad={} total={}",
            request.start,
            if cold { "cold" } else if request.force_align { "aligned" } else { "anchored" },
            self.state.rows.start,
            self.state.rows.end,
            self.state.top_pad,
            self.state.bottom_pad,
            self.state.total_height
        );
    }

    fn fill_classic<F: RowFactory + ?Sized>(&mut self, pass: &mut RenderPass<'_, F>) {
        let len = pass.len();
        for idx in 0..len {
            self.materialize(pass, idx);
            self.pending.push((idx, Edge::Fill));
        }
        self.state.rows = 0..len;
        self.normalize(pass, false);

        let total: u64 = self.rows_height(pass.rows, 0..len);
        self.state.top_pad = 0;
        self.state.bottom_pad = 0;
        self.state.total_height = units(total);
        self.state.estimated_row_height = self.heights.average();
        self.state.scroll_top = self.state.scroll_top.min(self.max_scroll());
        self.state.scroll_pos_top = self.state.scroll_top as i64;
        self.state.scroll_pos_bottom = self.state.scroll_top as i64;
        debug!(target: "viewport", "Classic fill: {} rows, total={}", len, total);
    }

    /// Steer the window to a new vertical scroll offset
    pub fn scroll_vertical<F: RowFactory + ?Sized>(
        &mut self,
        pass: &mut RenderPass<'_, F>,
        scroll_top: u32,
    ) -> ScrollOutcome {
        let new_top = scroll_top.min(self.max_scroll());
        let direction = if new_top < self.state.scroll_top {
            ScrollDirection::Up
        } else {
            ScrollDirection::Down
        };
        self.state.scroll_top = new_top;

        let mut outcome = ScrollOutcome {
            direction,
            jumped: false,
            added: 0,
            removed: 0,
        };

        if pass.is_empty() || self.is_classic() {
            self.state.scroll_pos_top = new_top as i64;
            self.state.scroll_pos_bottom = new_top as i64;
            return outcome;
        }

        for _ in 0..=MAX_RESTEER {
            let scroll = self.state.scroll_top as i64;
            let top_diff = scroll - self.state.scroll_pos_top;
            let bottom_diff = scroll - self.state.scroll_pos_bottom;
            let margin = self.window_buffer as i64 * self.config.big_jump_factor as i64;

            if -top_diff > margin || bottom_diff > margin {
                debug!(
                    target: "viewport",
                    "Big jump (top_diff={}, bottom_diff={}, margin={})",
                    top_diff, bottom_diff, margin
                );
                self.jump_fill(pass);
                outcome.jumped = true;
                return outcome;
            }

            self.chain_cut = false;
            match direction {
                ScrollDirection::Up => {
                    if top_diff < 0 {
                        outcome.added += self.extend_at_top(pass, (-top_diff) as u64);
                    }
                    if bottom_diff < 0 {
                        outcome.removed += self.trim_at_bottom(pass, (-bottom_diff) as u64);
                    }
                }
                ScrollDirection::Down => {
                    if bottom_diff > 0 {
                        outcome.added += self.extend_at_bottom(pass, bottom_diff as u64);
                    }
                    if top_diff > 0 {
                        outcome.removed += self.trim_at_top(pass, top_diff as u64);
                    }
                }
            }

            self.normalize(pass, true);
            self.state.scroll_top = self.state.scroll_top.min(self.max_scroll());

            // a tail shorter than its estimate pulls the clamped offset into the top pad
            let uncovered = self.state.top_pad.saturating_sub(self.state.scroll_top);
            if uncovered > 0 && self.state.rows.start > 0 {
                outcome.added += self.extend_at_top(pass, uncovered as u64);
                self.normalize(pass, true);
            }

            if !self.chain_cut {
                break;
            }
            trace!(target: "viewport", "Render chain cut, steering again");
        }

        trace!(
            target: "viewport",
            "Scroll {:?} to {}: rows {}..{} (+{} -{})",
            direction,
            self.state.scroll_top,
            self.state.rows.start,
            self.state.rows.end,
            outcome.added,
            outcome.removed
        );
        outcome
    }

    /// Re-fill at the row the scroll ratio points to, keeping the offset
    fn jump_fill<F: RowFactory + ?Sized>(&mut self, pass: &mut RenderPass<'_, F>) {
        let total = self.state.total_height.max(1) as u64;
        let index = (self.state.scroll_top as u64 * pass.len() as u64 / total) as usize;
        self.fill(pass, FillRequest::at(index.min(pass.len() - 1)));
    }

    /// Materialize rows below the window until `diff` is covered
    pub fn extend_at_bottom<F: RowFactory + ?Sized>(
        &mut self,
        pass: &mut RenderPass<'_, F>,
        diff: u64,
    ) -> usize {
        let len = pass.len();
        let mut remaining = diff as i64;
        let mut chain = 0;

        while remaining > 0 && self.state.rows.end < len {
            if chain >= self.config.max_render_chain {
                self.chain_cut = true;
                break;
            }
            let idx = self.state.rows.end;
            let height = self.materialize(pass, idx);
            self.state.rows.end += 1;
            self.pending.push((idx, Edge::Bottom));
            self.consume_bottom_pad(height as i64, len);
            self.state.scroll_pos_bottom += height as i64;
            remaining -= height as i64;
            chain += 1;
        }
        chain
    }

    /// Materialize rows above the window until `diff` is covered
    pub fn extend_at_top<F: RowFactory + ?Sized>(
        &mut self,
        pass: &mut RenderPass<'_, F>,
        diff: u64,
    ) -> usize {
        let mut remaining = diff as i64;
        let mut chain = 0;

        while remaining > 0 && self.state.rows.start > 0 {
            if chain >= self.config.max_render_chain {
                self.chain_cut = true;
                break;
            }
            let idx = self.state.rows.start - 1;
            let height = self.materialize(pass, idx);
            self.state.rows.start -= 1;
            self.pending.push((idx, Edge::Top));
            self.state.scroll_pos_top -= height as i64;
            self.consume_top_pad(height as i64);
            remaining -= height as i64;
            chain += 1;
        }
        chain
    }

    /// Drop rows from the top while they are scrolled out by `diff`
    pub fn trim_at_top<F: RowFactory + ?Sized>(
        &mut self,
        pass: &mut RenderPass<'_, F>,
        diff: u64,
    ) -> usize {
        let mut remaining = diff as i64;
        let mut chain = 0;

        while self.state.rows.start < self.state.rows.end {
            let idx = self.state.rows.start;
            let height = self.row_height(pass.rows, idx);
            if remaining < height as i64 {
                break;
            }
            if chain >= self.config.max_render_chain {
                self.chain_cut = true;
                break;
            }
            pass.factory.teardown(idx, &pass.rows.rows()[idx]);
            self.state.rows.start += 1;
            self.state.top_pad += height;
            self.state.scroll_pos_top += height as i64;
            remaining -= height as i64;
            chain += 1;
        }
        chain
    }

    /// Drop rows from the bottom while they are scrolled out by `diff`
    pub fn trim_at_bottom<F: RowFactory + ?Sized>(
        &mut self,
        pass: &mut RenderPass<'_, F>,
        diff: u64,
    ) -> usize {
        let mut remaining = diff as i64;
        let mut chain = 0;

        while self.state.rows.start < self.state.rows.end {
            let idx = self.state.rows.end - 1;
            let height = self.row_height(pass.rows, idx);
            if remaining < height as i64 {
                break;
            }
            if chain >= self.config.max_render_chain {
                self.chain_cut = true;
                break;
            }
            pass.factory.teardown(idx, &pass.rows.rows()[idx]);
            self.state.rows.end -= 1;
            self.state.bottom_pad += height;
            self.state.scroll_pos_bottom -= height as i64;
            remaining -= height as i64;
            chain += 1;
        }
        chain
    }

    /// Re-fill around the row at the current scroll offset, keeping the offset
    pub fn rerender_rows<F: RowFactory + ?Sized>(&mut self, pass: &mut RenderPass<'_, F>) {
        let (anchor, offset) = self.anchor(pass.rows);
        for row in pass.rows.rows_mut() {
            row.deinitialize_height();
        }
        debug!(target: "viewport", "Rerender anchored on row {} (+{})", anchor, offset);
        if anchor == 0 && offset == 0 {
            self.fill(pass, FillRequest::at(0));
        } else {
            self.fill(pass, FillRequest::aligned(anchor, offset));
        }
    }

    /// Bring a display row into view
    pub fn scroll_to_row<F: RowFactory + ?Sized>(
        &mut self,
        pass: &mut RenderPass<'_, F>,
        index: usize,
        position: RowPosition,
        if_visible: bool,
    ) -> Result<()> {
        let count = pass.len();
        if index >= count {
            return Err(GridError::RowOutOfRange { index, count });
        }

        if !if_visible && self.is_fully_visible(pass.rows, index) {
            return Ok(());
        }

        let container = self.container_height as i64;
        let position = match position {
            RowPosition::Nearest => {
                let above = match self.row_offset(pass.rows, index) {
                    Some(offset) => (offset as i64) < self.state.scroll_top as i64,
                    None => index < self.state.rows.start,
                };
                if above {
                    RowPosition::Top
                } else {
                    RowPosition::Bottom
                }
            }
            other => other,
        };

        let height = self.row_height(pass.rows, index) as i64;
        let lead = match position {
            RowPosition::Top | RowPosition::Nearest => 0,
            RowPosition::Center => -((container - height).max(0) / 2),
            RowPosition::Bottom => -(container - height).max(0),
        };

        match self.row_offset(pass.rows, index) {
            Some(offset) => {
                let target = units((offset as i64 + lead).max(0) as u64);
                let outcome = self.scroll_vertical(pass, target);
                if outcome.jumped || self.chain_cut {
                    // the steered window may stop short of the row
                    self.fill(pass, FillRequest::aligned(index, lead));
                }
            }
            None => self.fill(pass, FillRequest::aligned(index, lead)),
        }
        Ok(())
    }

    /// Display rows intersecting the viewport
    pub fn visible_range(&self, rows: &DisplaySequence) -> Range<usize> {
        let view_top = self.state.scroll_top as u64;
        let view_bottom = if self.container_height == 0 {
            u64::MAX
        } else {
            view_top + self.container_height as u64
        };

        let mut pos = self.state.top_pad as u64;
        let mut first = None;
        let mut last = self.state.rows.start;
        for idx in self.state.rows.clone() {
            let height = self.row_height(rows, idx) as u64;
            if pos + height > view_top && pos < view_bottom {
                first.get_or_insert(idx);
                last = idx + 1;
            }
            pos += height;
        }
        match first {
            Some(first) => first..last,
            None => self.state.rows.start..self.state.rows.start,
        }
    }

    /// Content offset of a materialized row's top edge
    pub fn row_offset(&self, rows: &DisplaySequence, index: usize) -> Option<u32> {
        if !self.state.rows.contains(&index) {
            return None;
        }
        let above = self.rows_height(rows, self.state.rows.start..index);
        Some(units(self.state.top_pad as u64 + above))
    }

    pub fn row_height(&self, rows: &DisplaySequence, index: usize) -> u32 {
        rows.get(index)
            .map(|row| self.heights.height_of(row))
            .unwrap_or_else(|| self.heights.average())
    }

    fn is_fully_visible(&self, rows: &DisplaySequence, index: usize) -> bool {
        match self.row_offset(rows, index) {
            Some(offset) => {
                let top = self.state.scroll_top;
                let height = self.row_height(rows, index);
                offset >= top
                    && (self.container_height == 0
                        || offset + height <= top + self.container_height)
            }
            None => false,
        }
    }

    /// Materialized row under the scroll offset, and how far into it we are
    pub fn anchor(&self, rows: &DisplaySequence) -> (usize, i64) {
        let scroll = self.state.scroll_top as u64;
        let mut pos = self.state.top_pad as u64;
        for idx in self.state.rows.clone() {
            let height = self.row_height(rows, idx) as u64;
            if pos + height > scroll {
                return (idx, scroll as i64 - pos as i64);
            }
            pos += height;
        }
        (self.state.rows.start.min(rows.len().saturating_sub(1)), 0)
    }

    fn teardown_all<F: RowFactory + ?Sized>(&mut self, pass: &mut RenderPass<'_, F>) {
        let end = self.state.rows.end.min(pass.len());
        for idx in self.state.rows.start..end {
            pass.factory.teardown(idx, &pass.rows.rows()[idx]);
        }
        self.state.rows = 0..0;
    }

    fn materialize<F: RowFactory + ?Sized>(&mut self, pass: &mut RenderPass<'_, F>, idx: usize) -> u32 {
        let natural = pass.factory.initialize(idx, &pass.rows.rows()[idx], &pass.cx);
        let row = &mut pass.rows.rows_mut()[idx];
        row.initialized = true;
        if !row.height_initialized || row.height.is_none() {
            self.heights.record(row, natural);
        }
        let height = self.heights.height_of(row);
        self.apply_tall_row_rule(height);
        height
    }

    fn apply_tall_row_rule(&mut self, height: u32) {
        if height > self.window_buffer && !self.is_classic() {
            self.window_buffer = height * 2;
            debug!(target: "viewport", "Tall row ({}): window buffer now {}", height, self.window_buffer);
        }
    }

    /// Batched height normalization of the rows added since the last pass
    fn normalize<F: RowFactory + ?Sized>(&mut self, pass: &mut RenderPass<'_, F>, adjust_pads: bool) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        let len = pass.len();

        let mut measured = Vec::with_capacity(pending.len());
        for (idx, edge) in pending {
            if !self.state.rows.contains(&idx) {
                continue;
            }
            let row = &pass.rows.rows()[idx];
            if row.height_initialized {
                continue;
            }
            let height = pass.factory.calc_height(idx, row, &pass.cx).max(1);
            measured.push((idx, edge, height));
        }

        for &(idx, edge, height) in &measured {
            let row: &mut DisplayRow = &mut pass.rows.rows_mut()[idx];
            pass.factory.set_cell_height(idx, row, height);
            let old = self.heights.height_of(row);
            self.heights.record(row, height);
            row.height_initialized = true;
            self.apply_tall_row_rule(height);

            if adjust_pads && height != old {
                let delta = height as i64 - old as i64;
                match edge {
                    Edge::Top => self.consume_top_pad(delta),
                    Edge::Bottom => self.consume_bottom_pad(delta, len),
                    Edge::Fill => {}
                }
            }
        }

        self.heights.commit_batch();
        self.state.estimated_row_height = self.heights.average();
        trace!(target: "viewport", "Normalized {} rows", measured.len());
    }

    /// Take `amount` out of the top pad, rebasing when the estimate runs out
    fn consume_top_pad(&mut self, amount: i64) {
        let new = self.state.top_pad as i64 - amount;
        let target = if self.state.rows.start == 0 {
            0
        } else if new < 0 {
            self.state.rows.start as i64 * self.heights.average() as i64
        } else {
            new
        };
        let delta = target - new;
        self.state.top_pad = target as u32;

        if delta != 0 {
            trace!(target: "viewport", "Top pad rebased by {}", delta);
            self.state.total_height = (self.state.total_height as i64 + delta).max(0) as u32;
            let scroll_top = (self.state.scroll_top as i64 + delta).max(0);
            let shift = scroll_top - self.state.scroll_top as i64;
            self.state.scroll_top = scroll_top as u32;
            self.state.scroll_pos_top += shift;
            self.state.scroll_pos_bottom += shift;
        }
    }

    /// Take `amount` out of the bottom pad, rebasing when the estimate runs out
    fn consume_bottom_pad(&mut self, amount: i64, len: usize) {
        let new = self.state.bottom_pad as i64 - amount;
        let target = if self.state.rows.end >= len {
            0
        } else if new < 0 {
            (len - self.state.rows.end) as i64 * self.heights.average() as i64
        } else {
            new
        };
        let delta = target - new;
        self.state.bottom_pad = target as u32;

        if delta != 0 {
            trace!(target: "viewport", "Bottom pad rebased by {}", delta);
            self.state.total_height = (self.state.total_height as i64 + delta).max(0) as u32;
        }
    }

    fn needs_more(&self, len: usize, start: usize, content: u64, target: u64) -> bool {
        self.state.rows.end < len
            && (self.state.rows.end <= start
                || content < target
                || self.state.rows.len() < self.config.min_total_rows)
    }

    /// Drop rows a batch walked past once normalized heights are known, so
    /// the window is the shortest run that satisfies the fill rule
    fn settle<F: RowFactory + ?Sized>(&mut self, pass: &mut RenderPass<'_, F>, start: usize, container: u64) {
        let target = container + self.window_buffer as u64;
        let (_, mut content) = self.measure_split(pass.rows, start);
        while self.state.rows.end > start + 1 && self.state.rows.len() > self.config.min_total_rows {
            let last = self.state.rows.end - 1;
            let height = self.row_height(pass.rows, last) as u64;
            if content - height < target {
                break;
            }
            pass.factory.teardown(last, &pass.rows.rows()[last]);
            self.state.rows.end -= 1;
            content -= height;
        }
    }

    /// Materialize rows above the window, with their real heights, while the
    /// viewport would otherwise start inside the top pad: an aligned target
    /// above the window, or a tail too short to fill the container
    fn cover_from_above<F: RowFactory + ?Sized>(
        &mut self,
        pass: &mut RenderPass<'_, F>,
        requested: usize,
        request: FillRequest,
        container: u64,
    ) {
        loop {
            let mut added = 0;
            while self.state.rows.start > 0 && self.lacks_cover(pass.rows, requested, request, container) {
                let idx = self.state.rows.start - 1;
                self.materialize(pass, idx);
                self.state.rows.start = idx;
                self.pending.push((idx, Edge::Fill));
                added += 1;
            }
            if added == 0 {
                break;
            }
            self.normalize(pass, false);
            trace!(target: "viewport", "Covered {} rows above the fill", added);
        }
    }

    fn lacks_cover(&self, rows: &DisplaySequence, requested: usize, request: FillRequest, container: u64) -> bool {
        let window = self.state.rows.clone();
        if window.end >= rows.len() && self.rows_height(rows, window.clone()) < container {
            return true;
        }
        if request.force_align {
            let (lead, _) = self.measure_split(rows, requested);
            return (lead as i64) + request.offset < 0;
        }
        false
    }

    /// Heights of the margin rows above `start` and of the rows from `start` on
    fn measure_split(&self, rows: &DisplaySequence, start: usize) -> (u64, u64) {
        let window = self.state.rows.clone();
        let split = start.clamp(window.start, window.end);
        (
            self.rows_height(rows, window.start..split),
            self.rows_height(rows, split..window.end),
        )
    }

    fn rows_height(&self, rows: &DisplaySequence, range: Range<usize>) -> u64 {
        range
            .filter_map(|idx| rows.get(idx))
            .map(|row| self.heights.height_of(row) as u64)
            .sum()
    }
}

/// Geometry is summed in `u64`; the window state saturates rather than wraps
fn units(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::column::ColumnSet;
    use crate::data::record::{RowId, RowStore};
    use crate::ui::row_factory::UniformRowFactory;

    fn sequence(n: usize) -> DisplaySequence {
        DisplaySequence::new((0..n).map(|i| DisplayRow::data(RowId(i))).collect())
    }

    fn window(container: u32) -> ViewportWindow {
        let mut window = ViewportWindow::new(ViewportConfig::default());
        window.set_container_height(container);
        window
    }

    fn padding_holds(window: &ViewportWindow, rows: &DisplaySequence) -> bool {
        let state = window.state();
        let content: u64 = state
            .rows
            .clone()
            .map(|i| window.heights().height_of(rows.get(i).unwrap()) as u64)
            .sum();
        state.top_pad as u64 + content + state.bottom_pad as u64 == state.total_height as u64
    }

    #[test]
    fn test_cold_fill_uniform() {
        let store = RowStore::new();
        let columns = ColumnSet::default();
        let mut rows = sequence(1000);
        let mut factory = UniformRowFactory::new(20);
        let mut pass = RenderPass::new(&mut rows, &mut factory, &store, &columns);
        let mut window = window(400);

        window.fill(&mut pass, FillRequest::at(0));
        let state = window.state().clone();
        assert_eq!(state.rows, 0..40);
        assert_eq!(state.top_pad, 0);
        assert_eq!(state.bottom_pad, 960 * 20);
        assert_eq!(state.total_height, 20_000);
        assert_eq!(factory.live, 40);
        assert!(padding_holds(&window, &rows));
    }

    #[test]
    fn test_empty_sequence() {
        let store = RowStore::new();
        let columns = ColumnSet::default();
        let mut rows = sequence(0);
        let mut factory = UniformRowFactory::new(20);
        let mut pass = RenderPass::new(&mut rows, &mut factory, &store, &columns);
        let mut window = window(400);

        window.fill(&mut pass, FillRequest::at(0));
        assert_eq!(window.state().materialized(), 0);
        assert_eq!(window.state().bottom(), None);
        assert_eq!(window.scroll_height(), 0);
    }

    #[test]
    fn test_zero_height_container_is_classic() {
        let store = RowStore::new();
        let columns = ColumnSet::default();
        let mut rows = sequence(50);
        let mut factory = UniformRowFactory::new(20);
        let mut pass = RenderPass::new(&mut rows, &mut factory, &store, &columns);
        let mut window = window(0);

        window.fill(&mut pass, FillRequest::at(0));
        assert!(window.is_classic());
        assert_eq!(window.state().rows, 0..50);
        assert_eq!(window.state().top_pad, 0);
        assert_eq!(window.state().bottom_pad, 0);
        assert_eq!(window.scroll_height(), 1000);
    }

    #[test]
    fn test_tall_row_grows_buffer() {
        let store = RowStore::new();
        let columns = ColumnSet::default();
        let mut rows = sequence(10);
        let mut factory = UniformRowFactory::new(300);
        let mut pass = RenderPass::new(&mut rows, &mut factory, &store, &columns);
        let mut window = window(100);

        window.fill(&mut pass, FillRequest::at(0));
        assert_eq!(window.window_buffer(), 600);
        assert!(padding_holds(&window, &rows));
    }

    #[test]
    fn test_scroll_to_row_out_of_range() {
        let store = RowStore::new();
        let columns = ColumnSet::default();
        let mut rows = sequence(10);
        let mut factory = UniformRowFactory::new(20);
        let mut pass = RenderPass::new(&mut rows, &mut factory, &store, &columns);
        let mut window = window(100);
        window.fill(&mut pass, FillRequest::at(0));

        let err = window
            .scroll_to_row(&mut pass, 10, RowPosition::Top, true)
            .unwrap_err();
        assert!(matches!(err, GridError::RowOutOfRange { index: 10, count: 10 }));
    }

    #[test]
    fn test_geometry_saturates() {
        assert_eq!(units(412), 412);
        assert_eq!(units(u32::MAX as u64), u32::MAX);
        assert_eq!(units(u32::MAX as u64 + 1), u32::MAX);
        assert_eq!(units(u64::MAX), u32::MAX);
    }
}
