//! Column width distribution.
//!
//! `FitColumns` fills the container exactly: fixed columns take their
//! resolved width, flexible columns split what is left by grow weight, and
//! any column whose minimum exceeds its share is pinned and removed from
//! the pool before the share is recomputed. When pinned flexible columns
//! still overflow, fixed columns with a shrink weight give space back, down
//! to (never below) their own minimums.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use unicode_width::UnicodeWidthStr;

/// Cell padding added to measured content by default
pub const COLUMN_PADDING: u32 = 2;

/// Layout strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Every column takes its explicit or natural content width
    #[default]
    FitData,
    /// Like FitData; unused space is left as filler
    FitDataFill,
    /// Like FitData; the last column grows to close any gap
    FitDataStretch,
    /// Columns fill the container exactly
    FitColumns,
}

impl LayoutMode {
    /// Cycle to the next mode
    pub fn cycle(&self) -> Self {
        match self {
            LayoutMode::FitData => LayoutMode::FitDataFill,
            LayoutMode::FitDataFill => LayoutMode::FitDataStretch,
            LayoutMode::FitDataStretch => LayoutMode::FitColumns,
            LayoutMode::FitColumns => LayoutMode::FitData,
        }
    }

    /// Get display name for the mode
    pub fn display_name(&self) -> &'static str {
        match self {
            LayoutMode::FitData => "Fit Data",
            LayoutMode::FitDataFill => "Fit Data (Fill)",
            LayoutMode::FitDataStretch => "Fit Data (Stretch)",
            LayoutMode::FitColumns => "Fit Columns",
        }
    }
}

/// Layout input for one column, re-derived every pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub min_width: u32,
    pub max_width: Option<u32>,
    /// Explicit width (percentages already resolved)
    pub fixed_width: Option<u32>,
    pub grow_weight: u32,
    /// 0 means the column never shrinks
    pub shrink_weight: u32,
    pub visible: bool,
    /// Measured content width, used by the fit-data modes
    pub natural_width: u32,
}

impl ColumnSpec {
    /// A flexible column with grow weight 1
    pub fn flexible(min_width: u32) -> Self {
        Self {
            min_width,
            max_width: None,
            fixed_width: None,
            grow_weight: 1,
            shrink_weight: 0,
            visible: true,
            natural_width: min_width,
        }
    }

    /// A fixed-width column
    pub fn fixed(width: u32, min_width: u32) -> Self {
        Self {
            fixed_width: Some(width),
            ..Self::flexible(min_width)
        }
    }

    pub fn with_grow(mut self, weight: u32) -> Self {
        self.grow_weight = weight;
        self
    }

    pub fn with_shrink(mut self, weight: u32) -> Self {
        self.shrink_weight = weight;
        self
    }

    pub fn with_max(mut self, max_width: u32) -> Self {
        self.max_width = Some(max_width);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    fn is_flexible(&self) -> bool {
        self.fixed_width.is_none()
    }

    fn clamp(&self, width: u32) -> u32 {
        let width = width.max(self.min_width);
        match self.max_width {
            Some(max) => width.min(max.max(self.min_width)),
            None => width,
        }
    }
}

/// Resolved widths, aligned with the input specs; hidden columns get 0
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnWidthResult {
    pub widths: Vec<u32>,
}

impl ColumnWidthResult {
    pub fn total(&self) -> u32 {
        self.widths.iter().sum()
    }

    /// Width beyond the container; the table scrolls horizontally
    pub fn overflow(&self, container_width: u32) -> u32 {
        self.total().saturating_sub(container_width)
    }
}

pub struct ColumnWidthSolver {
    mode: LayoutMode,
}

impl ColumnWidthSolver {
    pub fn new(mode: LayoutMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> LayoutMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: LayoutMode) {
        self.mode = mode;
    }

    /// Cycle to the next layout mode
    pub fn cycle_mode(&mut self) -> LayoutMode {
        self.mode = self.mode.cycle();
        self.mode
    }

    pub fn solve(&self, container_width: u32, specs: &[ColumnSpec]) -> ColumnWidthResult {
        let result = match self.mode {
            LayoutMode::FitColumns => fit_columns(container_width, specs),
            LayoutMode::FitData | LayoutMode::FitDataFill => fit_data(specs),
            LayoutMode::FitDataStretch => fit_data_stretch(container_width, specs),
        };

        debug!(
            target: "column_layout",
            "{} over {} columns: container={} total={}",
            self.mode.display_name(),
            specs.len(),
            container_width,
            result.total()
        );
        result
    }
}

impl Default for ColumnWidthSolver {
    fn default() -> Self {
        Self::new(LayoutMode::default())
    }
}

/// Each column at its explicit or natural width, within its bounds
pub fn fit_data(specs: &[ColumnSpec]) -> ColumnWidthResult {
    let widths = specs
        .iter()
        .map(|spec| {
            if !spec.visible {
                return 0;
            }
            spec.clamp(spec.fixed_width.unwrap_or(spec.natural_width))
        })
        .collect();
    ColumnWidthResult { widths }
}

/// FitData, then the last visible column closes the gap
pub fn fit_data_stretch(container_width: u32, specs: &[ColumnSpec]) -> ColumnWidthResult {
    let mut result = fit_data(specs);
    let total = result.total();
    if total < container_width {
        if let Some(last) = specs.iter().rposition(|s| s.visible) {
            result.widths[last] += container_width - total;
        }
    }
    result
}

/// Fill the container exactly, cascading minimums and shrink weights
pub fn fit_columns(container_width: u32, specs: &[ColumnSpec]) -> ColumnWidthResult {
    let mut widths = vec![0u32; specs.len()];
    let mut fixed_total: i64 = 0;
    let mut flexible = Vec::new();

    for (i, spec) in specs.iter().enumerate() {
        if !spec.visible {
            continue;
        }
        match spec.fixed_width {
            Some(width) => {
                widths[i] = width.max(spec.min_width);
                fixed_total += widths[i] as i64;
            }
            None => flexible.push(i),
        }
    }

    let flex_width = container_width as i64 - fixed_total;
    if !flexible.is_empty() {
        grow_columns(specs, &mut widths, flexible, flex_width);
    }

    let total: i64 = widths.iter().map(|w| *w as i64).sum();
    let overflow = total - container_width as i64;
    if overflow > 0 {
        let shrinkable: Vec<usize> = specs
            .iter()
            .enumerate()
            .filter(|(_, s)| s.visible && !s.is_flexible() && s.shrink_weight > 0)
            .map(|(i, _)| i)
            .collect();
        if !shrinkable.is_empty() {
            shrink_columns(specs, &mut widths, shrinkable, overflow);
        }
    }

    ColumnWidthResult { widths }
}

/// Distribute `free` over the pool by grow weight. Columns whose minimum
/// exceeds their share are pinned at the minimum, columns whose share
/// exceeds their maximum are capped, and both leave the pool. Every pass
/// removes at least one column or finishes.
fn grow_columns(specs: &[ColumnSpec], widths: &mut [u32], mut pool: Vec<usize>, mut free: i64) {
    let all_flexible = pool.clone();
    let mut capped = Vec::new();

    while !pool.is_empty() {
        let units: i64 = pool.iter().map(|&i| specs[i].grow_weight.max(1) as i64).sum();
        let per_unit = free.div_euclid(units);
        trace!(target: "column_layout", "grow pass: pool={} free={} per_unit={}", pool.len(), free, per_unit);

        let mut removed = Vec::new();
        for &i in &pool {
            let spec = &specs[i];
            let want = per_unit * spec.grow_weight.max(1) as i64;
            if spec.min_width as i64 > want {
                widths[i] = spec.min_width;
                removed.push(i);
            } else if let Some(max) = spec.max_width.filter(|m| want > *m as i64) {
                widths[i] = max.max(spec.min_width);
                capped.push(i);
                removed.push(i);
            }
        }

        if removed.is_empty() {
            for &i in &pool {
                widths[i] = (per_unit * specs[i].grow_weight.max(1) as i64) as u32;
            }
            let gap = free - per_unit * units;
            if gap > 0 {
                if let Some(&last) = pool.last() {
                    widths[last] += gap as u32;
                }
            }
            return;
        }

        for i in &removed {
            free -= widths[*i] as i64;
        }
        pool.retain(|i| !removed.contains(i));
    }

    // Pool exhausted: leftover space goes to the last column that can take it
    if free > 0 {
        if let Some(&last) = all_flexible.iter().rev().find(|i| !capped.contains(i)) {
            widths[last] += free as u32;
        }
    }
}

/// Take `deficit` back from shrinkable fixed columns by shrink weight,
/// pinning any that would go below their minimum.
fn shrink_columns(specs: &[ColumnSpec], widths: &mut [u32], mut pool: Vec<usize>, mut deficit: i64) {
    while !pool.is_empty() && deficit > 0 {
        let units: i64 = pool.iter().map(|&i| specs[i].shrink_weight as i64).sum();
        let per_unit = deficit / units;
        trace!(target: "column_layout", "shrink pass: pool={} deficit={} per_unit={}", pool.len(), deficit, per_unit);

        let mut pinned = Vec::new();
        for &i in &pool {
            let want = widths[i] as i64 - per_unit * specs[i].shrink_weight as i64;
            if want < specs[i].min_width as i64 {
                deficit -= (widths[i] - specs[i].min_width) as i64;
                widths[i] = specs[i].min_width;
                pinned.push(i);
            }
        }

        if pinned.is_empty() {
            for &i in &pool {
                widths[i] -= (per_unit * specs[i].shrink_weight as i64) as u32;
            }
            // Rounding remainder comes off the last column, spilling backwards
            let mut remainder = deficit - per_unit * units;
            for &i in pool.iter().rev() {
                if remainder <= 0 {
                    break;
                }
                let room = (widths[i] - specs[i].min_width) as i64;
                let take = room.min(remainder);
                widths[i] -= take as u32;
                remainder -= take;
            }
            return;
        }

        pool.retain(|i| !pinned.contains(i));
    }
}

/// Display width of text, widest line for multi-line text
pub fn text_width(text: &str) -> u32 {
    text.lines().map(|l| l.width() as u32).max().unwrap_or(0)
}

/// Row indices to sample for content measurement: every nth row plus the last
pub fn sample_indices(len: usize, sample_rows: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let sample_size = sample_rows.clamp(1, len);
    let sample_step = if len > sample_size { len / sample_size } else { 1 };
    let mut indices: Vec<usize> = (0..len).step_by(sample_step).collect();
    if indices.last() != Some(&(len - 1)) {
        indices.push(len - 1);
    }
    indices
}

/// Natural width of a column from its title and sampled cell text
pub fn natural_width<'a, I>(title: &str, cells: I, padding: u32) -> u32
where
    I: IntoIterator<Item = &'a str>,
{
    let max_data_width = cells.into_iter().map(text_width).max().unwrap_or(0);
    text_width(title).max(max_data_width) + padding
}
