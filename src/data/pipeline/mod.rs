//! The display pipeline: filter → sort → group → paginate.
//!
//! Each stage caches its output. Changing a stage's settings marks the
//! pipeline dirty from that stage, so the next `refresh` re-runs only that
//! stage and the ones after it. The viewport reads the resulting
//! `DisplaySequence` and may write height state back into it; that state is
//! carried into the next sequence for rows whose key survives.

pub mod filter;
pub mod group;
pub mod page;
pub mod sort;

use std::collections::HashSet;
use tracing::{debug, info};

use crate::data::column::ColumnSet;
use crate::data::display_row::DisplaySequence;
use crate::data::record::{RowId, RowStore};

pub use filter::{CompiledFilter, FilterSpec};
pub use group::GroupSpec;
pub use page::PageSpec;
pub use sort::{SortOrder, SortSpec};

use group::{Group, Unit};

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineStage {
    Filter,
    Sort,
    Group,
    Page,
}

#[derive(Default)]
pub struct DisplayPipeline {
    filters: Vec<FilterSpec>,
    sorters: Vec<SortSpec>,
    group_by: Option<GroupSpec>,
    collapsed: HashSet<String>,
    paging: Option<PageSpec>,

    filtered: Vec<RowId>,
    sorted: Vec<RowId>,
    groups: Vec<Group>,
    units: Vec<Unit>,
    sequence: DisplaySequence,

    dirty: Option<PipelineStage>,
}

impl DisplayPipeline {
    pub fn new() -> Self {
        Self {
            dirty: Some(PipelineStage::Filter),
            ..Default::default()
        }
    }

    /// Mark every stage from `stage` onward as stale
    pub fn invalidate(&mut self, stage: PipelineStage) {
        self.dirty = Some(self.dirty.map_or(stage, |d| d.min(stage)));
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_some()
    }

    pub fn set_filters(&mut self, filters: Vec<FilterSpec>) {
        self.filters = filters;
        self.invalidate(PipelineStage::Filter);
    }

    pub fn filters(&self) -> &[FilterSpec] {
        &self.filters
    }

    pub fn set_sort(&mut self, sorters: Vec<SortSpec>) {
        self.sorters = sorters;
        self.invalidate(PipelineStage::Sort);
    }

    pub fn sorters(&self) -> &[SortSpec] {
        &self.sorters
    }

    pub fn set_group_by(&mut self, group_by: Option<GroupSpec>) {
        self.group_by = group_by;
        self.collapsed.clear();
        self.invalidate(PipelineStage::Group);
    }

    pub fn group_by(&self) -> Option<&GroupSpec> {
        self.group_by.as_ref()
    }

    /// Flip a group between collapsed and expanded; returns the new collapsed state
    pub fn toggle_group(&mut self, key: &str) -> bool {
        let collapsed = if self.collapsed.remove(key) {
            false
        } else {
            self.collapsed.insert(key.to_string());
            true
        };
        self.invalidate(PipelineStage::Group);
        collapsed
    }

    pub fn set_page_size(&mut self, size: Option<usize>) {
        self.paging = size.filter(|s| *s > 0).map(PageSpec::new);
        self.invalidate(PipelineStage::Page);
    }

    /// Select a page; out-of-range pages are clamped on the next refresh
    pub fn set_page(&mut self, page: usize) {
        if let Some(paging) = self.paging.as_mut() {
            paging.page = page;
            self.invalidate(PipelineStage::Page);
        }
    }

    /// Current 1-based page, if paginating
    pub fn page(&self) -> Option<usize> {
        self.paging.map(|p| page::clamp_page(p.page, self.units.len(), p.size))
    }

    pub fn page_count(&self) -> usize {
        self.paging
            .map(|p| page::page_count(self.units.len(), p.size))
            .unwrap_or(1)
    }

    /// Run the stale stages, plus everything from `from` onward
    pub fn refresh(
        &mut self,
        store: &RowStore,
        columns: &ColumnSet,
        from: PipelineStage,
    ) -> &DisplaySequence {
        let start = self.dirty.map_or(from, |d| d.min(from));

        if start <= PipelineStage::Filter {
            let compiled = filter::compile_filters(&self.filters);
            self.filtered = filter::apply_filters(&compiled, store, &store.ids());
            debug!(target: "pipeline", "Filter: {} of {} rows", self.filtered.len(), store.len());
        }

        if start <= PipelineStage::Sort {
            self.sorted = self.filtered.clone();
            sort::sort_rows(&mut self.sorted, &self.sorters, store, columns);
        }

        if start <= PipelineStage::Group {
            match &self.group_by {
                Some(spec) => {
                    self.groups = group::group_rows(&self.sorted, &spec.field, store);
                    self.units = group::grouped_units(&self.groups, &self.collapsed);
                    debug!(target: "pipeline", "Group by '{}': {} groups", spec.field, self.groups.len());
                }
                None => {
                    self.groups.clear();
                    self.units = group::plain_units(&self.sorted);
                }
            }
        }

        let bounds = match self.paging {
            Some(spec) => page::page_bounds(self.units.len(), spec),
            None => 0..self.units.len(),
        };
        let footers = self.group_by.as_ref().is_some_and(|g| g.footers);
        let rows = group::emit_rows(&self.units[bounds], &self.groups, footers);

        let mut sequence = DisplaySequence::new(rows);
        sequence.adopt_state(&self.sequence);
        self.sequence = sequence;
        self.dirty = None;

        info!(
            target: "pipeline",
            "Display sequence rebuilt from {:?}: {} rows", start, self.sequence.len()
        );
        &self.sequence
    }

    /// The sequence from the last refresh
    pub fn display_rows(&self) -> &DisplaySequence {
        &self.sequence
    }

    /// Height state written back by the viewport
    pub fn sequence_mut(&mut self) -> &mut DisplaySequence {
        &mut self.sequence
    }

    /// Drop cached output and carried height state (new data)
    pub fn reset(&mut self) {
        self.sequence = DisplaySequence::default();
        self.invalidate(PipelineStage::Filter);
    }

    /// Rows that passed the filter stage
    pub fn filtered_count(&self) -> usize {
        self.filtered.len()
    }
}
