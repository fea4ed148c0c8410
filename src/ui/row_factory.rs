//! The boundary between the virtual renderer and whatever draws rows.
//!
//! The viewport never builds visuals itself. It asks a `RowFactory` to
//! materialize a display row, measures it, and later asks for a batched
//! height normalization pass over all rows added in one scroll chain.

use crate::data::column::ColumnSet;
use crate::data::display_row::{DisplayRow, DisplaySequence};
use crate::data::record::RowStore;

/// Read access to the data behind the display rows
#[derive(Clone, Copy)]
pub struct RowContext<'a> {
    pub store: &'a RowStore,
    pub columns: &'a ColumnSet,
}

pub trait RowFactory {
    /// Build the visual representation of a row and return its natural height
    fn initialize(&mut self, index: usize, row: &DisplayRow, cx: &RowContext<'_>) -> u32;

    /// Height the row needs once its cells are normalized (tallest cell)
    fn calc_height(&mut self, index: usize, row: &DisplayRow, cx: &RowContext<'_>) -> u32;

    /// Stretch every cell of the row to `height`
    fn set_cell_height(&mut self, _index: usize, _row: &DisplayRow, _height: u32) {}

    /// Drop the visual representation
    fn teardown(&mut self, index: usize, row: &DisplayRow);
}

/// Everything one viewport operation touches
pub struct RenderPass<'a, F: RowFactory + ?Sized> {
    pub rows: &'a mut DisplaySequence,
    pub factory: &'a mut F,
    pub cx: RowContext<'a>,
}

impl<'a, F: RowFactory + ?Sized> RenderPass<'a, F> {
    pub fn new(
        rows: &'a mut DisplaySequence,
        factory: &'a mut F,
        store: &'a RowStore,
        columns: &'a ColumnSet,
    ) -> Self {
        Self {
            rows,
            factory,
            cx: RowContext { store, columns },
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A factory where every row has the same height
#[derive(Debug, Clone, Default)]
pub struct UniformRowFactory {
    pub height: u32,
    pub live: usize,
}

impl UniformRowFactory {
    pub fn new(height: u32) -> Self {
        Self { height, live: 0 }
    }
}

impl RowFactory for UniformRowFactory {
    fn initialize(&mut self, _index: usize, _row: &DisplayRow, _cx: &RowContext<'_>) -> u32 {
        self.live += 1;
        self.height
    }

    fn calc_height(&mut self, _index: usize, _row: &DisplayRow, _cx: &RowContext<'_>) -> u32 {
        self.height
    }

    fn teardown(&mut self, _index: usize, _row: &DisplayRow) {
        self.live = self.live.saturating_sub(1);
    }
}
