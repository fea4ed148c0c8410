//! A virtualized data grid core.
//!
//! Records flow through a display pipeline (filter, sort, group, page)
//! into a display sequence. The viewport materializes only the rows near
//! the scroll position and stands in for the rest with top and bottom
//! padding, so scroll height stays right while the row count is large.
//! Column widths are solved against the container on every layout pass.

pub mod config;
pub mod data;
pub mod error;
pub mod ui;
pub mod utils;

pub use config::Config;
pub use data::column::ColumnDefinition;
pub use data::display_row::{DisplayKind, DisplayRow, DisplaySequence};
pub use data::record::{Record, RowId, RowStore};
pub use error::{GridError, Result};
pub use ui::grid::{Grid, GridBuilder};
pub use ui::row_factory::{RenderPass, RowContext, RowFactory};
pub use ui::viewport::{
    ColumnSpec, ColumnWidthSolver, FillRequest, LayoutMode, RowPosition, ViewportWindow,
};
