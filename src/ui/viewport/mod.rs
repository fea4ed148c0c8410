pub mod column_width_solver;
pub mod row_height;
pub mod window;

pub use column_width_solver::{
    ColumnSpec, ColumnWidthResult, ColumnWidthSolver, LayoutMode, COLUMN_PADDING,
};
pub use row_height::RowHeightModel;
pub use window::{
    FillRequest, RowPosition, ScrollDirection, ScrollOutcome, ViewportWindow, WindowState,
};
