//! Data layer: records, columns and the display pipeline
//!
//! Records and columns live in arenas (`RowStore`, `ColumnSet`) and are
//! referred to by index everywhere else.

pub mod capabilities;
pub mod column;
pub mod csv_loader;
pub mod display_row;
pub mod pipeline;
pub mod record;
