pub mod grid;
pub mod row_factory;
pub mod scroll_coordinator;
pub mod table_renderer;
pub mod text_row_factory;
pub mod viewport;
