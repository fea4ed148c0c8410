use serde_json::json;

use vgrid::config::Config;
use vgrid::data::column::ColumnDefinition;
use vgrid::data::pipeline::{FilterSpec, SortOrder};
use vgrid::data::record::Record;
use vgrid::ui::grid::{Grid, GridBuilder};
use vgrid::ui::row_factory::UniformRowFactory;
use vgrid::ui::text_row_factory::TextRowFactory;
use vgrid::ui::viewport::{LayoutMode, RowPosition};
use vgrid::{GridError, RowFactory};

fn records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| {
            json!({
                "name": format!("row {}", i),
                "qty": i,
                "city": (["London", "Tokyo", "Paris"][i % 3]),
            })
            .as_object()
            .cloned()
            .unwrap()
        })
        .collect()
}

fn columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new("name", "Name"),
        ColumnDefinition::new("qty", "Qty"),
        ColumnDefinition::new("city", "City"),
    ]
}

fn grid(n: usize) -> Grid<UniformRowFactory> {
    let mut grid = GridBuilder::new()
        .columns(columns())
        .size(600, 400)
        .build(UniformRowFactory::new(20))
        .unwrap();
    grid.set_data(records(n), false);
    grid
}

fn assert_padding<F: RowFactory>(grid: &Grid<F>) {
    let state = grid.window_state();
    let content: u64 = state
        .rows
        .clone()
        .map(|i| grid.window().row_height(grid.display_rows(), i) as u64)
        .sum();
    assert_eq!(
        state.top_pad as u64 + content + state.bottom_pad as u64,
        state.total_height as u64
    );
}

#[test]
fn test_load_renders_first_window() {
    let grid = grid(1000);
    assert_eq!(grid.display_row_count(), 1000);
    assert_eq!(grid.data_row_count(), 1000);
    assert_eq!(grid.materialized_range(), 0..40);
    assert_eq!(grid.visible_range(), 0..20);
    assert_eq!(grid.scroll_height(), 20_000);
    assert_eq!(grid.placeholder(), None);
    assert_eq!(grid.factory().live, 40);

    let widths: Vec<u32> = grid.column_widths().into_iter().map(|(_, w)| w).collect();
    assert_eq!(widths, vec![200, 200, 200]);

    let rows = grid.visible_rows();
    assert_eq!(rows[0], (0, 0));
    assert_eq!(rows[1], (1, 20));
}

#[test]
fn test_preserve_scroll_on_reload() {
    let mut grid = grid(1000);
    let outcome = grid.scroll_vertical_to(10_000).unwrap();
    assert!(outcome.jumped);
    assert_eq!(grid.visible_range().start, 500);

    grid.set_data(records(1000), true);
    assert_eq!(grid.scroll_top(), 10_000);
    assert_eq!(grid.visible_range().start, 500);
    assert_padding(&grid);

    grid.set_data(records(1000), false);
    assert_eq!(grid.scroll_top(), 0);
    assert_eq!(grid.visible_range().start, 0);
}

#[test]
fn test_horizontal_offset_survives_vertical_scroll() {
    let mut grid = grid(1000);
    grid.set_layout_mode(LayoutMode::FitDataStretch);
    grid.resize(100, 400);
    // 3 columns at their 40 minimum overflow a 100 wide container
    let sync = grid.scroll_horizontal_to(15);
    assert_eq!(sync.body, 15);

    grid.scroll_vertical_by(100);
    assert_eq!(grid.horizontal().header, 15);
    assert_eq!(grid.horizontal().footer, 15);
}

#[test]
fn test_empty_filter_result_shows_placeholder() {
    let mut grid = grid(100);
    grid.set_filters(vec![FilterSpec::Equals {
        field: "city".into(),
        value: json!("Atlantis"),
    }]);
    assert_eq!(grid.display_row_count(), 0);
    assert_eq!(grid.placeholder(), Some("No Data Available"));
    assert_eq!(grid.scroll_height(), 0);
    assert!(grid.visible_range().is_empty());
    assert_eq!(grid.factory().live, 0);

    grid.set_filters(Vec::new());
    assert_eq!(grid.display_row_count(), 100);
}

#[test]
fn test_out_of_range_requests_are_rejected() {
    let mut grid = grid(1000);
    let err = grid.scroll_to_row(5000, RowPosition::Top, true).unwrap_err();
    assert!(matches!(
        err,
        GridError::RowOutOfRange {
            index: 5000,
            count: 1000
        }
    ));
    assert_eq!(grid.materialized_range(), 0..40);

    assert!(matches!(
        grid.column_width("missing"),
        Err(GridError::UnknownColumn(_))
    ));
    assert!(grid.cell_text(1000, "name").is_err());
    assert_eq!(grid.cell_text(3, "name").unwrap(), "row 3");
}

#[test]
fn test_scroll_to_row_reveals_row() {
    let mut grid = grid(1000);
    grid.scroll_to_row(700, RowPosition::Top, true).unwrap();
    assert_eq!(grid.scroll_top(), 14_000);
    assert_eq!(grid.visible_range().start, 700);

    // already fully visible: nothing moves
    grid.scroll_to_row(705, RowPosition::Top, false).unwrap();
    assert_eq!(grid.scroll_top(), 14_000);
}

#[test]
fn test_resize_and_column_visibility() {
    let mut grid = grid(50);
    grid.resize(300, 400);
    assert_eq!(grid.column_width("name").unwrap(), 100);

    grid.set_column_visible("qty", false).unwrap();
    assert_eq!(grid.column_width("qty").unwrap(), 0);
    assert_eq!(grid.column_width("name").unwrap(), 150);
    assert_eq!(grid.column_width("city").unwrap(), 150);

    grid.move_column("city", 0).unwrap();
    let order: Vec<String> = grid.column_widths().into_iter().map(|(f, _)| f).collect();
    assert_eq!(order, vec!["city", "name"]);
}

#[test]
fn test_sort_cycle_and_paging() {
    let mut grid = grid(1000);
    assert_eq!(grid.cycle_sort("name"), Some(SortOrder::Ascending));
    assert_eq!(grid.cell_text(0, "name").unwrap(), "row 0");
    assert_eq!(grid.cell_text(2, "name").unwrap(), "row 10");
    assert_eq!(grid.cycle_sort("name"), Some(SortOrder::Descending));
    assert_eq!(grid.cell_text(0, "name").unwrap(), "row 999");
    assert_eq!(grid.cycle_sort("name"), None);
    assert!(grid.sorters().is_empty());

    grid.set_page_size(Some(100));
    assert_eq!(grid.display_row_count(), 100);
    assert_eq!(grid.page_count(), 10);
    grid.set_page(3);
    assert_eq!(grid.page(), Some(3));
    assert_eq!(grid.cell_text(0, "name").unwrap(), "row 200");
}

#[test]
fn test_grouping_and_toggle() {
    let mut grid = grid(30);
    grid.set_group_by(Some("city"));
    assert_eq!(grid.display_row_count(), 33);
    assert_eq!(grid.cell_text(0, "name").unwrap(), "");

    assert!(grid.toggle_group("Tokyo"));
    assert_eq!(grid.display_row_count(), 23);

    grid.set_group_by(None);
    assert_eq!(grid.display_row_count(), 30);
}

#[test]
fn test_scrollbar_takes_layout_width_on_overflow() {
    let mut config = Config::default();
    config.layout.scrollbar_width = 10;

    let mut tall = GridBuilder::new()
        .config(config.clone())
        .columns(columns())
        .size(600, 400)
        .build(UniformRowFactory::new(20))
        .unwrap();
    tall.set_data(records(100), false);
    assert_eq!(tall.layout_width(), 590);
    let total: u32 = tall.column_widths().iter().map(|(_, w)| w).sum();
    assert_eq!(total, 590);

    let mut short = GridBuilder::new()
        .config(config)
        .columns(columns())
        .size(600, 400)
        .build(UniformRowFactory::new(20))
        .unwrap();
    short.set_data(records(5), false);
    assert_eq!(short.layout_width(), 600);
}

#[test]
fn test_fit_data_uses_minimum_for_short_content() {
    let mut grid = grid(20);
    grid.set_layout_mode(LayoutMode::FitData);
    let widths: Vec<u32> = grid.column_widths().into_iter().map(|(_, w)| w).collect();
    assert_eq!(widths, vec![40, 40, 40]);
    assert_eq!(grid.cycle_layout_mode(), LayoutMode::FitDataFill);
}

#[test]
fn test_wrapped_text_rows_keep_padding_exact() {
    let records: Vec<Record> = (0..200)
        .map(|i| {
            let note = if i % 2 == 0 {
                "short".to_string()
            } else {
                "a rather long note that has to wrap over several lines".to_string()
            };
            json!({"id": i, "note": note}).as_object().cloned().unwrap()
        })
        .collect();

    let mut grid = GridBuilder::new()
        .config(Config::terminal())
        .columns(vec![
            ColumnDefinition::new("id", "Id").width(6),
            ColumnDefinition::new("note", "Note"),
        ])
        .size(30, 10)
        .build(TextRowFactory::new(3, 2))
        .unwrap();
    grid.set_data(records, false);

    // scrollbar column taken once content overflows
    assert_eq!(grid.layout_width(), 29);
    assert_eq!(grid.column_width("note").unwrap(), 23);
    assert_padding(&grid);

    let tall = grid.factory().rendered(1).unwrap();
    assert_eq!(tall.height, 3);
    assert_eq!(grid.factory().rendered(0).unwrap().height, 1);

    for _ in 0..40 {
        grid.scroll_vertical_by(3);
        assert_padding(&grid);
        assert_eq!(grid.factory().live_rows(), grid.materialized_range().len());
    }
    for _ in 0..25 {
        grid.scroll_vertical_by(-5);
        assert_padding(&grid);
    }
}

#[test]
fn test_builder_rejects_invalid_config() {
    let mut config = Config::default();
    config.viewport.big_jump_factor = 0;
    let result = GridBuilder::new()
        .config(config)
        .columns(columns())
        .build(UniformRowFactory::new(20));
    assert!(matches!(result, Err(GridError::Config(_))));

    let result = GridBuilder::new()
        .columns(vec![ColumnDefinition::new("qty", "Qty").sorter(
            vgrid::data::capabilities::SorterSpec::Named("nope".to_string()),
        )])
        .build(UniformRowFactory::new(20));
    assert!(matches!(result, Err(GridError::UnknownCapability { .. })));
}
