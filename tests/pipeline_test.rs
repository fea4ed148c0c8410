use serde_json::json;
use std::sync::Arc;

use vgrid::data::capabilities::{Capabilities, SorterSpec};
use vgrid::data::column::{ColumnDefinition, ColumnSet};
use vgrid::data::display_row::DisplayKind;
use vgrid::data::pipeline::{
    DisplayPipeline, FilterSpec, GroupSpec, PipelineStage, SortOrder, SortSpec,
};
use vgrid::data::record::{Record, RowId, RowStore};

fn trades() -> (RowStore, ColumnSet) {
    let rows = [
        ("Equity Trading", 120, "London"),
        ("FX Trading", 15, "Tokyo"),
        ("Equity Trading", 9, "New York"),
        ("Bond Trading", 300, "London"),
        ("FX Trading", 42, "London"),
        ("Options", 7, "Tokyo"),
    ];
    let mut store = RowStore::new();
    for (book, qty, city) in rows {
        store.push(
            json!({"book": book, "qty": qty, "city": city})
                .as_object()
                .cloned()
                .unwrap(),
        );
    }
    let columns = ColumnSet::build(
        vec![
            ColumnDefinition::new("book", "Book"),
            ColumnDefinition::new("qty", "Qty").sorter(SorterSpec::Named("number".into())),
            ColumnDefinition::new("city", "City"),
        ],
        &Capabilities::builtin(),
        10,
    )
    .unwrap();
    (store, columns)
}

fn ids(pipeline: &DisplayPipeline) -> Vec<usize> {
    pipeline
        .display_rows()
        .iter()
        .filter_map(|r| r.row_id())
        .map(|id| id.0)
        .collect()
}

#[test]
fn test_filters_combine() {
    let (store, columns) = trades();
    let mut pipeline = DisplayPipeline::new();
    pipeline.set_filters(vec![
        FilterSpec::Equals {
            field: "city".into(),
            value: json!("London"),
        },
        FilterSpec::Contains {
            field: "book".into(),
            text: "trading".into(),
        },
    ]);
    pipeline.refresh(&store, &columns, PipelineStage::Filter);
    assert_eq!(ids(&pipeline), vec![0, 3, 4]);
    assert_eq!(pipeline.filtered_count(), 3);
}

#[test]
fn test_regex_and_custom_filters() {
    let (store, columns) = trades();
    let mut pipeline = DisplayPipeline::new();
    pipeline.set_filters(vec![FilterSpec::Regex {
        field: "book".into(),
        pattern: "^(FX|Options)".into(),
    }]);
    pipeline.refresh(&store, &columns, PipelineStage::Filter);
    assert_eq!(ids(&pipeline), vec![1, 4, 5]);

    pipeline.set_filters(vec![FilterSpec::Custom(Arc::new(|r: &Record| {
        r.get("qty").and_then(|v| v.as_i64()).unwrap_or(0) > 40
    }))]);
    pipeline.refresh(&store, &columns, PipelineStage::Filter);
    assert_eq!(ids(&pipeline), vec![0, 3, 4]);
}

#[test]
fn test_invalid_regex_is_skipped() {
    let (store, columns) = trades();
    let mut pipeline = DisplayPipeline::new();
    pipeline.set_filters(vec![FilterSpec::Regex {
        field: "book".into(),
        pattern: "(unclosed".into(),
    }]);
    pipeline.refresh(&store, &columns, PipelineStage::Filter);
    assert_eq!(pipeline.display_rows().len(), 6);
}

#[test]
fn test_multi_column_sort() {
    let (store, columns) = trades();
    let mut pipeline = DisplayPipeline::new();
    pipeline.set_sort(vec![
        SortSpec::new("city", SortOrder::Ascending),
        SortSpec::new("qty", SortOrder::Descending),
    ]);
    pipeline.refresh(&store, &columns, PipelineStage::Sort);
    // London 300, 120, 42; New York 9; Tokyo 15, 7
    assert_eq!(ids(&pipeline), vec![3, 0, 4, 2, 1, 5]);
}

#[test]
fn test_numeric_sorter_is_used() {
    let (store, columns) = trades();
    let mut pipeline = DisplayPipeline::new();
    pipeline.set_sort(vec![SortSpec::new("qty", SortOrder::Ascending)]);
    pipeline.refresh(&store, &columns, PipelineStage::Sort);
    assert_eq!(ids(&pipeline), vec![5, 2, 1, 4, 0, 3]);
}

#[test]
fn test_grouping_with_footers_and_collapse() {
    let (store, columns) = trades();
    let mut pipeline = DisplayPipeline::new();
    pipeline.set_group_by(Some(GroupSpec::new("city").with_footers(true)));
    let seq = pipeline.refresh(&store, &columns, PipelineStage::Group);

    // 3 groups: header + rows + footer each
    assert_eq!(seq.len(), 6 + 3 * 2);
    match &seq.get(0).unwrap().kind {
        DisplayKind::GroupHeader { key, count, collapsed } => {
            assert_eq!(key, "London");
            assert_eq!(*count, 3);
            assert!(!collapsed);
        }
        other => panic!("expected group header, got {:?}", other),
    }
    assert!(matches!(
        seq.get(4).unwrap().kind,
        DisplayKind::GroupFooter { count: 3, .. }
    ));

    assert!(pipeline.toggle_group("London"));
    let seq = pipeline.refresh(&store, &columns, PipelineStage::Group);
    // collapsed London is a lone header; Tokyo and New York keep footers
    assert_eq!(seq.len(), 1 + 4 + 3);
    assert!(matches!(
        seq.get(0).unwrap().kind,
        DisplayKind::GroupHeader { collapsed: true, .. }
    ));

    assert!(!pipeline.toggle_group("London"));
}

#[test]
fn test_paging_clamps() {
    let (store, columns) = trades();
    let mut pipeline = DisplayPipeline::new();
    pipeline.set_page_size(Some(4));
    pipeline.set_page(9);
    pipeline.refresh(&store, &columns, PipelineStage::Page);

    assert_eq!(pipeline.page_count(), 2);
    assert_eq!(pipeline.page(), Some(2));
    assert_eq!(ids(&pipeline), vec![4, 5]);

    pipeline.set_page_size(None);
    pipeline.refresh(&store, &columns, PipelineStage::Page);
    assert_eq!(pipeline.page(), None);
    assert_eq!(pipeline.display_rows().len(), 6);
}

#[test]
fn test_page_change_does_not_refilter() {
    let (store, columns) = trades();
    let mut pipeline = DisplayPipeline::new();
    pipeline.set_page_size(Some(2));
    pipeline.refresh(&store, &columns, PipelineStage::Filter);
    assert!(!pipeline.is_dirty());

    pipeline.set_page(2);
    assert!(pipeline.is_dirty());
    pipeline.refresh(&store, &columns, PipelineStage::Page);
    assert_eq!(ids(&pipeline), vec![2, 3]);
    assert_eq!(pipeline.display_rows().get(0).unwrap().row_id(), Some(RowId(2)));
}
