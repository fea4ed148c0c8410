use proptest::prelude::*;

use vgrid::ui::viewport::column_width_solver::{fit_columns, fit_data};
use vgrid::ui::viewport::{ColumnSpec, ColumnWidthSolver, LayoutMode};

fn visible_total(specs: &[ColumnSpec], widths: &[u32]) -> u32 {
    specs
        .iter()
        .zip(widths)
        .filter(|(s, _)| s.visible)
        .map(|(_, w)| *w)
        .sum()
}

/// Smallest total the solver can reach without breaking a minimum
fn floor_sum(specs: &[ColumnSpec]) -> u32 {
    specs
        .iter()
        .filter(|s| s.visible)
        .map(|s| match s.fixed_width {
            Some(width) if s.shrink_weight == 0 => width.max(s.min_width),
            _ => s.min_width,
        })
        .sum()
}

#[test]
fn test_flexible_columns_meet_minimum_exactly() {
    let specs = [
        ColumnSpec::flexible(50),
        ColumnSpec::flexible(50),
        ColumnSpec::fixed(900, 900),
    ];
    let result = ColumnWidthSolver::new(LayoutMode::FitColumns).solve(1000, &specs);
    assert_eq!(result.widths, vec![50, 50, 900]);
    assert_eq!(result.total(), 1000);
    assert_eq!(result.overflow(1000), 0);
}

#[test]
fn test_container_below_minimums_overflows() {
    let specs = [ColumnSpec::flexible(80), ColumnSpec::flexible(80)];
    let result = ColumnWidthSolver::new(LayoutMode::FitColumns).solve(100, &specs);
    assert_eq!(result.widths, vec![80, 80]);
    assert_eq!(result.total(), 160);
    assert_eq!(result.overflow(100), 60);
}

#[test]
fn test_no_flexible_columns_leaves_space_unfilled() {
    let specs = [ColumnSpec::fixed(100, 10), ColumnSpec::fixed(150, 10)];
    let result = fit_columns(400, &specs);
    assert_eq!(result.widths, vec![100, 150]);
    assert_eq!(result.total(), 250);
}

#[test]
fn test_all_flexible_capped_gives_leftover_to_none() {
    let specs = [
        ColumnSpec::flexible(10).with_max(40),
        ColumnSpec::flexible(10).with_max(40),
    ];
    assert_eq!(fit_columns(200, &specs).widths, vec![40, 40]);
}

#[test]
fn test_pinned_column_leftover_goes_to_uncapped_column() {
    let specs = [
        ColumnSpec::flexible(10),
        ColumnSpec::flexible(10).with_max(20),
        ColumnSpec::flexible(90),
    ];
    // 150 / 3 = 50: the middle column caps at 20, the last pins at 90,
    // and the first takes what is left
    let result = fit_columns(150, &specs);
    assert_eq!(result.widths, vec![40, 20, 90]);
    assert_eq!(result.total(), 150);
}

#[test]
fn test_fit_data_modes() {
    let mut name = ColumnSpec::flexible(5);
    name.natural_width = 30;
    let mut id = ColumnSpec::flexible(5);
    id.natural_width = 4;
    let specs = [id, name];

    let solver = ColumnWidthSolver::new(LayoutMode::FitData);
    assert_eq!(solver.solve(100, &specs).widths, vec![5, 30]);

    let solver = ColumnWidthSolver::new(LayoutMode::FitDataFill);
    assert_eq!(solver.solve(100, &specs).widths, vec![5, 30]);

    let solver = ColumnWidthSolver::new(LayoutMode::FitDataStretch);
    assert_eq!(solver.solve(100, &specs).widths, vec![5, 95]);
}

fn spec_strategy() -> impl Strategy<Value = ColumnSpec> {
    prop_oneof![
        3 => (0u32..100, 1u32..4).prop_map(|(min, grow)| ColumnSpec::flexible(min).with_grow(grow)),
        2 => (0u32..300, 0u32..100, 0u32..3)
            .prop_map(|(width, min, shrink)| ColumnSpec::fixed(width, min).with_shrink(shrink)),
        1 => (0u32..100).prop_map(|min| ColumnSpec::flexible(min).hidden()),
    ]
}

proptest! {
    #[test]
    fn prop_widths_fill_container_exactly(
        specs in prop::collection::vec(spec_strategy(), 1..8),
        extra in 0u32..2_000,
    ) {
        prop_assume!(specs.iter().any(|s| s.visible && s.fixed_width.is_none()));
        let container = floor_sum(&specs) + extra;
        let result = fit_columns(container, &specs);
        prop_assert_eq!(visible_total(&specs, &result.widths), container);
    }

    #[test]
    fn prop_minimums_always_hold(
        specs in prop::collection::vec(spec_strategy(), 1..8),
        container in 0u32..3_000,
    ) {
        let result = fit_columns(container, &specs);
        prop_assert_eq!(result.widths.len(), specs.len());
        for (spec, width) in specs.iter().zip(&result.widths) {
            if spec.visible {
                prop_assert!(*width >= spec.min_width, "{:?} got {}", spec, width);
            } else {
                prop_assert_eq!(*width, 0);
            }
        }
    }

    #[test]
    fn prop_fit_data_respects_bounds(
        specs in prop::collection::vec(spec_strategy(), 1..8),
    ) {
        let result = fit_data(&specs);
        for (spec, width) in specs.iter().zip(&result.widths) {
            if spec.visible {
                prop_assert!(*width >= spec.min_width);
            }
        }
    }
}
