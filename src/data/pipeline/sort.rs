use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::data::capabilities::{compare_string, SorterFn};
use crate::data::column::ColumnSet;
use crate::data::record::{RowId, RowStore};

/// Sort order for columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn toggle(self) -> Self {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }

    pub fn indicator(self) -> &'static str {
        match self {
            SortOrder::Ascending => " ↑",
            SortOrder::Descending => " ↓",
        }
    }
}

/// One sort key; the first spec in a list is the primary key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

/// Stable multi-key sort of record ids using each column's sorter
pub fn sort_rows(ids: &mut [RowId], specs: &[SortSpec], store: &RowStore, columns: &ColumnSet) {
    if specs.is_empty() {
        return;
    }

    let keys: Vec<(&str, SortOrder, SorterFn)> = specs
        .iter()
        .map(|spec| {
            let sorter = columns
                .by_field(&spec.field)
                .map(|c| c.sorter.clone())
                .unwrap_or_else(|| std::sync::Arc::new(compare_string));
            (spec.field.as_str(), spec.order, sorter)
        })
        .collect();

    ids.sort_by(|a, b| {
        for (field, order, sorter) in &keys {
            let ord = sorter(store.value(*a, field), store.value(*b, field));
            let ord = match order {
                SortOrder::Ascending => ord,
                SortOrder::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });
}
