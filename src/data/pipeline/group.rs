use std::collections::{HashMap, HashSet};

use crate::data::display_row::{DisplayKind, DisplayRow};
use crate::data::record::{value_to_text, RowId, RowStore};

/// Group rows by the text of one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    pub field: String,
    /// Emit a calc row after each expanded group
    pub footers: bool,
}

impl GroupSpec {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            footers: false,
        }
    }

    pub fn with_footers(mut self, footers: bool) -> Self {
        self.footers = footers;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub key: String,
    pub rows: Vec<RowId>,
}

/// Bucket rows by key, groups in order of first appearance
pub fn group_rows(ids: &[RowId], field: &str, store: &RowStore) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for id in ids {
        let key = value_to_text(store.value(*id, field));
        match index.get(&key) {
            Some(&slot) => groups[slot].rows.push(*id),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push(Group {
                    key,
                    rows: vec![*id],
                });
            }
        }
    }

    groups
}

/// The thing pagination counts: a data row, or a collapsed group's header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Row { group: Option<usize>, id: RowId },
    Collapsed { group: usize },
}

impl Unit {
    fn group(&self) -> Option<usize> {
        match self {
            Unit::Row { group, .. } => *group,
            Unit::Collapsed { group } => Some(*group),
        }
    }
}

/// Flatten ungrouped rows into units
pub fn plain_units(ids: &[RowId]) -> Vec<Unit> {
    ids.iter().map(|id| Unit::Row { group: None, id: *id }).collect()
}

/// Flatten groups into units, collapsed groups counting as one
pub fn grouped_units(groups: &[Group], collapsed: &HashSet<String>) -> Vec<Unit> {
    let mut units = Vec::new();
    for (slot, group) in groups.iter().enumerate() {
        if collapsed.contains(&group.key) {
            units.push(Unit::Collapsed { group: slot });
        } else {
            units.extend(group.rows.iter().map(|id| Unit::Row {
                group: Some(slot),
                id: *id,
            }));
        }
    }
    units
}

/// Turn a page of units into display rows, adding group headers and footers
pub fn emit_rows(units: &[Unit], groups: &[Group], footers: bool) -> Vec<DisplayRow> {
    let mut rows = Vec::with_capacity(units.len() + 2);
    let mut open: Option<usize> = None;

    let close = |rows: &mut Vec<DisplayRow>, slot: usize| {
        if footers {
            if let Some(group) = groups.get(slot) {
                rows.push(DisplayRow::new(DisplayKind::GroupFooter {
                    key: group.key.clone(),
                    count: group.rows.len(),
                }));
            }
        }
    };

    for unit in units {
        if unit.group() != open {
            if let Some(slot) = open.take() {
                close(&mut rows, slot);
            }
        }

        match *unit {
            Unit::Row { group: None, id } => rows.push(DisplayRow::data(id)),
            Unit::Row {
                group: Some(slot),
                id,
            } => {
                if open != Some(slot) {
                    if let Some(group) = groups.get(slot) {
                        rows.push(DisplayRow::new(DisplayKind::GroupHeader {
                            key: group.key.clone(),
                            count: group.rows.len(),
                            collapsed: false,
                        }));
                    }
                    open = Some(slot);
                }
                rows.push(DisplayRow::data(id));
            }
            Unit::Collapsed { group: slot } => {
                if let Some(group) = groups.get(slot) {
                    rows.push(DisplayRow::new(DisplayKind::GroupHeader {
                        key: group.key.clone(),
                        count: group.rows.len(),
                        collapsed: true,
                    }));
                }
            }
        }
    }

    if let Some(slot) = open {
        close(&mut rows, slot);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> RowStore {
        let mut store = RowStore::new();
        for team in ["red", "blue", "red", "green", "blue"] {
            store.push(json!({ "team": team }).as_object().cloned().unwrap());
        }
        store
    }

    #[test]
    fn test_first_appearance_order() {
        let store = store();
        let groups = group_rows(&store.ids(), "team", &store);
        let keys: Vec<&str> = groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["red", "blue", "green"]);
        assert_eq!(groups[0].rows, vec![RowId(0), RowId(2)]);
    }

    #[test]
    fn test_emit_headers_and_footers() {
        let store = store();
        let groups = group_rows(&store.ids(), "team", &store);
        let units = grouped_units(&groups, &HashSet::new());
        let rows = emit_rows(&units, &groups, true);

        // 3 headers + 5 rows + 3 footers
        assert_eq!(rows.len(), 11);
        assert!(matches!(
            &rows[0].kind,
            DisplayKind::GroupHeader { key, count: 2, collapsed: false } if key == "red"
        ));
        assert_eq!(rows[1].row_id(), Some(RowId(0)));
        assert!(matches!(&rows[3].kind, DisplayKind::GroupFooter { key, .. } if key == "red"));
    }

    #[test]
    fn test_collapsed_group_shows_header_only() {
        let store = store();
        let groups = group_rows(&store.ids(), "team", &store);
        let collapsed: HashSet<String> = ["blue".to_string()].into_iter().collect();
        let units = grouped_units(&groups, &collapsed);
        assert_eq!(units.len(), 4);

        let rows = emit_rows(&units, &groups, true);
        let blue: Vec<&DisplayRow> = rows
            .iter()
            .filter(|r| r.key() == crate::data::display_row::DisplayKey::GroupHeader("blue".into()))
            .collect();
        assert_eq!(blue.len(), 1);
        assert!(!rows
            .iter()
            .any(|r| matches!(&r.kind, DisplayKind::GroupFooter { key, .. } if key == "blue")));
    }

    #[test]
    fn test_partial_page_repeats_header() {
        let store = store();
        let groups = group_rows(&store.ids(), "team", &store);
        let units = grouped_units(&groups, &HashSet::new());
        // second red row starts the slice
        let rows = emit_rows(&units[1..3], &groups, false);
        assert_eq!(rows.len(), 4);
        assert!(rows[0].is_group_row());
        assert_eq!(rows[1].row_id(), Some(RowId(2)));
        assert!(rows[2].is_group_row());
        assert_eq!(rows[3].row_id(), Some(RowId(1)));
    }
}
