//! Display rows: the units the viewport windows over.
//!
//! The pipeline regenerates the whole `DisplaySequence` whenever one of its
//! stages changes. Height state for rows whose key survives the re-run is
//! copied across so measurements are not thrown away by a sort.

use std::collections::HashMap;

use crate::data::record::RowId;

/// What a display row stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayKind {
    /// A data record
    Data(RowId),
    /// Header row opening a group; a collapsed group shows only its header
    GroupHeader {
        key: String,
        count: usize,
        collapsed: bool,
    },
    /// Calc row closing a group
    GroupFooter { key: String, count: usize },
}

/// Identity of a display row across pipeline runs
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DisplayKey {
    Data(RowId),
    GroupHeader(String),
    GroupFooter(String),
}

/// One renderable unit
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayRow {
    pub kind: DisplayKind,
    /// Last measured height, `None` until the row has been rendered
    pub height: Option<u32>,
    /// A visual representation has been built at least once
    pub initialized: bool,
    /// Cells have been stretched to `height`
    pub height_initialized: bool,
}

impl DisplayRow {
    pub fn new(kind: DisplayKind) -> Self {
        Self {
            kind,
            height: None,
            initialized: false,
            height_initialized: false,
        }
    }

    pub fn data(id: RowId) -> Self {
        Self::new(DisplayKind::Data(id))
    }

    pub fn key(&self) -> DisplayKey {
        match &self.kind {
            DisplayKind::Data(id) => DisplayKey::Data(*id),
            DisplayKind::GroupHeader { key, .. } => DisplayKey::GroupHeader(key.clone()),
            DisplayKind::GroupFooter { key, .. } => DisplayKey::GroupFooter(key.clone()),
        }
    }

    pub fn row_id(&self) -> Option<RowId> {
        match self.kind {
            DisplayKind::Data(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_group_row(&self) -> bool {
        !matches!(self.kind, DisplayKind::Data(_))
    }

    /// Forget that cells were stretched, so the next render re-normalizes
    pub fn deinitialize_height(&mut self) {
        self.height_initialized = false;
    }
}

/// Ordered, 0-indexed display rows
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisplaySequence {
    rows: Vec<DisplayRow>,
}

impl DisplaySequence {
    pub fn new(rows: Vec<DisplayRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&DisplayRow> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [DisplayRow] {
        &mut self.rows
    }

    pub fn iter(&self) -> impl Iterator<Item = &DisplayRow> {
        self.rows.iter()
    }

    /// Copy height state from a previous sequence for rows with the same key
    pub fn adopt_state(&mut self, previous: &DisplaySequence) {
        if previous.is_empty() {
            return;
        }

        let carried: HashMap<DisplayKey, (Option<u32>, bool, bool)> = previous
            .rows
            .iter()
            .filter(|r| r.initialized || r.height.is_some())
            .map(|r| (r.key(), (r.height, r.initialized, r.height_initialized)))
            .collect();

        for row in &mut self.rows {
            if let Some((height, initialized, height_initialized)) = carried.get(&row.key()) {
                row.height = *height;
                row.initialized = *initialized;
                row.height_initialized = *height_initialized;
            }
        }
    }

    /// Index of the display row for a record, if it is displayed
    pub fn position_of(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|r| r.row_id() == Some(id))
    }
}
