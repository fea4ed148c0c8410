//! Column definitions and the column arena.
//!
//! A `ColumnDefinition` is what the host supplies. `ColumnSet` resolves
//! the definitions once (formatter/sorter lookups, default minimums) and
//! owns the resulting `Column`s; everything else refers to them by
//! `ColumnId`.

use std::collections::HashMap;
use tracing::debug;

use crate::data::capabilities::{Capabilities, FormatterFn, FormatterSpec, SorterFn, SorterSpec};
use crate::error::{GridError, Result};
use crate::ui::viewport::column_width_solver::ColumnSpec;

/// Explicit width of a column
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidthSpec {
    /// Absolute width in units
    Px(u32),
    /// Share of the container width
    Percent(f32),
}

/// A column as declared by the host
#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    pub field: String,
    pub title: String,
    pub width: Option<WidthSpec>,
    pub min_width: Option<u32>,
    pub max_width: Option<u32>,
    pub width_grow: Option<u32>,
    pub width_shrink: Option<u32>,
    pub visible: bool,
    pub formatter: FormatterSpec,
    pub sorter: SorterSpec,
}

impl ColumnDefinition {
    pub fn new(field: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            title: title.into(),
            width: None,
            min_width: None,
            max_width: None,
            width_grow: None,
            width_shrink: None,
            visible: true,
            formatter: FormatterSpec::default(),
            sorter: SorterSpec::default(),
        }
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(WidthSpec::Px(width));
        self
    }

    pub fn width_percent(mut self, percent: f32) -> Self {
        self.width = Some(WidthSpec::Percent(percent));
        self
    }

    pub fn min_width(mut self, min_width: u32) -> Self {
        self.min_width = Some(min_width);
        self
    }

    pub fn max_width(mut self, max_width: u32) -> Self {
        self.max_width = Some(max_width);
        self
    }

    pub fn grow(mut self, weight: u32) -> Self {
        self.width_grow = Some(weight);
        self
    }

    pub fn shrink(mut self, weight: u32) -> Self {
        self.width_shrink = Some(weight);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn formatter(mut self, formatter: FormatterSpec) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn sorter(mut self, sorter: SorterSpec) -> Self {
        self.sorter = sorter;
        self
    }
}

/// Index of a column inside a `ColumnSet`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnId(pub usize);

/// A resolved column
#[derive(Clone)]
pub struct Column {
    pub id: ColumnId,
    pub definition: ColumnDefinition,
    pub min_width: u32,
    pub formatter: FormatterFn,
    pub sorter: SorterFn,
    /// Width assigned by the last layout pass
    pub width: u32,
    /// Measured content width, used by the fit-data layouts
    pub natural_width: u32,
}

impl Column {
    pub fn field(&self) -> &str {
        &self.definition.field
    }

    pub fn title(&self) -> &str {
        &self.definition.title
    }

    pub fn visible(&self) -> bool {
        self.definition.visible
    }

    /// Layout input for this column at the given container width
    pub fn spec(&self, container_width: u32) -> ColumnSpec {
        let fixed = self.definition.width.map(|w| match w {
            WidthSpec::Px(px) => px,
            WidthSpec::Percent(p) => percent_of(container_width, p),
        });

        ColumnSpec {
            min_width: self.min_width,
            max_width: self.definition.max_width,
            fixed_width: fixed,
            grow_weight: self.definition.width_grow.unwrap_or(1),
            shrink_weight: self.definition.width_shrink.unwrap_or(0),
            visible: self.visible(),
            natural_width: self.natural_width.max(self.min_width),
        }
    }
}

fn percent_of(container_width: u32, percent: f32) -> u32 {
    ((container_width as f64 / 100.0) * percent as f64).floor() as u32
}

/// Owns all columns in display order
#[derive(Clone, Default)]
pub struct ColumnSet {
    columns: Vec<Column>,
    by_field: HashMap<String, ColumnId>,
    order: Vec<ColumnId>,
}

impl ColumnSet {
    /// Resolve definitions against the capability table
    pub fn build(
        definitions: Vec<ColumnDefinition>,
        capabilities: &Capabilities,
        default_min_width: u32,
    ) -> Result<Self> {
        let mut columns = Vec::with_capacity(definitions.len());
        let mut by_field = HashMap::new();

        for (idx, definition) in definitions.into_iter().enumerate() {
            let formatter = capabilities.resolve_formatter(&definition.formatter)?;
            let sorter = capabilities.resolve_sorter(&definition.sorter)?;
            let id = ColumnId(idx);
            by_field.insert(definition.field.clone(), id);

            columns.push(Column {
                id,
                min_width: definition.min_width.unwrap_or(default_min_width),
                definition,
                formatter,
                sorter,
                width: 0,
                natural_width: 0,
            });
        }

        debug!(target: "column_layout", "Resolved {} column definitions", columns.len());

        let order = (0..columns.len()).map(ColumnId).collect();
        Ok(Self {
            columns,
            by_field,
            order,
        })
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id.0)
    }

    pub fn get_mut(&mut self, id: ColumnId) -> Option<&mut Column> {
        self.columns.get_mut(id.0)
    }

    pub fn id_of(&self, field: &str) -> Result<ColumnId> {
        self.by_field
            .get(field)
            .copied()
            .ok_or_else(|| GridError::UnknownColumn(field.to_string()))
    }

    pub fn by_field(&self, field: &str) -> Option<&Column> {
        self.by_field.get(field).and_then(|id| self.get(*id))
    }

    /// Columns in display order
    pub fn iter(&self) -> impl Iterator<Item = &Column> {
        self.order.iter().filter_map(|id| self.columns.get(id.0))
    }

    /// Visible columns in display order
    pub fn visible(&self) -> impl Iterator<Item = &Column> {
        self.iter().filter(|c| c.visible())
    }

    /// Display order as ids
    pub fn order(&self) -> &[ColumnId] {
        &self.order
    }

    pub fn set_visible(&mut self, field: &str, visible: bool) -> Result<()> {
        let id = self.id_of(field)?;
        if let Some(column) = self.get_mut(id) {
            column.definition.visible = visible;
        }
        Ok(())
    }

    /// Move a column to a new display position
    pub fn move_column(&mut self, field: &str, to_position: usize) -> Result<()> {
        let id = self.id_of(field)?;
        if let Some(from) = self.order.iter().position(|c| *c == id) {
            self.order.remove(from);
            let to = to_position.min(self.order.len());
            self.order.insert(to, id);
        }
        Ok(())
    }

    /// Layout inputs for every column in display order
    pub fn specs(&self, container_width: u32) -> Vec<ColumnSpec> {
        self.iter().map(|c| c.spec(container_width)).collect()
    }

    /// Store layout results, given in display order
    pub fn apply_widths(&mut self, widths: &[u32]) {
        let order = self.order.clone();
        for (id, width) in order.iter().zip(widths.iter()) {
            if let Some(column) = self.columns.get_mut(id.0) {
                column.width = *width;
            }
        }
    }

    pub fn set_natural_width(&mut self, id: ColumnId, width: u32) {
        if let Some(column) = self.columns.get_mut(id.0) {
            column.natural_width = width;
        }
    }
}
