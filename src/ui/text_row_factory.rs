//! Row factory for the terminal host.
//!
//! A materialized row is its cell text wrapped to the current column widths.
//! Row height is the tallest wrapped cell, in lines, so heights vary with
//! content and are only known once the row has been built.

use std::collections::HashMap;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::data::column::ColumnSet;
use crate::data::display_row::{DisplayKind, DisplayRow};
use crate::data::record::RowStore;
use crate::ui::row_factory::{RowContext, RowFactory};

/// One built row: wrapped lines per visible column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedRow {
    pub cells: Vec<Vec<String>>,
    pub height: u32,
    /// Group header/footer text spanning the row
    pub banner: Option<String>,
}

pub struct TextRowFactory {
    rendered: HashMap<usize, RenderedRow>,
    max_lines: u32,
    cell_padding: u32,
}

impl TextRowFactory {
    pub fn new(max_lines: u32, cell_padding: u32) -> Self {
        Self {
            rendered: HashMap::new(),
            max_lines: max_lines.max(1),
            cell_padding,
        }
    }

    /// The built row for a display index, if it is materialized
    pub fn rendered(&self, index: usize) -> Option<&RenderedRow> {
        self.rendered.get(&index)
    }

    pub fn live_rows(&self) -> usize {
        self.rendered.len()
    }

    fn build(&self, row: &DisplayRow, store: &RowStore, columns: &ColumnSet) -> RenderedRow {
        match &row.kind {
            DisplayKind::Data(id) => {
                let cells: Vec<Vec<String>> = columns
                    .visible()
                    .map(|column| {
                        let text = (column.formatter)(store.value(*id, column.field()));
                        let width = column.width.saturating_sub(self.cell_padding).max(1);
                        let mut lines = wrap_text(&text, width as usize);
                        lines.truncate(self.max_lines as usize);
                        lines
                    })
                    .collect();
                let height = cells.iter().map(|c| c.len() as u32).max().unwrap_or(1).max(1);
                RenderedRow {
                    cells,
                    height,
                    banner: None,
                }
            }
            DisplayKind::GroupHeader {
                key,
                count,
                collapsed,
            } => RenderedRow {
                cells: Vec::new(),
                height: 1,
                banner: Some(format!(
                    "{} {} ({} {})",
                    if *collapsed { "▶" } else { "▼" },
                    if key.is_empty() { "(empty)" } else { key },
                    count,
                    if *count == 1 { "row" } else { "rows" }
                )),
            },
            DisplayKind::GroupFooter { key, count } => RenderedRow {
                cells: Vec::new(),
                height: 1,
                banner: Some(format!("  Σ {}: {}", key, count)),
            },
        }
    }
}

impl RowFactory for TextRowFactory {
    fn initialize(&mut self, index: usize, row: &DisplayRow, cx: &RowContext<'_>) -> u32 {
        let built = self.build(row, cx.store, cx.columns);
        let height = built.height;
        self.rendered.insert(index, built);
        height
    }

    fn calc_height(&mut self, index: usize, row: &DisplayRow, cx: &RowContext<'_>) -> u32 {
        match self.rendered.get(&index) {
            Some(built) => built.height,
            None => self.build(row, cx.store, cx.columns).height,
        }
    }

    fn set_cell_height(&mut self, index: usize, _row: &DisplayRow, height: u32) {
        if let Some(built) = self.rendered.get_mut(&index) {
            for cell in &mut built.cells {
                cell.resize(height as usize, String::new());
            }
            built.height = height;
        }
    }

    fn teardown(&mut self, index: usize, _row: &DisplayRow) {
        self.rendered.remove(&index);
    }
}

/// Greedy word wrap by display width; words wider than a line are split
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();

    for source in text.split('\n') {
        let mut line = String::new();
        let mut line_width = 0;

        for word in source.split_whitespace() {
            let word_width = word.width();
            let gap = usize::from(!line.is_empty());

            if line_width + gap + word_width <= width {
                if gap == 1 {
                    line.push(' ');
                }
                line.push_str(word);
                line_width += gap + word_width;
                continue;
            }

            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }

            if word_width <= width {
                line.push_str(word);
                line_width = word_width;
            } else {
                for ch in word.chars() {
                    let ch_width = ch.width().unwrap_or(0);
                    if line_width + ch_width > width && !line.is_empty() {
                        lines.push(std::mem::take(&mut line));
                        line_width = 0;
                    }
                    line.push(ch);
                    line_width += ch_width;
                }
            }
        }
        lines.push(line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
