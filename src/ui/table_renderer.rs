//! Draws a `Grid<TextRowFactory>` into a ratatui frame.
//!
//! Only rows the viewport reports as visible are drawn, each at its own
//! offset from the scroll position, so a tall wrapped row can be partly
//! above the top edge. Horizontal scrolling slices every line by display
//! width so header and body stay aligned.

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::ui::grid::Grid;
use crate::ui::text_row_factory::TextRowFactory;

/// Options the host toggles at runtime
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Column index (among visible columns) drawn highlighted
    pub selected_column: Option<usize>,
}

/// Height of the header block (border + header line + separator)
pub const HEADER_LINES: u16 = 2;

/// Lines available to rows inside a bordered table of `area_height`
pub fn body_height(area_height: u16) -> u16 {
    area_height.saturating_sub(HEADER_LINES + 2)
}

pub fn render_grid(f: &mut Frame, area: Rect, grid: &Grid<TextRowFactory>, options: RenderOptions) {
    let title = format!(
        "{} rows ({} of {} records){}",
        grid.display_row_count(),
        grid.filtered_row_count(),
        grid.data_row_count(),
        grid.page()
            .map(|p| format!(" page {}/{}", p, grid.page_count()))
            .unwrap_or_default()
    );
    let block = Block::default().borders(Borders::ALL).title(title);
    let inner = block.inner(area);
    f.render_widget(block, area);

    if let Some(placeholder) = grid.placeholder() {
        let empty = Paragraph::new(placeholder.to_string())
            .style(Style::default().fg(Color::Yellow))
            .alignment(Alignment::Center);
        f.render_widget(empty, inner);
        return;
    }

    let left = grid.horizontal().body as usize;
    let width = inner.width as usize;

    let mut lines = vec![header_line(grid, left, width, options)];
    lines.push(Line::from("─".repeat(width)).style(Style::default().fg(Color::DarkGray)));
    lines.extend(body_lines(grid, left, width, body_height(area.height) as usize));

    f.render_widget(Paragraph::new(lines), inner);
}

fn header_line(
    grid: &Grid<TextRowFactory>,
    left: usize,
    width: usize,
    options: RenderOptions,
) -> Line<'static> {
    let mut spans = Vec::new();
    for (pos, column) in grid.columns().visible().enumerate() {
        let indicator = grid
            .sorters()
            .iter()
            .find(|s| s.field == column.field())
            .map(|s| s.order.indicator())
            .unwrap_or("");
        let text = pad_to(&format!(" {}{}", column.title(), indicator), column.width as usize);

        let mut style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        if options.selected_column == Some(pos) {
            style = style.fg(Color::Yellow).add_modifier(Modifier::UNDERLINED);
        }
        spans.push((text, style));
    }
    slice_spans(spans, left, width)
}

fn body_lines(
    grid: &Grid<TextRowFactory>,
    left: usize,
    width: usize,
    height: usize,
) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = vec![Line::default(); height];
    let widths: Vec<usize> = grid.columns().visible().map(|c| c.width as usize).collect();

    for (index, rel_y) in grid.visible_rows() {
        let Some(rendered) = grid.factory().rendered(index) else {
            continue;
        };
        for line in 0..rendered.height as i64 {
            let y = rel_y + line;
            if y < 0 || y >= height as i64 {
                continue;
            }

            let spans = match &rendered.banner {
                Some(banner) if line == 0 => vec![(
                    pad_to(banner, widths.iter().sum()),
                    Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
                )],
                Some(_) => Vec::new(),
                None => rendered
                    .cells
                    .iter()
                    .zip(&widths)
                    .map(|(cell, w)| {
                        let text = cell.get(line as usize).map(String::as_str).unwrap_or("");
                        (pad_to(&format!(" {}", text), *w), Style::default())
                    })
                    .collect(),
            };
            lines[y as usize] = slice_spans(spans, left, width);
        }
    }
    lines
}

/// Pad or cut text to exactly `width` display columns
pub fn pad_to(text: &str, width: usize) -> String {
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str(&" ".repeat(width - used));
    out
}

/// Drop `left` display columns and keep at most `width`
fn slice_spans(spans: Vec<(String, Style)>, left: usize, width: usize) -> Line<'static> {
    let mut skip = left;
    let mut room = width;
    let mut out = Vec::new();

    for (text, style) in spans {
        if room == 0 {
            break;
        }
        let text_width = text.width();
        if skip >= text_width {
            skip -= text_width;
            continue;
        }

        let mut kept = String::new();
        let mut col = 0;
        for ch in text.chars() {
            let w = ch.width().unwrap_or(0);
            if col >= skip && w <= room {
                kept.push(ch);
                room -= w;
            } else if col >= skip {
                room = 0;
                break;
            }
            col += w;
        }
        skip = 0;
        out.push(Span::styled(kept, style));
    }
    Line::from(out)
}
