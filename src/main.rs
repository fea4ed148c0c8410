use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    style::Stylize,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};
use std::io;
use std::time::Duration;
use tracing::{info, warn};

use vgrid::config::Config;
use vgrid::data::column::ColumnDefinition;
use vgrid::data::csv_loader::CsvLoader;
use vgrid::ui::grid::{Grid, GridBuilder};
use vgrid::ui::scroll_coordinator::page_offset;
use vgrid::ui::table_renderer::{body_height, render_grid, RenderOptions};
use vgrid::ui::text_row_factory::TextRowFactory;
use vgrid::ui::viewport::RowPosition;
use vgrid::utils::logging::{init_tracing, LogRingBuffer};

/// Wrapped cell text is cut after this many lines
const MAX_CELL_LINES: u32 = 4;
const LOG_PANE_HEIGHT: u16 = 10;
const HORIZONTAL_STEP: u32 = 4;

fn print_help() {
    println!("{}", "vgrid - virtualized table viewer".blue().bold());
    println!();
    println!("{}", "Usage:".yellow());
    println!("  vgrid [OPTIONS] FILE.csv");
    println!();
    println!("{}", "Options:".yellow());
    println!(
        "  {} - Generate config file with defaults",
        "--generate-config".green()
    );
    println!("  {}            - Show this help", "--help".green());
    println!();
    println!("{}", "Keys:".yellow());
    println!("  {}  - Scroll", "↑↓ / j k".green());
    println!("  {}  - Scroll sideways", "←→ / h l".green());
    println!("  {}   - Focus next/previous column", "Tab / S-Tab".green());
    println!("  {}  - Page up/down", "PgUp/PgDn".green());
    println!("  {}      - Top / bottom", "g / G".green());
    println!("  {}          - Cycle sort on focused column", "s".green());
    println!("  {}          - Cycle layout mode", "m".green());
    println!("  {}         - Toggle log pane", "F5".green());
    println!("  {}          - Quit", "q".green());
}

fn generate_config() -> Result<()> {
    let path = Config::get_config_path()?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(&path, Config::create_default_with_comments())
        .with_context(|| format!("writing {}", path.display()))?;
    println!("Configuration file created at: {:?}", path);
    Ok(())
}

struct App {
    grid: Grid<TextRowFactory>,
    logs: LogRingBuffer,
    focused_column: usize,
    show_logs: bool,
    file_name: String,
}

impl App {
    fn table_area(&self, area: Rect) -> (Rect, Option<Rect>) {
        if self.show_logs && area.height > LOG_PANE_HEIGHT + 4 {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Min(4), Constraint::Length(LOG_PANE_HEIGHT)])
                .split(area);
            (chunks[0], Some(chunks[1]))
        } else {
            (area, None)
        }
    }

    /// Keep the grid sized to the body of the table block
    fn sync_size(&mut self, area: Rect) {
        let (table, _) = self.table_area(area);
        let width = table.width.saturating_sub(2) as u32;
        let height = body_height(table.height) as u32;
        self.grid.resize(width, height);
    }

    fn ui(&self, f: &mut Frame) {
        let (table, logs) = self.table_area(f.area());
        render_grid(
            f,
            table,
            &self.grid,
            RenderOptions {
                selected_column: Some(self.focused_column),
            },
        );

        if let Some(area) = logs {
            let lines: Vec<Line> = self
                .logs
                .get_recent(area.height.saturating_sub(2) as usize)
                .iter()
                .map(|e| Line::from(e.format_for_display()))
                .collect();
            let pane = Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title("Log (F5)"));
            f.render_widget(pane, area);
        }
    }

    fn focused_field(&self) -> Option<String> {
        self.grid
            .columns()
            .visible()
            .nth(self.focused_column)
            .map(|c| c.field().to_string())
    }

    fn jump_to_row(&mut self, index: usize, position: RowPosition) {
        if self.grid.display_row_count() == 0 {
            return;
        }
        if let Err(e) = self.grid.scroll_to_row(index, position, false) {
            warn!(target: "grid", "Jump to row {} failed: {}", index, e);
        }
    }

    /// Returns true when the app should exit
    fn handle_key(&mut self, key: KeyEvent) -> bool {
        let visible_columns = self.grid.columns().visible().count().max(1);
        let page_height = self.grid.window().container_height();
        let row_height = self.grid.window().heights().average();

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Down | KeyCode::Char('j') => {
                self.grid.scroll_vertical_by(1);
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.grid.scroll_vertical_by(-1);
            }
            KeyCode::Left | KeyCode::Char('h') => {
                let left = self.grid.horizontal().body.saturating_sub(HORIZONTAL_STEP);
                self.grid.scroll_horizontal_to(left);
            }
            KeyCode::Right | KeyCode::Char('l') => {
                let left = self.grid.horizontal().body + HORIZONTAL_STEP;
                self.grid.scroll_horizontal_to(left);
            }
            KeyCode::Tab => {
                self.focused_column = (self.focused_column + 1) % visible_columns;
            }
            KeyCode::BackTab => {
                self.focused_column = (self.focused_column + visible_columns - 1) % visible_columns;
            }
            KeyCode::PageDown => {
                let top = page_offset(self.grid.scroll_top(), page_height, row_height, false);
                self.grid.scroll_vertical_to(top);
            }
            KeyCode::PageUp => {
                let top = page_offset(self.grid.scroll_top(), page_height, row_height, true);
                self.grid.scroll_vertical_to(top);
            }
            KeyCode::Char('g') | KeyCode::Home => self.jump_to_row(0, RowPosition::Top),
            KeyCode::Char('G') | KeyCode::End => {
                let last = self.grid.display_row_count().saturating_sub(1);
                self.jump_to_row(last, RowPosition::Bottom);
            }
            KeyCode::Char('s') => {
                if let Some(field) = self.focused_field() {
                    let order = self.grid.cycle_sort(&field);
                    info!(target: "grid", "Sort on '{}': {:?}", field, order);
                }
            }
            KeyCode::Char('m') => {
                let mode = self.grid.cycle_layout_mode();
                info!(target: "grid", "Layout mode: {}", mode.display_name());
            }
            KeyCode::F(5) => {
                self.show_logs = !self.show_logs;
            }
            _ => {}
        }
        false
    }

    fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        info!(target: "grid", "Viewing {}", self.file_name);
        loop {
            let size = terminal.size()?;
            self.sync_size(Rect::new(0, 0, size.width, size.height));
            terminal.draw(|f| self.ui(f))?;

            if !event::poll(Duration::from_millis(100))? {
                continue;
            }
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if self.handle_key(key) {
                        return Ok(());
                    }
                }
                Event::Resize(width, height) => {
                    self.sync_size(Rect::new(0, 0, width, height));
                }
                _ => {}
            }
        }
    }
}

fn build_app(file: &str, config: Config, logs: LogRingBuffer, area: Rect) -> Result<App> {
    let data = CsvLoader::load(file)?;
    let columns = data
        .headers
        .iter()
        .map(|h| ColumnDefinition::new(h.as_str(), h.as_str()))
        .collect();

    let factory = TextRowFactory::new(MAX_CELL_LINES, config.layout.cell_padding);
    let mut app = App {
        grid: GridBuilder::new()
            .config(config)
            .columns(columns)
            .build(factory)?,
        logs,
        focused_column: 0,
        show_logs: false,
        file_name: file.to_string(),
    };
    app.sync_size(area);
    app.grid.set_data(data.records, false);
    Ok(app)
}

fn run_tui(file: &str, config: Config, logs: LogRingBuffer) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    if let Err(e) = execute!(stdout, EnterAlternateScreen) {
        let _ = disable_raw_mode();
        return Err(e).context("Failed to setup terminal");
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = match Terminal::new(backend) {
        Ok(t) => t,
        Err(e) => {
            let _ = disable_raw_mode();
            return Err(e).context("Failed to create terminal");
        }
    };

    let res = terminal
        .size()
        .map_err(anyhow::Error::from)
        .and_then(|size| build_app(file, config, logs, Rect::new(0, 0, size.width, size.height)))
        .and_then(|mut app| app.run(&mut terminal));

    // Always restore terminal, even on error
    let _ = disable_raw_mode();
    let _ = execute!(terminal.backend_mut(), LeaveAlternateScreen);
    let _ = terminal.show_cursor();

    res
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|a| a == "--generate-config") {
        return generate_config();
    }

    let (config, config_error) = match Config::load() {
        Ok(config) => (config, None),
        Err(e) => (Config::terminal(), Some(e)),
    };
    let logs = init_tracing(&config.logging);
    if let Some(e) = config_error {
        warn!(target: "config", "Using default config: {:#}", e);
    }

    let Some(file) = args.iter().skip(1).find(|a| !a.starts_with("--")) else {
        print_help();
        std::process::exit(1);
    };

    run_tui(file, config, logs)
}
