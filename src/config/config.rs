use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::GridError;
use crate::ui::viewport::column_width_solver::LayoutMode;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub viewport: ViewportConfig,
    pub layout: LayoutConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
}

/// How the vertical renderer materializes rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Only a window of rows around the scroll position is materialized
    Virtual,
    /// Every display row is materialized (no padding, no windowing)
    Basic,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    pub render_mode: RenderMode,

    /// Height assumed for rows that have never been measured
    pub default_row_height: u32,

    /// Extra height rendered beyond the visible area.
    /// When unset the container height is used.
    pub window_buffer: Option<u32>,

    /// Minimum number of rows kept above the target row on a mid-list fill
    pub min_margin_rows: usize,

    /// Minimum number of rows a fill materializes, however tall they are
    pub min_total_rows: usize,

    /// Maximum rows added or removed per edge in one scroll event
    pub max_render_chain: usize,

    /// A scroll further than `big_jump_factor * window_buffer` from the
    /// window edges re-fills instead of extending
    pub big_jump_factor: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub mode: LayoutMode,

    /// Minimum width for columns that do not declare one
    pub default_min_width: u32,

    /// Width reserved for the vertical scrollbar when content overflows
    pub scrollbar_width: u32,

    /// Rows sampled when measuring natural content widths
    pub sample_rows: usize,

    /// Padding added to measured content widths
    pub cell_padding: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Shown instead of rows when the display sequence is empty
    pub placeholder: String,

    /// Show row numbers in the terminal host
    pub show_row_numbers: bool,

    /// Emit a calc row after each group
    pub group_footers: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is not set
    pub level: String,

    /// Also write log lines to a file in the data directory
    pub log_to_file: bool,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            render_mode: RenderMode::Virtual,
            default_row_height: 20,
            window_buffer: None,
            min_margin_rows: 5,
            min_total_rows: 20,
            max_render_chain: 90,
            big_jump_factor: 2,
        }
    }
}

impl ViewportConfig {
    /// Settings suited to a terminal, where one row is one line
    pub fn terminal() -> Self {
        Self {
            default_row_height: 1,
            min_total_rows: 5,
            ..Self::default()
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            mode: LayoutMode::FitColumns,
            default_min_width: 40,
            scrollbar_width: 0,
            sample_rows: 100,
            cell_padding: 2,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            placeholder: "No Data Available".to_string(),
            show_row_numbers: false,
            group_footers: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_to_file: false,
        }
    }
}

impl Config {
    /// Defaults for the terminal host
    pub fn terminal() -> Self {
        Self {
            viewport: ViewportConfig::terminal(),
            layout: LayoutConfig {
                default_min_width: 3,
                scrollbar_width: 1,
                ..LayoutConfig::default()
            },
            ..Self::default()
        }
    }

    /// Load config from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    /// Load config from a specific file, falling back to terminal defaults
    /// when the file does not exist
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::terminal());
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("parsing {}", config_path.display()))?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;

        Ok(())
    }

    /// Reject settings the viewport cannot run with
    pub fn validate(&self) -> std::result::Result<(), GridError> {
        let viewport = &self.viewport;
        if viewport.default_row_height == 0 {
            return Err(GridError::Config(
                "viewport.default_row_height must be at least 1".to_string(),
            ));
        }
        if viewport.max_render_chain == 0 {
            return Err(GridError::Config(
                "viewport.max_render_chain must be at least 1".to_string(),
            ));
        }
        if viewport.big_jump_factor == 0 {
            return Err(GridError::Config(
                "viewport.big_jump_factor must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("vgrid").join("config.toml"))
    }

    /// Create a default config file with comments
    pub fn create_default_with_comments() -> String {
        r#"# vgrid Configuration File
# Location: ~/.config/vgrid/config.toml (Linux)

[viewport]
# "virtual" renders a window of rows around the scroll position,
# "basic" renders every row
render_mode = "virtual"

# Height (in lines) assumed for rows not yet measured
default_row_height = 1

# Extra lines rendered beyond the visible area (defaults to the viewport height)
# window_buffer = 40

# Rows kept above the target row when jumping into the middle of the data
min_margin_rows = 5

# Rows always rendered by a fill, however tall they are
min_total_rows = 5

# Rows added or removed per edge in one scroll event
max_render_chain = 90

# Scrolling further than this many window buffers re-renders from scratch
big_jump_factor = 2

[layout]
# "fit_data", "fit_data_fill", "fit_data_stretch" or "fit_columns"
mode = "fit_columns"
default_min_width = 3
scrollbar_width = 1
sample_rows = 100
cell_padding = 2

[display]
placeholder = "No Data Available"
show_row_numbers = false
group_footers = false

[logging]
# Used when RUST_LOG is not set
level = "info"
log_to_file = false
"#
        .to_string()
    }
}
