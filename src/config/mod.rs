//! Configuration module
//!
//! Viewport tuning, column layout, display and logging settings,
//! loaded from a TOML file in the user's config directory.

pub mod config;

pub use config::{Config, DisplayConfig, LayoutConfig, LoggingConfig, RenderMode, ViewportConfig};
