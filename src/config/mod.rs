//! Configuration for a gridlock session
//!
//! The command line is parsed once into an immutable [`Config`] that is
//! passed by reference into the session and the presenter. Nothing reads
//! configuration as ambient state.

pub mod color;
pub mod grid;

use thiserror::Error;

pub use color::{Rgba, parse_color};
pub use grid::{parse_grid, parse_offset};

use crate::domain::geometry::{GravityMode, Offset};
use crate::domain::grid::{GridError, GridSpec};

/// Errors in user-supplied configuration values
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("expected {expected} comma-separated values, got {found} in '{input}'")]
    WrongComponentCount {
        input: String,
        expected: &'static str,
        found: usize,
    },
    #[error("'{value}' is not a valid number")]
    NotANumber { value: String },
    #[error("color component {value} is outside [0, 1]")]
    ComponentOutOfRange { value: f32 },
    #[error("line thickness must be a positive number of pixels, got {0}")]
    InvalidThickness(f32),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Which part of the screen the overlay covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayMode {
    /// Maximized, undecorated: the visible work area without panels
    #[default]
    Maximized,
    /// The whole monitor
    Fullscreen,
}

/// Colors and stroke used to draw the overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayStyle {
    pub grid_color: Rgba,
    pub background_color: Rgba,
    pub highlight_color: Rgba,
    pub line_width: f32,
}

impl OverlayStyle {
    pub const DEFAULT_LINE_WIDTH: f32 = 7.0;
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            grid_color: Rgba::new(0.0, 0.4, 1.0, 0.8),
            background_color: Rgba::new(0.0, 0.0, 0.0, 0.2),
            highlight_color: Rgba::new(1.0, 1.0, 1.0, 0.3),
            line_width: Self::DEFAULT_LINE_WIDTH,
        }
    }
}

/// Immutable session configuration
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Config {
    pub grid: GridSpec,
    pub offset: Offset,
    pub gravity: GravityMode,
    pub style: OverlayStyle,
    pub overlay_mode: OverlayMode,
    pub live_preview: bool,
    pub debug: bool,
}

/// Validates a grid line thickness in pixels
pub fn parse_thickness(input: &str) -> Result<f32, ConfigError> {
    let value = grid::parse_number::<f32>(input)?;
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::InvalidThickness(value));
    }
    Ok(value)
}
