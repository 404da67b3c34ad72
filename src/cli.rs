use std::str::FromStr;

use clap::Parser;

use crate::config::{
    Config, OverlayMode, OverlayStyle, Rgba, parse_color, parse_grid, parse_offset, parse_thickness,
};
use crate::domain::geometry::{GravityMode, Offset};
use crate::domain::grid::GridSpec;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Drag across a grid overlay to move and resize the active window.",
    long_about = None
)]
pub struct Cli {
    /// Grid size as COLS,ROWS
    #[arg(
        long,
        short = 'g',
        value_name = "COLS,ROWS",
        default_value = "16,10",
        value_parser = parse_grid
    )]
    pub grid: GridSpec,

    /// Pixel offset added to the resulting geometry as DX,DY
    #[arg(
        long,
        short = 'o',
        value_name = "DX,DY",
        default_value = "0,0",
        allow_hyphen_values = true,
        value_parser = parse_offset
    )]
    pub offset: Offset,

    /// Gravity sent with geometry requests: current, northwest or static
    #[arg(long, default_value = "current", value_parser = GravityMode::from_str)]
    pub gravity: GravityMode,

    /// Grid line color
    #[arg(
        long,
        value_name = "R,G,B[,A]",
        default_value = "0,0.4,1,0.8",
        value_parser = parse_color
    )]
    pub grid_color: Rgba,

    /// Fill drawn over the whole overlay
    #[arg(long, value_name = "R,G,B[,A]", default_value = "0,0,0,0.2", value_parser = parse_color)]
    pub background_color: Rgba,

    /// Fill of the selected cells
    #[arg(long, value_name = "R,G,B[,A]", default_value = "1,1,1,0.3", value_parser = parse_color)]
    pub highlight_color: Rgba,

    /// Grid line thickness in pixels
    #[arg(
        long,
        short = 't',
        value_name = "PX",
        default_value = "7",
        value_parser = parse_thickness
    )]
    pub thickness: f32,

    /// Cover the whole monitor instead of the work area
    #[arg(long, short = 'f')]
    pub fullscreen: bool,

    /// Move the window while dragging
    #[arg(long, short = 'l')]
    pub live: bool,

    #[arg(long, short = 'd')]
    pub debug: bool,
}

impl Cli {
    pub fn into_config(self) -> Config {
        Config {
            grid: self.grid,
            offset: self.offset,
            gravity: self.gravity,
            style: OverlayStyle {
                grid_color: self.grid_color,
                background_color: self.background_color,
                highlight_color: self.highlight_color,
                line_width: self.thickness,
            },
            overlay_mode: if self.fullscreen {
                OverlayMode::Fullscreen
            } else {
                OverlayMode::Maximized
            },
            live_preview: self.live,
            debug: self.debug,
        }
    }
}
