//! Overlay presentation
//!
//! Turns the interaction state into draw calls on a [`DrawingSurface`].
//! Layout calculation is separated from drawing so that the geometry of
//! what ends up on screen can be tested without any surface at all.
//! [`PixmapSurface`] is the tiny-skia backed surface used by the platform
//! overlays.

use tiny_skia::{LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::app::state::InteractionState;
use crate::config::{Config, OverlayStyle, Rgba};
use crate::domain::core::Rect;
use crate::domain::grid::{CellSize, GridSpec};
use crate::domain::selection::CellRect;

/// Rendering errors
#[derive(Debug, thiserror::Error)]
pub enum RendererError {
    #[error("Failed to create a {width}x{height} pixmap for rendering")]
    PixmapCreationFailed { width: u32, height: u32 },
}

/// A single grid line segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub width: f32,
    pub color: Rgba,
}

/// 2D drawing target for the overlay
pub trait DrawingSurface {
    /// Reallocates the surface for a new overlay size
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RendererError>;

    fn size(&self) -> (u32, u32);

    /// Asks the owner to repaint at the next opportunity
    fn request_redraw(&mut self);

    /// Replaces every pixel with full transparency
    fn clear(&mut self);

    fn fill_rect(&mut self, rect: Rect, color: Rgba);

    fn stroke_line(&mut self, line: &Line);
}

/// Pre-calculated overlay content
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLayout {
    pub width: u32,
    pub height: u32,
    pub background: Rgba,
    pub lines: Vec<Line>,
    /// Selection highlight, present only for a valid selection
    pub highlight: Option<(Rect, Rgba)>,
}

impl OverlayLayout {
    pub fn compute(
        grid: &GridSpec,
        style: &OverlayStyle,
        width: u32,
        height: u32,
        cursor: &CellRect,
        cell: Option<CellSize>,
    ) -> Self {
        let mut layout = Self {
            width,
            height,
            background: style.background_color,
            lines: Vec::new(),
            highlight: None,
        };

        layout.calculate_grid_lines(grid, style);
        layout.highlight = cell
            .and_then(|cell| cursor.to_pixel_rect(cell))
            .map(|rect| (rect, style.highlight_color));

        layout
    }

    /// Inner grid lines only; the overlay edges are not stroked
    fn calculate_grid_lines(&mut self, grid: &GridSpec, style: &OverlayStyle) {
        let (cols, rows) = grid.dimensions();
        let bottom = self.height.saturating_sub(1) as f32;
        let right = self.width.saturating_sub(1) as f32;

        for col in 1..cols {
            let x = (col as u64 * self.width as u64 / cols as u64) as f32;
            self.lines.push(Line {
                x1: x,
                y1: 0.0,
                x2: x,
                y2: bottom,
                width: style.line_width,
                color: style.grid_color,
            });
        }

        for row in 1..rows {
            let y = (row as u64 * self.height as u64 / rows as u64) as f32;
            self.lines.push(Line {
                x1: 0.0,
                y1: y,
                x2: right,
                y2: y,
                width: style.line_width,
                color: style.grid_color,
            });
        }
    }
}

/// Issues a layout to a surface: clear, background, grid, highlight
pub fn render_layout<S: DrawingSurface + ?Sized>(surface: &mut S, layout: &OverlayLayout) {
    surface.clear();
    surface.fill_rect(
        Rect::new(0, 0, layout.width as i32, layout.height as i32),
        layout.background,
    );

    for line in &layout.lines {
        surface.stroke_line(line);
    }

    if let Some((rect, color)) = layout.highlight {
        surface.fill_rect(rect, color);
    }
}

/// Draws the overlay for the current interaction state
#[derive(Debug, Clone)]
pub struct OverlayPresenter {
    grid: GridSpec,
    style: OverlayStyle,
}

impl OverlayPresenter {
    pub fn new(config: &Config) -> Self {
        Self {
            grid: config.grid,
            style: config.style,
        }
    }

    pub fn layout(&self, width: u32, height: u32, state: &InteractionState) -> OverlayLayout {
        OverlayLayout::compute(
            &self.grid,
            &self.style,
            width,
            height,
            &state.cursor,
            state.cell_size,
        )
    }

    /// Redraws the whole overlay; never mutates the state
    pub fn draw<S: DrawingSurface + ?Sized>(&self, surface: &mut S, state: &InteractionState) {
        let (width, height) = surface.size();
        if width == 0 || height == 0 {
            return;
        }

        render_layout(surface, &self.layout(width, height, state));
    }
}

/// tiny-skia surface backing the platform overlays
#[derive(Debug, Default)]
pub struct PixmapSurface {
    pixmap: Option<Pixmap>,
    redraw_requested: bool,
}

impl PixmapSurface {
    /// Creates an unallocated surface; call `resize` before drawing
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pixmap(&self) -> Option<&Pixmap> {
        self.pixmap.as_ref()
    }

    /// Returns and clears the pending redraw flag
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.redraw_requested)
    }

    /// Pixel data reordered to premultiplied BGRA, the layout of 32-bit
    /// DIB sections and little-endian ARGB visuals
    pub fn to_bgra(&self) -> Vec<u8> {
        let Some(pixmap) = &self.pixmap else {
            return Vec::new();
        };

        let mut data = pixmap.data().to_vec();
        for pixel in data.chunks_exact_mut(4) {
            pixel.swap(0, 2);
        }
        data
    }
}

impl DrawingSurface for PixmapSurface {
    fn resize(&mut self, width: u32, height: u32) -> Result<(), RendererError> {
        if self.size() == (width, height) {
            return Ok(());
        }

        let pixmap = Pixmap::new(width, height)
            .ok_or(RendererError::PixmapCreationFailed { width, height })?;
        self.pixmap = Some(pixmap);
        Ok(())
    }

    fn size(&self) -> (u32, u32) {
        self.pixmap
            .as_ref()
            .map(|pixmap| (pixmap.width(), pixmap.height()))
            .unwrap_or((0, 0))
    }

    fn request_redraw(&mut self) {
        self.redraw_requested = true;
    }

    fn clear(&mut self) {
        if let Some(pixmap) = self.pixmap.as_mut() {
            pixmap.fill(tiny_skia::Color::TRANSPARENT);
        }
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };
        let Some(skia_rect) =
            tiny_skia::Rect::from_xywh(rect.x as f32, rect.y as f32, rect.w as f32, rect.h as f32)
        else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color(color.to_skia());
        paint.anti_alias = false;

        pixmap.fill_rect(skia_rect, &paint, Transform::identity(), None);
    }

    fn stroke_line(&mut self, line: &Line) {
        let Some(pixmap) = self.pixmap.as_mut() else {
            return;
        };

        let mut path_builder = PathBuilder::new();
        path_builder.move_to(line.x1, line.y1);
        path_builder.line_to(line.x2, line.y2);

        if let Some(path) = path_builder.finish() {
            let mut paint = Paint::default();
            paint.set_color(line.color.to_skia());

            let stroke = Stroke {
                width: line.width,
                line_join: LineJoin::Round,
                ..Stroke::default()
            };

            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        }
    }
}
