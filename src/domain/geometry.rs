//! Translation of overlay pixels into window-manager geometry
//!
//! The overlay draws in its own coordinate space. Before a selection can be
//! applied to a window it has to be moved by the overlay's absolute screen
//! position (the grid origin) and by the user's offset.

use std::fmt;
use std::ops::BitOr;
use std::str::FromStr;

use thiserror::Error;

use crate::domain::core::{Point, Rect};

/// Which reference point the window manager keeps fixed on resize
///
/// The value travels untouched to the geometry mutator; only the platform
/// layer interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GravityMode {
    /// Use the window's own gravity hint
    #[default]
    Current,
    NorthWest,
    /// Position refers to the client area, ignoring decorations
    Static,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown gravity '{0}', expected one of: current, northwest, static")]
pub struct UnknownGravity(pub String);

impl FromStr for GravityMode {
    type Err = UnknownGravity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "current" => Ok(GravityMode::Current),
            "northwest" => Ok(GravityMode::NorthWest),
            "static" => Ok(GravityMode::Static),
            _ => Err(UnknownGravity(s.to_string())),
        }
    }
}

impl fmt::Display for GravityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GravityMode::Current => "current",
            GravityMode::NorthWest => "northwest",
            GravityMode::Static => "static",
        };
        f.write_str(name)
    }
}

/// Pixel offset added to every absolute position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset {
    pub dx: i32,
    pub dy: i32,
}

impl Offset {
    pub fn new(dx: i32, dy: i32) -> Self {
        Self { dx, dy }
    }
}

/// Which parts of a geometry request are meaningful
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveResizeMask(u8);

impl MoveResizeMask {
    pub const X: MoveResizeMask = MoveResizeMask(1 << 0);
    pub const Y: MoveResizeMask = MoveResizeMask(1 << 1);
    pub const WIDTH: MoveResizeMask = MoveResizeMask(1 << 2);
    pub const HEIGHT: MoveResizeMask = MoveResizeMask(1 << 3);
    pub const ALL: MoveResizeMask = MoveResizeMask(0b1111);

    pub fn contains(&self, other: MoveResizeMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn bits(&self) -> u8 {
        self.0
    }
}

impl BitOr for MoveResizeMask {
    type Output = MoveResizeMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        MoveResizeMask(self.0 | rhs.0)
    }
}

/// Absolute geometry handed to the window manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryRequest {
    pub gravity: GravityMode,
    pub mask: MoveResizeMask,
    pub rect: Rect,
}

impl GeometryRequest {
    /// Request that sets all four fields of `rect`
    pub fn new(gravity: GravityMode, rect: Rect) -> Self {
        Self {
            gravity,
            mask: MoveResizeMask::ALL,
            rect,
        }
    }
}

/// Converts an overlay-local pixel rectangle into absolute window geometry
///
/// `X = x + origin.x + offset.dx`, `Y = y + origin.y + offset.dy`; width
/// and height pass through.
///
/// # Example
/// ```rust
/// use gridlock::domain::core::{Point, Rect};
/// use gridlock::domain::geometry::{translate, GravityMode, Offset};
///
/// let request = translate(
///     Rect::new(200, 100, 300, 300),
///     Point::new(50, 50),
///     Offset::default(),
///     GravityMode::Current,
/// );
/// assert_eq!(request.rect, Rect::new(250, 150, 300, 300));
/// ```
pub fn translate(
    pixels: Rect,
    origin: Point,
    offset: Offset,
    gravity: GravityMode,
) -> GeometryRequest {
    GeometryRequest::new(
        gravity,
        pixels.translate(origin.x + offset.dx, origin.y + offset.dy),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_is_linear_in_origin_and_offset() {
        let cases = [
            (Rect::new(0, 0, 10, 10), Point::new(0, 0), Offset::new(0, 0)),
            (Rect::new(200, 100, 300, 300), Point::new(50, 50), Offset::new(0, 0)),
            (Rect::new(120, 40, 60, 90), Point::new(1920, 0), Offset::new(-8, 31)),
            (Rect::new(5, 7, 1, 1), Point::new(-1280, -24), Offset::new(3, -3)),
        ];

        for (pixels, origin, offset) in cases {
            let request = translate(pixels, origin, offset, GravityMode::NorthWest);
            assert_eq!(request.rect.x, pixels.x + origin.x + offset.dx);
            assert_eq!(request.rect.y, pixels.y + origin.y + offset.dy);
            assert_eq!(request.rect.w, pixels.w);
            assert_eq!(request.rect.h, pixels.h);
        }
    }

    #[test]
    fn translate_passes_gravity_through() {
        for gravity in [GravityMode::Current, GravityMode::NorthWest, GravityMode::Static] {
            let pixels = Rect::new(0, 0, 1, 1);
            let request = translate(pixels, Point::default(), Offset::default(), gravity);
            assert_eq!(request.gravity, gravity);
            assert_eq!(request.mask, MoveResizeMask::ALL);
        }
    }

    #[test]
    fn gravity_parses_names() {
        assert_eq!("current".parse::<GravityMode>(), Ok(GravityMode::Current));
        assert_eq!("NorthWest".parse::<GravityMode>(), Ok(GravityMode::NorthWest));
        assert_eq!(" static ".parse::<GravityMode>(), Ok(GravityMode::Static));
        assert!("south".parse::<GravityMode>().is_err());
        assert_eq!(GravityMode::NorthWest.to_string(), "northwest");
    }

    #[test]
    fn mask_all_contains_every_field() {
        let all =
            MoveResizeMask::X | MoveResizeMask::Y | MoveResizeMask::WIDTH | MoveResizeMask::HEIGHT;
        assert_eq!(all, MoveResizeMask::ALL);
        assert!(all.contains(MoveResizeMask::WIDTH));
        assert!(!MoveResizeMask::X.contains(MoveResizeMask::Y));
    }
}
