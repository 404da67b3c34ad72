//! Drag selection across grid cells
//!
//! A `CellRect` remembers the cell where the gesture started (anchor) and the
//! cell currently under the pointer (far corner). Corners are stored in
//! gesture order and only normalized when converted to pixels, so later
//! updates keep the original drag direction.

use crate::domain::core::Rect;
use crate::domain::grid::{CellCoords, CellSize};

/// Current cell selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellRect {
    /// Nothing selected yet; nothing is drawn or applied
    #[default]
    Empty,
    /// Both corners are set
    Span { anchor: CellCoords, far: CellCoords },
}

impl CellRect {
    /// Creates a new, empty selection
    pub fn new() -> Self {
        Self::Empty
    }

    /// Sets both corners to the same cell
    ///
    /// # Example
    /// ```rust
    /// use gridlock::domain::{grid::{CellCoords, CellSize}, selection::CellRect};
    ///
    /// let mut rect = CellRect::new();
    /// rect.set_anchor(CellCoords::new(2, 1));
    /// let cell = CellSize { width: 100, height: 100 };
    /// let pixels = rect.to_pixel_rect(cell).unwrap();
    /// assert_eq!((pixels.x, pixels.y, pixels.w, pixels.h), (200, 100, 100, 100));
    /// ```
    pub fn set_anchor(&mut self, coords: CellCoords) {
        *self = CellRect::Span {
            anchor: coords,
            far: coords,
        };
    }

    /// Moves only the far corner
    ///
    /// On an empty selection this behaves like [`CellRect::set_anchor`] so
    /// that corners are never half set.
    pub fn update_far_corner(&mut self, coords: CellCoords) {
        match self {
            CellRect::Span { far, .. } => *far = coords,
            CellRect::Empty => self.set_anchor(coords),
        }
    }

    /// Returns true if both corners are set
    pub fn is_valid(&self) -> bool {
        matches!(self, CellRect::Span { .. })
    }

    /// Resets the selection to empty
    pub fn reset(&mut self) {
        *self = CellRect::Empty;
    }

    /// Returns the anchor cell, if any
    pub fn anchor(&self) -> Option<CellCoords> {
        match self {
            CellRect::Span { anchor, .. } => Some(*anchor),
            CellRect::Empty => None,
        }
    }

    /// Returns (top_left, bottom_right) cells, if any
    pub fn normalized(&self) -> Option<(CellCoords, CellCoords)> {
        match self {
            CellRect::Span { anchor, far } => Some(normalize_coordinates(*anchor, *far)),
            CellRect::Empty => None,
        }
    }

    /// Selection size in cells as (cols, rows)
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.normalized().map(|(top_left, bottom_right)| {
            (
                bottom_right.col - top_left.col + 1,
                bottom_right.row - top_left.row + 1,
            )
        })
    }

    /// Converts the selection to an overlay-local pixel rectangle
    ///
    /// The far cell is inclusive: a single-cell selection is one full cell
    /// wide and high.
    pub fn to_pixel_rect(&self, cell: CellSize) -> Option<Rect> {
        let (top_left, _) = self.normalized()?;
        let (cols, rows) = self.dimensions()?;

        Some(Rect::new(
            (top_left.col * cell.width) as i32,
            (top_left.row * cell.height) as i32,
            (cols * cell.width) as i32,
            (rows * cell.height) as i32,
        ))
    }
}

/// Normalizes two cells into top-left and bottom-right corners
pub fn normalize_coordinates(a: CellCoords, b: CellCoords) -> (CellCoords, CellCoords) {
    (
        CellCoords::new(a.col.min(b.col), a.row.min(b.row)),
        CellCoords::new(a.col.max(b.col), a.row.max(b.row)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const CELL: CellSize = CellSize {
        width: 100,
        height: 80,
    };

    #[test]
    fn new_selection_is_empty() {
        let rect = CellRect::new();
        assert!(!rect.is_valid());
        assert_eq!(rect.to_pixel_rect(CELL), None);
        assert_eq!(rect.anchor(), None);
    }

    #[test]
    fn single_cell_is_one_full_cell() {
        for (col, row) in [(0, 0), (3, 2), (15, 9)] {
            let mut rect = CellRect::new();
            rect.set_anchor(CellCoords::new(col, row));
            assert_eq!(
                rect.to_pixel_rect(CELL),
                Some(Rect::new(
                    (col * 100) as i32,
                    (row * 80) as i32,
                    100,
                    80
                ))
            );
        }
    }

    #[test]
    fn drag_direction_does_not_change_pixels() {
        let a = CellCoords::new(4, 1);
        let b = CellCoords::new(1, 3);

        let mut forward = CellRect::new();
        forward.set_anchor(a);
        forward.update_far_corner(b);

        let mut backward = CellRect::new();
        backward.set_anchor(b);
        backward.update_far_corner(a);

        assert_eq!(forward.to_pixel_rect(CELL), backward.to_pixel_rect(CELL));
        assert_eq!(forward.to_pixel_rect(CELL), Some(Rect::new(100, 80, 400, 240)));
    }

    #[test]
    fn update_keeps_anchor_in_gesture_order() {
        let mut rect = CellRect::new();
        rect.set_anchor(CellCoords::new(5, 5));
        rect.update_far_corner(CellCoords::new(2, 2));
        rect.update_far_corner(CellCoords::new(7, 6));

        assert_eq!(rect.anchor(), Some(CellCoords::new(5, 5)));
        assert_eq!(
            rect.normalized(),
            Some((CellCoords::new(5, 5), CellCoords::new(7, 6)))
        );
        assert_eq!(rect.dimensions(), Some((3, 2)));
    }

    #[test]
    fn far_corner_on_empty_sets_both_corners() {
        let mut rect = CellRect::new();
        rect.update_far_corner(CellCoords::new(1, 2));
        assert_eq!(
            rect,
            CellRect::Span {
                anchor: CellCoords::new(1, 2),
                far: CellCoords::new(1, 2),
            }
        );
    }

    #[test]
    fn reset_clears_selection() {
        let mut rect = CellRect::new();
        rect.set_anchor(CellCoords::new(0, 0));
        rect.reset();
        assert!(!rect.is_valid());
    }

    #[test]
    fn normalize_coordinates_mixed_order() {
        let (tl, br) = normalize_coordinates(CellCoords::new(3, 1), CellCoords::new(1, 2));
        assert_eq!(tl, CellCoords::new(1, 1));
        assert_eq!(br, CellCoords::new(3, 2));
    }
}
