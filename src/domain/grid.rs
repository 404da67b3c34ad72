//! Grid dimensions and pixel-to-cell mapping
//!
//! This module handles the logical grid laid over the overlay. It validates
//! grid dimensions, derives the pixel size of a cell from the overlay size
//! and maps pointer positions to cell coordinates.

use thiserror::Error;

/// Invalid grid dimensions or overlay size
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// Grid dimensions are invalid (zero)
    #[error("invalid grid dimensions {cols}x{rows}: both must be at least 1")]
    InvalidDimensions { cols: u32, rows: u32 },
    /// Overlay is too small to give every cell at least one pixel
    #[error("overlay of {width}x{height} px is too small for a {cols}x{rows} grid")]
    OverlayTooSmall {
        width: u32,
        height: u32,
        cols: u32,
        rows: u32,
    },
}

/// Column/row address of a single grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellCoords {
    pub col: u32,
    pub row: u32,
}

impl CellCoords {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }
}

/// Pixel dimensions of one cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

/// Number of columns and rows the overlay is divided into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    cols: u32,
    rows: u32,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            cols: Self::DEFAULT_COLS,
            rows: Self::DEFAULT_ROWS,
        }
    }
}

impl GridSpec {
    pub const DEFAULT_COLS: u32 = 16;
    pub const DEFAULT_ROWS: u32 = 10;

    /// Creates a new grid specification
    ///
    /// # Example
    /// ```rust
    /// use gridlock::domain::grid::GridSpec;
    ///
    /// let grid = GridSpec::new(16, 10).unwrap();
    /// assert_eq!(grid.dimensions(), (16, 10));
    /// assert!(GridSpec::new(0, 10).is_err());
    /// ```
    pub fn new(cols: u32, rows: u32) -> Result<Self, GridError> {
        if cols == 0 || rows == 0 {
            return Err(GridError::InvalidDimensions { cols, rows });
        }

        Ok(Self { cols, rows })
    }

    /// Returns the grid dimensions as (cols, rows)
    pub fn dimensions(&self) -> (u32, u32) {
        (self.cols, self.rows)
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Computes the cell size for an overlay of the given pixel size
    ///
    /// Integer division: leftover pixels at the right and bottom edge
    /// belong to no cell.
    pub fn cell_size(&self, width: u32, height: u32) -> Result<CellSize, GridError> {
        let cell_width = width / self.cols;
        let cell_height = height / self.rows;

        if cell_width == 0 || cell_height == 0 {
            return Err(GridError::OverlayTooSmall {
                width,
                height,
                cols: self.cols,
                rows: self.rows,
            });
        }

        Ok(CellSize {
            width: cell_width,
            height: cell_height,
        })
    }

    /// Returns the cell under an overlay-local pixel position
    ///
    /// Positions outside the grid (negative, or in the leftover strip past
    /// the last full cell) are clamped to the nearest edge cell.
    pub fn cell_at(&self, x: i32, y: i32, cell: CellSize) -> CellCoords {
        CellCoords::new(
            clamp_index(x, cell.width, self.cols),
            clamp_index(y, cell.height, self.rows),
        )
    }
}

fn clamp_index(position: i32, cell_extent: u32, count: u32) -> u32 {
    if position <= 0 {
        return 0;
    }

    let index = (position as u32) / cell_extent.max(1);
    index.min(count - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_creation_valid() {
        let grid = GridSpec::new(16, 10).unwrap();
        assert_eq!(grid.dimensions(), (16, 10));
        assert_eq!(GridSpec::default(), grid);
    }

    #[test]
    fn grid_creation_invalid_dimensions() {
        assert!(matches!(
            GridSpec::new(0, 10),
            Err(GridError::InvalidDimensions { cols: 0, rows: 10 })
        ));
        assert!(matches!(
            GridSpec::new(5, 0),
            Err(GridError::InvalidDimensions { cols: 5, rows: 0 })
        ));
    }

    #[test]
    fn cell_size_uses_integer_division() {
        let grid = GridSpec::new(16, 10).unwrap();
        assert_eq!(
            grid.cell_size(1600, 1000).unwrap(),
            CellSize { width: 100, height: 100 }
        );

        // 1920 / 16 = 120, 1053 / 10 = 105 (3 px left over)
        assert_eq!(
            grid.cell_size(1920, 1053).unwrap(),
            CellSize { width: 120, height: 105 }
        );
    }

    #[test]
    fn cell_size_rejects_tiny_overlay() {
        let grid = GridSpec::new(16, 10).unwrap();
        assert!(matches!(
            grid.cell_size(15, 1000),
            Err(GridError::OverlayTooSmall { width: 15, .. })
        ));
    }

    #[test]
    fn cell_at_maps_pixels_to_cells() {
        let grid = GridSpec::new(16, 10).unwrap();
        let cell = grid.cell_size(1600, 1000).unwrap();

        assert_eq!(grid.cell_at(0, 0, cell), CellCoords::new(0, 0));
        assert_eq!(grid.cell_at(99, 99, cell), CellCoords::new(0, 0));
        assert_eq!(grid.cell_at(100, 100, cell), CellCoords::new(1, 1));
        assert_eq!(grid.cell_at(250, 150, cell), CellCoords::new(2, 1));
    }

    #[test]
    fn cell_at_clamps_out_of_range_positions() {
        let grid = GridSpec::new(16, 10).unwrap();
        let cell = grid.cell_size(1605, 1004).unwrap();

        assert_eq!(grid.cell_at(-20, -1, cell), CellCoords::new(0, 0));
        // Leftover strip past the last full cell
        assert_eq!(grid.cell_at(1603, 1002, cell), CellCoords::new(15, 9));
        assert_eq!(grid.cell_at(5000, 5000, cell), CellCoords::new(15, 9));
    }
}
