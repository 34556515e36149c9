//! The visible window of cells around a center cell.
//!
//! A neighborhood of radius `r` around `(ci, cj)` is the half-open square
//! `i in [ci - r, ci + r)`, `j in [cj - r, cj + r)`: side `2r`, one more row
//! and column below the center than above it. Cells that would leave the
//! `i32` range are skipped.

use geocoin_types::Cell;

/// Square window of cells around a center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighborhood {
    center: Cell,
    radius: u32,
}

impl Neighborhood {
    /// The window of the given radius around `center`.
    pub const fn around(center: Cell, radius: u32) -> Self {
        Self { center, radius }
    }

    /// The window's center cell.
    pub const fn center(&self) -> Cell {
        self.center
    }

    /// The window's radius.
    pub const fn radius(&self) -> u32 {
        self.radius
    }

    /// Return `true` if `cell` lies inside the window.
    pub fn contains(&self, cell: Cell) -> bool {
        let (i_lo, i_hi) = span(self.center.i, self.radius);
        let (j_lo, j_hi) = span(self.center.j, self.radius);
        let (i, j) = (i64::from(cell.i), i64::from(cell.j));
        i >= i_lo && i < i_hi && j >= j_lo && j < j_hi
    }

    /// Iterate the window's cells in row-major order.
    pub fn cells(&self) -> Cells {
        let (i_lo, i_hi) = span(self.center.i, self.radius);
        let (j_lo, j_hi) = span(self.center.j, self.radius);
        Cells {
            row: i_lo,
            column: j_lo,
            row_end: i_hi,
            column_start: j_lo,
            column_end: j_hi,
        }
    }
}

impl IntoIterator for Neighborhood {
    type Item = Cell;
    type IntoIter = Cells;

    fn into_iter(self) -> Self::IntoIter {
        self.cells()
    }
}

/// Half-open index range `[center - radius, center + radius)` in `i64`.
fn span(center: i32, radius: u32) -> (i64, i64) {
    let center = i64::from(center);
    let radius = i64::from(radius);
    (center.saturating_sub(radius), center.saturating_add(radius))
}

/// Row-major iterator over a [`Neighborhood`].
#[derive(Debug, Clone)]
pub struct Cells {
    row: i64,
    column: i64,
    row_end: i64,
    column_start: i64,
    column_end: i64,
}

impl Iterator for Cells {
    type Item = Cell;

    fn next(&mut self) -> Option<Cell> {
        loop {
            if self.row >= self.row_end || self.column_start >= self.column_end {
                return None;
            }
            if self.column >= self.column_end {
                self.row = self.row.saturating_add(1);
                self.column = self.column_start;
                continue;
            }

            let (row, column) = (self.row, self.column);
            self.column = self.column.saturating_add(1);

            if let (Ok(i), Ok(j)) = (i32::try_from(row), i32::try_from(column)) {
                return Some(Cell::new(i, j));
            }
        }
    }
}
