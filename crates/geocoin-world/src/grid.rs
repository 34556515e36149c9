//! Coordinate grid mapper: continuous positions to discrete cells.
//!
//! A cell index is `floor((coordinate - origin) * cells_per_degree)` on each
//! axis. Flooring rounds toward negative infinity, so cell boundaries are
//! symmetric across the origin and `-0.00005` degrees lands in cell `-1`,
//! not `0`. With a zero origin this is exactly `floor(lat * scale)`.

use geocoin_types::{Cell, CellBounds, LatLng};

use crate::error::WorldError;

/// Default grid origin: the classroom the game's world is anchored on.
pub const DEFAULT_ORIGIN: LatLng = LatLng::new(36.989_493_795_784_01, -122.062_771_285_485_04);

/// Default grid resolution: one cell per `1e-4` degrees.
pub const DEFAULT_CELLS_PER_DEGREE: f64 = 10_000.0;

/// Maps positions to cells and cells back to their geographic bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMapper {
    origin: LatLng,
    cells_per_degree: f64,
}

impl GridMapper {
    /// Create a mapper anchored at `origin` with `cells_per_degree` cells per
    /// degree on each axis.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidGrid`] if the scale is not finite and
    /// positive, or [`WorldError::InvalidOrigin`] if the origin is not finite.
    pub fn new(origin: LatLng, cells_per_degree: f64) -> Result<Self, WorldError> {
        if !cells_per_degree.is_finite() || cells_per_degree <= 0.0 {
            return Err(WorldError::InvalidGrid { cells_per_degree });
        }
        if !origin.lat.is_finite() || !origin.lng.is_finite() {
            return Err(WorldError::InvalidOrigin {
                lat: origin.lat,
                lng: origin.lng,
            });
        }
        Ok(Self {
            origin,
            cells_per_degree,
        })
    }

    /// The position of cell `(0, 0)`'s south-west corner.
    pub const fn origin(&self) -> LatLng {
        self.origin
    }

    /// Cells per degree on each axis.
    pub const fn cells_per_degree(&self) -> f64 {
        self.cells_per_degree
    }

    /// Return the cell containing `(lat, lng)`.
    pub fn cell_for(&self, lat: f64, lng: f64) -> Cell {
        Cell::new(
            self.index(lat - self.origin.lat),
            self.index(lng - self.origin.lng),
        )
    }

    /// Return the cell containing `position`.
    pub fn cell_at(&self, position: LatLng) -> Cell {
        self.cell_for(position.lat, position.lng)
    }

    /// Geographic rectangle covered by `cell`.
    pub fn bounds_of(&self, cell: Cell) -> CellBounds {
        let edge = |index: i32, origin: f64| f64::from(index) / self.cells_per_degree + origin;
        CellBounds {
            south_west: LatLng::new(edge(cell.i, self.origin.lat), edge(cell.j, self.origin.lng)),
            north_east: LatLng::new(
                edge(cell.i, self.origin.lat) + 1.0 / self.cells_per_degree,
                edge(cell.j, self.origin.lng) + 1.0 / self.cells_per_degree,
            ),
        }
    }

    /// Floor an offset in degrees to a cell index.
    #[allow(clippy::cast_possible_truncation)]
    fn index(&self, offset: f64) -> i32 {
        // Float-to-int `as` saturates at the i32 bounds and maps NaN to 0,
        // which keeps the mapping total.
        (offset * self.cells_per_degree).floor() as i32
    }
}

impl Default for GridMapper {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN,
            cells_per_degree: DEFAULT_CELLS_PER_DEGREE,
        }
    }
}
