//! Discrete grid addresses.
//!
//! A [`Cell`] is the integer `(i, j)` pair the grid mapper assigns to a
//! continuous position. Cells are plain values: two lookups for the same
//! geo-bucket compare equal, and nothing downstream relies on identity.
//!
//! Three string forms of a cell are observable outside the process and must
//! stay fixed:
//!
//! | Form | Example | Used for |
//! |------|---------|----------|
//! | memento key | `"3:-2"` | key of a cache in the persisted snapshot |
//! | spawn key | `"3,-2"` | seeded value deciding whether a cache spawns |
//! | initial-coins key | `"3,-2,initialCoins"` | seeded value for the starting coin count |

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Integer address of one grid square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Cell {
    /// Row index, derived from latitude.
    pub i: i32,
    /// Column index, derived from longitude.
    pub j: i32,
}

impl Cell {
    /// The cell containing the grid origin.
    pub const ORIGIN: Self = Self { i: 0, j: 0 };

    /// Create a cell from its row and column.
    pub const fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    /// Key under which this cell's memento is persisted (`"i:j"`).
    pub fn memento_key(self) -> String {
        format!("{}:{}", self.i, self.j)
    }

    /// Parse a memento key of the form `"i:j"`.
    ///
    /// Returns `None` for anything else, including surrounding whitespace.
    pub fn parse_memento_key(key: &str) -> Option<Self> {
        let (i, j) = key.split_once(':')?;
        Some(Self {
            i: i.parse().ok()?,
            j: j.parse().ok()?,
        })
    }

    /// Seeded-value key for the spawn decision (`"i,j"`).
    pub fn spawn_key(self) -> String {
        format!("{},{}", self.i, self.j)
    }

    /// Seeded-value key for the initial coin count (`"i,j,initialCoins"`).
    pub fn initial_coins_key(self) -> String {
        format!("{},{},initialCoins", self.i, self.j)
    }

    /// Return the cell `di` rows and `dj` columns away.
    ///
    /// Returns `None` if either index leaves the `i32` range.
    pub const fn offset(self, di: i32, dj: i32) -> Option<Self> {
        let Some(i) = self.i.checked_add(di) else {
            return None;
        };
        let Some(j) = self.j.checked_add(dj) else {
            return None;
        };
        Some(Self { i, j })
    }
}

impl core::fmt::Display for Cell {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.i, self.j)
    }
}

impl From<(i32, i32)> for Cell {
    fn from((i, j): (i32, i32)) -> Self {
        Self { i, j }
    }
}
