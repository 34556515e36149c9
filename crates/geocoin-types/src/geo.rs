//! Continuous geographic positions and movement directions.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl LatLng {
    /// Create a position from latitude and longitude.
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Return this position moved `distance` degrees in `direction`.
    pub fn step(self, direction: Direction, distance: f64) -> Self {
        let (dlat, dlng) = direction.unit();
        Self {
            lat: dlat.mul_add(distance, self.lat),
            lng: dlng.mul_add(distance, self.lng),
        }
    }
}

/// One of the four axis-aligned movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Direction {
    /// Increasing latitude.
    North,
    /// Decreasing latitude.
    South,
    /// Increasing longitude.
    East,
    /// Decreasing longitude.
    West,
}

impl Direction {
    /// All directions, in compass order.
    pub const ALL: [Self; 4] = [Self::North, Self::South, Self::East, Self::West];

    /// Unit step as `(delta_lat, delta_lng)`.
    pub const fn unit(self) -> (f64, f64) {
        match self {
            Self::North => (1.0, 0.0),
            Self::South => (-1.0, 0.0),
            Self::East => (0.0, 1.0),
            Self::West => (0.0, -1.0),
        }
    }
}

impl core::fmt::Display for Direction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn north_and_east_increase_coordinates() {
        let start = LatLng::new(10.0, 20.0);
        assert_eq!(start.step(Direction::North, 0.5), LatLng::new(10.5, 20.0));
        assert_eq!(start.step(Direction::East, 0.5), LatLng::new(10.0, 20.5));
    }

    #[test]
    fn south_and_west_decrease_coordinates() {
        let start = LatLng::new(10.0, 20.0);
        assert_eq!(start.step(Direction::South, 0.5), LatLng::new(9.5, 20.0));
        assert_eq!(start.step(Direction::West, 0.5), LatLng::new(10.0, 19.5));
    }

    #[test]
    fn direction_serializes_lowercase() {
        let json = serde_json::to_string(&Direction::West).ok();
        assert_eq!(json.as_deref(), Some("\"west\""));
    }

    #[test]
    fn lat_lng_uses_short_field_names() {
        let json = serde_json::to_string(&LatLng::new(1.5, -2.25)).ok();
        assert_eq!(json.as_deref(), Some(r#"{"lat":1.5,"lng":-2.25}"#));
    }
}
