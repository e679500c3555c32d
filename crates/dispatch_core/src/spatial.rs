//! Geographic primitives: raw lat/lon coordinates and great-circle distances.

use serde::{Deserialize, Serialize};

/// Mean Earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Quantization step for cache keys: one microdegree (~0.11 m at the equator).
const MICRO_DEG: f64 = 1e6;

/// A geographic coordinate in degrees, `(lat, lon)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

impl Coord {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Great-circle (haversine) distance to `other`, in meters.
    pub fn haversine_m(&self, other: Coord) -> f64 {
        let lat1 = self.lat.to_radians();
        let lat2 = other.lat.to_radians();
        let dlat = (other.lat - self.lat).to_radians();
        let dlon = (other.lon - self.lon).to_radians();

        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
        EARTH_RADIUS_M * c
    }

    /// Microdegree-quantized form used as a hashable route-cache key.
    pub(crate) fn quantized(&self) -> (i64, i64) {
        (
            (self.lat * MICRO_DEG).round() as i64,
            (self.lon * MICRO_DEG).round() as i64,
        )
    }
}

/// Total straight-line length of `start -> waypoints[0] -> ... -> waypoints[n-1]`, in meters.
pub fn path_length_m(start: Coord, waypoints: &[Coord]) -> f64 {
    let mut total = 0.0;
    let mut prev = start;
    for &wp in waypoints {
        total += prev.haversine_m(wp);
        prev = wp;
    }
    total
}
