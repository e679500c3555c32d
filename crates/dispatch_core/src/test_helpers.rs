//! Test helpers for common test setup and utilities.
//!
//! This module provides shared test utilities to reduce duplication across
//! test files.

use bevy_ecs::prelude::World;

use crate::matching::{HungarianSolver, MatcherResource};
use crate::pay::PayConfig;
use crate::report::DispatchTelemetry;
use crate::routing::{EuclideanRouteProvider, RouteProviderResource};
use crate::scenario::{DispatchConfig, DispatchPolicy};
use crate::spatial::{Coord, EARTH_RADIUS_M};

/// A standard test coordinate used across test files for consistency
/// (La Paz, B.C.S., the synthetic dataset's bounding box).
pub fn test_coord() -> Coord {
    Coord::new(24.1422, -110.3108)
}

/// Meters spanned by one degree of latitude on the sphere the haversine uses.
fn meters_per_degree() -> f64 {
    EARTH_RADIUS_M * std::f64::consts::PI / 180.0
}

/// A coordinate `meters` east of `base` (matching the haversine metric).
pub fn coord_east_m(base: Coord, meters: f64) -> Coord {
    let per_degree = meters_per_degree() * base.lat.to_radians().cos();
    Coord::new(base.lat, base.lon + meters / per_degree)
}

/// A coordinate `meters` north of `base`.
pub fn coord_north_m(base: Coord, meters: f64) -> Coord {
    Coord::new(base.lat + meters / meters_per_degree(), base.lon)
}

/// Create a basic test world with the dispatcher's essential resources.
///
/// This is a convenience for tests that wire entities by hand. For full
/// scenarios, use `build_scenario`.
pub fn create_test_world() -> World {
    let mut world = World::new();
    world.insert_resource(crate::clock::SimulationClock::default());
    world.insert_resource(DispatchConfig::default());
    world.insert_resource(PayConfig::default());
    world.insert_resource(DispatchPolicy::RollingHorizon);
    world.insert_resource(DispatchTelemetry::default());
    world.insert_resource(MatcherResource::new(Box::new(HungarianSolver)));
    world.insert_resource(RouteProviderResource(Box::new(
        EuclideanRouteProvider::new(320.0),
    )));
    world
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn east_offset_matches_haversine() {
        let base = test_coord();
        let moved = coord_east_m(base, 1000.0);
        assert!((base.haversine_m(moved) - 1000.0).abs() < 1.0);
    }

    #[test]
    fn north_offset_matches_haversine() {
        let base = test_coord();
        let moved = coord_north_m(base, 1000.0);
        assert!((base.haversine_m(moved) - 1000.0).abs() < 1.0);
    }

    #[test]
    fn test_world_carries_dispatch_resources() {
        let world = create_test_world();
        assert!(world.contains_resource::<DispatchConfig>());
        assert!(world.contains_resource::<MatcherResource>());
        assert!(world.contains_resource::<RouteProviderResource>());
    }
}
