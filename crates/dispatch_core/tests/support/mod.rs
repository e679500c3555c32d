//! Shared helpers for the integration suites.

use bevy_ecs::prelude::World;

use dispatch_core::clock::ONE_MIN_MS;
use dispatch_core::runner::{initialize_simulation, run_until_empty, simulation_schedule};
use dispatch_core::scenario::{
    build_scenario, CourierSpec, OrderSpec, RestaurantSpec, ScenarioParams,
};
use dispatch_core::spatial::{Coord, EARTH_RADIUS_M};

/// The synthetic dataset's home turf (La Paz, B.C.S.).
pub fn base_coord() -> Coord {
    Coord::new(24.1422, -110.3108)
}

/// A coordinate `meters` east of `base` (matching the haversine metric).
pub fn east_m(base: Coord, meters: f64) -> Coord {
    let per_degree = EARTH_RADIUS_M * std::f64::consts::PI / 180.0 * base.lat.to_radians().cos();
    Coord::new(base.lat, base.lon + meters / per_degree)
}

pub fn restaurant(id: u64, location: Coord) -> RestaurantSpec {
    RestaurantSpec { id, location }
}

pub fn order(id: u64, restaurant_id: u64, placement_min: u64, ready_min: u64, dropoff: Coord) -> OrderSpec {
    OrderSpec {
        id,
        restaurant_id,
        placement_time_ms: placement_min * ONE_MIN_MS,
        ready_time_ms: ready_min * ONE_MIN_MS,
        dropoff,
    }
}

pub fn courier(id: u64, on_min: u64, off_min: u64, start_location: Coord) -> CourierSpec {
    CourierSpec {
        id,
        on_time_ms: on_min * ONE_MIN_MS,
        off_time_ms: off_min * ONE_MIN_MS,
        start_location,
    }
}

/// Build the scenario, run it to completion, and return the world.
pub fn run_scenario(params: ScenarioParams) -> World {
    let mut world = World::new();
    build_scenario(&mut world, params).expect("valid scenario");
    initialize_simulation(&mut world);
    let mut schedule = simulation_schedule();
    let steps = run_until_empty(&mut world, &mut schedule, 100_000);
    assert!(steps < 100_000, "runner did not converge");
    world
}
