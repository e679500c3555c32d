use std::collections::HashMap;

use bevy_ecs::prelude::World;

use crate::clock::{SimulationClock, ONE_HOUR_MS};
use crate::ecs::{Courier, Order, Restaurant};
use crate::matching::{HungarianSolver, MatcherResource};
use crate::report::DispatchTelemetry;
use crate::routing::{build_route_provider, RouteProviderResource};
use crate::scenario::params::{ScenarioError, ScenarioParams, SimulationEndTimeMs};

/// Drain time appended to the last shift end when no explicit simulation end
/// is configured, so in-flight routes can complete.
const DEFAULT_DRAIN_MS: u64 = ONE_HOUR_MS;

/// Populate `world` with the scenario's resources and entities.
///
/// Restaurants, orders, and couriers are spawned in input order; the
/// dispatcher re-sorts by external id where ordering matters, so loaders do
/// not need to pre-sort. Validation failures abort before the world is
/// touched.
pub fn build_scenario(world: &mut World, params: ScenarioParams) -> Result<(), ScenarioError> {
    params.validate()?;

    world.insert_resource(SimulationClock::default());
    world.insert_resource(params.config);
    world.insert_resource(params.pay);
    world.insert_resource(params.policy);
    world.insert_resource(DispatchTelemetry::default());
    world.insert_resource(MatcherResource::new(Box::new(HungarianSolver)));
    world.insert_resource(RouteProviderResource(build_route_provider(
        &params.route_provider_kind,
    )));

    let end_ms = params.simulation_end_time_ms.unwrap_or_else(|| {
        let last_shift_end = params
            .couriers
            .iter()
            .map(|c| c.off_time_ms)
            .max()
            .unwrap_or(0);
        let last_ready = params.orders.iter().map(|o| o.ready_time_ms).max().unwrap_or(0);
        last_shift_end.max(last_ready) + DEFAULT_DRAIN_MS
    });
    world.insert_resource(SimulationEndTimeMs(end_ms));

    let mut restaurant_entities = HashMap::with_capacity(params.restaurants.len());
    for spec in &params.restaurants {
        let entity = world.spawn(Restaurant::new(spec.id, spec.location)).id();
        restaurant_entities.insert(spec.id, entity);
    }

    for spec in &params.orders {
        let restaurant = restaurant_entities[&spec.restaurant_id];
        world.spawn(Order::new(
            spec.id,
            restaurant,
            spec.placement_time_ms,
            spec.ready_time_ms,
            spec.dropoff,
        ));
    }

    for spec in &params.couriers {
        world.spawn(Courier::new(
            spec.id,
            spec.on_time_ms,
            spec.off_time_ms,
            spec.start_location,
        ));
    }

    Ok(())
}
