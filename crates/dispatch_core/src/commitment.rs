//! Two-stage commitment policy: final versus partial route commitments.
//!
//! A matched (courier, bundle) pair becomes a **final** commitment (pick up
//! and deliver, no reconsideration) when the courier can reach the restaurant
//! within the optimization window and every order will be ready by then, or
//! unconditionally once any order has been sitting ready longer than the
//! commitment window. Otherwise the courier is sent toward the restaurant on
//! a **partial** commitment and the orders stay available for reassignment.

use crate::bundling::Bundle;
use crate::ecs::{CommitmentKind, RouteCommitment};
use crate::routing::{Route, RouteProvider};
use crate::scenario::DispatchConfig;
use crate::spatial::Coord;

/// Decide the commitment for a matched pair. `None` aborts the assignment
/// (routing failure); the orders stay in their restaurant's queue.
pub fn decide_commitment(
    oracle: &dyn RouteProvider,
    courier_loc: Coord,
    bundle: &Bundle,
    now_ms: u64,
    config: &DispatchConfig,
) -> Option<RouteCommitment> {
    let mut full_waypoints = Vec::with_capacity(bundle.size() + 1);
    full_waypoints.push(bundle.restaurant_loc);
    full_waypoints.extend(bundle.dropoffs());
    let full = oracle.route(courier_loc, &full_waypoints);

    let ready_too_long = bundle
        .orders
        .iter()
        .any(|o| now_ms.saturating_sub(o.ready_time_ms) > config.commitment_window_ms);
    if ready_too_long {
        // Escape hatch: orders have waited past the commitment window, so any
        // feasible full route is committed outright.
        return full.map(|route| final_commitment(bundle, route, now_ms));
    }

    let full = full?;

    let inbound = oracle.route(courier_loc, &[bundle.restaurant_loc]);
    // Arrival is approximated as half the inbound travel time.
    let reachable_in_window = inbound.as_ref().is_some_and(|route| {
        config.inbound_horizon_factor * route.duration_s * 1000.0
            <= config.optimization_frequency_ms as f64
    });
    let all_ready_in_window = bundle
        .orders
        .iter()
        .all(|o| o.ready_time_ms <= now_ms + config.optimization_frequency_ms);

    if reachable_in_window && all_ready_in_window {
        return Some(final_commitment(bundle, full, now_ms));
    }

    inbound.map(|route| partial_commitment(bundle, route, now_ms))
}

fn final_commitment(bundle: &Bundle, route: Route, now_ms: u64) -> RouteCommitment {
    let last_waypoint = route
        .last_waypoint()
        .or_else(|| bundle.dropoffs().last().copied())
        .unwrap_or(bundle.restaurant_loc);
    RouteCommitment {
        orders: bundle.orders.iter().map(|o| o.entity).collect(),
        restaurant: bundle.restaurant,
        distance_m: route.distance_m,
        duration_s: route.duration_s,
        geometry: route.geometry,
        start_time_ms: now_ms,
        completion_time_ms: now_ms + (route.duration_s * 1000.0).round() as u64,
        kind: CommitmentKind::Final,
        last_waypoint,
    }
}

fn partial_commitment(bundle: &Bundle, inbound: Route, now_ms: u64) -> RouteCommitment {
    let last_waypoint = inbound.last_waypoint().unwrap_or(bundle.restaurant_loc);
    RouteCommitment {
        orders: Vec::new(),
        restaurant: bundle.restaurant,
        distance_m: inbound.distance_m,
        duration_s: inbound.duration_s,
        geometry: inbound.geometry,
        start_time_ms: now_ms,
        completion_time_ms: now_ms + (inbound.duration_s * 1000.0).round() as u64,
        kind: CommitmentKind::Partial,
        last_waypoint,
    }
}
