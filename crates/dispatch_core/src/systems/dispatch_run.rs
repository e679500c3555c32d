//! The per-tick dispatch pass.
//!
//! Under the rolling-horizon policy: build candidate bundles per restaurant,
//! classify them into urgency groups, match each group (most urgent first)
//! against the free couriers, and turn matched pairs into final or partial
//! commitments. The baseline policy instead sends every ready order to its
//! nearest free courier outright.
//!
//! Couriers enter the pass sorted by id and bundles in creation order, so a
//! run is deterministic for identical input.

use std::collections::HashSet;

use bevy_ecs::prelude::{Entity, Query, Res, ResMut};

use crate::bundling::{build_bundles, target_bundle_size, Bundle, BundleOrder};
use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::commitment::decide_commitment;
use crate::ecs::{CommitmentKind, Courier, Order, OrderStatus, Restaurant, RouteCommitment};
use crate::matching::{nearest_free_courier, MatcherResource};
use crate::report::DispatchTelemetry;
use crate::routing::{RouteProvider, RouteProviderResource};
use crate::scenario::{DispatchConfig, DispatchPolicy};
use crate::scoring::{classify_bundle, score_pair, UrgencyGroup};
use crate::spatial::Coord;

/// A courier eligible for matching this tick.
struct FreeCourier {
    entity: Entity,
    id: u64,
    location: Coord,
    off_time_ms: u64,
}

#[allow(clippy::too_many_arguments)]
pub fn dispatch_run_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    config: Res<DispatchConfig>,
    policy: Res<DispatchPolicy>,
    oracle: Res<RouteProviderResource>,
    matcher: Res<MatcherResource>,
    mut telemetry: ResMut<DispatchTelemetry>,
    mut couriers: Query<(Entity, &mut Courier)>,
    mut orders: Query<(Entity, &mut Order)>,
    mut restaurants: Query<(Entity, &mut Restaurant)>,
) {
    if event.0.kind != EventKind::DispatchRun {
        return;
    }

    let config = &*config;
    let matcher = &*matcher;
    let telemetry = &mut *telemetry;

    let now = clock.now();
    // The next pass is unconditionally scheduled; the runner's end-time guard
    // stops the cadence.
    clock.schedule_in(config.optimization_frequency_ms, EventKind::DispatchRun, None);
    telemetry.dispatch_runs += 1;

    let mut free: Vec<FreeCourier> = couriers
        .iter()
        .filter(|(_, c)| c.is_free() && now < c.off_time_ms)
        .map(|(entity, c)| FreeCourier {
            entity,
            id: c.id,
            location: c.location,
            off_time_ms: c.off_time_ms,
        })
        .collect();
    free.sort_by_key(|c| c.id);
    if free.is_empty() {
        tracing::debug!(at_min = now / 60_000, "dispatch pass: no free couriers");
        return;
    }

    let oracle = oracle.0.as_ref();

    let planned: Vec<(Entity, RouteCommitment)> = match *policy {
        DispatchPolicy::RollingHorizon => rolling_horizon_pass(
            oracle,
            matcher,
            &free,
            &orders,
            &restaurants,
            now,
            config,
            telemetry,
        ),
        DispatchPolicy::NearestCourier => {
            nearest_courier_pass(oracle, &free, &orders, &restaurants, now)
        }
    };

    for (courier_entity, route) in planned {
        clock.schedule_at(
            route.completion_time_ms,
            EventKind::CompleteRoute,
            Some(EventSubject::Courier(courier_entity)),
        );

        match route.kind {
            CommitmentKind::Final => {
                telemetry.final_commitments += 1;
                for &order_entity in &route.orders {
                    let Ok((_, mut order)) = orders.get_mut(order_entity) else {
                        continue;
                    };
                    order.mark_assigned();
                    if let Ok((_, mut restaurant)) = restaurants.get_mut(order.restaurant) {
                        restaurant.ready_orders.retain(|e| *e != order_entity);
                    }
                }
                tracing::debug!(
                    at_min = now / 60_000,
                    orders = route.orders.len(),
                    "final commitment"
                );
            }
            CommitmentKind::Partial => {
                telemetry.partial_commitments += 1;
                tracing::debug!(at_min = now / 60_000, "partial commitment");
            }
        }

        let Ok((_, mut courier)) = couriers.get_mut(courier_entity) else {
            continue;
        };
        courier.begin_route(route);
    }
}

/// Bundle, classify, match per urgency group, and decide commitments.
#[allow(clippy::too_many_arguments)]
fn rolling_horizon_pass(
    oracle: &dyn RouteProvider,
    matcher: &MatcherResource,
    free: &[FreeCourier],
    orders: &Query<(Entity, &mut Order)>,
    restaurants: &Query<(Entity, &mut Restaurant)>,
    now: u64,
    config: &DispatchConfig,
    telemetry: &mut DispatchTelemetry,
) -> Vec<(Entity, RouteCommitment)> {
    // Demand/supply ratio over the lookahead windows.
    let ready_in_window = orders
        .iter()
        .filter(|(_, o)| {
            o.status == OrderStatus::Ready && o.ready_time_ms <= now + config.demand_window_ms
        })
        .count();
    let horizon_supply = free
        .iter()
        .filter(|c| c.off_time_ms >= now + config.supply_window_ms)
        .count();
    let z_t = target_bundle_size(ready_in_window, horizon_supply);

    // Candidate bundles per restaurant, in restaurant-id order.
    let mut restaurant_queues: Vec<(Entity, u64, Coord, Vec<Entity>)> = restaurants
        .iter()
        .filter(|(_, r)| !r.ready_orders.is_empty())
        .map(|(entity, r)| (entity, r.id, r.location, r.ready_orders.clone()))
        .collect();
    restaurant_queues.sort_by_key(|(_, id, _, _)| *id);

    let mut bundles: Vec<Bundle> = Vec::new();
    for (restaurant_entity, _, location, queue) in &restaurant_queues {
        let mut candidates: Vec<BundleOrder> = queue
            .iter()
            .filter_map(|&order_entity| {
                let (_, order) = orders.get(order_entity).ok()?;
                (order.status == OrderStatus::Ready
                    && order.ready_time_ms <= now + config.assignment_horizon_ms)
                    .then(|| BundleOrder {
                        entity: order_entity,
                        id: order.id,
                        placement_time_ms: order.placement_time_ms,
                        ready_time_ms: order.ready_time_ms,
                        dropoff: order.dropoff,
                    })
            })
            .collect();
        candidates.sort_by_key(|o| (o.ready_time_ms, o.id));
        if candidates.is_empty() {
            continue;
        }
        bundles.extend(build_bundles(
            oracle,
            *restaurant_entity,
            *location,
            &candidates,
            z_t,
            horizon_supply,
            config.service_time_mins(),
            config.freshness_theta,
        ));
    }
    telemetry.bundles_built += bundles.len() as u64;
    if bundles.is_empty() {
        return Vec::new();
    }

    // Urgency tiers; bundle creation order is preserved inside each tier.
    let courier_locs: Vec<Coord> = free.iter().map(|c| c.location).collect();
    let mut groups: [Vec<usize>; 3] = Default::default();
    for (idx, bundle) in bundles.iter().enumerate() {
        let tier = match classify_bundle(oracle, bundle, &courier_locs, now, config) {
            UrgencyGroup::GroupI => 0,
            UrgencyGroup::GroupII => 1,
            UrgencyGroup::GroupIII => 2,
        };
        groups[tier].push(idx);
    }

    // One matching per group, most urgent first; couriers committed by an
    // earlier group are excluded from later ones.
    let mut committed: HashSet<Entity> = HashSet::new();
    let mut planned: Vec<(Entity, RouteCommitment)> = Vec::new();
    for group in &groups {
        if group.is_empty() {
            continue;
        }
        let available: Vec<&FreeCourier> = free
            .iter()
            .filter(|c| !committed.contains(&c.entity))
            .collect();
        if available.is_empty() {
            break;
        }

        let scores: Vec<Vec<f64>> = available
            .iter()
            .map(|courier| {
                group
                    .iter()
                    .map(|&bundle_idx| {
                        score_pair(oracle, courier.location, &bundles[bundle_idx], now, config)
                    })
                    .collect()
            })
            .collect();

        for pair in matcher.solve(&scores) {
            let courier = available[pair.row];
            let bundle = &bundles[group[pair.col]];
            match decide_commitment(oracle, courier.location, bundle, now, config) {
                Some(route) => {
                    if route.kind == CommitmentKind::Final {
                        let ready_too_long = bundle.orders.iter().any(|o| {
                            now.saturating_sub(o.ready_time_ms) > config.commitment_window_ms
                        });
                        if ready_too_long {
                            telemetry.forced_final_commitments += 1;
                        }
                    }
                    committed.insert(courier.entity);
                    planned.push((courier.entity, route));
                }
                None => telemetry.aborted_assignments += 1,
            }
        }
    }
    planned
}

/// Baseline: assign each ready order to the nearest free courier, one order
/// per courier per tick, as an immediate final commitment.
fn nearest_courier_pass(
    oracle: &dyn RouteProvider,
    free: &[FreeCourier],
    orders: &Query<(Entity, &mut Order)>,
    restaurants: &Query<(Entity, &mut Restaurant)>,
    now: u64,
) -> Vec<(Entity, RouteCommitment)> {
    let mut ready: Vec<(Entity, u64, u64, Coord, Entity)> = orders
        .iter()
        .filter(|(_, o)| o.status == OrderStatus::Ready)
        .map(|(entity, o)| (entity, o.id, o.ready_time_ms, o.dropoff, o.restaurant))
        .collect();
    ready.sort_by_key(|(_, id, ready_ms, _, _)| (*ready_ms, *id));

    let mut pool: Vec<(Entity, Coord)> = free.iter().map(|c| (c.entity, c.location)).collect();
    let mut planned = Vec::new();

    for (order_entity, _, _, dropoff, restaurant_entity) in ready {
        if pool.is_empty() {
            break;
        }
        let Ok((_, restaurant)) = restaurants.get(restaurant_entity) else {
            continue;
        };
        let Some(courier_entity) = nearest_free_courier(restaurant.location, &pool) else {
            continue;
        };
        let courier_loc = pool
            .iter()
            .find(|(entity, _)| *entity == courier_entity)
            .map(|(_, loc)| *loc)
            .expect("courier came from the pool");

        let Some(route) = oracle.route(courier_loc, &[restaurant.location, dropoff]) else {
            continue;
        };
        let last_waypoint = route.last_waypoint().unwrap_or(dropoff);
        pool.retain(|(entity, _)| *entity != courier_entity);
        planned.push((
            courier_entity,
            RouteCommitment {
                orders: vec![order_entity],
                restaurant: restaurant_entity,
                distance_m: route.distance_m,
                duration_s: route.duration_s,
                geometry: route.geometry,
                start_time_ms: now,
                completion_time_ms: now + (route.duration_s * 1000.0).round() as u64,
                kind: CommitmentKind::Final,
                last_waypoint,
            },
        ));
    }
    planned
}
