//! Bundle scoring and urgency classification.
//!
//! The score trades off throughput against freshness and lateness penalties;
//! classification sorts bundles into the urgency tiers that drive matching
//! order (Group I first, Group III last). Both use the same timing model:
//! the courier drives to the restaurant, waits for the kitchen if needed,
//! spends half the service time on pickup, then delivers each dropoff with
//! half the service time apiece.

use crate::bundling::Bundle;
use crate::routing::RouteProvider;
use crate::scenario::DispatchConfig;
use crate::spatial::Coord;

/// Urgency tiers. Group I bundles are already late against the target
/// click-to-door; Group II cannot be picked up at ready time; Group III is
/// everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrgencyGroup {
    GroupI,
    GroupII,
    GroupIII,
}

/// Timing of a candidate (courier, bundle) pairing, all in simulation ms
/// (fractional, since oracle durations are fractional seconds).
struct PairTiming {
    pickup_ms: f64,
    delivery_finish_ms: f64,
    outbound_duration_s: f64,
}

fn pair_timing(
    oracle: &dyn RouteProvider,
    courier_loc: Coord,
    bundle: &Bundle,
    now_ms: u64,
    config: &DispatchConfig,
) -> Option<PairTiming> {
    let half_service_ms = config.service_time_ms as f64 / 2.0;

    let inbound = oracle.route(courier_loc, &[bundle.restaurant_loc])?;
    let arrival_ms = now_ms as f64 + inbound.duration_s * 1000.0;
    let pickup_ms = (bundle.max_ready_ms() as f64).max(arrival_ms + half_service_ms);
    let departure_ms = pickup_ms + half_service_ms;

    let outbound = oracle.route(bundle.restaurant_loc, &bundle.dropoffs())?;
    let delivery_finish_ms = departure_ms
        + outbound.duration_s * 1000.0
        + half_service_ms * bundle.size() as f64;

    Some(PairTiming {
        pickup_ms,
        delivery_finish_ms,
        outbound_duration_s: outbound.duration_s,
    })
}

/// Score a (courier, bundle) pairing at time `now_ms`. Higher is better;
/// `f64::NEG_INFINITY` marks an infeasible pairing (routing failure).
pub fn score_pair(
    oracle: &dyn RouteProvider,
    courier_loc: Coord,
    bundle: &Bundle,
    now_ms: u64,
    config: &DispatchConfig,
) -> f64 {
    let Some(timing) = pair_timing(oracle, courier_loc, bundle, now_ms, config) else {
        return f64::NEG_INFINITY;
    };

    let latest_allowed_ms =
        (bundle.min_placement_ms() + config.max_click_to_door_ms) as f64;
    let priority_penalty = if timing.delivery_finish_ms > latest_allowed_ms {
        config.group_i_penalty
    } else if timing.pickup_ms > bundle.max_ready_ms() as f64 {
        config.group_ii_penalty
    } else {
        0.0
    };

    let throughput = bundle.size() as f64
        / (timing.outbound_duration_s / 60.0 + config.service_time_mins());

    let freshness_penalty = config.freshness_theta
        * bundle
            .orders
            .iter()
            .map(|o| (timing.pickup_ms - o.ready_time_ms as f64).max(0.0))
            .fold(0.0, f64::max)
        / 60_000.0;

    throughput - freshness_penalty - priority_penalty
}

/// Earliest achievable dropoff-finish time for the pairing, in fractional ms.
pub fn earliest_possible_dropoff_ms(
    oracle: &dyn RouteProvider,
    courier_loc: Coord,
    bundle: &Bundle,
    now_ms: u64,
    config: &DispatchConfig,
) -> Option<f64> {
    pair_timing(oracle, courier_loc, bundle, now_ms, config).map(|t| t.delivery_finish_ms)
}

/// Earliest pickup estimate: inbound travel plus half the service time.
pub fn earliest_pickup_estimate_ms(
    oracle: &dyn RouteProvider,
    courier_loc: Coord,
    bundle: &Bundle,
    now_ms: u64,
    config: &DispatchConfig,
) -> Option<f64> {
    let inbound = oracle.route(courier_loc, &[bundle.restaurant_loc])?;
    Some(now_ms as f64 + inbound.duration_s * 1000.0 + config.service_time_ms as f64 / 2.0)
}

/// Classify a bundle against the currently free couriers.
pub fn classify_bundle(
    oracle: &dyn RouteProvider,
    bundle: &Bundle,
    courier_locs: &[Coord],
    now_ms: u64,
    config: &DispatchConfig,
) -> UrgencyGroup {
    let target_dropoff_ms =
        (bundle.min_placement_ms() + config.target_click_to_door_ms) as f64;

    let can_meet_target = courier_locs.iter().any(|&loc| {
        earliest_possible_dropoff_ms(oracle, loc, bundle, now_ms, config)
            .is_some_and(|epd| epd <= target_dropoff_ms)
    });
    if !can_meet_target {
        return UrgencyGroup::GroupI;
    }

    let bundle_ready_ms = bundle.max_ready_ms() as f64;
    let can_pick_up_on_time = courier_locs.iter().any(|&loc| {
        earliest_pickup_estimate_ms(oracle, loc, bundle, now_ms, config)
            .is_some_and(|estimate| estimate <= bundle_ready_ms)
    });
    if !can_pick_up_on_time {
        return UrgencyGroup::GroupII;
    }

    UrgencyGroup::GroupIII
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundling::BundleOrder;
    use crate::clock::ONE_MIN_MS;
    use crate::routing::EuclideanRouteProvider;
    use crate::test_helpers::{coord_east_m, test_coord};
    use bevy_ecs::prelude::World;

    fn bundle_of(
        world: &mut World,
        placement_min: u64,
        ready_min: u64,
        dropoff: Coord,
    ) -> Bundle {
        let restaurant = world.spawn_empty().id();
        Bundle {
            restaurant,
            restaurant_loc: test_coord(),
            orders: vec![BundleOrder {
                entity: world.spawn_empty().id(),
                id: 1,
                placement_time_ms: placement_min * ONE_MIN_MS,
                ready_time_ms: ready_min * ONE_MIN_MS,
                dropoff,
            }],
        }
    }

    fn config() -> DispatchConfig {
        DispatchConfig::default()
    }

    #[test]
    fn infeasible_route_scores_negative_infinity() {
        struct NoRoute;
        impl RouteProvider for NoRoute {
            fn route(&self, _: Coord, _: &[Coord]) -> Option<crate::routing::Route> {
                None
            }
        }
        let mut world = World::new();
        let bundle = bundle_of(&mut world, 0, 0, coord_east_m(test_coord(), 300.0));
        let score = score_pair(&NoRoute, test_coord(), &bundle, 0, &config());
        assert_eq!(score, f64::NEG_INFINITY);
    }

    #[test]
    fn waiting_on_the_kitchen_incurs_no_freshness_penalty() {
        let oracle = EuclideanRouteProvider::new(320.0);
        let mut world = World::new();
        // Courier adjacent, order ready well after arrival: pickup waits on the
        // kitchen, so freshness is zero and only throughput remains.
        let bundle = bundle_of(&mut world, 0, 30, coord_east_m(test_coord(), 320.0));
        let courier = coord_east_m(test_coord(), 160.0);
        let score = score_pair(&oracle, courier, &bundle, 0, &config());
        let throughput = 1.0 / (1.0 + 4.0); // one-minute outbound + service time
        assert!((score - throughput).abs() < 1e-4, "got {score}");
    }

    #[test]
    fn stale_orders_are_penalized_for_freshness() {
        let oracle = EuclideanRouteProvider::new(320.0);
        let mut world = World::new();
        let dropoff = coord_east_m(test_coord(), 320.0);
        let fresh = bundle_of(&mut world, 0, 30, dropoff);
        let stale = bundle_of(&mut world, 0, 0, dropoff);
        let courier = coord_east_m(test_coord(), 160.0);
        let now = 30 * ONE_MIN_MS;
        let fresh_score = score_pair(&oracle, courier, &fresh, now, &config());
        let stale_score = score_pair(&oracle, courier, &stale, now, &config());
        assert!(stale_score < fresh_score);
    }

    #[test]
    fn hopelessly_late_bundle_is_group_one() {
        let oracle = EuclideanRouteProvider::new(320.0);
        let mut world = World::new();
        // Placed at minute 0; at minute 55 even an adjacent courier cannot
        // finish inside the 40-minute target.
        let bundle = bundle_of(&mut world, 0, 5, coord_east_m(test_coord(), 320.0));
        let couriers = [coord_east_m(test_coord(), 160.0)];
        let group = classify_bundle(&oracle, &bundle, &couriers, 55 * ONE_MIN_MS, &config());
        assert_eq!(group, UrgencyGroup::GroupI);
    }

    #[test]
    fn missed_ready_time_is_group_two() {
        let oracle = EuclideanRouteProvider::new(320.0);
        let mut world = World::new();
        // Ready at minute 1; the only courier is ten minutes out, so pickup
        // slips past ready time while the 40-minute target is still safe.
        let bundle = bundle_of(&mut world, 0, 1, coord_east_m(test_coord(), 320.0));
        let couriers = [coord_east_m(test_coord(), 3200.0)];
        let group = classify_bundle(&oracle, &bundle, &couriers, 2 * ONE_MIN_MS, &config());
        assert_eq!(group, UrgencyGroup::GroupII);
    }

    #[test]
    fn comfortable_bundle_is_group_three() {
        let oracle = EuclideanRouteProvider::new(320.0);
        let mut world = World::new();
        // Ready twenty minutes out; an adjacent courier picks up on time.
        let bundle = bundle_of(&mut world, 0, 20, coord_east_m(test_coord(), 320.0));
        let couriers = [coord_east_m(test_coord(), 160.0)];
        let group = classify_bundle(&oracle, &bundle, &couriers, ONE_MIN_MS, &config());
        assert_eq!(group, UrgencyGroup::GroupIII);
    }

    #[test]
    fn no_free_couriers_classifies_as_group_one() {
        let oracle = EuclideanRouteProvider::new(320.0);
        let mut world = World::new();
        let bundle = bundle_of(&mut world, 0, 5, coord_east_m(test_coord(), 320.0));
        let group = classify_bundle(&oracle, &bundle, &[], 0, &config());
        assert_eq!(group, UrgencyGroup::GroupI);
    }
}
