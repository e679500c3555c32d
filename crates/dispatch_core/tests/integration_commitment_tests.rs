mod support;

use dispatch_core::clock::ONE_MIN_MS;
use dispatch_core::ecs::{CommitmentKind, Courier, Order, OrderStatus};
use dispatch_core::report::DispatchTelemetry;
use dispatch_core::scenario::ScenarioParams;
use support::{base_coord, courier, east_m, order, restaurant, run_scenario};

#[test]
fn distant_courier_is_upgraded_from_partial_to_final() {
    let home = base_coord();
    let params = ScenarioParams {
        restaurants: vec![restaurant(1, home)],
        orders: vec![order(10, 1, 0, 0, east_m(home, 320.0))],
        // Twenty inbound minutes away: half the travel time misses the
        // five-minute window, so the first commitment only repositions.
        couriers: vec![courier(100, 0, 180, east_m(home, 6400.0))],
        ..Default::default()
    };
    let mut world = run_scenario(params);

    let courier = world.query::<&Courier>().single(&world).clone();
    assert!(courier.route_history.len() >= 2, "expected partial then final");
    assert_eq!(courier.route_history[0].kind, CommitmentKind::Partial);
    assert!(courier.route_history[0].orders.is_empty());
    // Repositioning took the full inbound travel time and ended at the restaurant.
    let partial = &courier.route_history[0];
    let inbound_mins =
        (partial.completion_time_ms - partial.start_time_ms) as f64 / ONE_MIN_MS as f64;
    assert!((inbound_mins - 20.0).abs() < 0.5, "got {inbound_mins}");
    assert!(partial.last_waypoint.haversine_m(home) < 1.0);

    let last = courier.route_history.last().expect("final route");
    assert_eq!(last.kind, CommitmentKind::Final);

    let order = world.query::<&Order>().single(&world);
    assert_eq!(order.status, OrderStatus::Delivered);

    let telemetry = world.resource::<DispatchTelemetry>();
    assert!(telemetry.partial_commitments >= 1);
    assert_eq!(telemetry.final_commitments, 1);
}

#[test]
fn long_waiting_orders_force_a_final_commitment() {
    let home = base_coord();
    let params = ScenarioParams {
        restaurants: vec![restaurant(1, home)],
        // Ready at minute 0; the only courier appears at minute 20, far away.
        // The commitment window (15 min) has lapsed, so the very first match
        // must commit the full route even though the restaurant is out of
        // reach within the optimization window.
        orders: vec![order(10, 1, 0, 0, east_m(home, 320.0))],
        couriers: vec![courier(100, 20, 180, east_m(home, 6400.0))],
        ..Default::default()
    };
    let mut world = run_scenario(params);

    let courier = world.query::<&Courier>().single(&world).clone();
    assert_eq!(courier.route_history.len(), 1);
    let route = &courier.route_history[0];
    assert_eq!(route.kind, CommitmentKind::Final);
    assert_eq!(route.start_time_ms, 20 * ONE_MIN_MS);

    let order = world.query::<&Order>().single(&world);
    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(order.pickup_time_ms, Some(20 * ONE_MIN_MS));
    // Inbound 20 min plus a one-minute dropoff leg.
    let click_to_door = order.click_to_door_mins().expect("delivered");
    assert!((click_to_door - 41.0).abs() < 0.5, "got {click_to_door}");

    let telemetry = world.resource::<DispatchTelemetry>();
    assert_eq!(telemetry.forced_final_commitments, 1);
}

#[test]
fn kitchen_backlog_defers_commitment_until_orders_near_ready() {
    let home = base_coord();
    let params = ScenarioParams {
        restaurants: vec![restaurant(1, home)],
        // Placed immediately but the kitchen needs 12 minutes; the adjacent
        // courier is repositioned (trivially) rather than finally committed
        // until ready time falls inside the optimization window.
        orders: vec![order(10, 1, 0, 12, east_m(home, 320.0))],
        couriers: vec![courier(100, 0, 120, east_m(home, 160.0))],
        ..Default::default()
    };
    let mut world = run_scenario(params);

    let courier = world.query::<&Courier>().single(&world).clone();
    let first = &courier.route_history[0];
    assert_eq!(first.kind, CommitmentKind::Partial);

    let final_route = courier
        .route_history
        .iter()
        .find(|r| r.kind == CommitmentKind::Final)
        .expect("eventual final commitment");
    // Final only once the ready time is within one tick of the pass.
    assert!(final_route.start_time_ms >= 7 * ONE_MIN_MS);

    let order = world.query::<&Order>().single(&world);
    assert_eq!(order.status, OrderStatus::Delivered);
}
