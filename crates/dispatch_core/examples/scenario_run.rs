//! Run a small hand-built lunch-rush scenario and print the report tables.
//!
//! Run with: cargo run -p dispatch_core --example scenario_run

use bevy_ecs::prelude::World;

use dispatch_core::clock::ONE_MIN_MS;
use dispatch_core::report::{collect_courier_rows, collect_order_rows, DispatchTelemetry};
use dispatch_core::runner::{initialize_simulation, run_until_empty, simulation_schedule};
use dispatch_core::scenario::{
    build_scenario, CourierSpec, OrderSpec, RestaurantSpec, ScenarioParams,
};
use dispatch_core::spatial::Coord;

fn main() {
    // Two restaurants a few blocks apart, a slow trickle of orders, and a
    // three-courier fleet on overlapping shifts.
    let taqueria = Coord::new(24.1422, -110.3108);
    let mariscos = Coord::new(24.1510, -110.3010);

    let restaurants = vec![
        RestaurantSpec { id: 1, location: taqueria },
        RestaurantSpec { id: 2, location: mariscos },
    ];

    let mut orders = Vec::new();
    for i in 0..12u64 {
        let placement_min = i * 7;
        let restaurant_id = 1 + i % 2;
        let base = if restaurant_id == 1 { taqueria } else { mariscos };
        orders.push(OrderSpec {
            id: i,
            restaurant_id,
            placement_time_ms: placement_min * ONE_MIN_MS,
            ready_time_ms: (placement_min + 8) * ONE_MIN_MS,
            dropoff: Coord::new(base.lat + 0.004 + 0.001 * i as f64, base.lon - 0.003),
        });
    }

    let couriers = vec![
        CourierSpec {
            id: 1,
            on_time_ms: 0,
            off_time_ms: 180 * ONE_MIN_MS,
            start_location: Coord::new(24.1450, -110.3060),
        },
        CourierSpec {
            id: 2,
            on_time_ms: 15 * ONE_MIN_MS,
            off_time_ms: 180 * ONE_MIN_MS,
            start_location: Coord::new(24.1390, -110.3150),
        },
        CourierSpec {
            id: 3,
            on_time_ms: 30 * ONE_MIN_MS,
            off_time_ms: 180 * ONE_MIN_MS,
            start_location: Coord::new(24.1530, -110.2980),
        },
    ];

    let mut world = World::new();
    build_scenario(
        &mut world,
        ScenarioParams {
            restaurants,
            orders,
            couriers,
            ..Default::default()
        },
    )
    .expect("valid scenario");
    initialize_simulation(&mut world);

    let mut schedule = simulation_schedule();
    let steps = run_until_empty(&mut world, &mut schedule, 100_000);

    let telemetry = world.resource::<DispatchTelemetry>().clone();
    println!("--- Lunch-rush scenario ---");
    println!("Steps executed: {steps}");
    println!(
        "Dispatch passes: {}  bundles: {}  final: {}  partial: {}",
        telemetry.dispatch_runs,
        telemetry.bundles_built,
        telemetry.final_commitments,
        telemetry.partial_commitments,
    );

    println!("\nOrders:");
    for row in collect_order_rows(&mut world) {
        println!(
            "  #{:<3} {:<10} placed={:>3}m ready={:>3}m ctd={:?} bundle={:?}",
            row.order_id,
            row.status,
            row.placement_time / ONE_MIN_MS,
            row.ready_time / ONE_MIN_MS,
            row.click_to_door.map(|m| format!("{m:.1}m")),
            row.bundle_size,
        );
    }

    println!("\nCouriers:");
    for row in collect_courier_rows(&mut world) {
        println!(
            "  #{:<3} delivered={:<3} distance={:.1}km shift={:.1}h earnings={:.2}",
            row.courier_id,
            row.orders_delivered,
            row.total_distance_km,
            row.shift_duration_hours,
            row.earnings,
        );
    }
}
