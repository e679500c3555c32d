//! Run reporting: dispatch counters and the order/courier output tables.

use bevy_ecs::prelude::{Resource, World};
use serde::Serialize;

use crate::ecs::{Courier, Order, OrderStatus};
use crate::pay::{final_compensation, PayConfig};

/// Counters accumulated across the run, for logs and diagnostics.
#[derive(Debug, Default, Clone, Resource)]
pub struct DispatchTelemetry {
    pub dispatch_runs: u64,
    pub bundles_built: u64,
    pub final_commitments: u64,
    pub partial_commitments: u64,
    /// Final commitments forced by the commitment-window escape.
    pub forced_final_commitments: u64,
    /// Matched pairs dropped because no route could be committed.
    pub aborted_assignments: u64,
    pub orders_delivered: u64,
}

/// One row of the order-level output table. Times are simulation ms;
/// click-to-door and ready-to-pickup are minutes.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRow {
    pub order_id: u64,
    pub status: &'static str,
    pub placement_time: u64,
    pub ready_time: u64,
    pub pickup_time: Option<u64>,
    pub delivery_time: Option<u64>,
    pub click_to_door: Option<f64>,
    pub ready_to_pickup: Option<f64>,
    pub bundle_size: Option<u32>,
}

/// One row of the courier-level output table. `earnings` is the final
/// compensation after the hourly guarantee is applied.
#[derive(Debug, Clone, Serialize)]
pub struct CourierRow {
    pub courier_id: u64,
    pub orders_delivered: u32,
    pub total_distance_km: f64,
    pub shift_duration_hours: f64,
    pub earnings: f64,
}

pub fn order_status_label(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "pending",
        OrderStatus::Ready => "ready",
        OrderStatus::Assigned => "assigned",
        OrderStatus::Delivered => "delivered",
    }
}

/// Collect the order table, sorted by order id. Undelivered orders appear
/// with their current status and null pickup/delivery columns.
pub fn collect_order_rows(world: &mut World) -> Vec<OrderRow> {
    let mut rows: Vec<OrderRow> = world
        .query::<&Order>()
        .iter(world)
        .map(|order| OrderRow {
            order_id: order.id,
            status: order_status_label(order.status),
            placement_time: order.placement_time_ms,
            ready_time: order.ready_time_ms,
            pickup_time: order.pickup_time_ms,
            delivery_time: order.delivery_time_ms,
            click_to_door: order.click_to_door_mins(),
            ready_to_pickup: order.ready_to_pickup_mins(),
            bundle_size: order.delivered_bundle_size,
        })
        .collect();
    rows.sort_by_key(|row| row.order_id);
    rows
}

/// Collect the courier table, sorted by courier id, applying the pay floor.
pub fn collect_courier_rows(world: &mut World) -> Vec<CourierRow> {
    let pay = *world.resource::<PayConfig>();
    let mut rows: Vec<CourierRow> = world
        .query::<&Courier>()
        .iter(world)
        .map(|courier| {
            let shift_hours = courier.shift_duration_hours();
            CourierRow {
                courier_id: courier.id,
                orders_delivered: courier.orders_delivered,
                total_distance_km: courier.total_distance_m / 1000.0,
                shift_duration_hours: shift_hours,
                earnings: final_compensation(courier.earnings, shift_hours, &pay),
            }
        })
        .collect();
    rows.sort_by_key(|row| row.courier_id);
    rows
}
