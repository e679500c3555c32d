//! World state: components and status enums for orders, restaurants, and couriers.
//!
//! Orders, restaurants, and couriers are entities; cross-references are plain
//! `Entity` ids resolved through the world, so no shared ownership is needed.
//! An order is owned by its restaurant's ready queue until it enters a final
//! route commitment, and by that route until delivery.

use bevy_ecs::prelude::{Component, Entity};

use crate::spatial::Coord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Ready,
    Assigned,
    Delivered,
}

#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct Order {
    /// External (dataset) order id, used in reports.
    pub id: u64,
    pub restaurant: Entity,
    pub placement_time_ms: u64,
    pub ready_time_ms: u64,
    pub dropoff: Coord,
    pub status: OrderStatus,
    /// Set exactly once, on delivery.
    pub pickup_time_ms: Option<u64>,
    /// Set exactly once, on delivery.
    pub delivery_time_ms: Option<u64>,
    /// Size of the bundle that delivered this order.
    pub delivered_bundle_size: Option<u32>,
}

impl Order {
    pub fn new(
        id: u64,
        restaurant: Entity,
        placement_time_ms: u64,
        ready_time_ms: u64,
        dropoff: Coord,
    ) -> Self {
        Self {
            id,
            restaurant,
            placement_time_ms,
            ready_time_ms,
            dropoff,
            status: OrderStatus::Pending,
            pickup_time_ms: None,
            delivery_time_ms: None,
            delivered_bundle_size: None,
        }
    }

    /// Pending -> Ready. Status transitions are strictly monotonic.
    pub fn mark_ready(&mut self) {
        assert_eq!(
            self.status,
            OrderStatus::Pending,
            "order {} released twice",
            self.id
        );
        self.status = OrderStatus::Ready;
    }

    /// Ready -> Assigned, when the order enters a final commitment.
    pub fn mark_assigned(&mut self) {
        assert_eq!(
            self.status,
            OrderStatus::Ready,
            "order {} assigned while not ready",
            self.id
        );
        self.status = OrderStatus::Assigned;
    }

    /// Assigned -> Delivered. Pickup/delivery timestamps are written once.
    pub fn mark_delivered(&mut self, pickup_time_ms: u64, delivery_time_ms: u64, bundle_size: u32) {
        assert_eq!(
            self.status,
            OrderStatus::Assigned,
            "order {} delivered while not assigned",
            self.id
        );
        assert!(
            self.pickup_time_ms.is_none() && self.delivery_time_ms.is_none(),
            "order {} delivered twice",
            self.id
        );
        self.status = OrderStatus::Delivered;
        self.pickup_time_ms = Some(pickup_time_ms);
        self.delivery_time_ms = Some(delivery_time_ms);
        self.delivered_bundle_size = Some(bundle_size);
    }

    /// delivery_time - placement_time, in minutes. `None` until delivered.
    pub fn click_to_door_mins(&self) -> Option<f64> {
        self.delivery_time_ms
            .map(|d| (d as f64 - self.placement_time_ms as f64) / 60_000.0)
    }

    /// pickup_time - ready_time, in minutes. `None` until delivered.
    pub fn ready_to_pickup_mins(&self) -> Option<f64> {
        self.pickup_time_ms
            .map(|p| (p as f64 - self.ready_time_ms as f64) / 60_000.0)
    }
}

/// A restaurant and its queue of ready, not-yet-assigned orders.
#[derive(Debug, Clone, Component)]
pub struct Restaurant {
    /// External (dataset) restaurant id.
    pub id: u64,
    pub location: Coord,
    /// Orders in Ready status, in release order.
    pub ready_orders: Vec<Entity>,
}

impl Restaurant {
    pub fn new(id: u64, location: Coord) -> Self {
        Self {
            id,
            location,
            ready_orders: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitmentKind {
    /// The courier will pick up and deliver the orders without reconsideration.
    Final,
    /// The courier repositions toward the restaurant; orders stay reassignable.
    Partial,
}

/// An active or archived route commitment. Owned by exactly one courier.
#[derive(Debug, Clone)]
pub struct RouteCommitment {
    /// Orders delivered by this route. Empty for partial commitments.
    pub orders: Vec<Entity>,
    pub restaurant: Entity,
    pub distance_m: f64,
    pub duration_s: f64,
    /// Encoded polyline from the routing oracle, when the backend provides one.
    pub geometry: Option<String>,
    pub start_time_ms: u64,
    pub completion_time_ms: u64,
    pub kind: CommitmentKind,
    /// Where the courier ends up when the route completes.
    pub last_waypoint: Coord,
}

#[derive(Debug, Clone, Component)]
pub struct Courier {
    /// External (dataset) courier id.
    pub id: u64,
    pub on_time_ms: u64,
    pub off_time_ms: u64,
    pub location: Coord,
    /// Set by the activation event at `on_time_ms`.
    pub on_shift: bool,
    /// Non-null means busy and excluded from matching.
    pub current_route: Option<RouteCommitment>,
    /// Completed routes, append-only.
    pub route_history: Vec<RouteCommitment>,
    pub orders_delivered: u32,
    pub total_distance_m: f64,
    /// Per-delivery earnings accumulated during the run (before the hourly floor).
    pub earnings: f64,
}

impl Courier {
    pub fn new(id: u64, on_time_ms: u64, off_time_ms: u64, location: Coord) -> Self {
        Self {
            id,
            on_time_ms,
            off_time_ms,
            location,
            on_shift: false,
            current_route: None,
            route_history: Vec::new(),
            orders_delivered: 0,
            total_distance_m: 0.0,
            earnings: 0.0,
        }
    }

    /// Eligible for matching: on shift with no active route.
    pub fn is_free(&self) -> bool {
        self.on_shift && self.current_route.is_none()
    }

    pub fn shift_duration_hours(&self) -> f64 {
        (self.off_time_ms.saturating_sub(self.on_time_ms)) as f64 / 3_600_000.0
    }

    /// Attach a route. Committing a busy courier is a programmer error.
    pub fn begin_route(&mut self, route: RouteCommitment) {
        assert!(
            self.current_route.is_none(),
            "courier {} committed while busy",
            self.id
        );
        self.current_route = Some(route);
    }
}
