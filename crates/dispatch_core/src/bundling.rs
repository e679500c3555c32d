//! Bundle formation: parallel cheapest insertion per restaurant.
//!
//! Each dispatch tick, the orders ready at a restaurant inside the assignment
//! horizon are distributed over a set of bundle slots. Orders are taken in
//! ready-time order; every slot and every insertion position is priced via
//! the routing oracle and the cheapest one wins. An order no slot can host
//! opens a fresh bundle, which later orders may join.

use bevy_ecs::prelude::Entity;

use crate::routing::RouteProvider;
use crate::spatial::Coord;

/// An order as seen by the bundle builder and scorer.
#[derive(Debug, Clone, Copy)]
pub struct BundleOrder {
    pub entity: Entity,
    pub id: u64,
    pub placement_time_ms: u64,
    pub ready_time_ms: u64,
    pub dropoff: Coord,
}

/// An ordered set of orders from a single restaurant delivered in one route.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub restaurant: Entity,
    pub restaurant_loc: Coord,
    /// Orders in delivery order.
    pub orders: Vec<BundleOrder>,
}

impl Bundle {
    pub fn size(&self) -> usize {
        self.orders.len()
    }

    /// Dropoff coordinates in delivery order.
    pub fn dropoffs(&self) -> Vec<Coord> {
        self.orders.iter().map(|o| o.dropoff).collect()
    }

    /// Earliest placement time across the bundle. Bundles are never empty.
    pub fn min_placement_ms(&self) -> u64 {
        self.orders
            .iter()
            .map(|o| o.placement_time_ms)
            .min()
            .expect("bundle is never empty")
    }

    /// Latest ready time across the bundle.
    pub fn max_ready_ms(&self) -> u64 {
        self.orders
            .iter()
            .map(|o| o.ready_time_ms)
            .max()
            .expect("bundle is never empty")
    }
}

/// Target bundle size from the demand/supply ratio:
/// `max(floor(ready_orders / available_couriers), 1)`.
pub fn target_bundle_size(ready_orders: usize, available_couriers: usize) -> usize {
    if available_couriers == 0 {
        return ready_orders.max(1);
    }
    (ready_orders / available_couriers).max(1)
}

/// Build candidate bundles for one restaurant by parallel cheapest insertion.
///
/// `orders` must already be filtered to the assignment horizon and sorted by
/// ready time; `available_couriers` is the horizon supply count, which floors
/// the number of preallocated slots.
pub fn build_bundles(
    oracle: &dyn RouteProvider,
    restaurant: Entity,
    restaurant_loc: Coord,
    orders: &[BundleOrder],
    target_size: usize,
    available_couriers: usize,
    service_time_mins: f64,
    theta: f64,
) -> Vec<Bundle> {
    if orders.is_empty() {
        return Vec::new();
    }

    let slot_count = (orders.len() / target_size.max(1)).max(available_couriers);
    let mut slots: Vec<Vec<BundleOrder>> = vec![Vec::new(); slot_count];

    for &order in orders {
        let mut best: Option<(usize, usize, f64)> = None;

        for (slot_idx, slot) in slots.iter().enumerate() {
            for position in 0..=slot.len() {
                let mut dropoffs: Vec<Coord> = slot.iter().map(|o| o.dropoff).collect();
                dropoffs.insert(position, order.dropoff);

                let Some(route) = oracle.route(restaurant_loc, &dropoffs) else {
                    continue;
                };
                let service_delay_mins = if slot.is_empty() {
                    service_time_mins
                } else {
                    service_time_mins * (slot.len() as f64 + 1.0)
                };
                let cost = route.duration_mins() + theta * service_delay_mins;

                if best.map_or(true, |(_, _, best_cost)| cost < best_cost) {
                    best = Some((slot_idx, position, cost));
                }
            }
        }

        match best {
            Some((slot_idx, position, _)) => slots[slot_idx].insert(position, order),
            // No feasible insertion anywhere: open a fresh bundle.
            None => slots.push(vec![order]),
        }
    }

    slots
        .into_iter()
        .filter(|slot| !slot.is_empty())
        .map(|orders| Bundle {
            restaurant,
            restaurant_loc,
            orders,
        })
        .collect()
}
