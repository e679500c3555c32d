//! Completes a courier's active route: delivery bookkeeping and relocation.
//!
//! Final routes deliver their orders (pickup stamped with the route start,
//! delivery with the completion time) and pay the courier per order. Partial
//! routes only reposition. Either way the courier moves to the route's last
//! waypoint, the route is archived, and the courier becomes free for the
//! next dispatch pass.

use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject};
use crate::ecs::{CommitmentKind, Courier, Order};
use crate::pay::{delivery_earnings, PayConfig};
use crate::report::DispatchTelemetry;

pub fn route_completed_system(
    event: Res<CurrentEvent>,
    pay: Res<PayConfig>,
    mut telemetry: ResMut<DispatchTelemetry>,
    mut couriers: Query<&mut Courier>,
    mut orders: Query<&mut Order>,
) {
    if event.0.kind != EventKind::CompleteRoute {
        return;
    }
    let Some(EventSubject::Courier(entity)) = event.0.subject else {
        return;
    };
    let Ok(mut courier) = couriers.get_mut(entity) else {
        return;
    };
    let Some(route) = courier.current_route.take() else {
        return;
    };

    if route.kind == CommitmentKind::Final {
        let delivered = route.orders.len() as u32;
        for &order_entity in &route.orders {
            if let Ok(mut order) = orders.get_mut(order_entity) {
                order.mark_delivered(route.start_time_ms, route.completion_time_ms, delivered);
            }
        }
        courier.orders_delivered += delivered;
        courier.earnings += delivery_earnings(delivered, pay.pay_per_order);
        telemetry.orders_delivered += delivered as u64;
        tracing::debug!(
            courier = courier.id,
            delivered,
            at_min = route.completion_time_ms / 60_000,
            "route delivered"
        );
    } else {
        tracing::debug!(
            courier = courier.id,
            at_min = route.completion_time_ms / 60_000,
            "repositioning complete"
        );
    }

    courier.total_distance_m += route.distance_m;
    courier.location = route.last_waypoint;
    courier.route_history.push(route);
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::clock::{Event, SimulationClock};
    use crate::ecs::{OrderStatus, Restaurant, RouteCommitment};
    use crate::test_helpers::{coord_east_m, test_coord};

    fn run_completion(world: &mut World, courier_entity: bevy_ecs::prelude::Entity, at_ms: u64) {
        world.insert_resource(CurrentEvent(Event {
            timestamp: at_ms,
            kind: EventKind::CompleteRoute,
            subject: Some(EventSubject::Courier(courier_entity)),
        }));
        let mut schedule = Schedule::default();
        schedule.add_systems(route_completed_system);
        schedule.run(world);
    }

    #[test]
    fn final_route_delivers_orders_and_pays_the_courier() {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(PayConfig::default());
        world.insert_resource(DispatchTelemetry::default());

        let restaurant = world.spawn(Restaurant::new(1, test_coord())).id();
        let dropoff = coord_east_m(test_coord(), 500.0);
        let mut order = Order::new(7, restaurant, 0, 0, dropoff);
        order.mark_ready();
        order.mark_assigned();
        let order_entity = world.spawn(order).id();

        let mut courier = Courier::new(1, 0, 3_600_000, test_coord());
        courier.on_shift = true;
        courier.begin_route(RouteCommitment {
            orders: vec![order_entity],
            restaurant,
            distance_m: 1000.0,
            duration_s: 180.0,
            geometry: None,
            start_time_ms: 60_000,
            completion_time_ms: 240_000,
            kind: CommitmentKind::Final,
            last_waypoint: dropoff,
        });
        let courier_entity = world.spawn(courier).id();

        run_completion(&mut world, courier_entity, 240_000);

        let order = world.entity(order_entity).get::<Order>().expect("order");
        assert_eq!(order.status, OrderStatus::Delivered);
        assert_eq!(order.pickup_time_ms, Some(60_000));
        assert_eq!(order.delivery_time_ms, Some(240_000));
        assert_eq!(order.delivered_bundle_size, Some(1));

        let courier = world
            .entity(courier_entity)
            .get::<Courier>()
            .expect("courier");
        assert!(courier.current_route.is_none());
        assert_eq!(courier.orders_delivered, 1);
        assert_eq!(courier.earnings, 10.0);
        assert_eq!(courier.total_distance_m, 1000.0);
        assert_eq!(courier.route_history.len(), 1);
        assert!(courier.location.haversine_m(dropoff) < 1.0);
        assert!(courier.is_free());
    }

    #[test]
    fn partial_route_repositions_without_delivering() {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(PayConfig::default());
        world.insert_resource(DispatchTelemetry::default());

        let restaurant = world.spawn(Restaurant::new(1, test_coord())).id();
        let mut courier = Courier::new(1, 0, 3_600_000, coord_east_m(test_coord(), 6400.0));
        courier.on_shift = true;
        courier.begin_route(RouteCommitment {
            orders: Vec::new(),
            restaurant,
            distance_m: 6400.0,
            duration_s: 1200.0,
            geometry: None,
            start_time_ms: 0,
            completion_time_ms: 1_200_000,
            kind: CommitmentKind::Partial,
            last_waypoint: test_coord(),
        });
        let courier_entity = world.spawn(courier).id();

        run_completion(&mut world, courier_entity, 1_200_000);

        let courier = world
            .entity(courier_entity)
            .get::<Courier>()
            .expect("courier");
        assert_eq!(courier.orders_delivered, 0);
        assert_eq!(courier.earnings, 0.0);
        // Courier relocated to the restaurant and is free again.
        assert!(courier.location.haversine_m(test_coord()) < 1.0);
        assert!(courier.is_free());
        assert_eq!(courier.route_history.len(), 1);
    }
}
