//! Seeds the event queue when the simulation starts.

use bevy_ecs::prelude::{Entity, Query, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::{Courier, Order};

pub fn simulation_started_system(
    event: Res<CurrentEvent>,
    mut clock: ResMut<SimulationClock>,
    couriers: Query<(Entity, &Courier)>,
    orders: Query<(Entity, &Order)>,
) {
    if event.0.kind != EventKind::SimulationStarted {
        return;
    }

    for (entity, courier) in &couriers {
        clock.schedule_at(
            courier.on_time_ms,
            EventKind::ActivateCourier,
            Some(EventSubject::Courier(entity)),
        );
    }

    for (entity, order) in &orders {
        clock.schedule_at(
            order.placement_time_ms,
            EventKind::ReleaseOrder,
            Some(EventSubject::Order(entity)),
        );
    }

    let now = clock.now();
    clock.schedule_at(now, EventKind::DispatchRun, None);

    tracing::info!(
        couriers = couriers.iter().count(),
        orders = orders.iter().count(),
        "simulation started"
    );
}
