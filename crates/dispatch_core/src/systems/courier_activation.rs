//! Brings a courier on shift when its activation event fires.

use bevy_ecs::prelude::{Query, Res};

use crate::clock::{CurrentEvent, EventKind, EventSubject};
use crate::ecs::Courier;

pub fn courier_activation_system(event: Res<CurrentEvent>, mut couriers: Query<&mut Courier>) {
    if event.0.kind != EventKind::ActivateCourier {
        return;
    }
    let Some(EventSubject::Courier(entity)) = event.0.subject else {
        return;
    };
    let Ok(mut courier) = couriers.get_mut(entity) else {
        return;
    };

    courier.on_shift = true;
    tracing::debug!(courier = courier.id, "courier on shift");
}
