//! Releases a placed order into its restaurant's ready queue.

use bevy_ecs::prelude::{Query, Res};

use crate::clock::{CurrentEvent, EventKind, EventSubject};
use crate::ecs::{Order, Restaurant};

pub fn order_release_system(
    event: Res<CurrentEvent>,
    mut orders: Query<&mut Order>,
    mut restaurants: Query<&mut Restaurant>,
) {
    if event.0.kind != EventKind::ReleaseOrder {
        return;
    }
    let Some(EventSubject::Order(entity)) = event.0.subject else {
        return;
    };
    let Ok(mut order) = orders.get_mut(entity) else {
        return;
    };

    order.mark_ready();
    if let Ok(mut restaurant) = restaurants.get_mut(order.restaurant) {
        restaurant.ready_orders.push(entity);
        tracing::debug!(order = order.id, restaurant = restaurant.id, "order ready");
    }
}
