//! Nearest-courier lookup for the first-come-first-served baseline policy.

use bevy_ecs::prelude::Entity;

use crate::spatial::Coord;

/// The free courier closest (straight-line) to `target`, or `None` if the
/// slice is empty. Ties keep the earlier entry, so a slice sorted by courier
/// id stays deterministic.
pub fn nearest_free_courier(target: Coord, couriers: &[(Entity, Coord)]) -> Option<Entity> {
    let mut best: Option<(Entity, f64)> = None;
    for &(entity, loc) in couriers {
        let distance = loc.haversine_m(target);
        match best {
            None => best = Some((entity, distance)),
            Some((_, best_distance)) if distance < best_distance => {
                best = Some((entity, distance))
            }
            _ => {}
        }
    }
    best.map(|(entity, _)| entity)
}
