//! Simulation runner: advances the clock and routes events into the ECS.
//!
//! Clock progression and event routing happen here, outside systems. Each step
//! pops the next event from [SimulationClock], inserts it as [CurrentEvent],
//! then runs the schedule.

use bevy_ecs::prelude::Res;
use bevy_ecs::prelude::{Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;

use crate::clock::{CurrentEvent, EventKind, SimulationClock};
use crate::scenario::SimulationEndTimeMs;
use crate::systems::{
    courier_activation::courier_activation_system, dispatch_run::dispatch_run_system,
    order_release::order_release_system, route_completed::route_completed_system,
    simulation_started::simulation_started_system,
};

// Condition functions for each event kind
fn is_simulation_started(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::SimulationStarted)
        .unwrap_or(false)
}

fn is_activate_courier(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::ActivateCourier)
        .unwrap_or(false)
}

fn is_release_order(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::ReleaseOrder)
        .unwrap_or(false)
}

fn is_dispatch_run(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::DispatchRun)
        .unwrap_or(false)
}

fn is_complete_route(event: Option<Res<CurrentEvent>>) -> bool {
    event
        .map(|e| e.0.kind == EventKind::CompleteRoute)
        .unwrap_or(false)
}

/// Runs one simulation step: pops the next event, inserts it as [CurrentEvent],
/// then runs the schedule. Returns `true` if an event was processed, `false`
/// if the clock was empty or the next event is at or past [SimulationEndTimeMs]
/// (when that resource is present).
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> bool {
    let stop_at = world.get_resource::<SimulationEndTimeMs>().map(|e| e.0);
    let next_ts = world
        .get_resource::<SimulationClock>()
        .and_then(|c| c.next_event_time());
    if let (Some(end_ms), Some(ts)) = (stop_at, next_ts) {
        if ts >= end_ms {
            return false;
        }
    }

    let event = match world.resource_mut::<SimulationClock>().pop_next() {
        Some(e) => e,
        None => return false,
    };
    world.insert_resource(CurrentEvent(event));

    schedule.run(world);
    true
}

/// Runs simulation steps until the event queue is empty, the end time is
/// reached, or `max_steps` is hit. Returns the number of steps executed.
pub fn run_until_empty(world: &mut World, schedule: &mut Schedule, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && run_next_event(world, schedule) {
        steps += 1;
    }
    steps
}

/// Builds the default simulation schedule with each system gated on its event
/// kind, so only the relevant system runs per step.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems((
        simulation_started_system.run_if(is_simulation_started),
        courier_activation_system.run_if(is_activate_courier),
        order_release_system.run_if(is_release_order),
        dispatch_run_system.run_if(is_dispatch_run),
        route_completed_system.run_if(is_complete_route),
    ));
    schedule
}

/// Initializes the simulation by scheduling the SimulationStarted event at time 0.
/// Call this after building the scenario and before running events.
pub fn initialize_simulation(world: &mut World) {
    let mut clock = world.resource_mut::<SimulationClock>();
    clock.schedule_at(0, EventKind::SimulationStarted, None);
}
