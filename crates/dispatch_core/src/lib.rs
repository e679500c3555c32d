//! # Meal-Delivery Dispatch Core
//!
//! A discrete-event simulator for rolling-horizon meal-delivery dispatch.
//!
//! ## Overview
//!
//! This crate provides the dispatch engine, including:
//!
//! - **Event Scheduling**: Millisecond-precision discrete event system
//! - **ECS State**: Orders, restaurants, and couriers as world entities
//! - **Routing Oracles**: Pluggable Euclidean / OSRM backends with caching
//! - **Bundle Formation**: Parallel cheapest-insertion per restaurant
//! - **Matching**: Urgency-grouped min-cost bipartite courier assignment
//! - **Commitments**: Two-stage final/partial route commitments
//! - **Reporting**: Order- and courier-level tables with parquet export
//!
//! ## Key Concepts
//!
//! - **Dispatch Ticks**: The dispatcher runs on a fixed cadence; all other
//!   progress (shift starts, order releases, route completions) happens
//!   through targeted events on the same timeline
//! - **Deterministic**: Stable input ordering and a deterministic assignment
//!   solver make runs reproducible bit-for-bit
//!
//! ## Example
//!
//! ```rust,no_run
//! use bevy_ecs::prelude::World;
//! use dispatch_core::scenario::{build_scenario, ScenarioParams};
//! use dispatch_core::runner::{initialize_simulation, run_until_empty, simulation_schedule};
//!
//! let mut world = World::new();
//! build_scenario(&mut world, ScenarioParams::default()).expect("valid scenario");
//! initialize_simulation(&mut world);
//!
//! let mut schedule = simulation_schedule();
//! let steps = run_until_empty(&mut world, &mut schedule, 1_000_000);
//! ```

pub mod bundling;
pub mod clock;
pub mod commitment;
pub mod ecs;
pub mod matching;
pub mod pay;
pub mod report;
pub mod report_export;
pub mod routing;
pub mod runner;
pub mod scenario;
pub mod scoring;
pub mod spatial;
pub mod systems;

#[cfg(test)]
pub mod test_helpers;
