//! Scenario setup: configuration resources, instance specs, and world building.

mod build;
mod params;

pub use build::build_scenario;
pub use params::{
    CourierSpec, DispatchConfig, DispatchPolicy, OrderSpec, RestaurantSpec, ScenarioError,
    ScenarioParams, SimulationEndTimeMs,
};
