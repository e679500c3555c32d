use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::clock::ONE_MIN_MS;
use crate::pay::PayConfig;
use crate::routing::RouteProviderKind;
use crate::spatial::Coord;

/// Dispatcher timing constants and score weights. All durations in
/// simulation milliseconds.
#[derive(Debug, Clone, Copy, Resource, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Width of a dispatch tick.
    pub optimization_frequency_ms: u64,
    /// Lookahead window for orders entering bundle formation.
    pub assignment_horizon_ms: u64,
    /// Click-to-door target; bundles that cannot meet it go to Group I.
    pub target_click_to_door_ms: u64,
    /// Click-to-door ceiling used by the score's lateness penalty.
    pub max_click_to_door_ms: u64,
    /// Pickup service time; half is spent at the restaurant, half per dropoff.
    pub service_time_ms: u64,
    /// Demand window for the target-bundle-size ratio.
    pub demand_window_ms: u64,
    /// Supply window for the target-bundle-size ratio.
    pub supply_window_ms: u64,
    pub group_i_penalty: f64,
    pub group_ii_penalty: f64,
    /// Freshness weight (theta) applied to pickup-after-ready minutes.
    pub freshness_theta: f64,
    /// Orders ready longer than this force a final commitment when matched.
    pub commitment_window_ms: u64,
    /// Arrival-at-restaurant estimate uses this fraction of the inbound
    /// travel time when testing the optimization window.
    pub inbound_horizon_factor: f64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            optimization_frequency_ms: 5 * ONE_MIN_MS,
            assignment_horizon_ms: 20 * ONE_MIN_MS,
            target_click_to_door_ms: 40 * ONE_MIN_MS,
            max_click_to_door_ms: 90 * ONE_MIN_MS,
            service_time_ms: 4 * ONE_MIN_MS,
            demand_window_ms: 20 * ONE_MIN_MS,
            supply_window_ms: 20 * ONE_MIN_MS,
            group_i_penalty: 100.0,
            group_ii_penalty: 50.0,
            freshness_theta: 1.5,
            commitment_window_ms: 15 * ONE_MIN_MS,
            inbound_horizon_factor: 0.5,
        }
    }
}

impl DispatchConfig {
    pub fn service_time_mins(&self) -> f64 {
        self.service_time_ms as f64 / ONE_MIN_MS as f64
    }
}

/// Which dispatch policy runs each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Resource, Serialize, Deserialize)]
pub enum DispatchPolicy {
    /// Bundle formation, urgency-grouped matching, two-stage commitments.
    #[default]
    RollingHorizon,
    /// Baseline: each ready order goes to the nearest free courier outright.
    NearestCourier,
}

/// Simulation end time in milliseconds. The runner stops processing events
/// once the next event would be at or after this timestamp.
#[derive(Debug, Clone, Copy, Resource)]
pub struct SimulationEndTimeMs(pub u64);

/// An order as provided by a dataset loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSpec {
    pub id: u64,
    pub restaurant_id: u64,
    pub placement_time_ms: u64,
    pub ready_time_ms: u64,
    pub dropoff: Coord,
}

/// A restaurant as provided by a dataset loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestaurantSpec {
    pub id: u64,
    pub location: Coord,
}

/// A courier as provided by a dataset loader.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourierSpec {
    pub id: u64,
    pub on_time_ms: u64,
    pub off_time_ms: u64,
    pub start_location: Coord,
}

/// Loader-level data inconsistencies. Fatal at startup; the dispatcher
/// assumes cleaned input.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("order {order} references unknown restaurant {restaurant}")]
    UnknownRestaurant { order: u64, restaurant: u64 },
    #[error("order {order} is ready at {ready_ms}ms, before its placement at {placement_ms}ms")]
    ReadyBeforePlacement {
        order: u64,
        placement_ms: u64,
        ready_ms: u64,
    },
    #[error("courier {courier} has off_time {off_ms}ms at or before on_time {on_ms}ms")]
    InvalidShift {
        courier: u64,
        on_ms: u64,
        off_ms: u64,
    },
}

/// Parameters for building a simulation scenario.
#[derive(Debug, Clone, Default)]
pub struct ScenarioParams {
    pub restaurants: Vec<RestaurantSpec>,
    pub orders: Vec<OrderSpec>,
    pub couriers: Vec<CourierSpec>,
    pub config: DispatchConfig,
    pub pay: PayConfig,
    pub policy: DispatchPolicy,
    pub route_provider_kind: RouteProviderKind,
    /// Optional explicit end time. If unset, the builder derives one from the
    /// latest shift end plus an hour of drain time.
    pub simulation_end_time_ms: Option<u64>,
}

impl ScenarioParams {
    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_route_provider(mut self, kind: RouteProviderKind) -> Self {
        self.route_provider_kind = kind;
        self
    }

    pub fn with_simulation_end_time_ms(mut self, end_ms: u64) -> Self {
        self.simulation_end_time_ms = Some(end_ms);
        self
    }

    /// Check the input for loader-level inconsistencies.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        for order in &self.orders {
            if !self.restaurants.iter().any(|r| r.id == order.restaurant_id) {
                return Err(ScenarioError::UnknownRestaurant {
                    order: order.id,
                    restaurant: order.restaurant_id,
                });
            }
            if order.ready_time_ms < order.placement_time_ms {
                return Err(ScenarioError::ReadyBeforePlacement {
                    order: order.id,
                    placement_ms: order.placement_time_ms,
                    ready_ms: order.ready_time_ms,
                });
            }
        }
        for courier in &self.couriers {
            if courier.off_time_ms <= courier.on_time_ms {
                return Err(ScenarioError::InvalidShift {
                    courier: courier.id,
                    on_ms: courier.on_time_ms,
                    off_ms: courier.off_time_ms,
                });
            }
        }
        Ok(())
    }
}
