//! Matching: pluggable solvers for courier-bundle assignment.
//!
//! The dispatcher builds one score matrix per urgency group (rows are free
//! couriers, columns are the group's bundles) and hands it to the solver
//! stored in [`MatcherResource`]. Infeasible pairs carry
//! `f64::NEG_INFINITY` and are never selected.
//!
//! ## Implementations
//!
//! - `HungarianSolver`: min-cost bipartite assignment (Kuhn-Munkres)
//! - `nearest_free_courier`: straight-line lookup for the FCFS baseline

pub mod algorithm;
pub mod hungarian;
pub mod nearest;

use bevy_ecs::prelude::Resource;

pub use algorithm::{AssignmentPair, AssignmentSolver};
pub use hungarian::HungarianSolver;
pub use nearest::nearest_free_courier;

/// Resource wrapper for the assignment solver trait object.
#[derive(Resource)]
pub struct MatcherResource(pub Box<dyn AssignmentSolver>);

impl MatcherResource {
    pub fn new(solver: Box<dyn AssignmentSolver>) -> Self {
        Self(solver)
    }
}

impl std::ops::Deref for MatcherResource {
    type Target = dyn AssignmentSolver;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
