//! ECS Systems: event-driven logic that reacts to simulation events.
//!
//! Systems are functions that query and mutate the ECS world based on the
//! current event. Each system handles one event kind:
//!
//! - **simulation_started**: schedules shift activations, order releases, and
//!   the first dispatch pass
//! - **courier_activation**: brings couriers on shift
//! - **order_release**: moves placed orders into their restaurant's queue
//! - **dispatch_run**: the per-tick dispatch pass (bundling, scoring,
//!   matching, commitments)
//! - **route_completed**: delivery bookkeeping and courier relocation
//!
//! Systems react to the `CurrentEvent` resource, which is inserted by the
//! runner before each schedule execution.

pub mod courier_activation;
pub mod dispatch_run;
pub mod order_release;
pub mod route_completed;
pub mod simulation_started;
