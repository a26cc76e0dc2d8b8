//! Loco Queue Core - per-locomotive waypoint scheduler
//!
//! Drives queued waypoint orders for every locomotive from a single periodic
//! tick. Each tick re-reads the host (move order active, velocity, clock,
//! fuel) and advances each queue's state machine as far as it can.
//!
//! # Architecture
//!
//! - **Collaborators**: traits the host implements (movement, physical
//!   effects, refueling, clock, plus the consist traits from
//!   `loco-queue-logic`)
//! - **Registries**: queue states with change notifications, and route
//!   templates with their locomotive assignments
//! - **Scheduler**: the tick orchestrator and operator commands
//! - **Yard**: an ECS (`hecs`) railyard implementing every collaborator
//!
//! # Example
//!
//! ```rust,no_run
//! use loco_queue_core::prelude::*;
//!
//! let mut yard = Yard::new();
//! yard.add_consist(vec![Car::locomotive("L1"), Car::ordinary("c1"), Car::ordinary("c2")]);
//!
//! let mut scheduler = WaypointScheduler::default();
//! let order = WaypointOrder::to(Location::new("siding-1", 30.0))
//!     .uncouple(UncoupleMode::ByCount { count: 1 });
//! scheduler.enqueue(&CarId::new("L1"), order).unwrap();
//!
//! loop {
//!     yard.advance(0.1);
//!     scheduler.update(&mut yard, 0.1);
//! }
//! ```

pub mod collaborators;
pub mod config;
pub mod engine;
pub mod persistence;
pub mod queue;
pub mod registry;
pub mod resolution;
pub mod routes;
pub mod yard;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::collaborators::*;
    pub use crate::config::SchedulerConfig;
    pub use crate::engine::{CommandError, WaypointScheduler};
    pub use crate::queue::{OrderPhase, QueueError, QueueStatus};
    pub use crate::registry::QueueEvent;
    pub use crate::routes::{RouteAssignment, RouteDefinition};
    pub use crate::yard::Yard;
    pub use loco_queue_logic::{
        Car, CarId, CountFrom, CutError, CutSelector, Destination, DestinationMatch, End, Location,
        OrderId, PostCouplingCut, RefuelDirective, UncoupleMode, WaitDirective, WaypointOrder,
    };
}
