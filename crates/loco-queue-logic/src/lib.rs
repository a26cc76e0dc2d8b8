//! Pure waypoint and consist logic for locomotive order queues.
//!
//! This crate contains everything about waypoints and cuts that does not
//! depend on a host game, engine, or runtime. Functions take a materialized
//! consist snapshot plus small lookup traits and return plain values, so the
//! whole cut engine is unit-testable without a simulation.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`consist`] | Cars, logical ends, traversal snapshots, motive-power lookup |
//! | [`destination`] | Car destinations and the by-destination match predicate |
//! | [`cut`] | Cut calculator: by count, destination, specific car, all-except-motive-power |
//! | [`uncouple`] | Uncouple-point resolver: which joint separates a cut block |
//! | [`waypoint`] | Waypoint order records, directives, and order validation |
//! | [`migration`] | Versioned upcast of stored waypoint records |
//! | [`error`] | Typed cut errors shared by the calculator and resolver |

pub mod consist;
pub mod cut;
pub mod destination;
pub mod error;
pub mod migration;
pub mod uncouple;
pub mod waypoint;

pub use consist::{Archetype, Car, CarId, Consist, Coupling, End, MotivePower, TenderPairs};
pub use destination::{Destination, DestinationMatch, DestinationResolver, DestinationTable};
pub use error::CutError;
pub use migration::{upcast_v1, MigrationError, WaypointRecordV1, CURRENT_RECORD_VERSION};
pub use uncouple::{find_car_to_uncouple, UncouplePoint};
pub use waypoint::{
    CountFrom, CutSelector, Location, OrderError, OrderId, PostCouplingCut, RefuelDirective,
    UncoupleMode, WaitDirective, WaypointOrder,
};
