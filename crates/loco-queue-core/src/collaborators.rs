//! Host collaborator contracts.
//!
//! The scheduler never touches track, physics or hardware directly. Every
//! external read and every physical action goes through these traits, so a
//! host game, the reference yard, or a test double can drive it.

use loco_queue_logic::{
    CarId, Coupling, CutError, DestinationResolver, End, Location, MotivePower, RefuelDirective,
};

/// Physical coupler, brake and air operations.
///
/// Each operation is idempotent.
pub trait PhysicalEffects {
    /// Open the joint at `end` of `car`. Fails with
    /// [`CutError::NoAdjacentCar`] when that end is already open.
    fn uncouple(&mut self, car: &CarId, end: End) -> Result<(), CutError>;
    fn set_handbrakes(&mut self, cars: &[CarId], applied: bool);
    fn connect_air(&mut self, cars: &[CarId]);
    fn bleed_air(&mut self, cars: &[CarId]);
}

/// The locomotive's engine driver.
pub trait MovementDriver {
    /// Start a move order, optionally coupling to `couple_target` on arrival.
    fn send_to(&mut self, locomotive: &CarId, location: &Location, couple_target: Option<&CarId>);
    fn has_active_order(&self, locomotive: &CarId) -> bool;
    fn velocity(&self, locomotive: &CarId) -> f32;
    fn cancel_order(&mut self, locomotive: &CarId);
    /// Logical end of the locomotive's consist that faces `location`.
    fn nearest_end(&self, locomotive: &CarId, location: &Location) -> End;
}

/// Refueling from an industry.
pub trait Refueling {
    fn start_refuel(&mut self, locomotive: &CarId, directive: &RefuelDirective);
    /// Tank full or source depleted.
    fn refuel_finished(&self, locomotive: &CarId, directive: &RefuelDirective) -> bool;
    fn stop_refuel(&mut self, locomotive: &CarId);
}

/// In-sim clock, in seconds.
pub trait SimClock {
    fn now(&self) -> f64;
}

/// Everything the scheduler needs from a host.
pub trait Railyard:
    Coupling
    + MotivePower
    + DestinationResolver
    + PhysicalEffects
    + MovementDriver
    + Refueling
    + SimClock
{
}

impl<T> Railyard for T where
    T: Coupling
        + MotivePower
        + DestinationResolver
        + PhysicalEffects
        + MovementDriver
        + Refueling
        + SimClock
{
}
