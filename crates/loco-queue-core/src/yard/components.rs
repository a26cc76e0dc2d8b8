//! Component definitions for the reference yard.
//!
//! Components are pure data attached to car entities. Behavior lives in
//! [`super::Yard`].

use hecs::Entity;
use loco_queue_logic::{Car, CarId, Destination, End, Location};

/// Identity and archetype of a car entity.
#[derive(Debug, Clone)]
pub struct CarInfo(pub Car);

/// Coupler links, oriented so that `b` of one car always meets `a` of the
/// next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Couplers {
    pub a: Option<Entity>,
    pub b: Option<Entity>,
}

impl Couplers {
    pub fn get(&self, end: End) -> Option<Entity> {
        match end {
            End::A => self.a,
            End::B => self.b,
        }
    }

    pub fn set(&mut self, end: End, other: Option<Entity>) {
        match end {
            End::A => self.a = other,
            End::B => self.b = other,
        }
    }

    pub fn flip(&mut self) {
        std::mem::swap(&mut self.a, &mut self.b);
    }
}

#[derive(Debug, Clone)]
pub struct DestinationTag(pub Destination);

/// Locomotive → tender pairing.
#[derive(Debug, Clone, Copy)]
pub struct PairedTender(pub Entity);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Brakes {
    pub handbrake: bool,
    pub air_connected: bool,
}

/// An active move order.
#[derive(Debug, Clone)]
pub struct MoveOrder {
    pub destination: Location,
    pub couple_target: Option<CarId>,
    /// Seconds of travel left.
    pub remaining: f32,
}

/// Engine driver state of a locomotive entity.
#[derive(Debug, Clone)]
pub struct Driver {
    pub velocity: f32,
    /// End of the consist that faces the current destination.
    pub leading_end: End,
    /// Last waypoint reached.
    pub location: Option<Location>,
}

impl Default for Driver {
    fn default() -> Self {
        Self {
            velocity: 0.0,
            leading_end: End::A,
            location: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FuelTank {
    pub quantity: f32,
    /// Industry currently filling the tank.
    pub filling_from: Option<String>,
    pub fill_to: f32,
}

/// A fuel-dispensing industry.
#[derive(Debug, Clone)]
pub struct FuelSource {
    pub load: String,
    pub stock: f32,
    /// Units per second.
    pub rate: f32,
}
