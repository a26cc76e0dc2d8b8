//! Waypoint order records and their validation.
//!
//! A waypoint is one queued stop for a locomotive. It can combine movement,
//! coupling, a post-coupling cut, an uncouple directive, waiting and
//! refueling. The scheduler consumes these records; this module only defines
//! them and checks that an order is internally consistent before it is
//! queued.
//!
//! ```
//! use loco_queue_logic::waypoint::{validate_order, Location, UncoupleMode, WaypointOrder};
//!
//! let mut order = WaypointOrder::to(Location::new("yard-1", 40.0));
//! order.uncouple = UncoupleMode::ByCount { count: 3 };
//! assert!(validate_order(&order).is_empty());
//! ```

use crate::consist::CarId;
use crate::destination::DestinationMatch;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Order identity, unique within one scheduler.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A point on the host's track network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Host track segment identifier.
    pub segment: String,
    /// Distance along the segment, in metres.
    #[serde(default)]
    pub offset: f32,
}

impl Location {
    pub fn new(segment: impl Into<String>, offset: f32) -> Self {
        Self {
            segment: segment.into(),
            offset,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:.1}", self.segment, self.offset)
    }
}

/// Which end of the consist counting starts from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountFrom {
    /// The end of the consist nearest the waypoint.
    #[default]
    NearestToWaypoint,
    /// The end of the consist furthest from the waypoint.
    FurthestFromWaypoint,
}

/// How the uncouple directive picks its cut block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum UncoupleMode {
    #[default]
    None,
    ByCount {
        count: usize,
    },
    ByDestination {
        target: DestinationMatch,
    },
    /// Free-text query: car id or display name.
    BySpecificCar {
        query: String,
    },
    AllExceptMotivePower,
}

impl UncoupleMode {
    pub fn is_none(&self) -> bool {
        matches!(self, UncoupleMode::None)
    }
}

/// What a post-coupling cut selects, relative to the coupled car.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "by", rename_all = "snake_case")]
pub enum CutSelector {
    Count { count: usize },
    Destination { target: DestinationMatch },
    AllExceptMotivePower,
}

/// Cut evaluated right after coupling to the waypoint's couple target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PostCouplingCut {
    #[default]
    None,
    /// Keep the selected coupled cars, leave the rest of the coupled string.
    Pickup { select: CutSelector },
    /// Leave the selected carried cars with the coupled string.
    Dropoff { select: CutSelector },
}

impl PostCouplingCut {
    pub fn is_none(&self) -> bool {
        matches!(self, PostCouplingCut::None)
    }
}

/// How long to hold at the waypoint once stopped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "wait", rename_all = "snake_case")]
pub enum WaitDirective {
    /// A fixed in-sim duration.
    Duration { minutes: f64 },
    /// Until the next occurrence of an in-sim time of day.
    UntilTime { hour: u8, minute: u8 },
}

/// Refuel from an industry at the waypoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefuelDirective {
    /// Load name, e.g. "diesel", "coal", "water".
    pub load: String,
    /// Tank capacity to fill to.
    pub capacity: f32,
    /// Industry supplying the load.
    pub industry_id: String,
}

/// One queued stop for a locomotive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaypointOrder {
    #[serde(default)]
    pub id: OrderId,
    pub location: Location,
    /// `false` resolves only the uncouple directive while rolling through.
    #[serde(default = "default_true")]
    pub stop_at_waypoint: bool,

    #[serde(default)]
    pub couple_target: Option<CarId>,
    #[serde(default)]
    pub connect_air_on_couple: bool,
    #[serde(default)]
    pub release_handbrakes_on_couple: bool,
    #[serde(default)]
    pub post_coupling_cut: PostCouplingCut,

    #[serde(default)]
    pub uncouple: UncoupleMode,
    #[serde(default)]
    pub count_from: CountFrom,
    /// Leave the matched cars out of by-destination and specific-car blocks.
    #[serde(default)]
    pub exclude_matched_from_cut: bool,
    /// The cut block stays with the locomotive; the remainder is left behind.
    #[serde(default)]
    pub take_active_cut: bool,
    #[serde(default)]
    pub apply_handbrakes_on_uncouple: bool,
    #[serde(default)]
    pub bleed_air_on_uncouple: bool,

    #[serde(default)]
    pub wait: Option<WaitDirective>,
    #[serde(default)]
    pub refuel: Option<RefuelDirective>,
}

fn default_true() -> bool {
    true
}

impl WaypointOrder {
    /// A plain move-and-stop order with no directives.
    pub fn to(location: Location) -> Self {
        Self {
            id: OrderId::default(),
            location,
            stop_at_waypoint: true,
            couple_target: None,
            connect_air_on_couple: false,
            release_handbrakes_on_couple: false,
            post_coupling_cut: PostCouplingCut::None,
            uncouple: UncoupleMode::None,
            count_from: CountFrom::default(),
            exclude_matched_from_cut: false,
            take_active_cut: false,
            apply_handbrakes_on_uncouple: false,
            bleed_air_on_uncouple: false,
            wait: None,
            refuel: None,
        }
    }

    pub fn couple_to(mut self, target: impl Into<CarId>) -> Self {
        self.couple_target = Some(target.into());
        self
    }

    pub fn uncouple(mut self, mode: UncoupleMode) -> Self {
        self.uncouple = mode;
        self
    }

    pub fn post_cut(mut self, cut: PostCouplingCut) -> Self {
        self.post_coupling_cut = cut;
        self
    }

    pub fn wait(mut self, wait: WaitDirective) -> Self {
        self.wait = Some(wait);
        self
    }

    pub fn refuel(mut self, refuel: RefuelDirective) -> Self {
        self.refuel = Some(refuel);
        self
    }

    pub fn rolling(mut self) -> Self {
        self.stop_at_waypoint = false;
        self
    }

    pub fn has_couple_effects(&self) -> bool {
        self.couple_target.is_some()
    }

    pub fn has_uncouple_effects(&self) -> bool {
        !self.uncouple.is_none()
    }
}

/// Order validation error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderError {
    #[error("by-count uncouple needs at least one car")]
    ZeroUncoupleCount,
    #[error("destination match for {0} has an empty identifier")]
    EmptyDestinationId(&'static str),
    #[error("specific-car uncouple has an empty query")]
    EmptyCarQuery,
    #[error("post-coupling cut requires a couple target")]
    PostCutWithoutCoupleTarget,
    #[error("wait duration must be positive and finite (got {0})")]
    InvalidWaitDuration(f64),
    #[error("wait time {hour:02}:{minute:02} is not a valid time of day")]
    InvalidWaitTime { hour: u8, minute: u8 },
    #[error("refuel load name is empty")]
    EmptyRefuelLoad,
    #[error("refuel capacity must be positive (got {0})")]
    InvalidRefuelCapacity(f32),
    #[error("refuel industry id is empty")]
    EmptyRefuelIndustry,
    #[error("waypoint location has an empty segment id")]
    EmptyLocation,
}

fn check_destination(target: &DestinationMatch, errors: &mut Vec<OrderError>) {
    let kind = match target {
        DestinationMatch::NoDestination => return,
        DestinationMatch::Track(_) => "track",
        DestinationMatch::Industry(_) => "industry",
        DestinationMatch::Area(_) => "area",
    };
    if target.target_id().is_some_and(|id| id.trim().is_empty()) {
        errors.push(OrderError::EmptyDestinationId(kind));
    }
}

/// Validate a waypoint order, returning all errors found.
pub fn validate_order(order: &WaypointOrder) -> Vec<OrderError> {
    let mut errors = Vec::new();

    if order.location.segment.trim().is_empty() {
        errors.push(OrderError::EmptyLocation);
    }

    match &order.uncouple {
        UncoupleMode::ByCount { count: 0 } => errors.push(OrderError::ZeroUncoupleCount),
        UncoupleMode::ByDestination { target } => check_destination(target, &mut errors),
        UncoupleMode::BySpecificCar { query } if query.trim().is_empty() => {
            errors.push(OrderError::EmptyCarQuery)
        }
        _ => {}
    }

    match &order.post_coupling_cut {
        PostCouplingCut::None => {}
        PostCouplingCut::Pickup { select } | PostCouplingCut::Dropoff { select } => {
            if order.couple_target.is_none() {
                errors.push(OrderError::PostCutWithoutCoupleTarget);
            }
            if let CutSelector::Destination { target } = select {
                check_destination(target, &mut errors);
            }
        }
    }

    match order.wait {
        Some(WaitDirective::Duration { minutes }) if !(minutes.is_finite() && minutes > 0.0) => {
            errors.push(OrderError::InvalidWaitDuration(minutes))
        }
        Some(WaitDirective::UntilTime { hour, minute }) if hour > 23 || minute > 59 => {
            errors.push(OrderError::InvalidWaitTime { hour, minute })
        }
        _ => {}
    }

    if let Some(refuel) = &order.refuel {
        if refuel.load.trim().is_empty() {
            errors.push(OrderError::EmptyRefuelLoad);
        }
        if !(refuel.capacity > 0.0) {
            errors.push(OrderError::InvalidRefuelCapacity(refuel.capacity));
        }
        if refuel.industry_id.trim().is_empty() {
            errors.push(OrderError::EmptyRefuelIndustry);
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> WaypointOrder {
        WaypointOrder::to(Location::new("main-3", 120.0))
    }

    #[test]
    fn plain_order_is_valid() {
        assert!(validate_order(&order()).is_empty());
    }

    #[test]
    fn zero_count_rejected() {
        let o = order().uncouple(UncoupleMode::ByCount { count: 0 });
        assert_eq!(validate_order(&o), vec![OrderError::ZeroUncoupleCount]);
    }

    #[test]
    fn empty_destination_rejected() {
        let o = order().uncouple(UncoupleMode::ByDestination {
            target: DestinationMatch::Industry(" ".into()),
        });
        assert_eq!(validate_order(&o), vec![OrderError::EmptyDestinationId("industry")]);
        let o = order().uncouple(UncoupleMode::ByDestination {
            target: DestinationMatch::NoDestination,
        });
        assert!(validate_order(&o).is_empty());
    }

    #[test]
    fn post_cut_needs_couple_target() {
        let o = order().post_cut(PostCouplingCut::Pickup {
            select: CutSelector::Count { count: 2 },
        });
        assert_eq!(validate_order(&o), vec![OrderError::PostCutWithoutCoupleTarget]);
        let o = o.couple_to("hopper-12");
        assert!(validate_order(&o).is_empty());
    }

    #[test]
    fn wait_bounds() {
        let o = order().wait(WaitDirective::Duration { minutes: 0.0 });
        assert_eq!(validate_order(&o), vec![OrderError::InvalidWaitDuration(0.0)]);
        let o = order().wait(WaitDirective::UntilTime { hour: 24, minute: 0 });
        assert_eq!(
            validate_order(&o),
            vec![OrderError::InvalidWaitTime { hour: 24, minute: 0 }]
        );
        let o = order().wait(WaitDirective::UntilTime { hour: 23, minute: 59 });
        assert!(validate_order(&o).is_empty());
    }

    #[test]
    fn refuel_collects_every_problem() {
        let o = order().refuel(RefuelDirective {
            load: "".into(),
            capacity: -1.0,
            industry_id: "".into(),
        });
        let errors = validate_order(&o);
        assert_eq!(errors.len(), 3);
        assert!(errors.contains(&OrderError::EmptyRefuelLoad));
        assert!(errors.contains(&OrderError::InvalidRefuelCapacity(-1.0)));
    }

    #[test]
    fn serde_defaults_fill_optional_fields() {
        let json = r#"{"location":{"segment":"s1"},"uncouple":{"mode":"by_count","count":2}}"#;
        let o: WaypointOrder = serde_json::from_str(json).unwrap();
        assert!(o.stop_at_waypoint);
        assert_eq!(o.uncouple, UncoupleMode::ByCount { count: 2 });
        assert_eq!(o.count_from, CountFrom::NearestToWaypoint);
        assert!(o.post_coupling_cut.is_none());
    }
}
