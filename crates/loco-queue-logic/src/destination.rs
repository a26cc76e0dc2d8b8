//! Car destinations and the by-destination match predicate.

use crate::consist::{Car, CarId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Where a car is billed to go. Any level may be unknown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub track: Option<String>,
    pub industry: Option<String>,
    pub area: Option<String>,
}

impl Destination {
    pub fn track(id: impl Into<String>) -> Self {
        Self {
            track: Some(id.into()),
            ..Default::default()
        }
    }

    pub fn with_industry(mut self, id: impl Into<String>) -> Self {
        self.industry = Some(id.into());
        self
    }

    pub fn with_area(mut self, id: impl Into<String>) -> Self {
        self.area = Some(id.into());
        self
    }
}

/// Host lookup of a car's current destination.
pub trait DestinationResolver {
    fn destination_of(&self, car: &Car) -> Option<Destination>;
}

/// Which cars count as "matching" for a by-destination cut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum DestinationMatch {
    /// Cars with no destination at all.
    NoDestination,
    Track(String),
    Industry(String),
    Area(String),
}

impl DestinationMatch {
    pub fn matches(&self, destination: Option<&Destination>) -> bool {
        match (self, destination) {
            (DestinationMatch::NoDestination, d) => d.is_none(),
            (_, None) => false,
            (DestinationMatch::Track(id), Some(d)) => d.track.as_deref() == Some(id.as_str()),
            (DestinationMatch::Industry(id), Some(d)) => d.industry.as_deref() == Some(id.as_str()),
            (DestinationMatch::Area(id), Some(d)) => d.area.as_deref() == Some(id.as_str()),
        }
    }

    /// The identifier a match targets; `None` for [`DestinationMatch::NoDestination`].
    pub fn target_id(&self) -> Option<&str> {
        match self {
            DestinationMatch::NoDestination => None,
            DestinationMatch::Track(id)
            | DestinationMatch::Industry(id)
            | DestinationMatch::Area(id) => Some(id.as_str()),
        }
    }
}

impl fmt::Display for DestinationMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DestinationMatch::NoDestination => write!(f, "cars without destination"),
            DestinationMatch::Track(id) => write!(f, "track {id}"),
            DestinationMatch::Industry(id) => write!(f, "industry {id}"),
            DestinationMatch::Area(id) => write!(f, "area {id}"),
        }
    }
}

/// Car → destination table, for hosts that keep waybills as plain data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DestinationTable {
    destinations: HashMap<CarId, Destination>,
}

impl DestinationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, car: impl Into<CarId>, destination: Destination) {
        self.destinations.insert(car.into(), destination);
    }

    pub fn clear(&mut self, car: &CarId) {
        self.destinations.remove(car);
    }
}

impl DestinationResolver for DestinationTable {
    fn destination_of(&self, car: &Car) -> Option<Destination> {
        self.destinations.get(&car.id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_destination_matches_only_unbilled() {
        let m = DestinationMatch::NoDestination;
        assert!(m.matches(None));
        assert!(!m.matches(Some(&Destination::track("t1"))));
    }

    #[test]
    fn test_levels_match_independently() {
        let d = Destination::track("t1").with_industry("mill").with_area("east");
        assert!(DestinationMatch::Track("t1".into()).matches(Some(&d)));
        assert!(DestinationMatch::Industry("mill".into()).matches(Some(&d)));
        assert!(DestinationMatch::Area("east".into()).matches(Some(&d)));
        assert!(!DestinationMatch::Track("t2".into()).matches(Some(&d)));
        assert!(!DestinationMatch::Area("east".into()).matches(None));
    }

    #[test]
    fn test_serde_shape() {
        let json = serde_json::to_string(&DestinationMatch::Industry("mill".into())).unwrap();
        assert_eq!(json, r#"{"kind":"industry","id":"mill"}"#);
        let back: DestinationMatch = serde_json::from_str(r#"{"kind":"no_destination"}"#).unwrap();
        assert_eq!(back, DestinationMatch::NoDestination);
    }
}
