//! Named route templates and locomotive route assignments.
//!
//! The scheduler only reads from this registry. Orders are instantiated from
//! a template by deep copy, so editing a queue never edits its route.

use loco_queue_logic::{CarId, WaypointOrder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A named, ordered list of waypoint templates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub name: String,
    pub orders: Vec<WaypointOrder>,
}

impl RouteDefinition {
    pub fn new(name: impl Into<String>, orders: Vec<WaypointOrder>) -> Self {
        Self {
            name: name.into(),
            orders,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteAssignment {
    pub route: String,
    /// Re-populate the queue from the route whenever it runs dry.
    pub looping: bool,
}

#[derive(Debug, Clone, Default)]
pub struct RouteRegistry {
    routes: BTreeMap<String, RouteDefinition>,
    assignments: BTreeMap<CarId, RouteAssignment>,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a route. Returns the previous definition.
    pub fn define(&mut self, route: RouteDefinition) -> Option<RouteDefinition> {
        self.routes.insert(route.name.clone(), route)
    }

    pub fn route(&self, name: &str) -> Option<&RouteDefinition> {
        self.routes.get(name)
    }

    pub fn route_names(&self) -> impl Iterator<Item = &str> {
        self.routes.keys().map(String::as_str)
    }

    pub fn assign(&mut self, locomotive: CarId, assignment: RouteAssignment) {
        self.assignments.insert(locomotive, assignment);
    }

    pub fn unassign(&mut self, locomotive: &CarId) -> Option<RouteAssignment> {
        self.assignments.remove(locomotive)
    }

    pub fn assignment(&self, locomotive: &CarId) -> Option<&RouteAssignment> {
        self.assignments.get(locomotive)
    }

    /// The route to re-populate from, if the locomotive loops one.
    pub fn looping_route_for(&self, locomotive: &CarId) -> Option<&RouteDefinition> {
        self.assignments
            .get(locomotive)
            .filter(|a| a.looping)
            .and_then(|a| self.routes.get(&a.route))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loco_queue_logic::Location;

    #[test]
    fn test_only_looping_assignments_repopulate() {
        let mut routes = RouteRegistry::new();
        routes.define(RouteDefinition::new(
            "shuttle",
            vec![WaypointOrder::to(Location::new("a", 0.0))],
        ));
        let loco = CarId::new("L1");
        routes.assign(
            loco.clone(),
            RouteAssignment {
                route: "shuttle".into(),
                looping: false,
            },
        );
        assert!(routes.looping_route_for(&loco).is_none());
        routes.assign(
            loco.clone(),
            RouteAssignment {
                route: "shuttle".into(),
                looping: true,
            },
        );
        assert_eq!(routes.looping_route_for(&loco).map(|r| r.orders.len()), Some(1));
    }

    #[test]
    fn test_dangling_assignment_is_ignored() {
        let mut routes = RouteRegistry::new();
        let loco = CarId::new("L1");
        routes.assign(
            loco.clone(),
            RouteAssignment {
                route: "missing".into(),
                looping: true,
            },
        );
        assert!(routes.looping_route_for(&loco).is_none());
    }
}
