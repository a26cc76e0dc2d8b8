//! Consist model: cars, logical ends, and materialized traversal order.
//!
//! A consist is the connected sequence of cars coupled to a locomotive. The
//! host owns the live coupling links and exposes them through [`Coupling`];
//! every algorithm in this crate runs on a [`Consist`] snapshot taken from it,
//! never on the live links.
//!
//! Logical ends are consist-relative: walking out of the `B` end of any car
//! reaches the next car, whose `A` end faces back. Physical orientation of a
//! car body is the host's concern.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Unique car identity as the host reports it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarId(pub String);

impl CarId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CarId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for CarId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One of the two logical connection points of a car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum End {
    A,
    B,
}

impl End {
    pub fn opposite(self) -> Self {
        match self {
            End::A => End::B,
            End::B => End::A,
        }
    }
}

/// What kind of rolling stock a car is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    #[default]
    Ordinary,
    Locomotive,
    Tender,
}

impl Archetype {
    /// Locomotives and tenders both count as motive power.
    pub fn is_motive_power(self) -> bool {
        !matches!(self, Archetype::Ordinary)
    }
}

/// A single car as seen by the cut engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub id: CarId,
    /// Display name (reporting mark and number), used by free-text lookup.
    pub name: String,
    pub archetype: Archetype,
}

impl Car {
    pub fn new(id: impl Into<String>, archetype: Archetype) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id: CarId(id),
            archetype,
        }
    }

    pub fn ordinary(id: impl Into<String>) -> Self {
        Self::new(id, Archetype::Ordinary)
    }

    pub fn locomotive(id: impl Into<String>) -> Self {
        Self::new(id, Archetype::Locomotive)
    }

    pub fn tender(id: impl Into<String>) -> Self {
        Self::new(id, Archetype::Tender)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Read-only adjacency view over live coupling state.
pub trait Coupling {
    /// Look up a car by id.
    fn car(&self, id: &CarId) -> Option<Car>;

    /// The car coupled at `end` of `id`, if that end is not open.
    fn adjacent_car(&self, id: &CarId, end: End) -> Option<CarId>;

    /// Cars reached by starting at `start` and repeatedly leaving through
    /// `end`. The starting car comes first.
    ///
    /// Stops at an open end, an unknown car, or a repeated car, so a
    /// corrupted link table can never loop forever.
    fn walk(&self, start: &CarId, end: End) -> Consist {
        let mut cars = Vec::new();
        let mut seen = HashSet::new();
        let mut current = Some(start.clone());
        while let Some(id) = current {
            if !seen.insert(id.clone()) {
                break;
            }
            let Some(car) = self.car(&id) else {
                break;
            };
            current = self.adjacent_car(&id, end);
            cars.push(car);
        }
        Consist::new(cars)
    }

    /// The whole consist containing `car`, ordered from its extreme car on
    /// the `end` side toward the opposite side.
    fn enumerate_from(&self, car: &CarId, end: End) -> Consist {
        let toward_end = self.walk(car, end);
        match toward_end.last() {
            Some(extreme) => {
                let extreme = extreme.id.clone();
                self.walk(&extreme, end.opposite())
            }
            None => Consist::default(),
        }
    }
}

/// Motive-power lookup supplied by the host.
pub trait MotivePower {
    fn is_motive_power(&self, car: &Car) -> bool {
        car.archetype.is_motive_power()
    }

    /// The tender permanently paired with `locomotive`, if any.
    fn paired_tender(&self, locomotive: &Car) -> Option<CarId>;

    /// The other half of a locomotive/tender pair, searching `consist` for
    /// the locomotive when `car` is a tender.
    fn pair_of(&self, car: &Car, consist: &Consist) -> Option<CarId> {
        match car.archetype {
            Archetype::Locomotive => self.paired_tender(car),
            Archetype::Tender => consist
                .iter()
                .filter(|c| c.archetype == Archetype::Locomotive)
                .find(|loco| self.paired_tender(loco).as_ref() == Some(&car.id))
                .map(|loco| loco.id.clone()),
            Archetype::Ordinary => None,
        }
    }
}

/// Locomotive → tender table, for hosts that keep pairs as plain data.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenderPairs {
    pairs: HashMap<CarId, CarId>,
}

impl TenderPairs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pair(&mut self, locomotive: impl Into<CarId>, tender: impl Into<CarId>) {
        self.pairs.insert(locomotive.into(), tender.into());
    }
}

impl MotivePower for TenderPairs {
    fn paired_tender(&self, locomotive: &Car) -> Option<CarId> {
        self.pairs.get(&locomotive.id).cloned()
    }
}

/// A materialized, immutable traversal order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Consist {
    cars: Vec<Car>,
}

impl Consist {
    pub fn new(cars: Vec<Car>) -> Self {
        Self { cars }
    }

    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Car> {
        self.cars.iter()
    }

    pub fn len(&self) -> usize {
        self.cars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }

    pub fn first(&self) -> Option<&Car> {
        self.cars.first()
    }

    pub fn last(&self) -> Option<&Car> {
        self.cars.last()
    }

    pub fn get(&self, index: usize) -> Option<&Car> {
        self.cars.get(index)
    }

    pub fn index_of(&self, id: &CarId) -> Option<usize> {
        self.cars.iter().position(|c| &c.id == id)
    }

    pub fn contains(&self, id: &CarId) -> bool {
        self.index_of(id).is_some()
    }

    /// Same cars, opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            cars: self.cars.iter().rev().cloned().collect(),
        }
    }

    pub fn ids(&self) -> Vec<CarId> {
        self.cars.iter().map(|c| c.id.clone()).collect()
    }

    pub fn into_cars(self) -> Vec<Car> {
        self.cars
    }
}

impl FromIterator<Car> for Consist {
    fn from_iter<I: IntoIterator<Item = Car>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Consist {
    type Item = &'a Car;
    type IntoIter = std::slice::Iter<'a, Car>;

    fn into_iter(self) -> Self::IntoIter {
        self.cars.iter()
    }
}

/// A snapshot is itself a coupling view: `A` is toward the first car.
impl Coupling for Consist {
    fn car(&self, id: &CarId) -> Option<Car> {
        self.cars.iter().find(|c| &c.id == id).cloned()
    }

    fn adjacent_car(&self, id: &CarId, end: End) -> Option<CarId> {
        let index = self.index_of(id)?;
        let neighbor = match end {
            End::A => index.checked_sub(1)?,
            End::B => index + 1,
        };
        self.cars.get(neighbor).map(|c| c.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> Consist {
        (0..n).map(|i| Car::ordinary(i.to_string())).collect()
    }

    #[test]
    fn test_opposite_end() {
        assert_eq!(End::A.opposite(), End::B);
        assert_eq!(End::B.opposite(), End::A);
    }

    #[test]
    fn test_adjacent_in_snapshot() {
        let consist = numbered(3);
        assert_eq!(consist.adjacent_car(&"0".into(), End::A), None);
        assert_eq!(consist.adjacent_car(&"0".into(), End::B), Some("1".into()));
        assert_eq!(consist.adjacent_car(&"2".into(), End::A), Some("1".into()));
        assert_eq!(consist.adjacent_car(&"2".into(), End::B), None);
    }

    #[test]
    fn test_walk_starts_at_car() {
        let consist = numbered(5);
        let walked = consist.walk(&"2".into(), End::B);
        assert_eq!(walked.ids(), [CarId::from("2"), "3".into(), "4".into()]);
        let back = consist.walk(&"2".into(), End::A);
        assert_eq!(back.ids(), [CarId::from("2"), "1".into(), "0".into()]);
    }

    #[test]
    fn test_enumerate_from_either_end() {
        let consist = numbered(4);
        let from_a = consist.enumerate_from(&"2".into(), End::A);
        assert_eq!(from_a, consist);
        let from_b = consist.enumerate_from(&"1".into(), End::B);
        assert_eq!(from_b, consist.reversed());
    }

    #[test]
    fn test_enumerate_unknown_car_is_empty() {
        let consist = numbered(4);
        assert!(consist.enumerate_from(&"99".into(), End::A).is_empty());
    }

    #[test]
    fn test_pair_of_tender_searches_consist() {
        let mut pairs = TenderPairs::new();
        pairs.pair("L1", "T1");
        let consist = Consist::new(vec![Car::locomotive("L1"), Car::tender("T1")]);
        let tender = consist.cars()[1].clone();
        assert_eq!(pairs.pair_of(&tender, &consist), Some("L1".into()));
        let loco = consist.cars()[0].clone();
        assert_eq!(pairs.pair_of(&loco, &consist), Some("T1".into()));
    }
}
