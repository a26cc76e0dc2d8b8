//! Reference yard - an ECS railyard implementing every host collaborator
//!
//! Cars are `hecs` entities. Coupler links are stored as entity handles and
//! mutated for real on uncouple and on coupling at the end of a move, so
//! scheduler runs against a `Yard` exercise complete cuts.

mod components;

pub use components::*;

use crate::collaborators::{MovementDriver, PhysicalEffects, Refueling, SimClock};
use hecs::{Entity, World};
use loco_queue_logic::{
    Car, CarId, Coupling, CutError, Destination, DestinationResolver, End, Location, MotivePower,
    RefuelDirective,
};
use std::collections::{HashMap, HashSet};

/// In-memory railyard
pub struct Yard {
    /// ECS world containing all car entities
    pub world: World,
    cars: HashMap<CarId, Entity>,
    industries: HashMap<String, FuelSource>,
    /// Sim time in seconds
    pub clock: f64,
    /// Seconds every move order takes
    pub travel_time: f32,
    pub cruise_speed: f32,
    /// Speed reported for one step after arriving
    pub coast_speed: f32,
}

impl Default for Yard {
    fn default() -> Self {
        Self::new()
    }
}

impl Yard {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            cars: HashMap::new(),
            industries: HashMap::new(),
            clock: 0.0,
            travel_time: 2.0,
            cruise_speed: 8.0,
            coast_speed: 0.5,
        }
    }

    /// Spawn a car. Locomotives also get a driver and a fuel tank.
    pub fn add_car(&mut self, car: Car) -> Entity {
        let id = car.id.clone();
        let is_locomotive = matches!(car.archetype, loco_queue_logic::Archetype::Locomotive);
        let entity = self
            .world
            .spawn((CarInfo(car), Couplers::default(), Brakes::default()));
        if is_locomotive {
            let _ = self
                .world
                .insert(entity, (Driver::default(), FuelTank::default()));
        }
        self.cars.insert(id, entity);
        entity
    }

    /// Spawn cars coupled in A→B order.
    pub fn add_consist(&mut self, cars: Vec<Car>) -> Vec<Entity> {
        let entities: Vec<Entity> = cars.into_iter().map(|car| self.add_car(car)).collect();
        for pair in entities.windows(2) {
            self.link(pair[0], End::B, pair[1]);
        }
        entities
    }

    pub fn entity(&self, car: &CarId) -> Option<Entity> {
        self.cars.get(car).copied()
    }

    fn car_id(&self, entity: Entity) -> Option<CarId> {
        self.world
            .get::<&CarInfo>(entity)
            .ok()
            .map(|info| info.0.id.clone())
    }

    fn couplers(&self, entity: Entity) -> Couplers {
        self.world
            .get::<&Couplers>(entity)
            .map(|c| *c)
            .unwrap_or_default()
    }

    /// Join `end` of `from` to the facing end of `to`.
    fn link(&mut self, from: Entity, end: End, to: Entity) {
        if let Ok(mut c) = self.world.get::<&mut Couplers>(from) {
            c.set(end, Some(to));
        }
        if let Ok(mut c) = self.world.get::<&mut Couplers>(to) {
            c.set(end.opposite(), Some(from));
        }
    }

    /// Last car reached leaving `start` through `end`.
    fn extreme(&self, start: Entity, end: End) -> Entity {
        let mut seen = HashSet::from([start]);
        let mut current = start;
        while let Some(next) = self.couplers(current).get(end) {
            if !seen.insert(next) {
                break;
            }
            current = next;
        }
        current
    }

    /// Every entity coupled to `start`, including `start`.
    fn string_of(&self, start: Entity) -> Vec<Entity> {
        let first = self.extreme(start, End::A);
        let mut seen = HashSet::from([first]);
        let mut string = vec![first];
        let mut current = first;
        while let Some(next) = self.couplers(current).get(End::B) {
            if !seen.insert(next) {
                break;
            }
            string.push(next);
            current = next;
        }
        string
    }

    pub fn pair_tender(&mut self, locomotive: &CarId, tender: &CarId) {
        if let (Some(loco), Some(tender)) = (self.entity(locomotive), self.entity(tender)) {
            let _ = self.world.insert_one(loco, PairedTender(tender));
        }
    }

    pub fn set_destination(&mut self, car: &CarId, destination: Destination) {
        if let Some(entity) = self.entity(car) {
            let _ = self.world.insert_one(entity, DestinationTag(destination));
        }
    }

    pub fn set_leading_end(&mut self, locomotive: &CarId, end: End) {
        if let Some(entity) = self.entity(locomotive) {
            if let Ok(mut driver) = self.world.get::<&mut Driver>(entity) {
                driver.leading_end = end;
            }
        }
    }

    pub fn add_fuel_source(&mut self, industry: impl Into<String>, source: FuelSource) {
        self.industries.insert(industry.into(), source);
    }

    pub fn fuel_stock(&self, industry: &str) -> Option<f32> {
        self.industries.get(industry).map(|s| s.stock)
    }

    pub fn fuel_level(&self, locomotive: &CarId) -> f32 {
        self.entity(locomotive)
            .and_then(|e| self.world.get::<&FuelTank>(e).ok().map(|t| t.quantity))
            .unwrap_or(0.0)
    }

    /// Where the locomotive last arrived, if it has moved at all.
    pub fn position(&self, locomotive: &CarId) -> Option<Location> {
        self.entity(locomotive)
            .and_then(|e| self.world.get::<&Driver>(e).ok()?.location.clone())
    }

    pub fn brakes(&self, car: &CarId) -> Brakes {
        self.entity(car)
            .and_then(|e| self.world.get::<&Brakes>(e).ok().map(|b| *b))
            .unwrap_or_default()
    }

    /// Car ids of the consist containing `car`, from end A.
    pub fn consist_ids(&self, car: &CarId) -> Vec<String> {
        self.enumerate_from(car, End::A)
            .iter()
            .map(|c| c.id.to_string())
            .collect()
    }

    /// Advance yard time: moves, arrivals with coupling, and refueling.
    pub fn advance(&mut self, delta_seconds: f32) {
        self.clock += f64::from(delta_seconds);

        // Drivers with no order come to rest.
        let idle: Vec<Entity> = self
            .world
            .query::<(&Driver, Option<&MoveOrder>)>()
            .iter()
            .filter(|(_, (_, order))| order.is_none())
            .map(|(entity, _)| entity)
            .collect();
        for entity in idle {
            if let Ok(mut driver) = self.world.get::<&mut Driver>(entity) {
                driver.velocity = 0.0;
            }
        }

        // Collect updates (can't mutate while iterating)
        let moving: Vec<(Entity, MoveOrder)> = self
            .world
            .query::<&MoveOrder>()
            .iter()
            .map(|(entity, order)| (entity, order.clone()))
            .collect();
        for (entity, mut order) in moving {
            order.remaining -= delta_seconds;
            if order.remaining > 0.0 {
                if let Ok(mut driver) = self.world.get::<&mut Driver>(entity) {
                    driver.velocity = self.cruise_speed;
                }
                let _ = self.world.insert_one(entity, order);
                continue;
            }
            let _ = self.world.remove_one::<MoveOrder>(entity);
            if let Ok(mut driver) = self.world.get::<&mut Driver>(entity) {
                driver.velocity = self.coast_speed;
                driver.location = Some(order.destination.clone());
            }
            if let Some(target) = &order.couple_target {
                self.couple_on_arrival(entity, target);
            }
        }

        let filling: Vec<(Entity, String, f32, f32)> = self
            .world
            .query::<&FuelTank>()
            .iter()
            .filter_map(|(entity, tank)| {
                let industry = tank.filling_from.clone()?;
                Some((entity, industry, tank.quantity, tank.fill_to))
            })
            .collect();
        for (entity, industry, quantity, fill_to) in filling {
            let Some(source) = self.industries.get_mut(&industry) else {
                continue;
            };
            let wanted = (fill_to - quantity).max(0.0);
            let moved = wanted.min(source.rate * delta_seconds).min(source.stock);
            source.stock -= moved;
            if let Ok(mut tank) = self.world.get::<&mut FuelTank>(entity) {
                tank.quantity += moved;
            }
        }
    }

    /// Couple the leading end of the locomotive's consist to `target`.
    fn couple_on_arrival(&mut self, locomotive: Entity, target: &CarId) {
        let Some(target) = self.entity(target) else {
            return;
        };
        if self.string_of(locomotive).contains(&target) {
            return;
        }
        let lead = self
            .world
            .get::<&Driver>(locomotive)
            .map(|d| d.leading_end)
            .unwrap_or(End::A);
        let extreme = self.extreme(locomotive, lead);
        let facing = lead.opposite();
        let target_couplers = self.couplers(target);
        if target_couplers.get(facing).is_some() {
            if target_couplers.get(lead).is_some() {
                return;
            }
            // Turn the target's string so its open end faces us.
            for entity in self.string_of(target) {
                if let Ok(mut c) = self.world.get::<&mut Couplers>(entity) {
                    c.flip();
                }
            }
        }
        self.link(extreme, lead, target);
    }
}

impl Coupling for Yard {
    fn car(&self, id: &CarId) -> Option<Car> {
        let entity = self.entity(id)?;
        self.world.get::<&CarInfo>(entity).ok().map(|info| info.0.clone())
    }

    fn adjacent_car(&self, id: &CarId, end: End) -> Option<CarId> {
        let entity = self.entity(id)?;
        self.couplers(entity).get(end).and_then(|e| self.car_id(e))
    }
}

impl MotivePower for Yard {
    fn paired_tender(&self, locomotive: &Car) -> Option<CarId> {
        let entity = self.entity(&locomotive.id)?;
        let tender = self.world.get::<&PairedTender>(entity).ok().map(|p| p.0)?;
        self.car_id(tender)
    }
}

impl DestinationResolver for Yard {
    fn destination_of(&self, car: &Car) -> Option<Destination> {
        let entity = self.entity(&car.id)?;
        self.world
            .get::<&DestinationTag>(entity)
            .ok()
            .map(|tag| tag.0.clone())
    }
}

impl PhysicalEffects for Yard {
    fn uncouple(&mut self, car: &CarId, end: End) -> Result<(), CutError> {
        let open = || CutError::NoAdjacentCar {
            car: car.clone(),
            end,
        };
        let entity = self.entity(car).ok_or_else(open)?;
        let neighbor = self.couplers(entity).get(end).ok_or_else(open)?;
        if let Ok(mut c) = self.world.get::<&mut Couplers>(entity) {
            c.set(end, None);
        }
        if let Ok(mut c) = self.world.get::<&mut Couplers>(neighbor) {
            if c.a == Some(entity) {
                c.a = None;
            }
            if c.b == Some(entity) {
                c.b = None;
            }
        }
        Ok(())
    }

    fn set_handbrakes(&mut self, cars: &[CarId], applied: bool) {
        for car in cars {
            if let Some(entity) = self.entity(car) {
                if let Ok(mut brakes) = self.world.get::<&mut Brakes>(entity) {
                    brakes.handbrake = applied;
                }
            }
        }
    }

    fn connect_air(&mut self, cars: &[CarId]) {
        for car in cars {
            if let Some(entity) = self.entity(car) {
                if let Ok(mut brakes) = self.world.get::<&mut Brakes>(entity) {
                    brakes.air_connected = true;
                }
            }
        }
    }

    fn bleed_air(&mut self, cars: &[CarId]) {
        for car in cars {
            if let Some(entity) = self.entity(car) {
                if let Ok(mut brakes) = self.world.get::<&mut Brakes>(entity) {
                    brakes.air_connected = false;
                }
            }
        }
    }
}

impl MovementDriver for Yard {
    fn send_to(&mut self, locomotive: &CarId, location: &Location, couple_target: Option<&CarId>) {
        if let Some(entity) = self.entity(locomotive) {
            let order = MoveOrder {
                destination: location.clone(),
                couple_target: couple_target.cloned(),
                remaining: self.travel_time,
            };
            let _ = self.world.insert_one(entity, order);
        }
    }

    fn has_active_order(&self, locomotive: &CarId) -> bool {
        self.entity(locomotive)
            .is_some_and(|e| self.world.get::<&MoveOrder>(e).is_ok())
    }

    fn velocity(&self, locomotive: &CarId) -> f32 {
        self.entity(locomotive)
            .and_then(|e| self.world.get::<&Driver>(e).ok().map(|d| d.velocity))
            .unwrap_or(0.0)
    }

    fn cancel_order(&mut self, locomotive: &CarId) {
        if let Some(entity) = self.entity(locomotive) {
            let _ = self.world.remove_one::<MoveOrder>(entity);
        }
    }

    fn nearest_end(&self, locomotive: &CarId, _location: &Location) -> End {
        self.entity(locomotive)
            .and_then(|e| self.world.get::<&Driver>(e).ok().map(|d| d.leading_end))
            .unwrap_or(End::A)
    }
}

impl Refueling for Yard {
    fn start_refuel(&mut self, locomotive: &CarId, directive: &RefuelDirective) {
        if let Some(entity) = self.entity(locomotive) {
            if let Ok(mut tank) = self.world.get::<&mut FuelTank>(entity) {
                tank.filling_from = Some(directive.industry_id.clone());
                tank.fill_to = directive.capacity;
            }
        }
    }

    fn refuel_finished(&self, locomotive: &CarId, directive: &RefuelDirective) -> bool {
        if self.fuel_level(locomotive) >= directive.capacity {
            return true;
        }
        self.industries
            .get(&directive.industry_id)
            .map_or(true, |s| s.load != directive.load || s.stock <= 0.0)
    }

    fn stop_refuel(&mut self, locomotive: &CarId) {
        if let Some(entity) = self.entity(locomotive) {
            if let Ok(mut tank) = self.world.get::<&mut FuelTank>(entity) {
                tank.filling_from = None;
            }
        }
    }
}

impl SimClock for Yard {
    fn now(&self) -> f64 {
        self.clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yard_with(ids: &[&str]) -> Yard {
        let mut yard = Yard::new();
        let cars = ids
            .iter()
            .map(|id| {
                if id.starts_with('L') {
                    Car::locomotive(*id)
                } else {
                    Car::ordinary(*id)
                }
            })
            .collect();
        yard.add_consist(cars);
        yard
    }

    #[test]
    fn test_consist_walks_from_either_end() {
        let yard = yard_with(&["L1", "c1", "c2"]);
        assert_eq!(yard.consist_ids(&CarId::new("c2")), vec!["L1", "c1", "c2"]);
        let from_b = yard.enumerate_from(&CarId::new("L1"), End::B);
        assert_eq!(from_b.first().map(|c| c.id.as_str()), Some("c2"));
    }

    #[test]
    fn test_uncouple_splits_links() {
        let mut yard = yard_with(&["L1", "c1", "c2"]);
        yard.uncouple(&CarId::new("c1"), End::B).unwrap();
        assert_eq!(yard.consist_ids(&CarId::new("L1")), vec!["L1", "c1"]);
        assert_eq!(yard.consist_ids(&CarId::new("c2")), vec!["c2"]);
        assert_eq!(
            yard.uncouple(&CarId::new("c1"), End::B),
            Err(CutError::NoAdjacentCar {
                car: CarId::new("c1"),
                end: End::B,
            })
        );
    }

    #[test]
    fn test_arrival_couples_and_reorients() {
        let mut yard = yard_with(&["L1", "c1"]);
        // x1's open end is A; coupling to the locomotive's A end needs B.
        yard.add_consist(vec![Car::ordinary("x1"), Car::ordinary("x2")]);
        yard.set_leading_end(&CarId::new("L1"), End::A);
        yard.send_to(&CarId::new("L1"), &Location::new("spur", 0.0), Some(&CarId::new("x1")));
        assert!(yard.has_active_order(&CarId::new("L1")));
        assert_eq!(yard.position(&CarId::new("L1")), None);
        yard.advance(5.0);
        assert_eq!(yard.position(&CarId::new("L1")), Some(Location::new("spur", 0.0)));
        assert!(!yard.has_active_order(&CarId::new("L1")));
        assert!(yard.velocity(&CarId::new("L1")) > 0.0);
        assert_eq!(yard.consist_ids(&CarId::new("L1")), vec!["x2", "x1", "L1", "c1"]);
        yard.advance(0.5);
        assert_eq!(yard.velocity(&CarId::new("L1")), 0.0);
    }

    #[test]
    fn test_refuel_stops_when_full_or_empty() {
        let mut yard = yard_with(&["L1"]);
        yard.add_fuel_source(
            "fuel-stand",
            FuelSource {
                load: "diesel".into(),
                stock: 150.0,
                rate: 100.0,
            },
        );
        let directive = RefuelDirective {
            load: "diesel".into(),
            capacity: 400.0,
            industry_id: "fuel-stand".into(),
        };
        let loco = CarId::new("L1");
        yard.start_refuel(&loco, &directive);
        yard.advance(1.0);
        assert!(!yard.refuel_finished(&loco, &directive));
        yard.advance(1.0);
        assert_eq!(yard.fuel_level(&loco), 150.0);
        assert!(yard.refuel_finished(&loco, &directive));
    }

    #[test]
    fn test_tender_pairing() {
        let mut yard = Yard::new();
        yard.add_consist(vec![Car::locomotive("L1"), Car::tender("T1")]);
        yard.pair_tender(&CarId::new("L1"), &CarId::new("T1"));
        let loco = yard.car(&CarId::new("L1")).unwrap();
        assert_eq!(yard.paired_tender(&loco), Some(CarId::new("T1")));
    }
}
