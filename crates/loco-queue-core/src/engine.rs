//! Waypoint scheduler - the tick orchestrator for every locomotive queue

use crate::collaborators::{MovementDriver, Railyard, Refueling};
use crate::config::SchedulerConfig;
use crate::queue::{OrderPhase, QueueError, QueueState, QueueStatus, Removed};
use crate::registry::{QueueEvent, QueueRegistry, SubscriberId};
use crate::resolution::{resolve_coupling, resolve_uncoupling};
use crate::routes::{RouteAssignment, RouteDefinition, RouteRegistry};
use log::{debug, info, warn};
use loco_queue_logic::waypoint::validate_order;
use loco_queue_logic::{CarId, CutError, OrderError, OrderId, WaitDirective, WaypointOrder};
use thiserror::Error;

/// Operator command failure.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CommandError {
    #[error("locomotive {0} has no queue")]
    UnknownLocomotive(CarId),
    #[error("locomotive {locomotive} has no order {order}")]
    UnknownOrder { locomotive: CarId, order: OrderId },
    #[error("no route named '{0}'")]
    UnknownRoute(String),
    #[error("order {0} is in flight and cannot be moved")]
    OrderInFlight(OrderId),
    #[error("invalid order: {}", join_errors(.0))]
    InvalidOrder(Vec<OrderError>),
}

fn join_errors(errors: &[OrderError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Outcome of one pass over a locomotive's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    /// Waiting on the yard; nothing more this tick.
    Suspend,
    /// An order was dispatched or resolved; evaluate again.
    Continue,
    /// Nothing in flight and nothing pending.
    Exhausted,
}

/// Sim time at which a wait ends.
///
/// Time-of-day waits whose time already passed today resume tomorrow.
pub fn resume_time(wait: &WaitDirective, now: f64, seconds_per_day: f64) -> f64 {
    match *wait {
        WaitDirective::Duration { minutes } => now + minutes * 60.0,
        WaitDirective::UntilTime { hour, minute } => {
            let fraction = (f64::from(hour) * 3600.0 + f64::from(minute) * 60.0) / 86_400.0;
            let target = fraction * seconds_per_day;
            let day_start = (now / seconds_per_day).floor() * seconds_per_day;
            if day_start + target >= now {
                day_start + target
            } else {
                day_start + seconds_per_day + target
            }
        }
    }
}

/// Advance one locomotive's in-flight order as far as the yard allows.
fn advance<Y>(
    state: &mut QueueState,
    yard: &mut Y,
    config: &SchedulerConfig,
    events: &mut Vec<QueueEvent>,
) -> Result<Step, CutError>
where
    Y: Railyard + ?Sized,
{
    let locomotive = state.locomotive.clone();

    if state.in_flight().is_none() {
        let Some(flight) = state.dispatch_next() else {
            return Ok(Step::Exhausted);
        };
        let order = &flight.order;
        info!("{locomotive}: dispatching order {} to {}", order.id, order.location);
        yard.send_to(&locomotive, &order.location, order.couple_target.as_ref());
        events.push(QueueEvent::OrderDispatched {
            locomotive: locomotive.clone(),
            order: order.id,
        });
        return Ok(Step::Continue);
    }
    let Some(flight) = state.in_flight_mut() else {
        return Ok(Step::Exhausted);
    };

    // T0: travel
    if yard.has_active_order(&locomotive) {
        if flight.phase == OrderPhase::Sending {
            flight.phase = OrderPhase::Traveling;
        }
        return Ok(Step::Suspend);
    }

    if !flight.order.stop_at_waypoint {
        debug!("{locomotive}: rolling through order {}", flight.order.id);
        flight.phase = OrderPhase::Resolving;
        resolve_uncoupling(yard, &locomotive, &flight.order)?;
        finish(state, events);
        return Ok(Step::Continue);
    }

    if yard.velocity(&locomotive).abs() > config.stopped_speed_threshold {
        return Ok(Step::Suspend);
    }

    // T1: wait
    if let Some(wait) = flight.order.wait.clone() {
        if !flight.waited {
            match flight.phase {
                OrderPhase::Waiting { resume_at } => {
                    if yard.now() < resume_at {
                        return Ok(Step::Suspend);
                    }
                    flight.waited = true;
                    info!("{locomotive}: wait for order {} finished", flight.order.id);
                }
                _ => {
                    let resume_at = resume_time(&wait, yard.now(), config.seconds_per_day);
                    flight.phase = OrderPhase::Waiting { resume_at };
                    info!("{locomotive}: waiting until t={resume_at:.0}s");
                    return Ok(Step::Suspend);
                }
            }
        }
    }

    // T2: refuel
    if let Some(refuel) = flight.order.refuel.clone() {
        if !flight.refueled {
            if flight.phase != OrderPhase::Refueling {
                yard.start_refuel(&locomotive, &refuel);
                flight.phase = OrderPhase::Refueling;
                info!("{locomotive}: refueling {} from {}", refuel.load, refuel.industry_id);
                return Ok(Step::Suspend);
            }
            if !yard.refuel_finished(&locomotive, &refuel) {
                return Ok(Step::Suspend);
            }
            yard.stop_refuel(&locomotive);
            flight.refueled = true;
            info!("{locomotive}: refueling finished");
        }
    }

    // T3: couple, then uncouple
    flight.phase = OrderPhase::Resolving;
    resolve_coupling(yard, &locomotive, &flight.order)?;
    resolve_uncoupling(yard, &locomotive, &flight.order)?;
    finish(state, events);
    Ok(Step::Continue)
}

fn finish(state: &mut QueueState, events: &mut Vec<QueueEvent>) {
    if let Some(order) = state.finish() {
        info!("{}: order {} resolved", state.locomotive, order.id);
        events.push(QueueEvent::OrderResolved {
            locomotive: state.locomotive.clone(),
            order: order.id,
        });
    }
}

/// Owns every locomotive queue and drives them from a periodic tick.
///
/// Operator commands and ticks both take `&mut self`, so they are serialized
/// on whatever thread owns the scheduler.
#[derive(Debug)]
pub struct WaypointScheduler {
    pub config: SchedulerConfig,
    queues: QueueRegistry,
    routes: RouteRegistry,
    /// Time fed through `update`, in seconds.
    pub elapsed: f64,
    last_tick: f64,
    ticks: u64,
}

impl Default for WaypointScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl WaypointScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            queues: QueueRegistry::new(),
            routes: RouteRegistry::new(),
            elapsed: 0.0,
            last_tick: 0.0,
            ticks: 0,
        }
    }

    pub fn queues(&self) -> &QueueRegistry {
        &self.queues
    }

    pub fn routes(&self) -> &RouteRegistry {
        &self.routes
    }

    pub fn routes_mut(&mut self) -> &mut RouteRegistry {
        &mut self.routes
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriberId
    where
        F: FnMut(&QueueEvent) + 'static,
    {
        self.queues.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        self.queues.unsubscribe(id)
    }

    /// Feed elapsed time; ticks once the configured interval has passed.
    /// Returns whether a tick ran.
    pub fn update<Y>(&mut self, yard: &mut Y, delta_seconds: f64) -> bool
    where
        Y: Railyard + ?Sized,
    {
        self.elapsed += delta_seconds;
        if self.elapsed - self.last_tick >= self.config.tick_interval_secs {
            self.tick(yard);
            self.last_tick = self.elapsed;
            return true;
        }
        false
    }

    /// Visit every queue once, in locomotive order.
    pub fn tick<Y>(&mut self, yard: &mut Y)
    where
        Y: Railyard + ?Sized,
    {
        let mut events = Vec::new();
        for locomotive in self.queues.locomotives() {
            self.tick_locomotive(yard, &locomotive, &mut events);
        }
        self.ticks += 1;
        self.queues.publish_all(&events);
    }

    fn tick_locomotive<Y>(&mut self, yard: &mut Y, locomotive: &CarId, events: &mut Vec<QueueEvent>)
    where
        Y: Railyard + ?Sized,
    {
        for _ in 0..self.config.max_orders_per_tick {
            let Some(state) = self.queues.get_mut(locomotive) else {
                return;
            };
            if state.is_paused() {
                return;
            }
            match advance(state, yard, &self.config, events) {
                Ok(Step::Suspend) => return,
                Ok(Step::Continue) => {}
                Ok(Step::Exhausted) => {
                    if !self.repopulate(locomotive, events) {
                        self.queues.remove(locomotive);
                        info!("{locomotive}: queue exhausted");
                        events.push(QueueEvent::QueueRemoved {
                            locomotive: locomotive.clone(),
                        });
                        return;
                    }
                }
                Err(source) => {
                    self.fail(locomotive, source, events);
                    return;
                }
            }
        }
        debug!("{locomotive}: order limit reached for this tick");
    }

    /// Refill an exhausted queue from its looping route.
    fn repopulate(&mut self, locomotive: &CarId, events: &mut Vec<QueueEvent>) -> bool {
        let Some(route) = self.routes.looping_route_for(locomotive) else {
            return false;
        };
        let orders = self.queues.instantiate(&route.orders);
        if orders.is_empty() {
            return false;
        }
        let route = route.name.clone();
        let count = orders.len();
        let state = self.queues.get_or_create(locomotive);
        for order in orders {
            state.push_back(order);
        }
        info!("{locomotive}: re-populated {count} orders from route '{route}'");
        events.push(QueueEvent::RouteRepopulated {
            locomotive: locomotive.clone(),
            route,
            orders: count,
        });
        true
    }

    fn fail(&mut self, locomotive: &CarId, source: CutError, events: &mut Vec<QueueEvent>) {
        let Some(state) = self.queues.get_mut(locomotive) else {
            return;
        };
        let order = state.in_flight().map(|f| f.order.id).unwrap_or_default();
        let error = QueueError {
            locomotive: locomotive.clone(),
            order,
            source,
        };
        warn!("{error}; queue paused");
        state.fail(error.clone());
        events.push(QueueEvent::OrderFailed { error });
    }

    fn prepare(&mut self, mut order: WaypointOrder) -> Result<WaypointOrder, CommandError> {
        let errors = validate_order(&order);
        if !errors.is_empty() {
            return Err(CommandError::InvalidOrder(errors));
        }
        order.id = self.queues.next_order_id();
        Ok(order)
    }

    fn changed(&mut self, locomotive: &CarId) {
        self.queues.publish(&QueueEvent::QueueChanged {
            locomotive: locomotive.clone(),
        });
    }

    /// Append an order, creating the queue if needed.
    pub fn enqueue(
        &mut self,
        locomotive: &CarId,
        order: WaypointOrder,
    ) -> Result<OrderId, CommandError> {
        let order = self.prepare(order)?;
        let id = order.id;
        self.queues.get_or_create(locomotive).push_back(order);
        self.changed(locomotive);
        Ok(id)
    }

    /// Insert an order at `index` in the pending list.
    pub fn insert_order(
        &mut self,
        locomotive: &CarId,
        index: usize,
        order: WaypointOrder,
    ) -> Result<OrderId, CommandError> {
        let order = self.prepare(order)?;
        let id = order.id;
        self.queues.get_or_create(locomotive).insert(index, order);
        self.changed(locomotive);
        Ok(id)
    }

    /// Reorder a pending order. The in-flight order never moves.
    pub fn move_order(
        &mut self,
        locomotive: &CarId,
        order: OrderId,
        index: usize,
    ) -> Result<(), CommandError> {
        let state = self
            .queues
            .get_mut(locomotive)
            .ok_or_else(|| CommandError::UnknownLocomotive(locomotive.clone()))?;
        if state.in_flight().is_some_and(|f| f.order.id == order) {
            return Err(CommandError::OrderInFlight(order));
        }
        if !state.move_pending(order, index) {
            return Err(CommandError::UnknownOrder {
                locomotive: locomotive.clone(),
                order,
            });
        }
        self.changed(locomotive);
        Ok(())
    }

    /// Delete an order. Deleting the in-flight order cancels the move and
    /// any refuel, and un-pauses the queue.
    pub fn remove_order<Y>(
        &mut self,
        yard: &mut Y,
        locomotive: &CarId,
        order: OrderId,
    ) -> Result<WaypointOrder, CommandError>
    where
        Y: MovementDriver + Refueling + ?Sized,
    {
        let state = self
            .queues
            .get_mut(locomotive)
            .ok_or_else(|| CommandError::UnknownLocomotive(locomotive.clone()))?;
        let removed = state.remove(order).ok_or_else(|| CommandError::UnknownOrder {
            locomotive: locomotive.clone(),
            order,
        })?;
        let order = match removed {
            Removed::Pending(order) => order,
            Removed::InFlight {
                order,
                was_refueling,
            } => {
                yard.cancel_order(locomotive);
                if was_refueling {
                    yard.stop_refuel(locomotive);
                }
                info!("{locomotive}: cancelled in-flight order {}", order.id);
                order
            }
        };
        self.changed(locomotive);
        Ok(order)
    }

    /// Drop the whole queue. The route assignment is kept.
    pub fn clear_queue<Y>(
        &mut self,
        yard: &mut Y,
        locomotive: &CarId,
    ) -> Result<usize, CommandError>
    where
        Y: MovementDriver + Refueling + ?Sized,
    {
        let mut state = self
            .queues
            .remove(locomotive)
            .ok_or_else(|| CommandError::UnknownLocomotive(locomotive.clone()))?;
        let mut cleared = state.pending_len();
        if let Some(flight) = state.clear() {
            yard.cancel_order(locomotive);
            if flight.is_refueling() {
                yard.stop_refuel(locomotive);
            }
            cleared += 1;
        }
        info!("{locomotive}: cleared {cleared} orders");
        self.queues.publish(&QueueEvent::QueueRemoved {
            locomotive: locomotive.clone(),
        });
        Ok(cleared)
    }

    pub fn define_route(&mut self, route: RouteDefinition) -> Option<RouteDefinition> {
        self.routes.define(route)
    }

    /// Assign a route and queue a copy of its orders.
    pub fn assign_route(
        &mut self,
        locomotive: &CarId,
        route: &str,
        looping: bool,
    ) -> Result<usize, CommandError> {
        let definition = self
            .routes
            .route(route)
            .ok_or_else(|| CommandError::UnknownRoute(route.to_string()))?;
        let errors: Vec<OrderError> = definition.orders.iter().flat_map(validate_order).collect();
        if !errors.is_empty() {
            return Err(CommandError::InvalidOrder(errors));
        }
        let orders = self.queues.instantiate(&definition.orders);
        let count = orders.len();
        let state = self.queues.get_or_create(locomotive);
        for order in orders {
            state.push_back(order);
        }
        self.routes.assign(
            locomotive.clone(),
            RouteAssignment {
                route: route.to_string(),
                looping,
            },
        );
        info!("{locomotive}: assigned route '{route}' (looping: {looping})");
        self.changed(locomotive);
        Ok(count)
    }

    pub fn unassign_route(&mut self, locomotive: &CarId) -> Option<RouteAssignment> {
        self.routes.unassign(locomotive)
    }

    pub fn status(&self, locomotive: &CarId) -> Option<QueueStatus> {
        self.queues.get(locomotive).map(QueueState::status)
    }

    pub fn statuses(&self) -> Vec<QueueStatus> {
        self.queues.iter().map(QueueState::status).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loco_queue_logic::{Location, UncoupleMode};

    const DAY: f64 = 86_400.0;

    #[test]
    fn test_duration_wait() {
        let wait = WaitDirective::Duration { minutes: 2.5 };
        assert_eq!(resume_time(&wait, 100.0, DAY), 250.0);
    }

    #[test]
    fn test_time_of_day_later_today() {
        let wait = WaitDirective::UntilTime { hour: 6, minute: 30 };
        let now = 2.0 * DAY + 3600.0;
        assert_eq!(resume_time(&wait, now, DAY), 2.0 * DAY + 6.5 * 3600.0);
    }

    #[test]
    fn test_time_of_day_rolls_to_tomorrow() {
        let wait = WaitDirective::UntilTime { hour: 6, minute: 0 };
        let now = DAY + 7.0 * 3600.0;
        assert_eq!(resume_time(&wait, now, DAY), 2.0 * DAY + 6.0 * 3600.0);
    }

    #[test]
    fn test_time_of_day_scales_with_day_length() {
        let wait = WaitDirective::UntilTime { hour: 12, minute: 0 };
        assert_eq!(resume_time(&wait, 0.0, 1200.0), 600.0);
    }

    #[test]
    fn test_invalid_order_rejected() {
        let mut scheduler = WaypointScheduler::default();
        let order =
            WaypointOrder::to(Location::new("s", 0.0)).uncouple(UncoupleMode::ByCount { count: 0 });
        let err = scheduler.enqueue(&CarId::new("L1"), order).unwrap_err();
        assert_eq!(err, CommandError::InvalidOrder(vec![OrderError::ZeroUncoupleCount]));
        assert!(scheduler.queues().is_empty());
    }

    #[test]
    fn test_move_rejects_unknown() {
        let mut scheduler = WaypointScheduler::default();
        let loco = CarId::new("L1");
        assert!(matches!(
            scheduler.move_order(&loco, OrderId(1), 0),
            Err(CommandError::UnknownLocomotive(_))
        ));
        scheduler
            .enqueue(&loco, WaypointOrder::to(Location::new("s", 0.0)))
            .unwrap();
        assert!(matches!(
            scheduler.move_order(&loco, OrderId(99), 0),
            Err(CommandError::UnknownOrder { .. })
        ));
    }

    #[test]
    fn test_assign_unknown_route() {
        let mut scheduler = WaypointScheduler::default();
        assert_eq!(
            scheduler.assign_route(&CarId::new("L1"), "nowhere", true),
            Err(CommandError::UnknownRoute("nowhere".into()))
        );
    }
}
