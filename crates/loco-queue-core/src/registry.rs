//! Observable registry of per-locomotive queue states.
//!
//! The registry owns every [`QueueState`] and notifies subscribers of queue
//! changes. Each instance is isolated; tests build their own.

use crate::queue::{QueueError, QueueState};
use loco_queue_logic::{CarId, OrderId, WaypointOrder};
use std::collections::BTreeMap;

/// Notification published after each mutation or tick.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueEvent {
    QueueChanged { locomotive: CarId },
    QueueRemoved { locomotive: CarId },
    OrderDispatched { locomotive: CarId, order: OrderId },
    OrderResolved { locomotive: CarId, order: OrderId },
    OrderFailed { error: QueueError },
    RouteRepopulated { locomotive: CarId, route: String, orders: usize },
}

impl QueueEvent {
    pub fn locomotive(&self) -> &CarId {
        match self {
            QueueEvent::QueueChanged { locomotive }
            | QueueEvent::QueueRemoved { locomotive }
            | QueueEvent::OrderDispatched { locomotive, .. }
            | QueueEvent::OrderResolved { locomotive, .. }
            | QueueEvent::RouteRepopulated { locomotive, .. } => locomotive,
            QueueEvent::OrderFailed { error } => &error.locomotive,
        }
    }
}

/// Handle returned by [`QueueRegistry::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(usize);

type Subscriber = Box<dyn FnMut(&QueueEvent)>;

#[derive(Default)]
pub struct QueueRegistry {
    states: BTreeMap<CarId, QueueState>,
    subscribers: Vec<(SubscriberId, Subscriber)>,
    next_subscriber: usize,
    next_order: u64,
}

impl QueueRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriberId
    where
        F: FnMut(&QueueEvent) + 'static,
    {
        let id = SubscriberId(self.next_subscriber);
        self.next_subscriber += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(s, _)| *s != id);
        self.subscribers.len() != before
    }

    pub fn publish(&mut self, event: &QueueEvent) {
        for (_, callback) in &mut self.subscribers {
            callback(event);
        }
    }

    pub fn publish_all(&mut self, events: &[QueueEvent]) {
        for event in events {
            self.publish(event);
        }
    }

    /// Fresh order id, unique within this registry.
    pub fn next_order_id(&mut self) -> OrderId {
        self.next_order += 1;
        OrderId(self.next_order)
    }

    /// Deep copies of `templates` with fresh ids.
    pub fn instantiate(&mut self, templates: &[WaypointOrder]) -> Vec<WaypointOrder> {
        templates
            .iter()
            .map(|template| {
                let mut order = template.clone();
                order.id = self.next_order_id();
                order
            })
            .collect()
    }

    pub fn get(&self, locomotive: &CarId) -> Option<&QueueState> {
        self.states.get(locomotive)
    }

    pub fn get_mut(&mut self, locomotive: &CarId) -> Option<&mut QueueState> {
        self.states.get_mut(locomotive)
    }

    /// The locomotive's queue, created on first use.
    pub fn get_or_create(&mut self, locomotive: &CarId) -> &mut QueueState {
        self.states
            .entry(locomotive.clone())
            .or_insert_with(|| QueueState::new(locomotive.clone()))
    }

    pub fn remove(&mut self, locomotive: &CarId) -> Option<QueueState> {
        self.states.remove(locomotive)
    }

    pub fn contains(&self, locomotive: &CarId) -> bool {
        self.states.contains_key(locomotive)
    }

    /// Locomotives with a queue, in id order.
    pub fn locomotives(&self) -> Vec<CarId> {
        self.states.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueueState> {
        self.states.values()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl std::fmt::Debug for QueueRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueRegistry")
            .field("states", &self.states)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
