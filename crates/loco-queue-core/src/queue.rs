//! Per-locomotive queue state.
//!
//! One [`QueueState`] per locomotive: a FIFO of pending orders, at most one
//! in-flight order with its sub-state, and the error that paused the queue,
//! if any. Only the scheduler mutates it.

use loco_queue_logic::{CarId, CutError, OrderId, WaypointOrder};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;

/// Where the in-flight order is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum OrderPhase {
    /// Move order issued, driver has not reported it active yet.
    Sending,
    Traveling,
    /// Holding at the waypoint until `resume_at` (sim seconds).
    Waiting { resume_at: f64 },
    Refueling,
    Resolving,
}

/// The order currently being worked, plus its sub-state.
#[derive(Debug, Clone, PartialEq)]
pub struct InFlight {
    pub order: WaypointOrder,
    pub phase: OrderPhase,
    pub waited: bool,
    pub refueled: bool,
}

impl InFlight {
    pub fn new(order: WaypointOrder) -> Self {
        Self {
            order,
            phase: OrderPhase::Sending,
            waited: false,
            refueled: false,
        }
    }

    pub fn is_refueling(&self) -> bool {
        self.phase == OrderPhase::Refueling
    }
}

/// A resolution failure, tagged with the locomotive and order it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("locomotive {locomotive}, order {order}: {source}")]
pub struct QueueError {
    pub locomotive: CarId,
    pub order: OrderId,
    #[source]
    pub source: CutError,
}

/// Which part of the queue an order was removed from.
#[derive(Debug, Clone, PartialEq)]
pub enum Removed {
    Pending(WaypointOrder),
    /// The in-flight order; carries whether it was refueling.
    InFlight { order: WaypointOrder, was_refueling: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueueState {
    pub locomotive: CarId,
    pending: VecDeque<WaypointOrder>,
    in_flight: Option<InFlight>,
    error: Option<QueueError>,
}

impl QueueState {
    pub fn new(locomotive: CarId) -> Self {
        Self {
            locomotive,
            pending: VecDeque::new(),
            in_flight: None,
            error: None,
        }
    }

    pub fn pending(&self) -> impl Iterator<Item = &WaypointOrder> {
        self.pending.iter()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn in_flight(&self) -> Option<&InFlight> {
        self.in_flight.as_ref()
    }

    pub fn in_flight_mut(&mut self) -> Option<&mut InFlight> {
        self.in_flight.as_mut()
    }

    pub fn error(&self) -> Option<&QueueError> {
        self.error.as_ref()
    }

    pub fn is_paused(&self) -> bool {
        self.error.is_some()
    }

    /// No in-flight order and nothing pending.
    pub fn is_exhausted(&self) -> bool {
        self.in_flight.is_none() && self.pending.is_empty()
    }

    pub fn contains(&self, order: OrderId) -> bool {
        self.in_flight.as_ref().is_some_and(|f| f.order.id == order)
            || self.pending.iter().any(|o| o.id == order)
    }

    pub fn push_back(&mut self, order: WaypointOrder) {
        self.pending.push_back(order);
    }

    /// Insert into the pending list; `index` past the end appends.
    pub fn insert(&mut self, index: usize, order: WaypointOrder) {
        let index = index.min(self.pending.len());
        self.pending.insert(index, order);
    }

    /// Move a pending order to `index` in the pending list.
    pub fn move_pending(&mut self, order: OrderId, index: usize) -> bool {
        let Some(from) = self.pending.iter().position(|o| o.id == order) else {
            return false;
        };
        let Some(item) = self.pending.remove(from) else {
            return false;
        };
        let index = index.min(self.pending.len());
        self.pending.insert(index, item);
        true
    }

    /// Pop the next pending order into flight.
    pub fn dispatch_next(&mut self) -> Option<&InFlight> {
        let order = self.pending.pop_front()?;
        self.in_flight = Some(InFlight::new(order));
        self.in_flight.as_ref()
    }

    /// Clear the in-flight order after it resolved.
    pub fn finish(&mut self) -> Option<WaypointOrder> {
        self.in_flight.take().map(|f| f.order)
    }

    /// Pause the queue; the in-flight order stays in place.
    pub fn fail(&mut self, error: QueueError) {
        self.error = Some(error);
    }

    /// Remove an order. Removing the in-flight order also clears the error.
    pub fn remove(&mut self, order: OrderId) -> Option<Removed> {
        if self.in_flight.as_ref().is_some_and(|f| f.order.id == order) {
            let flight = self.in_flight.take()?;
            self.error = None;
            return Some(Removed::InFlight {
                was_refueling: flight.is_refueling(),
                order: flight.order,
            });
        }
        let index = self.pending.iter().position(|o| o.id == order)?;
        self.pending.remove(index).map(Removed::Pending)
    }

    /// Drop everything. Returns the in-flight order if there was one.
    pub fn clear(&mut self) -> Option<InFlight> {
        self.pending.clear();
        self.error = None;
        self.in_flight.take()
    }

    pub fn status(&self) -> QueueStatus {
        let phase = self.in_flight.as_ref().map(|f| f.phase);
        QueueStatus {
            locomotive: self.locomotive.clone(),
            pending: self.pending.iter().map(|o| o.id).collect(),
            in_flight: self.in_flight.as_ref().map(|f| f.order.id),
            phase,
            resume_at: match phase {
                Some(OrderPhase::Waiting { resume_at }) => Some(resume_at),
                _ => None,
            },
            error: self.error.as_ref().map(ToString::to_string),
        }
    }
}

/// Operator-facing snapshot of one queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueStatus {
    pub locomotive: CarId,
    pub pending: Vec<OrderId>,
    pub in_flight: Option<OrderId>,
    pub phase: Option<OrderPhase>,
    pub resume_at: Option<f64>,
    pub error: Option<String>,
}
