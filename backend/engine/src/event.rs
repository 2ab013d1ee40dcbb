//! Publish/subscribe of route conquests.
//!
//! Every successful claim produces one [`ConquestEvent`], which the [`ConquestEventBus`]
//! hands to each subscribed [`ConquestObserver`] before the turn moves on. Delivery is
//! synchronous and follows subscription order.
//!
//! Observers cannot talk back to the engine: whatever they do happens inside
//! [`ConquestObserver::on_conquest`].

use crate::map::RouteId;
use crate::player::PlayerId;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A route was claimed.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ConquestEvent {
    pub player: PlayerId,
    pub route: RouteId,
    pub length: u8,
    pub points_awarded: u8,
    /// Trains the player has left once the route is built.
    pub trains_remaining_after: u8,
    pub turn: u32,
}

/// Reacts to route conquests.
///
/// Implementations must be `Send + Sync`, since sessions move between threads.
pub trait ConquestObserver: Send + Sync {
    fn on_conquest(&self, event: &ConquestEvent);

    /// Human-readable name for logging.
    fn name(&self) -> &str;
}

/// Ordered set of observers.
#[derive(Clone, Default)]
pub struct ConquestEventBus {
    observers: Vec<Arc<dyn ConquestObserver>>,
}

impl ConquestEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an observer at the end of the delivery order.
    ///
    /// Subscribing an observer that is already registered (the same `Arc`) does nothing.
    ///
    /// # Example
    /// ```
    /// use std::sync::Arc;
    /// use ticket_to_ride_engine::event::{ConquestEvent, ConquestEventBus, ConquestObserver};
    ///
    /// struct Silent;
    /// impl ConquestObserver for Silent {
    ///     fn on_conquest(&self, _: &ConquestEvent) {}
    ///     fn name(&self) -> &str { "silent" }
    /// }
    ///
    /// let observer: Arc<dyn ConquestObserver> = Arc::new(Silent);
    /// let mut bus = ConquestEventBus::new();
    /// bus.subscribe(observer.clone());
    /// bus.subscribe(observer);
    /// assert_eq!(bus.observer_count(), 1);
    /// ```
    pub fn subscribe(&mut self, observer: Arc<dyn ConquestObserver>) {
        if self.is_subscribed(&observer) {
            return;
        }

        log::debug!("Subscribed conquest observer: {}", observer.name());
        self.observers.push(observer);
    }

    /// Removes the observer, if it was subscribed.
    pub fn unsubscribe(&mut self, observer: &Arc<dyn ConquestObserver>) {
        self.observers
            .retain(|subscribed| !Arc::ptr_eq(subscribed, observer));
    }

    pub fn is_subscribed(&self, observer: &Arc<dyn ConquestObserver>) -> bool {
        self.observers
            .iter()
            .any(|subscribed| Arc::ptr_eq(subscribed, observer))
    }

    /// Delivers `event` to every observer, in subscription order.
    pub fn publish(&self, event: &ConquestEvent) {
        for observer in &self.observers {
            observer.on_conquest(event);
        }
    }

    pub fn clear(&mut self) {
        self.observers.clear();
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }
}

impl fmt::Debug for ConquestEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.observers.iter().map(|observer| observer.name()))
            .finish()
    }
}
