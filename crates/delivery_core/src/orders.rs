//! Order collaborator seam: which orders are out for delivery, and where their
//! courier is.
//!
//! The real order workflow lives outside this crate. [`InMemoryOrderBook`] backs
//! the CLI and the tests.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An order currently out for delivery, as seen by the courier simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveDelivery {
    pub order_id: OrderId,
    pub store_location: Option<GeoPoint>,
    pub delivery_location: Option<GeoPoint>,
    /// Last courier position published for this order, if any.
    #[serde(default)]
    pub courier_position: Option<GeoPoint>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OrderBookError {
    #[error("order {0} not found")]
    NotFound(OrderId),
    #[error("order book unavailable: {0}")]
    Unavailable(String),
}

/// Read/write access to the order workflow.
pub trait OrderBook: Send + Sync {
    /// Orders currently out for delivery.
    fn active_deliveries(&self) -> Result<Vec<ActiveDelivery>, OrderBookError>;

    fn set_courier_position(
        &self,
        order_id: OrderId,
        position: GeoPoint,
    ) -> Result<(), OrderBookError>;
}

/// ECS resource wrapping the shared order book.
#[derive(Resource, Clone)]
pub struct OrderBookResource(pub Arc<dyn OrderBook>);

/// Order book held in memory. Records every published position.
#[derive(Debug, Default)]
pub struct InMemoryOrderBook {
    deliveries: Mutex<BTreeMap<OrderId, ActiveDelivery>>,
    published: Mutex<Vec<(OrderId, GeoPoint)>>,
}

impl InMemoryOrderBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_deliveries(deliveries: impl IntoIterator<Item = ActiveDelivery>) -> Self {
        let book = Self::new();
        for delivery in deliveries {
            book.insert(delivery);
        }
        book
    }

    /// Put an order out for delivery (or replace it).
    pub fn insert(&self, delivery: ActiveDelivery) {
        lock(&self.deliveries).insert(delivery.order_id, delivery);
    }

    /// Take an order out of the active set.
    pub fn remove(&self, order_id: OrderId) -> Option<ActiveDelivery> {
        lock(&self.deliveries).remove(&order_id)
    }

    pub fn get(&self, order_id: OrderId) -> Option<ActiveDelivery> {
        lock(&self.deliveries).get(&order_id).cloned()
    }

    /// Every `(order, position)` published so far, in order.
    pub fn published_positions(&self) -> Vec<(OrderId, GeoPoint)> {
        lock(&self.published).clone()
    }

    pub fn published_count(&self, order_id: OrderId) -> usize {
        lock(&self.published)
            .iter()
            .filter(|(id, _)| *id == order_id)
            .count()
    }
}

impl OrderBook for InMemoryOrderBook {
    fn active_deliveries(&self) -> Result<Vec<ActiveDelivery>, OrderBookError> {
        Ok(lock(&self.deliveries).values().cloned().collect())
    }

    fn set_courier_position(
        &self,
        order_id: OrderId,
        position: GeoPoint,
    ) -> Result<(), OrderBookError> {
        let mut deliveries = lock(&self.deliveries);
        let delivery = deliveries
            .get_mut(&order_id)
            .ok_or(OrderBookError::NotFound(order_id))?;
        delivery.courier_position = Some(position);
        lock(&self.published).push((order_id, position));
        Ok(())
    }
}

// A panic while holding the lock leaves plain data behind; keep using it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery(id: u64) -> ActiveDelivery {
        ActiveDelivery {
            order_id: OrderId(id),
            store_location: Some(GeoPoint::new(52.52, 13.40)),
            delivery_location: Some(GeoPoint::new(52.53, 13.42)),
            courier_position: None,
        }
    }

    #[test]
    fn active_deliveries_are_ordered_by_id() {
        let book = InMemoryOrderBook::from_deliveries([delivery(3), delivery(1), delivery(2)]);
        let ids: Vec<_> = book
            .active_deliveries()
            .expect("deliveries")
            .into_iter()
            .map(|d| d.order_id)
            .collect();
        assert_eq!(ids, vec![OrderId(1), OrderId(2), OrderId(3)]);
    }

    #[test]
    fn set_position_updates_delivery_and_history() {
        let book = InMemoryOrderBook::from_deliveries([delivery(1)]);
        let point = GeoPoint::new(52.525, 13.41);
        book.set_courier_position(OrderId(1), point).expect("set");

        assert_eq!(book.get(OrderId(1)).unwrap().courier_position, Some(point));
        assert_eq!(book.published_positions(), vec![(OrderId(1), point)]);
    }

    #[test]
    fn set_position_for_unknown_order_fails() {
        let book = InMemoryOrderBook::new();
        let err = book
            .set_courier_position(OrderId(9), GeoPoint::new(0.0, 0.0))
            .expect_err("unknown order");
        assert_eq!(err, OrderBookError::NotFound(OrderId(9)));
    }
}
