//! Courier simulation: moves a courier along a cached route for every order
//! that is out for delivery.
//!
//! Each [`CourierSimulator::tick`] is one sequential pass over the active set:
//!
//! 1. Forget orders that left the active set (their route is rebuilt from
//!    scratch if they come back).
//! 2. Place couriers without a known position at their store.
//! 3. Fetch and cache a full route for orders that have none yet. A route that
//!    cannot be built is cached as "no path" instead of retried every tick.
//! 4. Move the cursor forward by a fixed number of route points and publish the
//!    new position, only when the cursor actually moved.
//!
//! A failing order is logged and skipped; the rest of the tick carries on.
//! Movement stops at the last route point; delivery status stays with the
//! order workflow.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use lru::LruCache;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::CourierConfig;
use crate::geo::GeoPoint;
use crate::orders::{ActiveDelivery, OrderBook, OrderBookError, OrderId};
use crate::routing::{GeometryDetail, RouteProvider};

mod state;

pub use state::{CourierPhase, TickReport};
use state::{PathState, SimulationState};

#[derive(Debug, Error)]
pub enum CourierError {
    #[error("store location unknown, cannot place courier")]
    MissingStoreLocation,
    #[error(transparent)]
    OrderBook(#[from] OrderBookError),
}

/// Owns every per-order route and cursor. `tick` takes `&mut self`, so two
/// ticks can never touch the state at once.
#[derive(Resource)]
pub struct CourierSimulator {
    states: LruCache<OrderId, SimulationState>,
    /// Configured capacity; the cache grows past it only while the active set
    /// is larger.
    base_capacity: NonZeroUsize,
    points_per_tick: usize,
}

impl CourierSimulator {
    pub fn new(config: &CourierConfig) -> Self {
        let capacity = NonZeroUsize::new(config.max_tracked_orders).unwrap_or(NonZeroUsize::MIN);
        Self {
            states: LruCache::new(capacity),
            base_capacity: capacity,
            points_per_tick: config.points_per_tick.max(1),
        }
    }

    pub fn points_per_tick(&self) -> usize {
        self.points_per_tick
    }

    /// Run one pass over the orders out for delivery.
    pub fn tick(&mut self, router: &dyn RouteProvider, orders: &dyn OrderBook) -> TickReport {
        let mut report = TickReport::default();

        let deliveries = match orders.active_deliveries() {
            Ok(deliveries) => deliveries,
            Err(err) => {
                warn!(error = %err, "could not read active deliveries, skipping tick");
                report.failures += 1;
                return report;
            }
        };
        report.active = deliveries.len();

        let active: HashSet<OrderId> = deliveries.iter().map(|d| d.order_id).collect();
        report.evicted = self.evict_inactive(&active);
        self.fit_capacity(active.len());

        for delivery in &deliveries {
            if let Err(err) = self.step_order(delivery, router, orders, &mut report) {
                report.failures += 1;
                warn!(order_id = %delivery.order_id, error = %err, "courier update failed");
            }
        }

        debug!(
            active = report.active,
            evicted = report.evicted,
            routes_fetched = report.routes_fetched,
            position_updates = report.position_updates,
            failures = report.failures,
            "courier tick complete"
        );
        report
    }

    pub fn phase(&self, order_id: OrderId) -> CourierPhase {
        self.states
            .peek(&order_id)
            .map(SimulationState::phase)
            .unwrap_or(CourierPhase::Absent)
    }

    pub fn cursor(&self, order_id: OrderId) -> Option<usize> {
        self.states.peek(&order_id).map(|state| state.cursor)
    }

    pub fn last_position(&self, order_id: OrderId) -> Option<GeoPoint> {
        self.states
            .peek(&order_id)
            .and_then(|state| state.last_position)
    }

    /// Number of route points cached for the order, if a route is cached.
    pub fn path_len(&self, order_id: OrderId) -> Option<usize> {
        match &self.states.peek(&order_id)?.path {
            PathState::Route(path) => Some(path.len()),
            _ => None,
        }
    }

    pub fn tracked_orders(&self) -> usize {
        self.states.len()
    }

    fn evict_inactive(&mut self, active: &HashSet<OrderId>) -> usize {
        let stale: Vec<OrderId> = self
            .states
            .iter()
            .map(|(order_id, _)| *order_id)
            .filter(|order_id| !active.contains(order_id))
            .collect();
        for order_id in &stale {
            self.states.pop(order_id);
        }
        stale.len()
    }

    /// Size the cache so every active order fits. Runs after eviction, when
    /// only active orders are tracked, so resizing never drops live state.
    fn fit_capacity(&mut self, active: usize) {
        let wanted = NonZeroUsize::new(active)
            .map_or(self.base_capacity, |needed| needed.max(self.base_capacity));
        if wanted == self.states.cap() {
            return;
        }
        if wanted > self.base_capacity && wanted > self.states.cap() {
            warn!(
                active,
                limit = self.base_capacity.get(),
                "active deliveries exceed tracked order limit, growing state cache"
            );
        }
        self.states.resize(wanted);
    }

    fn state_mut(&mut self, order_id: OrderId) -> &mut SimulationState {
        self.states.get_or_insert_mut(order_id, SimulationState::default)
    }

    fn step_order(
        &mut self,
        delivery: &ActiveDelivery,
        router: &dyn RouteProvider,
        orders: &dyn OrderBook,
        report: &mut TickReport,
    ) -> Result<(), CourierError> {
        let order_id = delivery.order_id;
        let points_per_tick = self.points_per_tick;
        let state = self.state_mut(order_id);

        let position = match delivery.courier_position.or(state.last_position) {
            Some(position) => position,
            None => {
                let start = delivery
                    .store_location
                    .ok_or(CourierError::MissingStoreLocation)?;
                orders.set_courier_position(order_id, start)?;
                report.position_updates += 1;
                debug!(%order_id, position = %start, "courier placed at store");
                start
            }
        };
        state.last_position = Some(position);

        if matches!(state.path, PathState::Pending) {
            state.cursor = 0;
            state.path = match delivery.delivery_location {
                Some(destination) => {
                    let route = router.route(position, destination, GeometryDetail::Full);
                    report.routes_fetched += 1;
                    if route.metrics.is_fallback {
                        report.fallback_routes += 1;
                    }
                    if route.geometry.len() >= 2 {
                        debug!(%order_id, points = route.geometry.len(), "route cached");
                        PathState::Route(Arc::new(route.geometry))
                    } else {
                        warn!(%order_id, "route has no usable geometry");
                        PathState::NoPath
                    }
                }
                None => {
                    warn!(%order_id, "delivery address has no coordinates");
                    PathState::NoPath
                }
            };
        }

        let PathState::Route(path) = &state.path else {
            return Ok(());
        };
        let Some(last) = path.last_index() else {
            return Ok(());
        };
        if state.cursor >= last {
            return Ok(());
        }

        let next = (state.cursor + points_per_tick).min(last);
        if next == state.cursor {
            return Ok(());
        }
        let Some(point) = path.get(next) else {
            return Ok(());
        };

        orders.set_courier_position(order_id, point)?;
        state.cursor = next;
        state.last_position = Some(point);
        report.position_updates += 1;
        Ok(())
    }
}
