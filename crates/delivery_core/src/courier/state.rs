use std::sync::Arc;

use serde::Serialize;

use crate::geo::GeoPoint;
use crate::routing::RouteGeometry;

/// Cached route for one order.
#[derive(Debug, Clone, Default)]
pub(crate) enum PathState {
    /// No route requested yet.
    #[default]
    Pending,
    Route(Arc<RouteGeometry>),
    /// Route could not be built; not retried while the order stays active.
    NoPath,
}

/// Per-order simulation state. Dropped when the order leaves the active set.
#[derive(Debug, Clone, Default)]
pub(crate) struct SimulationState {
    pub(crate) path: PathState,
    pub(crate) cursor: usize,
    pub(crate) last_position: Option<GeoPoint>,
}

impl SimulationState {
    pub(crate) fn phase(&self) -> CourierPhase {
        match &self.path {
            PathState::Pending => CourierPhase::RoutePending,
            PathState::NoPath => CourierPhase::NoPath,
            PathState::Route(path) => match path.last_index() {
                Some(last) if self.cursor < last => CourierPhase::Advancing,
                _ => CourierPhase::Arrived,
            },
        }
    }
}

/// Where an order is in the courier state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CourierPhase {
    /// Not tracked: never seen, or evicted after leaving the active set.
    Absent,
    RoutePending,
    Advancing,
    /// Cursor sits on the last route point.
    Arrived,
    NoPath,
}

/// Counters for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub active: usize,
    pub evicted: usize,
    pub routes_fetched: usize,
    pub fallback_routes: usize,
    pub position_updates: usize,
    pub failures: usize,
}

impl TickReport {
    pub(crate) fn accumulate(&mut self, other: &TickReport) {
        self.active = other.active;
        self.evicted += other.evicted;
        self.routes_fetched += other.routes_fetched;
        self.fallback_routes += other.fallback_routes;
        self.position_updates += other.position_updates;
        self.failures += other.failures;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route_of(len: usize) -> Arc<RouteGeometry> {
        Arc::new(RouteGeometry::new(
            (0..len)
                .map(|i| GeoPoint::new(52.5 + i as f64 * 0.001, 13.4))
                .collect(),
        ))
    }

    #[test]
    fn phase_follows_path_and_cursor() {
        let mut state = SimulationState::default();
        assert_eq!(state.phase(), CourierPhase::RoutePending);

        state.path = PathState::Route(route_of(4));
        assert_eq!(state.phase(), CourierPhase::Advancing);

        state.cursor = 3;
        assert_eq!(state.phase(), CourierPhase::Arrived);

        state.path = PathState::NoPath;
        assert_eq!(state.phase(), CourierPhase::NoPath);
    }
}
