//! Test helpers: fixed geography and in-process providers.
//!
//! Available behind the default `test-helpers` feature so integration tests,
//! benches and downstream crates can reuse them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::geo::GeoPoint;
use crate::routing::{
    fallback_route, GeometryDetail, MatrixProvider, MatrixResult, RouteGeometry, RouteMetrics,
    RouteProvider, RouteResult, RoutingError,
};

/// A store in central Berlin.
pub const TEST_STORE: GeoPoint = GeoPoint::new(52.5200, 13.4050);

/// A customer roughly 2 km east of [`TEST_STORE`].
pub const TEST_CUSTOMER: GeoPoint = GeoPoint::new(52.5200, 13.4345);

/// `points` evenly spaced points from `from` to `to`, both included.
pub fn straight_path(from: GeoPoint, to: GeoPoint, points: usize) -> RouteGeometry {
    let segments = points.saturating_sub(1).max(1) as f64;
    RouteGeometry::new(
        (0..points)
            .map(|i| {
                if i + 1 == points {
                    return to;
                }
                let t = i as f64 / segments;
                GeoPoint::new(
                    from.latitude + (to.latitude - from.latitude) * t,
                    from.longitude + (to.longitude - from.longitude) * t,
                )
            })
            .collect(),
    )
}

/// Route provider that answers every query with the same result and records
/// the queries it saw.
#[derive(Debug)]
pub struct StaticRouteProvider {
    result: RouteResult,
    calls: Mutex<Vec<(GeoPoint, GeoPoint, GeometryDetail)>>,
}

impl StaticRouteProvider {
    pub fn new(result: RouteResult) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Provider-sourced route with the given geometry and fixed metrics.
    pub fn with_geometry(geometry: RouteGeometry) -> Self {
        Self::new(RouteResult {
            metrics: RouteMetrics {
                distance_km: 1.0,
                duration_minutes: 3,
                is_fallback: false,
            },
            geometry,
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|calls| calls.len()).unwrap_or(0)
    }

    pub fn calls(&self) -> Vec<(GeoPoint, GeoPoint, GeometryDetail)> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

impl RouteProvider for StaticRouteProvider {
    fn route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        detail: GeometryDetail,
    ) -> RouteResult {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((origin, destination, detail));
        }
        self.result.clone()
    }
}

/// Route provider that always answers with the great-circle estimate, as the
/// gateway does when the provider is down.
#[derive(Debug, Default)]
pub struct FallbackRouteProvider {
    calls: AtomicUsize,
}

impl FallbackRouteProvider {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RouteProvider for FallbackRouteProvider {
    fn route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        _detail: GeometryDetail,
    ) -> RouteResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        fallback_route(origin, destination, 30.0)
    }
}

/// Matrix provider returning durations (minutes) in input order, or failing.
#[derive(Debug)]
pub struct StaticMatrixProvider {
    durations: Option<Vec<Option<u32>>>,
    calls: AtomicUsize,
}

impl StaticMatrixProvider {
    /// `None` entries are reported unreachable.
    pub fn with_durations(durations: Vec<Option<u32>>) -> Self {
        Self {
            durations: Some(durations),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            durations: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl MatrixProvider for StaticMatrixProvider {
    fn table(
        &self,
        _origin: GeoPoint,
        destinations: &[GeoPoint],
    ) -> Result<Vec<MatrixResult>, RoutingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let durations = self
            .durations
            .as_ref()
            .ok_or_else(|| RoutingError::Api("Unavailable".to_string()))?;
        Ok(destinations
            .iter()
            .enumerate()
            .map(|(idx, _)| match durations.get(idx).copied().flatten() {
                Some(minutes) => MatrixResult {
                    distance_km: minutes as f64 * 0.5,
                    duration_minutes: minutes,
                },
                None => MatrixResult::UNREACHABLE,
            })
            .collect())
    }
}
