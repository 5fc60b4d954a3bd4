//! Route providers: point-to-point routes and one-to-many travel matrices.
//!
//! Two seams, each with an OSRM-backed gateway:
//!
//! - **[`RouteProvider`]** answers a single origin/destination query and never
//!   fails. [`RoutingGateway`] calls OSRM `/route` and degrades to a Haversine
//!   estimate (tagged `is_fallback`) on any provider failure.
//! - **[`MatrixProvider`]** answers one origin against many destinations in a
//!   single request. [`DistanceMatrixGateway`] calls OSRM `/table` and
//!   propagates failures, leaving the degradation policy to the caller.
//!
//! Providers are shared as `Arc<dyn _>`; the courier simulation reads its
//! provider from the [`RouteProviderResource`] ECS resource.

use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::geo::{haversine_km, round_km, travel_minutes, GeoPoint};

mod gateway;
pub mod osrm;

pub use gateway::{settle_route, DistanceMatrixGateway, RouteOutcome, RoutingGateway};
pub use osrm::{OsrmClient, RoutingError};

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// How much geometry a route request asks the provider for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryDetail {
    /// Distance and duration only; geometry is the straight origin-destination line.
    #[default]
    Summary,
    /// Full road geometry.
    Full,
}

/// Distance and duration of one route query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteMetrics {
    /// Kilometres, rounded half-up to two decimals.
    pub distance_km: f64,
    pub duration_minutes: u32,
    /// Set when the numbers come from the local estimate instead of the provider.
    pub is_fallback: bool,
}

/// Ordered points of a route, origin first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteGeometry {
    points: Vec<GeoPoint>,
}

impl RouteGeometry {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    /// The two-point line used when no road geometry is available.
    pub fn straight(origin: GeoPoint, destination: GeoPoint) -> Self {
        Self::new(vec![origin, destination])
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<GeoPoint> {
        self.points.get(index).copied()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.points.len().checked_sub(1)
    }
}

/// Result of a route query. Always carries geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResult {
    pub metrics: RouteMetrics,
    pub geometry: RouteGeometry,
}

/// One cell of a one-to-many travel matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatrixResult {
    pub distance_km: f64,
    pub duration_minutes: u32,
}

impl MatrixResult {
    /// Sentinel for destinations the provider declares unreachable.
    pub const UNREACHABLE: MatrixResult = MatrixResult {
        distance_km: 0.0,
        duration_minutes: u32::MAX,
    };

    pub fn is_reachable(&self) -> bool {
        self.duration_minutes != u32::MAX
    }
}

// ---------------------------------------------------------------------------
// Provider seams
// ---------------------------------------------------------------------------

/// Point-to-point routing. Implementations must not fail; degraded answers are
/// tagged through [`RouteMetrics::is_fallback`].
pub trait RouteProvider: Send + Sync {
    fn route(&self, origin: GeoPoint, destination: GeoPoint, detail: GeometryDetail)
        -> RouteResult;
}

/// One origin against many destinations. Output is index-aligned with
/// `destinations`.
pub trait MatrixProvider: Send + Sync {
    fn table(
        &self,
        origin: GeoPoint,
        destinations: &[GeoPoint],
    ) -> Result<Vec<MatrixResult>, RoutingError>;
}

/// ECS resource wrapping the shared route provider.
#[derive(Resource, Clone)]
pub struct RouteProviderResource(pub Arc<dyn RouteProvider>);

// ---------------------------------------------------------------------------
// Haversine fallback
// ---------------------------------------------------------------------------

/// Great-circle estimate used when the provider cannot answer.
///
/// Duration assumes a constant `speed_kmh` and is at least one minute for any
/// non-zero distance.
pub fn fallback_route(origin: GeoPoint, destination: GeoPoint, speed_kmh: f64) -> RouteResult {
    let distance_km = round_km(haversine_km(origin, destination));
    let duration_minutes = if distance_km > 0.0 {
        travel_minutes(distance_km, speed_kmh).max(1)
    } else {
        0
    };
    RouteResult {
        metrics: RouteMetrics {
            distance_km,
            duration_minutes,
            is_fallback: true,
        },
        geometry: RouteGeometry::straight(origin, destination),
    }
}
