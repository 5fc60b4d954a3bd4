//! Delivery-time estimates and store ranking.
//!
//! Ranking prefers one batched matrix request for every geolocated store. If
//! the matrix provider fails, each store is routed individually through the
//! [`RouteProvider`], which degrades on its own. Stores without coordinates are
//! never dropped: they trail the ranking with an unknown ETA.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::RankingConfig;
use crate::geo::{haversine_km, travel_minutes, GeoPoint};
use crate::routing::{GeometryDetail, MatrixProvider, MatrixResult, RouteProvider};

/// Post-buffer delivery estimate for one store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeliveryMetrics {
    pub distance_km: f64,
    pub estimated_minutes: u32,
    /// Set when the travel time came from the local estimate.
    pub is_fallback: bool,
}

impl DeliveryMetrics {
    pub const ZERO: DeliveryMetrics = DeliveryMetrics {
        distance_km: 0.0,
        estimated_minutes: 0,
        is_fallback: false,
    };

    /// ETA sentinel for stores that cannot be located or reached.
    pub const UNKNOWN: DeliveryMetrics = DeliveryMetrics {
        distance_km: 0.0,
        estimated_minutes: u32::MAX,
        is_fallback: false,
    };

    pub fn is_known(&self) -> bool {
        self.estimated_minutes != u32::MAX
    }
}

/// Anything a delivery can start from.
pub trait DeliverySite {
    fn location(&self) -> Option<GeoPoint>;

    /// ETA the store advertises for itself, used when no ranking is possible.
    fn declared_eta_minutes(&self) -> Option<u32> {
        None
    }
}

/// Store read model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub declared_eta_minutes: Option<u32>,
}

impl DeliverySite for Store {
    fn location(&self) -> Option<GeoPoint> {
        self.location
    }

    fn declared_eta_minutes(&self) -> Option<u32> {
        self.declared_eta_minutes
    }
}

#[derive(Debug, PartialEq)]
pub struct RankedStore<'a, S> {
    pub store: &'a S,
    pub metrics: DeliveryMetrics,
}

// Manual impls: `S` itself need not be `Clone`/`Copy`.
impl<S> Clone for RankedStore<'_, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for RankedStore<'_, S> {}

impl RankingConfig {
    /// Travel time plus the prep/pickup buffer, never below the floor.
    pub fn buffered_minutes(&self, travel_minutes: u32) -> u32 {
        travel_minutes
            .saturating_add(self.prep_buffer_minutes)
            .max(self.min_delivery_minutes)
    }

    /// Distance-only estimate: zero for zero distance, otherwise constant-speed
    /// travel plus a buffer, never below the floor.
    pub fn estimated_delivery_time(&self, distance_km: f64) -> u32 {
        if distance_km <= 0.0 {
            return 0;
        }
        travel_minutes(distance_km, self.estimate_speed_kmh)
            .saturating_add(self.estimate_buffer_minutes)
            .max(self.min_delivery_minutes)
    }
}

/// Great-circle distance in kilometres.
pub fn calculate_distance(a: GeoPoint, b: GeoPoint) -> f64 {
    haversine_km(a, b)
}

/// Distance-only ETA with the default buffers.
pub fn calculate_estimated_delivery_time(distance_km: f64) -> u32 {
    RankingConfig::default().estimated_delivery_time(distance_km)
}

/// Ranks stores by estimated delivery time. Holds no per-call state.
#[derive(Clone)]
pub struct DeliveryMetricsRanker {
    router: Arc<dyn RouteProvider>,
    matrix: Arc<dyn MatrixProvider>,
    config: RankingConfig,
}

impl DeliveryMetricsRanker {
    pub fn new(
        router: Arc<dyn RouteProvider>,
        matrix: Arc<dyn MatrixProvider>,
        config: RankingConfig,
    ) -> Self {
        Self {
            router,
            matrix,
            config,
        }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Order `stores` by ascending ETA to `customer`, ties keeping input order.
    /// `limit == 0` means unlimited.
    pub fn rank_by_delivery_time<'a, S: DeliverySite>(
        &self,
        stores: &'a [S],
        customer: Option<GeoPoint>,
        limit: usize,
    ) -> Vec<RankedStore<'a, S>> {
        let Some(customer) = customer else {
            let declared = stores
                .iter()
                .map(|store| RankedStore {
                    store,
                    metrics: DeliveryMetrics {
                        distance_km: 0.0,
                        estimated_minutes: store.declared_eta_minutes().unwrap_or(0),
                        is_fallback: false,
                    },
                })
                .collect();
            return truncate(declared, limit);
        };

        let mut located: Vec<(&'a S, GeoPoint)> = Vec::with_capacity(stores.len());
        let mut unlocated: Vec<&'a S> = Vec::new();
        for store in stores {
            match store.location() {
                Some(point) => located.push((store, point)),
                None => unlocated.push(store),
            }
        }

        let mut ranked = self.measure_located(&located, customer);
        ranked.sort_by_key(|entry| entry.metrics.estimated_minutes);
        ranked.extend(unlocated.into_iter().map(|store| RankedStore {
            store,
            metrics: DeliveryMetrics::UNKNOWN,
        }));

        debug!(
            stores = stores.len(),
            located = located.len(),
            "ranked stores by delivery time"
        );
        truncate(ranked, limit)
    }

    /// Estimate for a single store. Zero when either side has no coordinates.
    pub fn calculate_delivery_metrics<S: DeliverySite + ?Sized>(
        &self,
        store: &S,
        address: Option<GeoPoint>,
    ) -> DeliveryMetrics {
        let (Some(origin), Some(destination)) = (store.location(), address) else {
            return DeliveryMetrics::ZERO;
        };
        let route = self
            .router
            .route(origin, destination, GeometryDetail::Summary);
        DeliveryMetrics {
            distance_km: route.metrics.distance_km,
            estimated_minutes: self.config.buffered_minutes(route.metrics.duration_minutes),
            is_fallback: route.metrics.is_fallback,
        }
    }

    fn measure_located<'a, S: DeliverySite>(
        &self,
        located: &[(&'a S, GeoPoint)],
        customer: GeoPoint,
    ) -> Vec<RankedStore<'a, S>> {
        if located.is_empty() {
            return Vec::new();
        }

        let destinations: Vec<GeoPoint> = located.iter().map(|(_, point)| *point).collect();
        match self.matrix.table(customer, &destinations) {
            Ok(results) if results.len() == located.len() => located
                .iter()
                .zip(results)
                .map(|((store, _), cell)| RankedStore {
                    store: *store,
                    metrics: self.from_matrix(cell),
                })
                .collect(),
            Ok(results) => {
                warn!(
                    expected = located.len(),
                    got = results.len(),
                    "travel matrix size mismatch, routing stores individually"
                );
                self.route_individually(located, customer)
            }
            Err(err) => {
                warn!(error = %err, "travel matrix unavailable, routing stores individually");
                self.route_individually(located, customer)
            }
        }
    }

    fn from_matrix(&self, cell: MatrixResult) -> DeliveryMetrics {
        if !cell.is_reachable() {
            return DeliveryMetrics::UNKNOWN;
        }
        DeliveryMetrics {
            distance_km: cell.distance_km,
            estimated_minutes: self.config.buffered_minutes(cell.duration_minutes),
            is_fallback: false,
        }
    }

    fn route_individually<'a, S: DeliverySite>(
        &self,
        located: &[(&'a S, GeoPoint)],
        customer: GeoPoint,
    ) -> Vec<RankedStore<'a, S>> {
        located
            .iter()
            .map(|(store, point)| {
                let route = self.router.route(*point, customer, GeometryDetail::Summary);
                RankedStore {
                    store: *store,
                    metrics: DeliveryMetrics {
                        distance_km: route.metrics.distance_km,
                        estimated_minutes: self
                            .config
                            .buffered_minutes(route.metrics.duration_minutes),
                        is_fallback: route.metrics.is_fallback,
                    },
                }
            })
            .collect()
    }
}

fn truncate<T>(mut items: Vec<T>, limit: usize) -> Vec<T> {
    if limit > 0 {
        items.truncate(limit);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimated_delivery_time_is_zero_for_zero_distance() {
        assert_eq!(calculate_estimated_delivery_time(0.0), 0);
    }

    #[test]
    fn estimated_delivery_time_adds_buffer() {
        // 6 km at 30 km/h = 12 min, +10 buffer.
        assert_eq!(calculate_estimated_delivery_time(6.0), 22);
    }

    #[test]
    fn estimated_delivery_time_has_a_floor() {
        assert_eq!(calculate_estimated_delivery_time(0.5), 15);
    }

    #[test]
    fn buffered_minutes_applies_prep_buffer_and_floor() {
        let config = RankingConfig::default();
        assert_eq!(config.buffered_minutes(0), 20);
        assert_eq!(config.buffered_minutes(15), 35);
        assert_eq!(config.buffered_minutes(u32::MAX), u32::MAX);
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(52.52, 13.405);
        let b = GeoPoint::new(48.1351, 11.582);
        assert_eq!(calculate_distance(a, b), calculate_distance(b, a));
    }
}
