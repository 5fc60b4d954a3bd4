use tracing::{trace, warn};

use crate::config::RoutingConfig;
use crate::geo::GeoPoint;

use super::osrm::{OsrmClient, RoutingError};
use super::{
    fallback_route, GeometryDetail, MatrixProvider, MatrixResult, RouteProvider, RouteResult,
};

/// Outcome of a point-to-point query: the provider's answer, or the local
/// estimate together with the failure that forced it.
#[derive(Debug)]
pub enum RouteOutcome {
    Provider(RouteResult),
    Fallback {
        route: RouteResult,
        cause: RoutingError,
    },
}

impl RouteOutcome {
    pub fn route(&self) -> &RouteResult {
        match self {
            RouteOutcome::Provider(route) => route,
            RouteOutcome::Fallback { route, .. } => route,
        }
    }

    pub fn into_route(self) -> RouteResult {
        match self {
            RouteOutcome::Provider(route) => route,
            RouteOutcome::Fallback { route, .. } => route,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, RouteOutcome::Fallback { .. })
    }
}

/// Turn a provider result into an outcome, substituting the Haversine
/// estimate for any error.
pub fn settle_route(
    fetched: Result<RouteResult, RoutingError>,
    origin: GeoPoint,
    destination: GeoPoint,
    fallback_speed_kmh: f64,
) -> RouteOutcome {
    match fetched {
        Ok(route) => RouteOutcome::Provider(route),
        Err(cause) => RouteOutcome::Fallback {
            route: fallback_route(origin, destination, fallback_speed_kmh),
            cause,
        },
    }
}

/// Point-to-point routing over OSRM `/route` with a built-in Haversine fallback.
#[derive(Debug, Clone)]
pub struct RoutingGateway {
    client: OsrmClient,
    fallback_speed_kmh: f64,
}

impl RoutingGateway {
    pub fn new(config: &RoutingConfig) -> Result<Self, RoutingError> {
        Ok(Self::from_client(
            OsrmClient::new(config)?,
            config.fallback_speed_kmh,
        ))
    }

    pub fn from_client(client: OsrmClient, fallback_speed_kmh: f64) -> Self {
        Self {
            client,
            fallback_speed_kmh,
        }
    }

    /// Query the provider and report whether the answer was degraded.
    pub fn resolve(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        detail: GeometryDetail,
    ) -> RouteOutcome {
        trace!(%origin, %destination, ?detail, "requesting route");
        let outcome = settle_route(
            self.client.fetch_route(origin, destination, detail),
            origin,
            destination,
            self.fallback_speed_kmh,
        );
        if let RouteOutcome::Fallback { cause, .. } = &outcome {
            warn!(
                endpoint = self.client.endpoint(),
                %origin,
                %destination,
                error = %cause,
                "routing provider unavailable, using great-circle estimate"
            );
        }
        outcome
    }
}

impl RouteProvider for RoutingGateway {
    fn route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        detail: GeometryDetail,
    ) -> RouteResult {
        self.resolve(origin, destination, detail).into_route()
    }
}

/// One-to-many travel matrix over OSRM `/table`. Failures propagate.
#[derive(Debug, Clone)]
pub struct DistanceMatrixGateway {
    client: OsrmClient,
}

impl DistanceMatrixGateway {
    pub fn new(config: &RoutingConfig) -> Result<Self, RoutingError> {
        Ok(Self::from_client(OsrmClient::new(config)?))
    }

    pub fn from_client(client: OsrmClient) -> Self {
        Self { client }
    }
}

impl MatrixProvider for DistanceMatrixGateway {
    fn table(
        &self,
        origin: GeoPoint,
        destinations: &[GeoPoint],
    ) -> Result<Vec<MatrixResult>, RoutingError> {
        if destinations.is_empty() {
            return Ok(Vec::new());
        }
        trace!(%origin, destinations = destinations.len(), "requesting travel matrix");
        self.client.fetch_table(origin, destinations)
    }
}
