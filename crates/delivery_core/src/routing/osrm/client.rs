use reqwest::{blocking::Client, Url};
use serde::de::DeserializeOwned;

use crate::config::RoutingConfig;
use crate::geo::GeoPoint;
use crate::routing::{GeometryDetail, MatrixResult, RouteResult};

use super::error::RoutingError;
use super::parser::{parse_route_response, parse_table_response};
use super::response::{OsrmRouteResponse, OsrmTableResponse};

/// Thin blocking HTTP client for an OSRM-compatible endpoint.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    client: Client,
    endpoint: String,
    profile: String,
}

impl OsrmClient {
    pub fn new(config: &RoutingConfig) -> Result<Self, RoutingError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(RoutingError::Http)?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            profile: config.profile.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Query `/route` between two points.
    pub fn fetch_route(
        &self,
        origin: GeoPoint,
        destination: GeoPoint,
        detail: GeometryDetail,
    ) -> Result<RouteResult, RoutingError> {
        let mut url = self.service_url("route", &[origin, destination])?;
        {
            let mut query = url.query_pairs_mut();
            match detail {
                GeometryDetail::Summary => {
                    query.append_pair("overview", "false");
                }
                GeometryDetail::Full => {
                    query
                        .append_pair("overview", "full")
                        .append_pair("geometries", "geojson");
                }
            }
        }

        let parsed: OsrmRouteResponse = self.get_json(url)?;
        parse_route_response(parsed, origin, destination, detail)
    }

    /// Query `/table` with `origin` as the only source. Callers handle the
    /// empty-destination case; this always issues a request.
    pub fn fetch_table(
        &self,
        origin: GeoPoint,
        destinations: &[GeoPoint],
    ) -> Result<Vec<MatrixResult>, RoutingError> {
        let mut points = Vec::with_capacity(destinations.len() + 1);
        points.push(origin);
        points.extend_from_slice(destinations);

        let destination_indices = (1..=destinations.len())
            .map(|idx| idx.to_string())
            .collect::<Vec<_>>()
            .join(";");

        let mut url = self.service_url("table", &points)?;
        url.query_pairs_mut()
            .append_pair("sources", "0")
            .append_pair("destinations", &destination_indices)
            .append_pair("annotations", "distance,duration");

        let parsed: OsrmTableResponse = self.get_json(url)?;
        parse_table_response(parsed, destinations.len())
    }

    fn service_url(&self, service: &str, points: &[GeoPoint]) -> Result<Url, RoutingError> {
        let base = format!(
            "{}/{}/v1/{}/{}",
            self.endpoint,
            service,
            self.profile,
            encode_coordinates(points)
        );
        Url::parse(&base).map_err(|err| RoutingError::InvalidUrl(err.to_string()))
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, RoutingError> {
        let response = self.client.get(url).send().map_err(RoutingError::Http)?;
        let status = response.status();
        if !status.is_success() {
            return Err(RoutingError::Status(status.as_u16()));
        }
        response.json().map_err(RoutingError::Json)
    }
}

/// `lon,lat;lon,lat;...` as OSRM expects.
pub(super) fn encode_coordinates(points: &[GeoPoint]) -> String {
    points
        .iter()
        .map(|point| format!("{:.6},{:.6}", point.longitude, point.latitude))
        .collect::<Vec<_>>()
        .join(";")
}
