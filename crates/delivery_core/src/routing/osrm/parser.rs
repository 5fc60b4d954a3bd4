use crate::geo::{meters_to_km, seconds_to_minutes, GeoPoint};
use crate::routing::{GeometryDetail, MatrixResult, RouteGeometry, RouteMetrics, RouteResult};

use super::error::RoutingError;
use super::response::{OsrmGeometry, OsrmRouteResponse, OsrmTableResponse};

const OK_CODE: &str = "Ok";

pub(super) fn parse_route_response(
    resp: OsrmRouteResponse,
    origin: GeoPoint,
    destination: GeoPoint,
    detail: GeometryDetail,
) -> Result<RouteResult, RoutingError> {
    if resp.code != OK_CODE {
        return Err(RoutingError::Api(resp.code));
    }

    let route = resp.routes.into_iter().next().ok_or(RoutingError::NoRoute)?;
    let distance_m = non_negative(route.distance, "distance")?;
    let duration_s = non_negative(route.duration, "duration")?;

    let geometry = match detail {
        GeometryDetail::Summary => RouteGeometry::straight(origin, destination),
        GeometryDetail::Full => {
            let geometry = route
                .geometry
                .ok_or_else(|| RoutingError::Malformed("route has no geometry".into()))?;
            parse_geometry(geometry)?
        }
    };

    Ok(RouteResult {
        metrics: RouteMetrics {
            distance_km: meters_to_km(distance_m),
            duration_minutes: seconds_to_minutes(duration_s),
            is_fallback: false,
        },
        geometry,
    })
}

pub(super) fn parse_table_response(
    resp: OsrmTableResponse,
    expected: usize,
) -> Result<Vec<MatrixResult>, RoutingError> {
    if resp.code != OK_CODE {
        return Err(RoutingError::Api(resp.code));
    }

    let distances = first_row(resp.distances, "distances", expected)?;
    let durations = first_row(resp.durations, "durations", expected)?;

    Ok(distances
        .into_iter()
        .zip(durations)
        .map(|cell| match cell {
            (Some(distance_m), Some(duration_s))
                if distance_m.is_finite() && duration_s.is_finite() =>
            {
                MatrixResult {
                    distance_km: meters_to_km(distance_m),
                    duration_minutes: seconds_to_minutes(duration_s),
                }
            }
            _ => MatrixResult::UNREACHABLE,
        })
        .collect())
}

fn parse_geometry(geometry: OsrmGeometry) -> Result<RouteGeometry, RoutingError> {
    let points = geometry
        .coordinates
        .iter()
        .map(|pair| match pair.as_slice() {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Ok(GeoPoint::new(*lat, *lon)),
            _ => Err(RoutingError::Malformed(format!(
                "invalid coordinate pair {:?}",
                pair
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if points.len() < 2 {
        return Err(RoutingError::Malformed(format!(
            "route geometry has {} point(s)",
            points.len()
        )));
    }
    Ok(RouteGeometry::new(points))
}

fn non_negative(value: Option<f64>, field: &str) -> Result<f64, RoutingError> {
    match value {
        Some(v) if v.is_finite() && v >= 0.0 => Ok(v),
        Some(v) => Err(RoutingError::Malformed(format!("{field} is {v}"))),
        None => Err(RoutingError::Malformed(format!("{field} is missing"))),
    }
}

fn first_row(
    matrix: Option<Vec<Vec<Option<f64>>>>,
    field: &str,
    expected: usize,
) -> Result<Vec<Option<f64>>, RoutingError> {
    let row = matrix
        .and_then(|rows| rows.into_iter().next())
        .ok_or_else(|| RoutingError::Malformed(format!("{field} matrix is missing")))?;
    if row.len() != expected {
        return Err(RoutingError::Malformed(format!(
            "{field} row has {} entries, expected {expected}",
            row.len()
        )));
    }
    Ok(row)
}
