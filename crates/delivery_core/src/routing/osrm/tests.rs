use serde_json::json;

use crate::geo::GeoPoint;
use crate::routing::{GeometryDetail, MatrixResult};

use super::client::encode_coordinates;
use super::error::RoutingError;
use super::parser::{parse_route_response, parse_table_response};
use super::response::{OsrmRouteResponse, OsrmTableResponse};

const ORIGIN: GeoPoint = GeoPoint::new(52.5200, 13.4050);
const DESTINATION: GeoPoint = GeoPoint::new(52.5300, 13.4250);

fn route_response(body: serde_json::Value) -> OsrmRouteResponse {
    serde_json::from_value(body).expect("route response")
}

fn table_response(body: serde_json::Value) -> OsrmTableResponse {
    serde_json::from_value(body).expect("table response")
}

#[test]
fn encode_coordinates_orders_lon_before_lat() {
    assert_eq!(
        encode_coordinates(&[ORIGIN, DESTINATION]),
        "13.405000,52.520000;13.425000,52.530000"
    );
}

#[test]
fn parse_route_converts_units() {
    let response = route_response(json!({
        "code": "Ok",
        "routes": [{"distance": 2345.0, "duration": 418.0}]
    }));

    let route = parse_route_response(response, ORIGIN, DESTINATION, GeometryDetail::Summary)
        .expect("should parse");
    assert_eq!(route.metrics.distance_km, 2.35);
    assert_eq!(route.metrics.duration_minutes, 7);
    assert!(!route.metrics.is_fallback);
    assert_eq!(route.geometry.points(), &[ORIGIN, DESTINATION]);
}

#[test]
fn parse_route_reads_full_geometry_as_lon_lat() {
    let response = route_response(json!({
        "code": "Ok",
        "routes": [{
            "distance": 1500.0,
            "duration": 300.0,
            "geometry": {
                "type": "LineString",
                "coordinates": [[13.405, 52.52], [13.41, 52.525], [13.425, 52.53]]
            }
        }]
    }));

    let route = parse_route_response(response, ORIGIN, DESTINATION, GeometryDetail::Full)
        .expect("should parse");
    assert_eq!(route.geometry.len(), 3);
    assert_eq!(route.geometry.get(1), Some(GeoPoint::new(52.525, 13.41)));
}

#[test]
fn parse_route_rejects_non_ok_code() {
    let response = route_response(json!({"code": "NoSegment", "message": "no segment"}));
    let err = parse_route_response(response, ORIGIN, DESTINATION, GeometryDetail::Summary)
        .expect_err("should fail");
    assert!(matches!(err, RoutingError::Api(code) if code == "NoSegment"));
}

#[test]
fn parse_route_rejects_empty_routes() {
    let response = route_response(json!({"code": "Ok", "routes": []}));
    let err = parse_route_response(response, ORIGIN, DESTINATION, GeometryDetail::Summary)
        .expect_err("should fail");
    assert!(matches!(err, RoutingError::NoRoute));
}

#[test]
fn parse_route_rejects_missing_duration() {
    let response = route_response(json!({"code": "Ok", "routes": [{"distance": 10.0}]}));
    let err = parse_route_response(response, ORIGIN, DESTINATION, GeometryDetail::Summary)
        .expect_err("should fail");
    assert!(matches!(err, RoutingError::Malformed(_)));
}

#[test]
fn parse_route_rejects_degenerate_full_geometry() {
    let response = route_response(json!({
        "code": "Ok",
        "routes": [{
            "distance": 10.0,
            "duration": 5.0,
            "geometry": {"coordinates": [[13.405, 52.52]]}
        }]
    }));
    let err = parse_route_response(response, ORIGIN, DESTINATION, GeometryDetail::Full)
        .expect_err("should fail");
    assert!(matches!(err, RoutingError::Malformed(_)));
}

#[test]
fn parse_route_rejects_short_coordinate_pairs() {
    let response = route_response(json!({
        "code": "Ok",
        "routes": [{
            "distance": 10.0,
            "duration": 5.0,
            "geometry": {"coordinates": [[13.405, 52.52], [13.41]]}
        }]
    }));
    let err = parse_route_response(response, ORIGIN, DESTINATION, GeometryDetail::Full)
        .expect_err("should fail");
    assert!(matches!(err, RoutingError::Malformed(_)));
}

#[test]
fn parse_table_maps_nulls_to_unreachable() {
    let response = table_response(json!({
        "code": "Ok",
        "distances": [[1000.0, null, 2500.0]],
        "durations": [[120.0, null, 600.0]]
    }));

    let results = parse_table_response(response, 3).expect("should parse");
    assert_eq!(
        results,
        vec![
            MatrixResult {
                distance_km: 1.0,
                duration_minutes: 2
            },
            MatrixResult::UNREACHABLE,
            MatrixResult {
                distance_km: 2.5,
                duration_minutes: 10
            },
        ]
    );
}

#[test]
fn parse_table_rejects_row_length_mismatch() {
    let response = table_response(json!({
        "code": "Ok",
        "distances": [[1000.0]],
        "durations": [[120.0]]
    }));
    let err = parse_table_response(response, 2).expect_err("should fail");
    assert!(matches!(err, RoutingError::Malformed(_)));
}

#[test]
fn parse_table_rejects_missing_distances() {
    let response = table_response(json!({"code": "Ok", "durations": [[120.0]]}));
    let err = parse_table_response(response, 1).expect_err("should fail");
    assert!(matches!(err, RoutingError::Malformed(_)));
}
