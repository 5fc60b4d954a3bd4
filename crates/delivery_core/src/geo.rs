//! Geographic primitives: WGS84 points, Haversine distance and the unit
//! conversions shared by the gateways and the ranker.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Mean Earth radius used by every great-circle computation in the crate.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A latitude/longitude pair in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeoParseError {
    #[error("expected `LAT,LON`, got `{0}`")]
    Format(String),
    #[error("invalid number `{0}`")]
    Number(String),
    #[error("coordinate out of range: {latitude},{longitude}")]
    OutOfRange { latitude: f64, longitude: f64 },
}

impl GeoPoint {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Build a point, rejecting non-finite or out-of-range coordinates.
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, GeoParseError> {
        let point = Self::new(latitude, longitude);
        if point.is_valid() {
            Ok(point)
        } else {
            Err(GeoParseError::OutOfRange {
                latitude,
                longitude,
            })
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to `other` in kilometres (unrounded).
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        haversine_km(*self, *other)
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.latitude, self.longitude)
    }
}

impl FromStr for GeoPoint {
    type Err = GeoParseError;

    /// Parses `LAT,LON`.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (lat, lon) = raw
            .split_once(',')
            .ok_or_else(|| GeoParseError::Format(raw.to_string()))?;
        let parse = |value: &str| {
            value
                .trim()
                .parse::<f64>()
                .map_err(|_| GeoParseError::Number(value.trim().to_string()))
        };
        Self::try_new(parse(lat)?, parse(lon)?)
    }
}

/// Haversine great-circle distance in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let (lat1, lon1) = (a.latitude.to_radians(), a.longitude.to_radians());
    let (lat2, lon2) = (b.latitude.to_radians(), b.longitude.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Round half-up to two decimals. Negative input clamps to zero.
pub fn round_km(km: f64) -> f64 {
    (km.max(0.0) * 100.0).round() / 100.0
}

/// Metres to kilometres, half-up to two decimals.
pub fn meters_to_km(meters: f64) -> f64 {
    (meters.max(0.0) / 10.0).round() / 100.0
}

/// Seconds to whole minutes, rounded, never below zero.
pub fn seconds_to_minutes(seconds: f64) -> u32 {
    (seconds / 60.0).round().max(0.0) as u32
}

/// Travel minutes for `distance_km` at a constant speed, rounded.
pub fn travel_minutes(distance_km: f64, speed_kmh: f64) -> u32 {
    if distance_km <= 0.0 {
        return 0;
    }
    (distance_km / speed_kmh.max(f64::EPSILON) * 60.0)
        .round()
        .max(0.0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALEXANDERPLATZ: GeoPoint = GeoPoint::new(52.5219, 13.4132);
    const POTSDAMER_PLATZ: GeoPoint = GeoPoint::new(52.5096, 13.3759);

    #[test]
    fn haversine_is_zero_for_identical_points() {
        assert_eq!(haversine_km(ALEXANDERPLATZ, ALEXANDERPLATZ), 0.0);
    }

    #[test]
    fn haversine_is_symmetric() {
        let pairs = [
            (ALEXANDERPLATZ, POTSDAMER_PLATZ),
            (GeoPoint::new(-33.8688, 151.2093), GeoPoint::new(51.5074, -0.1278)),
            (GeoPoint::new(0.0, 179.9), GeoPoint::new(0.0, -179.9)),
        ];
        for (a, b) in pairs {
            assert_eq!(haversine_km(a, b), haversine_km(b, a));
        }
    }

    #[test]
    fn haversine_matches_known_distance() {
        // One degree of latitude on a 6371 km sphere.
        let km = haversine_km(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!((km - 111.195).abs() < 0.001, "got {km}");
    }

    #[test]
    fn meters_round_half_up_to_hundredths() {
        assert_eq!(meters_to_km(1234.0), 1.23);
        assert_eq!(meters_to_km(1235.0), 1.24);
        assert_eq!(meters_to_km(-10.0), 0.0);
    }

    #[test]
    fn seconds_round_to_minutes() {
        assert_eq!(seconds_to_minutes(89.0), 1);
        assert_eq!(seconds_to_minutes(90.0), 2);
        assert_eq!(seconds_to_minutes(-30.0), 0);
    }

    #[test]
    fn parses_lat_lon_pairs() {
        let point: GeoPoint = "52.52, 13.405".parse().expect("valid point");
        assert_eq!(point, GeoPoint::new(52.52, 13.405));

        assert!(matches!(
            "52.52".parse::<GeoPoint>(),
            Err(GeoParseError::Format(_))
        ));
        assert!(matches!(
            "91,0".parse::<GeoPoint>(),
            Err(GeoParseError::OutOfRange { .. })
        ));
        assert!(matches!(
            "abc,0".parse::<GeoPoint>(),
            Err(GeoParseError::Number(_))
        ));
    }
}
