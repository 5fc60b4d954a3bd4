//! Wire structs for the subset of the OSRM JSON we read.

#[derive(serde::Deserialize)]
pub(super) struct OsrmRouteResponse {
    pub(super) code: String,
    #[serde(default)]
    pub(super) routes: Vec<OsrmRoute>,
}

#[derive(serde::Deserialize)]
pub(super) struct OsrmRoute {
    pub(super) distance: Option<f64>, // metres
    pub(super) duration: Option<f64>, // seconds
    pub(super) geometry: Option<OsrmGeometry>,
}

#[derive(serde::Deserialize)]
pub(super) struct OsrmGeometry {
    #[serde(default)]
    pub(super) coordinates: Vec<Vec<f64>>, // [lon, lat]
}

#[derive(serde::Deserialize)]
pub(super) struct OsrmTableResponse {
    pub(super) code: String,
    pub(super) distances: Option<Vec<Vec<Option<f64>>>>,
    pub(super) durations: Option<Vec<Vec<Option<f64>>>>,
}
