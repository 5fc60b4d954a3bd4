use thiserror::Error;

/// Errors encountered while querying the routing provider.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("failed to build OSRM URL: {0}")]
    InvalidUrl(String),
    #[error("OSRM request failed: {0}")]
    Http(#[source] reqwest::Error),
    #[error("OSRM returned HTTP {0}")]
    Status(u16),
    #[error("OSRM response was not valid JSON: {0}")]
    Json(#[source] reqwest::Error),
    #[error("OSRM returned code `{0}`")]
    Api(String),
    #[error("OSRM returned no route")]
    NoRoute,
    #[error("malformed OSRM response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for RoutingError {
    fn from(err: reqwest::Error) -> Self {
        RoutingError::Http(err)
    }
}
