//! OSRM HTTP client for the `/route` and `/table` services.
//!
//! The client is blocking and carries a request timeout. It returns typed
//! results or a [`RoutingError`]; deciding what to do on failure is left to the
//! gateways in [`crate::routing`].

mod client;
mod error;
mod parser;
mod response;

#[cfg(test)]
mod tests;

pub use client::OsrmClient;
pub use error::RoutingError;
