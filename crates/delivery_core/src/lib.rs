pub mod config;
pub mod courier;
pub mod geo;
pub mod orders;
pub mod profiling;
pub mod ranking;
pub mod routing;
pub mod runner;
pub mod systems;
pub mod ticker;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
