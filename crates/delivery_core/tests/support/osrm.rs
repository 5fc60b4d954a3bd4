//! In-process OSRM stand-in backed by wiremock.
//!
//! wiremock serves from its own thread, so the blocking gateways can be called
//! from the test thread while this runtime is idle.

use delivery_core::config::RoutingConfig;
use tokio::runtime::{Builder, Runtime};
use wiremock::{Mock, MockServer, Request};

// `server` is declared first so it is dropped while the runtime is still alive.
pub struct MockOsrm {
    server: MockServer,
    runtime: Runtime,
}

impl MockOsrm {
    pub fn start() -> Self {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("test runtime");
        let server = runtime.block_on(MockServer::start());
        Self { server, runtime }
    }

    pub fn mount(&self, mock: Mock) {
        self.runtime.block_on(mock.mount(&self.server));
    }

    pub fn received_requests(&self) -> Vec<Request> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
    }

    pub fn routing_config(&self) -> RoutingConfig {
        RoutingConfig::with_endpoint(&self.server.uri())
    }
}

/// An endpoint nothing listens on.
pub fn unreachable_config() -> RoutingConfig {
    RoutingConfig {
        request_timeout_ms: 500,
        ..RoutingConfig::with_endpoint("http://127.0.0.1:9")
    }
}
