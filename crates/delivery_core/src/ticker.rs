//! Wall-clock driver for [`CourierRunner`].
//!
//! A background thread runs one tick per period. The runner sits behind a
//! mutex; a tick that finds it locked (a previous tick, or a manual caller, is
//! still running) is skipped rather than queued.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, TryLockError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info};

use crate::courier::TickReport;
use crate::runner::CourierRunner;

/// What happened when a tick was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickAttempt {
    Ran(TickReport),
    /// Another tick held the runner.
    Skipped,
    /// A previous tick panicked while holding the runner.
    Poisoned,
}

/// Run a tick unless one is already in progress.
pub fn try_run_tick(runner: &Mutex<CourierRunner>) -> TickAttempt {
    match runner.try_lock() {
        Ok(mut runner) => TickAttempt::Ran(runner.run_tick()),
        Err(TryLockError::WouldBlock) => TickAttempt::Skipped,
        Err(TryLockError::Poisoned(_)) => TickAttempt::Poisoned,
    }
}

/// Background thread ticking a shared runner at a fixed period.
pub struct CourierTicker {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    skipped: Arc<AtomicU64>,
}

impl CourierTicker {
    pub fn spawn(runner: Arc<Mutex<CourierRunner>>, period: Duration) -> std::io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let skipped = Arc::new(AtomicU64::new(0));
        let skipped_counter = Arc::clone(&skipped);

        let handle = thread::Builder::new()
            .name("courier-ticker".to_string())
            .spawn(move || {
                info!(period_ms = period.as_millis() as u64, "courier ticker started");
                loop {
                    match stop_rx.recv_timeout(period) {
                        Err(RecvTimeoutError::Timeout) => {}
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                    match try_run_tick(&runner) {
                        TickAttempt::Ran(_) => {}
                        TickAttempt::Skipped => {
                            skipped_counter.fetch_add(1, Ordering::Relaxed);
                            debug!("previous courier tick still running, skipping");
                        }
                        TickAttempt::Poisoned => {
                            error!("courier runner poisoned by a panicked tick, stopping ticker");
                            break;
                        }
                    }
                }
                info!("courier ticker stopped");
            })?;

        Ok(Self {
            stop: Some(stop_tx),
            handle: Some(handle),
            skipped,
        })
    }

    /// Ticks skipped because the runner was busy.
    pub fn skipped_ticks(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    /// Stop the thread and wait for an in-flight tick to finish.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("courier ticker thread panicked");
            }
        }
    }
}

impl Drop for CourierTicker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CourierConfig;
    use crate::orders::{ActiveDelivery, InMemoryOrderBook, OrderId};
    use crate::test_helpers::{straight_path, StaticRouteProvider, TEST_CUSTOMER, TEST_STORE};

    fn runner_with_one_order() -> (Arc<Mutex<CourierRunner>>, Arc<InMemoryOrderBook>) {
        let router = Arc::new(StaticRouteProvider::with_geometry(straight_path(
            TEST_STORE,
            TEST_CUSTOMER,
            10,
        )));
        let orders = Arc::new(InMemoryOrderBook::from_deliveries([ActiveDelivery {
            order_id: OrderId(1),
            store_location: Some(TEST_STORE),
            delivery_location: Some(TEST_CUSTOMER),
            courier_position: Some(TEST_STORE),
        }]));
        let runner = CourierRunner::new(&CourierConfig::default(), router, orders.clone());
        (Arc::new(Mutex::new(runner)), orders)
    }

    #[test]
    fn tick_is_skipped_while_runner_is_busy() {
        let (runner, orders) = runner_with_one_order();

        let guard = runner.lock().expect("lock");
        assert_eq!(try_run_tick(&runner), TickAttempt::Skipped);
        drop(guard);

        assert!(matches!(try_run_tick(&runner), TickAttempt::Ran(_)));
        assert_eq!(orders.published_count(OrderId(1)), 1);
    }

    #[test]
    fn ticker_runs_until_stopped() {
        let (runner, orders) = runner_with_one_order();
        let ticker = CourierTicker::spawn(Arc::clone(&runner), Duration::from_millis(5))
            .expect("spawn ticker");

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while orders.published_count(OrderId(1)) < 3 && std::time::Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        ticker.stop();

        assert_eq!(orders.published_count(OrderId(1)), 3);
        let runner = runner.lock().expect("lock");
        assert_eq!(runner.simulator().cursor(OrderId(1)), Some(9));
    }
}
