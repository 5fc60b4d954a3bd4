//! Courier runner: owns the ECS world and runs the courier schedule one tick
//! at a time.
//!
//! The runner does not know about wall-clock time. Tests and the CLI call
//! [`CourierRunner::run_tick`] directly; [`crate::ticker::CourierTicker`]
//! calls it on a fixed period.

use std::sync::Arc;
use std::time::Instant;

use bevy_ecs::prelude::{Schedule, World};

use crate::config::CourierConfig;
use crate::courier::{CourierSimulator, TickReport};
use crate::orders::{OrderBook, OrderBookResource};
use crate::profiling::TickStats;
use crate::routing::{RouteProvider, RouteProviderResource};
use crate::systems::courier_tick_system;

pub struct CourierRunner {
    world: World,
    schedule: Schedule,
}

impl CourierRunner {
    pub fn new(
        config: &CourierConfig,
        router: Arc<dyn RouteProvider>,
        orders: Arc<dyn OrderBook>,
    ) -> Self {
        let mut world = World::new();
        world.insert_resource(CourierSimulator::new(config));
        world.insert_resource(RouteProviderResource(router));
        world.insert_resource(OrderBookResource(orders));
        world.insert_resource(TickStats::default());

        let mut schedule = Schedule::default();
        schedule.add_systems(courier_tick_system);

        Self { world, schedule }
    }

    /// Run one courier pass and return its report.
    pub fn run_tick(&mut self) -> TickReport {
        let started = Instant::now();
        self.schedule.run(&mut self.world);
        let elapsed = started.elapsed();

        let mut stats = self.world.resource_mut::<TickStats>();
        stats.record_duration(elapsed);
        stats.last_report
    }

    /// Run `ticks` passes back to back.
    pub fn run_ticks(&mut self, ticks: usize) -> &TickStats {
        for _ in 0..ticks {
            self.run_tick();
        }
        self.stats()
    }

    pub fn stats(&self) -> &TickStats {
        self.world.resource::<TickStats>()
    }

    pub fn simulator(&self) -> &CourierSimulator {
        self.world.resource::<CourierSimulator>()
    }
}
