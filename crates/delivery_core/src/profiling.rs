//! Tick timing and cumulative courier counters.

use std::time::Duration;

use bevy_ecs::prelude::Resource;
use serde::Serialize;

use crate::courier::TickReport;

/// Wall-clock timing of executed ticks.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TickTiming {
    pub total_duration: Duration,
    pub call_count: u64,
    pub min_duration: Duration,
    pub max_duration: Duration,
}

impl TickTiming {
    pub fn record(&mut self, duration: Duration) {
        self.total_duration += duration;
        self.call_count += 1;
        if duration < self.min_duration || self.min_duration == Duration::ZERO {
            self.min_duration = duration;
        }
        if duration > self.max_duration {
            self.max_duration = duration;
        }
    }

    pub fn avg_duration(&self) -> Duration {
        if self.call_count == 0 {
            Duration::ZERO
        } else {
            let avg_nanos = self.total_duration.as_nanos() / self.call_count as u128;
            Duration::from_nanos(avg_nanos as u64)
        }
    }
}

/// ECS resource accumulating every tick's report.
#[derive(Debug, Clone, Default, Resource, Serialize)]
pub struct TickStats {
    pub ticks: u64,
    pub last_report: TickReport,
    pub totals: TickReport,
    pub timing: TickTiming,
}

impl TickStats {
    pub fn record_report(&mut self, report: TickReport) {
        self.ticks += 1;
        self.last_report = report;
        self.totals.accumulate(&report);
    }

    pub fn record_duration(&mut self, duration: Duration) {
        self.timing.record(duration);
    }

    pub fn summary(&self) -> String {
        format!(
            "ticks={} active={} routes_fetched={} fallback_routes={} position_updates={} \
             evicted={} failures={} avg_tick={:?} max_tick={:?}",
            self.ticks,
            self.totals.active,
            self.totals.routes_fetched,
            self.totals.fallback_routes,
            self.totals.position_updates,
            self.totals.evicted,
            self.totals.failures,
            self.timing.avg_duration(),
            self.timing.max_duration,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_tracks_min_max_avg() {
        let mut timing = TickTiming::default();
        timing.record(Duration::from_millis(10));
        timing.record(Duration::from_millis(30));

        assert_eq!(timing.call_count, 2);
        assert_eq!(timing.min_duration, Duration::from_millis(10));
        assert_eq!(timing.max_duration, Duration::from_millis(30));
        assert_eq!(timing.avg_duration(), Duration::from_millis(20));
    }

    #[test]
    fn reports_accumulate_counters() {
        let mut stats = TickStats::default();
        stats.record_report(TickReport {
            active: 2,
            position_updates: 2,
            routes_fetched: 2,
            ..TickReport::default()
        });
        stats.record_report(TickReport {
            active: 1,
            evicted: 1,
            position_updates: 1,
            ..TickReport::default()
        });

        assert_eq!(stats.ticks, 2);
        assert_eq!(stats.totals.active, 1);
        assert_eq!(stats.totals.position_updates, 3);
        assert_eq!(stats.totals.routes_fetched, 2);
        assert_eq!(stats.totals.evicted, 1);
    }
}
