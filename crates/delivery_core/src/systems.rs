//! ECS systems run by the courier schedule.

use bevy_ecs::prelude::{Res, ResMut};

use crate::courier::CourierSimulator;
use crate::orders::OrderBookResource;
use crate::profiling::TickStats;
use crate::routing::RouteProviderResource;

/// One courier pass over the active deliveries.
pub fn courier_tick_system(
    mut simulator: ResMut<CourierSimulator>,
    router: Res<RouteProviderResource>,
    orders: Res<OrderBookResource>,
    mut stats: ResMut<TickStats>,
) {
    let report = simulator.tick(router.0.as_ref(), orders.0.as_ref());
    stats.record_report(report);
}
