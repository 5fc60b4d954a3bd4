use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use delivery_core::config::DeliveryConfig;
use delivery_core::courier::CourierPhase;
use delivery_core::geo::GeoPoint;
use delivery_core::orders::{ActiveDelivery, InMemoryOrderBook, OrderId};
use delivery_core::profiling::TickStats;
use delivery_core::ranking::{DeliveryMetricsRanker, Store};
use delivery_core::routing::{
    DistanceMatrixGateway, GeometryDetail, RouteOutcome, RouteResult, RoutingGateway,
};
use delivery_core::runner::CourierRunner;
use delivery_core::ticker::CourierTicker;

// ── CLI definition ─────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "delivery",
    about = "Route, rank and simulate deliveries against an OSRM-compatible provider"
)]
struct Cli {
    /// JSON config file; environment variables override it
    #[arg(long, env = "DELIVERY_CONFIG")]
    config: Option<PathBuf>,
    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route between two points, falling back to a great-circle estimate
    Route {
        /// Origin as LAT,LON
        #[arg(long)]
        from: GeoPoint,
        /// Destination as LAT,LON
        #[arg(long)]
        to: GeoPoint,
        /// Request the full route geometry
        #[arg(long)]
        full: bool,
    },
    /// Rank stores by estimated delivery time to a customer
    Rank {
        /// JSON array of stores
        #[arg(long)]
        stores: PathBuf,
        /// Customer location as LAT,LON; declared ETAs are used without it
        #[arg(long)]
        customer: Option<GeoPoint>,
        /// Maximum stores to return, 0 for all
        #[arg(long, default_value_t = 0)]
        limit: usize,
    },
    /// Move couriers along their routes for a number of ticks
    Simulate {
        /// JSON array of orders out for delivery
        #[arg(long)]
        orders: PathBuf,
        #[arg(long, default_value_t = 10)]
        ticks: usize,
        /// Tick on the configured wall-clock interval instead of back to back
        #[arg(long)]
        realtime: bool,
    },
}

// ── Output ─────────────────────────────────────────────────────────

#[derive(Serialize)]
struct RouteOutput {
    source: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_cause: Option<String>,
    route: RouteResult,
}

#[derive(Serialize)]
struct RankedOutput<'a> {
    id: &'a str,
    name: &'a str,
    distance_km: f64,
    /// `None` when the store cannot be located or reached.
    estimated_minutes: Option<u32>,
    is_fallback: bool,
}

#[derive(Serialize)]
struct CourierOutput {
    order_id: OrderId,
    phase: CourierPhase,
    cursor: Option<usize>,
    path_len: Option<usize>,
    position: Option<GeoPoint>,
}

#[derive(Serialize)]
struct SimulateOutput {
    couriers: Vec<CourierOutput>,
    stats: TickStats,
}

// ── Entry point ────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let config = DeliveryConfig::load(cli.config.as_deref()).context("loading config")?;
    info!(endpoint = %config.routing.endpoint, profile = %config.routing.profile, "config loaded");

    match cli.command {
        Commands::Route { from, to, full } => run_route(&config, from, to, full),
        Commands::Rank {
            stores,
            customer,
            limit,
        } => run_rank(&config, &stores, customer, limit),
        Commands::Simulate {
            orders,
            ticks,
            realtime,
        } => run_simulate(&config, &orders, ticks, realtime),
    }
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn run_route(config: &DeliveryConfig, from: GeoPoint, to: GeoPoint, full: bool) -> Result<()> {
    let gateway = RoutingGateway::new(&config.routing)?;
    let detail = if full {
        GeometryDetail::Full
    } else {
        GeometryDetail::Summary
    };

    let output = match gateway.resolve(from, to, detail) {
        RouteOutcome::Provider(route) => RouteOutput {
            source: "provider",
            fallback_cause: None,
            route,
        },
        RouteOutcome::Fallback { route, cause } => RouteOutput {
            source: "fallback",
            fallback_cause: Some(cause.to_string()),
            route,
        },
    };
    print_json(&output)
}

fn run_rank(
    config: &DeliveryConfig,
    stores_path: &Path,
    customer: Option<GeoPoint>,
    limit: usize,
) -> Result<()> {
    let stores: Vec<Store> = read_json(stores_path)?;
    let ranker = DeliveryMetricsRanker::new(
        Arc::new(RoutingGateway::new(&config.routing)?),
        Arc::new(DistanceMatrixGateway::new(&config.routing)?),
        config.ranking.clone(),
    );

    let ranked = ranker.rank_by_delivery_time(&stores, customer, limit);
    let output: Vec<RankedOutput<'_>> = ranked
        .iter()
        .map(|entry| RankedOutput {
            id: &entry.store.id,
            name: &entry.store.name,
            distance_km: entry.metrics.distance_km,
            estimated_minutes: entry
                .metrics
                .is_known()
                .then_some(entry.metrics.estimated_minutes),
            is_fallback: entry.metrics.is_fallback,
        })
        .collect();
    print_json(&output)
}

fn run_simulate(
    config: &DeliveryConfig,
    orders_path: &Path,
    ticks: usize,
    realtime: bool,
) -> Result<()> {
    let deliveries: Vec<ActiveDelivery> = read_json(orders_path)?;
    let order_ids: Vec<OrderId> = deliveries.iter().map(|d| d.order_id).collect();
    let book = Arc::new(InMemoryOrderBook::from_deliveries(deliveries));
    let router = Arc::new(RoutingGateway::new(&config.routing)?);
    let runner = CourierRunner::new(&config.courier, router, book.clone());

    let runner = if realtime {
        let interval = config.courier.tick_interval();
        let run_for = realtime_duration(interval, ticks)?;
        let shared = Arc::new(Mutex::new(runner));
        let ticker = CourierTicker::spawn(Arc::clone(&shared), interval)
            .context("starting courier ticker")?;
        thread::sleep(run_for);
        let skipped = ticker.skipped_ticks();
        ticker.stop();
        info!(skipped, "courier ticker finished");
        Arc::try_unwrap(shared)
            .map_err(|_| anyhow!("courier runner still shared after ticker stopped"))?
            .into_inner()
            .map_err(|_| anyhow!("courier runner poisoned"))?
    } else {
        let mut runner = runner;
        runner.run_ticks(ticks);
        runner
    };

    info!(summary = %runner.stats().summary(), "simulation finished");

    let simulator = runner.simulator();
    let couriers = order_ids
        .into_iter()
        .map(|order_id| CourierOutput {
            order_id,
            phase: simulator.phase(order_id),
            cursor: simulator.cursor(order_id),
            path_len: simulator.path_len(order_id),
            position: book.get(order_id).and_then(|d| d.courier_position),
        })
        .collect();
    print_json(&SimulateOutput {
        couriers,
        stats: runner.stats().clone(),
    })
}

// ── Helpers ────────────────────────────────────────────────────────

/// Wall-clock time for `ticks` periods plus half a period.
fn realtime_duration(interval: Duration, ticks: usize) -> Result<Duration> {
    u32::try_from(ticks)
        .ok()
        .and_then(|ticks| interval.checked_mul(ticks))
        .and_then(|total| total.checked_add(interval / 2))
        .ok_or_else(|| anyhow!("{ticks} ticks of {interval:?} is too long to run in real time"))
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
