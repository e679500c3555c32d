//! CLI wrapper: load an instance, run the dispatch simulation, emit reports.
//!
//! Usage: `dispatch_runner <instance>` where `<instance>` is a synthetic
//! orders CSV or a benchmark instance directory. Routing defaults to the
//! Euclidean backend; `USE_EUCLIDEAN` / `METERS_PER_MINUTE` / `OSRM_ENDPOINT`
//! environment variables (or the matching flags) control the oracle.

mod kpi;
mod loader;

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use bevy_ecs::prelude::World;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use dispatch_core::pay::PayConfig;
use dispatch_core::report::{collect_courier_rows, collect_order_rows, DispatchTelemetry};
use dispatch_core::report_export::{write_couriers_parquet, write_orders_parquet};
use dispatch_core::routing::RouteProviderKind;
use dispatch_core::runner::{initialize_simulation, run_until_empty, simulation_schedule};
use dispatch_core::scenario::{build_scenario, DispatchConfig, DispatchPolicy, ScenarioParams};

const MAX_STEPS: usize = 10_000_000;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Rolling-horizon bundling and matching.
    RollingHorizon,
    /// First-come-first-served nearest-courier baseline.
    Fcfs,
}

impl From<PolicyArg> for DispatchPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::RollingHorizon => DispatchPolicy::RollingHorizon,
            PolicyArg::Fcfs => DispatchPolicy::NearestCourier,
        }
    }
}

fn parse_flag(raw: &str) -> Result<bool, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "" | "0" | "false" | "no" => Ok(false),
        other => Err(format!("expected a boolean-ish value, got {other:?}")),
    }
}

/// Meal-delivery dispatch simulator.
#[derive(Debug, Parser)]
#[command(name = "dispatch_runner")]
struct Cli {
    /// Instance to simulate: a synthetic orders CSV file or a benchmark
    /// instance directory.
    instance: PathBuf,

    /// Dispatch policy.
    #[arg(long, value_enum, default_value_t = PolicyArg::RollingHorizon)]
    policy: PolicyArg,

    /// Output directory for the report tables.
    #[arg(long, default_value = "results")]
    out: PathBuf,

    /// Force the Euclidean routing backend even when an OSRM endpoint is set.
    #[arg(long, env = "USE_EUCLIDEAN", value_parser = parse_flag, default_value = "false")]
    use_euclidean: bool,

    /// Straight-line speed for the Euclidean backend (overrides the instance).
    #[arg(long, env = "METERS_PER_MINUTE")]
    meters_per_minute: Option<f64>,

    /// OSRM endpoint, e.g. http://localhost:5000 (requires the `osrm` build).
    #[arg(long, env = "OSRM_ENDPOINT")]
    osrm_endpoint: Option<String>,

    /// Fleet size synthesized for courier-less instances.
    #[arg(long, default_value_t = 5)]
    couriers: usize,

    /// Seed for synthesized fleet placement.
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

/// Echo of the effective run configuration, written next to the tables.
#[derive(Debug, Serialize)]
struct RunParams<'a> {
    instance: String,
    policy: DispatchPolicy,
    route_provider: &'a RouteProviderKind,
    config: &'a DispatchConfig,
    pay: &'a PayConfig,
    restaurants: usize,
    orders: usize,
    couriers: usize,
}

fn resolve_route_provider(cli: &Cli, params: &mut ScenarioParams) {
    if let Some(meters_per_minute) = cli.meters_per_minute {
        params.route_provider_kind = RouteProviderKind::Euclidean { meters_per_minute };
    }

    #[cfg(feature = "osrm")]
    if !cli.use_euclidean {
        if let Some(endpoint) = &cli.osrm_endpoint {
            let meters_per_minute = match &params.route_provider_kind {
                RouteProviderKind::Euclidean { meters_per_minute } => *meters_per_minute,
                RouteProviderKind::Osrm {
                    meters_per_minute, ..
                } => *meters_per_minute,
            };
            params.route_provider_kind = RouteProviderKind::Osrm {
                endpoint: endpoint.clone(),
                meters_per_minute,
                fallback_to_euclidean: true,
            };
        }
    }

    #[cfg(not(feature = "osrm"))]
    if cli.osrm_endpoint.is_some() && !cli.use_euclidean {
        tracing::warn!("built without the `osrm` feature; using the euclidean backend");
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut params = loader::load_instance(&cli.instance, cli.couriers, cli.seed)
        .with_context(|| format!("loading instance {}", cli.instance.display()))?;
    params.policy = cli.policy.into();
    resolve_route_provider(&cli, &mut params);

    let run_params = RunParams {
        instance: cli.instance.display().to_string(),
        policy: params.policy,
        route_provider: &params.route_provider_kind,
        config: &params.config,
        pay: &params.pay,
        restaurants: params.restaurants.len(),
        orders: params.orders.len(),
        couriers: params.couriers.len(),
    };
    tracing::info!(
        orders = run_params.orders,
        couriers = run_params.couriers,
        restaurants = run_params.restaurants,
        policy = ?run_params.policy,
        "instance loaded"
    );
    let run_params_json = serde_json::to_string_pretty(&run_params)?;

    let pay = params.pay;
    let mut world = World::new();
    build_scenario(&mut world, params).context("building scenario")?;
    initialize_simulation(&mut world);

    let mut schedule = simulation_schedule();
    let steps = run_until_empty(&mut world, &mut schedule, MAX_STEPS);
    let telemetry = world.resource::<DispatchTelemetry>().clone();
    tracing::info!(
        steps,
        dispatch_runs = telemetry.dispatch_runs,
        final_commitments = telemetry.final_commitments,
        partial_commitments = telemetry.partial_commitments,
        orders_delivered = telemetry.orders_delivered,
        "simulation finished"
    );

    let order_rows = collect_order_rows(&mut world);
    let courier_rows = collect_courier_rows(&mut world);

    fs::create_dir_all(&cli.out)
        .with_context(|| format!("creating output directory {}", cli.out.display()))?;
    fs::write(cli.out.join("params.json"), run_params_json)?;

    let orders_csv = cli.out.join("orders.csv");
    let mut writer = csv::Writer::from_path(&orders_csv)
        .with_context(|| format!("writing {}", orders_csv.display()))?;
    for row in &order_rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    let couriers_csv = cli.out.join("couriers.csv");
    let mut writer = csv::Writer::from_path(&couriers_csv)
        .with_context(|| format!("writing {}", couriers_csv.display()))?;
    for row in &courier_rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    write_orders_parquet(cli.out.join("orders.parquet"), &order_rows)
        .map_err(|e| anyhow::anyhow!("writing orders parquet: {e}"))?;
    write_couriers_parquet(cli.out.join("couriers.parquet"), &courier_rows)
        .map_err(|e| anyhow::anyhow!("writing couriers parquet: {e}"))?;

    println!("{}", kpi::compute_kpis(&order_rows, &courier_rows, &pay));
    Ok(())
}
