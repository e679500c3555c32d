//! Instance loaders.
//!
//! Two formats:
//!
//! - **Synthetic CSV**: one file with order rows carrying restaurant and
//!   dropoff coordinates and minute-resolution timestamps. The dataset has no
//!   couriers, so a small fleet is synthesized around the restaurant centroid.
//! - **Benchmark directory**: tab-separated `orders.txt`, `restaurants.txt`,
//!   `couriers.txt`, and `instance_parameters.txt` with planar x/y
//!   coordinates, mapped to lat/lon by an affine transform over a fixed
//!   bounding box. Instance parameters override the pay and dispatch
//!   configuration.

use std::collections::BTreeMap;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use thiserror::Error;

use dispatch_core::clock::{ONE_HOUR_MS, ONE_MIN_MS};
use dispatch_core::routing::RouteProviderKind;
use dispatch_core::scenario::{CourierSpec, OrderSpec, RestaurantSpec, ScenarioParams};
use dispatch_core::spatial::Coord;

/// Range of x/y in the benchmark dataset's planar coordinates.
const X_MIN: f64 = 0.0;
const X_MAX: f64 = 35_124.0;
const Y_MIN: f64 = 0.0;
const Y_MAX: f64 = 54_766.0;

/// Bounding box the planar instances are mapped into (La Paz, B.C.S.).
const LAT_MIN: f64 = 24.0976;
const LAT_MAX: f64 = 24.1876;
const LON_MIN: f64 = -110.3624;
const LON_MAX: f64 = -110.2636;

/// Synthesized fleet shift padding: couriers come on this long before the
/// first placement and stay an hour past the last ready time.
const FLEET_LEAD_MINS: f64 = 15.0;

/// Jitter applied to synthesized courier start positions, in degrees.
const FLEET_JITTER_DEG: f64 = 0.002;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("failed to parse {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("instance {0} contains no orders")]
    EmptyInstance(String),
}

/// Affine transform from benchmark planar coordinates to lat/lon.
fn xy_to_latlon(x: f64, y: f64) -> Coord {
    let lon = LON_MIN + (x - X_MIN) / (X_MAX - X_MIN) * (LON_MAX - LON_MIN);
    let lat = LAT_MIN + (y - Y_MIN) / (Y_MAX - Y_MIN) * (LAT_MAX - LAT_MIN);
    Coord::new(lat, lon)
}

/// Benchmark ids look like `o12`/`r3`/`c7`; keep the digits.
fn parse_id(raw: &str) -> u64 {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

fn mins_to_ms(mins: f64) -> u64 {
    (mins * ONE_MIN_MS as f64).round().max(0.0) as u64
}

/// Load an instance: a directory is treated as a benchmark instance, a file
/// as a synthetic orders CSV.
pub fn load_instance(
    path: &Path,
    fleet_size: usize,
    seed: u64,
) -> Result<ScenarioParams, LoaderError> {
    if path.is_dir() {
        load_benchmark_instance(path)
    } else {
        load_synth_instance(path, fleet_size, seed)
    }
}

// ---------------------------------------------------------------------------
// Synthetic CSV
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SynthOrderRow {
    order_id: u64,
    restaurant_id: u64,
    /// Placement time in minutes.
    created_at: f64,
    /// Kitchen-ready time in minutes.
    ready_at: f64,
    rest_lat: f64,
    rest_lon: f64,
    dest_lat: f64,
    dest_lon: f64,
}

/// Load the synthetic orders CSV and synthesize a courier fleet.
pub fn load_synth_instance(
    path: &Path,
    fleet_size: usize,
    seed: u64,
) -> Result<ScenarioParams, LoaderError> {
    let display = path.display().to_string();
    let mut reader = csv::Reader::from_path(path).map_err(|source| LoaderError::Csv {
        path: display.clone(),
        source,
    })?;

    let mut rows: Vec<SynthOrderRow> = Vec::new();
    for record in reader.deserialize() {
        rows.push(record.map_err(|source| LoaderError::Csv {
            path: display.clone(),
            source,
        })?);
    }
    if rows.is_empty() {
        return Err(LoaderError::EmptyInstance(display));
    }

    // Shift the timeline so the synthesized fleet's shift start is t = 0.
    let first_placement = rows
        .iter()
        .map(|r| r.created_at)
        .fold(f64::INFINITY, f64::min);
    let last_ready = rows.iter().map(|r| r.ready_at).fold(0.0, f64::max);
    let origin_mins = first_placement - FLEET_LEAD_MINS;

    let mut restaurants: BTreeMap<u64, RestaurantSpec> = BTreeMap::new();
    for row in &rows {
        restaurants
            .entry(row.restaurant_id)
            .or_insert_with(|| RestaurantSpec {
                id: row.restaurant_id,
                location: Coord::new(row.rest_lat, row.rest_lon),
            });
    }

    let orders: Vec<OrderSpec> = rows
        .iter()
        .map(|row| OrderSpec {
            id: row.order_id,
            restaurant_id: row.restaurant_id,
            placement_time_ms: mins_to_ms(row.created_at - origin_mins),
            ready_time_ms: mins_to_ms(row.ready_at - origin_mins),
            dropoff: Coord::new(row.dest_lat, row.dest_lon),
        })
        .collect();

    // The dataset records no couriers: put a small fleet near the restaurant
    // centroid, on shift from t = 0 until an hour past the last ready time.
    let centroid_lat =
        restaurants.values().map(|r| r.location.lat).sum::<f64>() / restaurants.len() as f64;
    let centroid_lon =
        restaurants.values().map(|r| r.location.lon).sum::<f64>() / restaurants.len() as f64;
    let off_time_ms = mins_to_ms(last_ready - origin_mins) + ONE_HOUR_MS;

    let mut rng = StdRng::seed_from_u64(seed);
    let couriers: Vec<CourierSpec> = (0..fleet_size)
        .map(|i| CourierSpec {
            id: i as u64 + 1,
            on_time_ms: 0,
            off_time_ms,
            start_location: Coord::new(
                centroid_lat + rng.gen_range(-FLEET_JITTER_DEG..=FLEET_JITTER_DEG),
                centroid_lon + rng.gen_range(-FLEET_JITTER_DEG..=FLEET_JITTER_DEG),
            ),
        })
        .collect();

    Ok(ScenarioParams {
        restaurants: restaurants.into_values().collect(),
        orders,
        couriers,
        ..Default::default()
    })
}

// ---------------------------------------------------------------------------
// Benchmark directory
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct BenchmarkOrderRow {
    order: String,
    x: f64,
    y: f64,
    placement_time: f64,
    ready_time: f64,
    restaurant: String,
}

#[derive(Debug, Deserialize)]
struct BenchmarkRestaurantRow {
    restaurant: String,
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct BenchmarkCourierRow {
    courier: String,
    x: f64,
    y: f64,
    on_time: f64,
    off_time: f64,
}

fn read_table<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, LoaderError> {
    let display = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LoaderError::Csv {
            path: display.clone(),
            source,
        })?;
    let mut rows = Vec::new();
    for record in reader.deserialize() {
        rows.push(record.map_err(|source| LoaderError::Csv {
            path: display.clone(),
            source,
        })?);
    }
    Ok(rows)
}

/// Parameter table: a single record of named numeric columns.
fn read_instance_parameters(path: &Path) -> Result<Vec<(String, f64)>, LoaderError> {
    let display = path.display().to_string();
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| LoaderError::Csv {
            path: display.clone(),
            source,
        })?;
    let headers = reader
        .headers()
        .map_err(|source| LoaderError::Csv {
            path: display.clone(),
            source,
        })?
        .clone();
    let mut values = Vec::new();
    if let Some(record) = reader.records().next() {
        let record = record.map_err(|source| LoaderError::Csv {
            path: display.clone(),
            source,
        })?;
        for (name, field) in headers.iter().zip(record.iter()) {
            if let Ok(value) = field.parse::<f64>() {
                values.push((name.to_string(), value));
            }
        }
    }
    Ok(values)
}

fn lookup(params: &[(String, f64)], key_prefix: &str) -> Option<f64> {
    params
        .iter()
        .find(|(name, _)| name.starts_with(key_prefix))
        .map(|(_, value)| *value)
}

/// Load a tab-separated benchmark instance directory.
pub fn load_benchmark_instance(dir: &Path) -> Result<ScenarioParams, LoaderError> {
    let order_rows: Vec<BenchmarkOrderRow> = read_table(&dir.join("orders.txt"))?;
    let restaurant_rows: Vec<BenchmarkRestaurantRow> = read_table(&dir.join("restaurants.txt"))?;
    let courier_rows: Vec<BenchmarkCourierRow> = read_table(&dir.join("couriers.txt"))?;
    if order_rows.is_empty() {
        return Err(LoaderError::EmptyInstance(dir.display().to_string()));
    }

    let restaurants: Vec<RestaurantSpec> = restaurant_rows
        .iter()
        .map(|row| RestaurantSpec {
            id: parse_id(&row.restaurant),
            location: xy_to_latlon(row.x, row.y),
        })
        .collect();

    let orders: Vec<OrderSpec> = order_rows
        .iter()
        .map(|row| OrderSpec {
            id: parse_id(&row.order),
            restaurant_id: parse_id(&row.restaurant),
            placement_time_ms: mins_to_ms(row.placement_time),
            ready_time_ms: mins_to_ms(row.ready_time),
            dropoff: xy_to_latlon(row.x, row.y),
        })
        .collect();

    let couriers: Vec<CourierSpec> = courier_rows
        .iter()
        .map(|row| CourierSpec {
            id: parse_id(&row.courier),
            on_time_ms: mins_to_ms(row.on_time),
            off_time_ms: mins_to_ms(row.off_time),
            start_location: xy_to_latlon(row.x, row.y),
        })
        .collect();

    let mut params = ScenarioParams {
        restaurants,
        orders,
        couriers,
        ..Default::default()
    };

    // Instance parameters override the defaults where present.
    let overrides = read_instance_parameters(&dir.join("instance_parameters.txt"))?;
    if let Some(value) = lookup(&overrides, "pay per order") {
        params.pay.pay_per_order = value;
    }
    if let Some(value) = lookup(&overrides, "guaranteed pay per hour") {
        params.pay.guaranteed_hourly = value;
    }
    if let Some(value) = lookup(&overrides, "pickup service minutes") {
        params.config.service_time_ms = mins_to_ms(value);
    }
    if let Some(value) = lookup(&overrides, "target click-to-door") {
        params.config.target_click_to_door_ms = mins_to_ms(value);
    }
    if let Some(value) = lookup(&overrides, "maximum click-to-door") {
        params.config.max_click_to_door_ms = mins_to_ms(value);
    }
    if let Some(value) = lookup(&overrides, "meters_per_minute") {
        params.route_provider_kind = RouteProviderKind::Euclidean {
            meters_per_minute: value,
        };
    }

    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SYNTH_CSV: &str = "\
order_id,restaurant_id,created_at,ready_at,rest_lat,rest_lon,dest_lat,dest_lon
0,3,660.0,668.0,24.14,-110.31,24.15,-110.30
1,3,662.0,671.0,24.14,-110.31,24.13,-110.32
2,5,665.0,673.0,24.16,-110.29,24.17,-110.28
";

    #[test]
    fn synth_loader_builds_a_shifted_instance_with_a_fleet() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("orders.csv");
        fs::write(&path, SYNTH_CSV).expect("write csv");

        let params = load_synth_instance(&path, 5, 42).expect("load");
        assert_eq!(params.orders.len(), 3);
        assert_eq!(params.restaurants.len(), 2);
        assert_eq!(params.couriers.len(), 5);

        // First placement (minute 660) lands 15 minutes into the timeline.
        assert_eq!(params.orders[0].placement_time_ms, 15 * ONE_MIN_MS);
        assert_eq!(params.orders[0].ready_time_ms, 23 * ONE_MIN_MS);

        // Fleet is on shift from t = 0 to an hour past the last ready time.
        let last_ready_ms = (673.0_f64 - 645.0) as u64 * ONE_MIN_MS;
        for courier in &params.couriers {
            assert_eq!(courier.on_time_ms, 0);
            assert_eq!(courier.off_time_ms, last_ready_ms + ONE_HOUR_MS);
        }

        // Couriers are jittered around the restaurant centroid.
        for courier in &params.couriers {
            assert!((courier.start_location.lat - 24.15).abs() < 0.02);
            assert!((courier.start_location.lon + 110.30).abs() < 0.02);
        }

        params.validate().expect("valid instance");
    }

    #[test]
    fn synth_loader_is_deterministic_per_seed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("orders.csv");
        fs::write(&path, SYNTH_CSV).expect("write csv");

        let first = load_synth_instance(&path, 3, 7).expect("load");
        let second = load_synth_instance(&path, 3, 7).expect("load");
        assert_eq!(format!("{:?}", first.couriers), format!("{:?}", second.couriers));

        let other_seed = load_synth_instance(&path, 3, 8).expect("load");
        assert_ne!(
            format!("{:?}", first.couriers),
            format!("{:?}", other_seed.couriers)
        );
    }

    #[test]
    fn benchmark_loader_reads_tables_and_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("orders.txt"),
            "order\tx\ty\tplacement_time\tready_time\trestaurant\no1\t17562\t27383\t10\t20\tr1\n",
        )
        .expect("orders");
        fs::write(
            dir.path().join("restaurants.txt"),
            "restaurant\tx\ty\nr1\t17562\t27383\n",
        )
        .expect("restaurants");
        fs::write(
            dir.path().join("couriers.txt"),
            "courier\tx\ty\ton_time\toff_time\nc1\t17562\t27383\t0\t480\n",
        )
        .expect("couriers");
        fs::write(
            dir.path().join("instance_parameters.txt"),
            "pay per order\tguaranteed pay per hour\tpickup service minutes\ttarget click-to-door time (minutes)\tmaximum click-to-door time (minutes)\tmeters_per_minute\n12.5\t18\t6\t35\t80\t400\n",
        )
        .expect("params");

        let params = load_benchmark_instance(dir.path()).expect("load");
        assert_eq!(params.orders.len(), 1);
        assert_eq!(params.orders[0].id, 1);
        assert_eq!(params.orders[0].restaurant_id, 1);
        assert_eq!(params.orders[0].placement_time_ms, 10 * ONE_MIN_MS);
        assert_eq!(params.couriers[0].off_time_ms, 480 * ONE_MIN_MS);

        // Mid-plane x/y maps to the middle of the bounding box.
        let loc = params.restaurants[0].location;
        assert!((loc.lat - (LAT_MIN + LAT_MAX) / 2.0).abs() < 1e-3);
        assert!((loc.lon - (LON_MIN + LON_MAX) / 2.0).abs() < 1e-3);

        assert_eq!(params.pay.pay_per_order, 12.5);
        assert_eq!(params.pay.guaranteed_hourly, 18.0);
        assert_eq!(params.config.service_time_ms, 6 * ONE_MIN_MS);
        assert_eq!(params.config.target_click_to_door_ms, 35 * ONE_MIN_MS);
        assert_eq!(params.config.max_click_to_door_ms, 80 * ONE_MIN_MS);
        assert_eq!(
            params.route_provider_kind,
            RouteProviderKind::Euclidean {
                meters_per_minute: 400.0
            }
        );

        params.validate().expect("valid instance");
    }
}
