//! Post-run KPI summary over the report tables.

use std::fmt;

use dispatch_core::pay::{delivery_earnings, minimum_guarantee, PayConfig};
use dispatch_core::report::{CourierRow, OrderRow};

#[derive(Debug, Clone)]
pub struct KpiSummary {
    pub total_orders: usize,
    pub delivered_orders: usize,
    pub avg_click_to_door_mins: f64,
    pub p95_click_to_door_mins: f64,
    pub avg_ready_to_pickup_mins: f64,
    pub pct_undelivered: f64,
    pub total_distance_km: f64,
    pub orders_per_courier_hour: f64,
    pub avg_bundle_size: f64,
    pub total_compensation: f64,
    pub cost_per_order: f64,
    pub fraction_minimum_compensated: f64,
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let rank = ((p * sorted.len() as f64).ceil() as usize).clamp(1, sorted.len());
    sorted[rank - 1]
}

pub fn compute_kpis(orders: &[OrderRow], couriers: &[CourierRow], pay: &PayConfig) -> KpiSummary {
    let click_to_door: Vec<f64> = orders.iter().filter_map(|r| r.click_to_door).collect();
    let ready_to_pickup: Vec<f64> = orders.iter().filter_map(|r| r.ready_to_pickup).collect();
    let bundle_sizes: Vec<f64> = orders
        .iter()
        .filter_map(|r| r.bundle_size.map(f64::from))
        .collect();

    let delivered = orders.iter().filter(|r| r.status == "delivered").count();
    let pct_undelivered = if orders.is_empty() {
        100.0
    } else {
        (orders.len() - delivered) as f64 / orders.len() as f64 * 100.0
    };

    let total_hours: f64 = couriers.iter().map(|c| c.shift_duration_hours).sum();
    let total_delivered: u64 = couriers.iter().map(|c| c.orders_delivered as u64).sum();
    let orders_per_courier_hour = if total_hours > 0.0 {
        total_delivered as f64 / total_hours
    } else {
        0.0
    };

    // Courier rows already carry the floor-adjusted compensation.
    let total_compensation: f64 = couriers.iter().map(|c| c.earnings).sum();
    let cost_per_order = if total_delivered > 0 {
        total_compensation / total_delivered as f64
    } else {
        0.0
    };
    let at_minimum = couriers
        .iter()
        .filter(|c| {
            let floor = minimum_guarantee(c.shift_duration_hours, pay.guaranteed_hourly);
            let earned = delivery_earnings(c.orders_delivered, pay.pay_per_order);
            earned < floor && (c.earnings - floor).abs() < 1e-6
        })
        .count();
    let fraction_minimum_compensated = if couriers.is_empty() {
        0.0
    } else {
        at_minimum as f64 / couriers.len() as f64
    };

    KpiSummary {
        total_orders: orders.len(),
        delivered_orders: delivered,
        avg_click_to_door_mins: mean(&click_to_door),
        p95_click_to_door_mins: percentile(&click_to_door, 0.95),
        avg_ready_to_pickup_mins: mean(&ready_to_pickup),
        pct_undelivered,
        total_distance_km: couriers.iter().map(|c| c.total_distance_km).sum(),
        orders_per_courier_hour,
        avg_bundle_size: mean(&bundle_sizes),
        total_compensation,
        cost_per_order,
        fraction_minimum_compensated,
    }
}

impl fmt::Display for KpiSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "orders delivered            {}/{}", self.delivered_orders, self.total_orders)?;
        writeln!(f, "avg click-to-door (min)     {:.2}", self.avg_click_to_door_mins)?;
        writeln!(f, "p95 click-to-door (min)     {:.2}", self.p95_click_to_door_mins)?;
        writeln!(f, "avg ready-to-pickup (min)   {:.2}", self.avg_ready_to_pickup_mins)?;
        writeln!(f, "undelivered (%)             {:.2}", self.pct_undelivered)?;
        writeln!(f, "total distance (km)         {:.2}", self.total_distance_km)?;
        writeln!(f, "orders per courier-hour     {:.2}", self.orders_per_courier_hour)?;
        writeln!(f, "avg bundle size             {:.2}", self.avg_bundle_size)?;
        writeln!(f, "total compensation          {:.2}", self.total_compensation)?;
        writeln!(f, "cost per order              {:.2}", self.cost_per_order)?;
        write!(
            f,
            "couriers at minimum pay     {:.2}",
            self.fraction_minimum_compensated
        )
    }
}
