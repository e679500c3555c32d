use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, UInt32Array, UInt64Array};
use arrow::datatypes::Schema;

use crate::report::CourierRow;

use super::utils::{f64_field, u32_field, u64_field, write_record_batch};

/// Write the courier-level table.
pub fn write_couriers_parquet<P: AsRef<Path>>(
    path: P,
    rows: &[CourierRow],
) -> Result<(), Box<dyn Error>> {
    let courier_id: Vec<u64> = rows.iter().map(|r| r.courier_id).collect();
    let orders_delivered: Vec<u32> = rows.iter().map(|r| r.orders_delivered).collect();
    let total_distance_km: Vec<f64> = rows.iter().map(|r| r.total_distance_km).collect();
    let shift_duration_hours: Vec<f64> = rows.iter().map(|r| r.shift_duration_hours).collect();
    let earnings: Vec<f64> = rows.iter().map(|r| r.earnings).collect();

    let schema = Schema::new(vec![
        u64_field("courier_id"),
        u32_field("orders_delivered"),
        f64_field("total_distance_km"),
        f64_field("shift_duration_hours"),
        f64_field("earnings"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(courier_id)),
        Arc::new(UInt32Array::from(orders_delivered)),
        Arc::new(Float64Array::from(total_distance_km)),
        Arc::new(Float64Array::from(shift_duration_hours)),
        Arc::new(Float64Array::from(earnings)),
    ];

    write_record_batch(path, schema, arrays)
}
