use std::error::Error;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt32Array, UInt64Array};
use arrow::datatypes::Schema;

use crate::report::OrderRow;

use super::utils::{
    nullable_f64_field, nullable_u32_field, nullable_u64_field, u64_field, utf8_field,
    write_record_batch,
};

/// Write the order-level table. One row per order; undelivered orders carry
/// null pickup/delivery columns.
pub fn write_orders_parquet<P: AsRef<Path>>(
    path: P,
    rows: &[OrderRow],
) -> Result<(), Box<dyn Error>> {
    let order_id: Vec<u64> = rows.iter().map(|r| r.order_id).collect();
    let status: Vec<&str> = rows.iter().map(|r| r.status).collect();
    let placement_time: Vec<u64> = rows.iter().map(|r| r.placement_time).collect();
    let ready_time: Vec<u64> = rows.iter().map(|r| r.ready_time).collect();
    let pickup_time: Vec<Option<u64>> = rows.iter().map(|r| r.pickup_time).collect();
    let delivery_time: Vec<Option<u64>> = rows.iter().map(|r| r.delivery_time).collect();
    let click_to_door: Vec<Option<f64>> = rows.iter().map(|r| r.click_to_door).collect();
    let ready_to_pickup: Vec<Option<f64>> = rows.iter().map(|r| r.ready_to_pickup).collect();
    let bundle_size: Vec<Option<u32>> = rows.iter().map(|r| r.bundle_size).collect();

    let schema = Schema::new(vec![
        u64_field("order_id"),
        utf8_field("status"),
        u64_field("placement_time"),
        u64_field("ready_time"),
        nullable_u64_field("pickup_time"),
        nullable_u64_field("delivery_time"),
        nullable_f64_field("click_to_door"),
        nullable_f64_field("ready_to_pickup"),
        nullable_u32_field("bundle_size"),
    ]);

    let arrays: Vec<ArrayRef> = vec![
        Arc::new(UInt64Array::from(order_id)),
        Arc::new(StringArray::from(status)),
        Arc::new(UInt64Array::from(placement_time)),
        Arc::new(UInt64Array::from(ready_time)),
        Arc::new(UInt64Array::from(pickup_time)),
        Arc::new(UInt64Array::from(delivery_time)),
        Arc::new(Float64Array::from(click_to_door)),
        Arc::new(Float64Array::from(ready_to_pickup)),
        Arc::new(UInt32Array::from(bundle_size)),
    ];

    write_record_batch(path, schema, arrays)
}
