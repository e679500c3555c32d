//! Courier compensation: per-delivery pay against a guaranteed hourly floor.

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

/// Pay per delivered order, in currency units.
pub const PAY_PER_ORDER: f64 = 10.0;

/// Guaranteed pay per shift hour, in currency units.
pub const GUARANTEED_HOURLY: f64 = 15.0;

/// Compensation configuration for the fleet.
#[derive(Debug, Clone, Copy, Resource, Serialize, Deserialize)]
pub struct PayConfig {
    /// Pay per delivered order, in currency units.
    pub pay_per_order: f64,
    /// Guaranteed pay per shift hour, in currency units.
    pub guaranteed_hourly: f64,
}

impl Default for PayConfig {
    fn default() -> Self {
        Self {
            pay_per_order: PAY_PER_ORDER,
            guaranteed_hourly: GUARANTEED_HOURLY,
        }
    }
}

/// Earnings from deliveries alone.
pub fn delivery_earnings(orders_delivered: u32, pay_per_order: f64) -> f64 {
    orders_delivered as f64 * pay_per_order
}

/// The minimum a courier is owed for a shift of the given length.
pub fn minimum_guarantee(shift_hours: f64, guaranteed_hourly: f64) -> f64 {
    shift_hours * guaranteed_hourly
}

/// End-of-simulation compensation: delivery earnings, floored by the
/// hourly guarantee.
pub fn final_compensation(delivery_earnings: f64, shift_hours: f64, config: &PayConfig) -> f64 {
    delivery_earnings.max(minimum_guarantee(shift_hours, config.guaranteed_hourly))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_courier_is_paid_per_order() {
        let config = PayConfig::default();
        let earned = delivery_earnings(12, config.pay_per_order);
        assert_eq!(earned, 120.0);
        // 12 orders over a 4-hour shift beats the 60.0 guarantee.
        assert_eq!(final_compensation(earned, 4.0, &config), 120.0);
    }

    #[test]
    fn idle_courier_falls_back_to_the_guarantee() {
        let config = PayConfig::default();
        let earned = delivery_earnings(2, config.pay_per_order);
        assert_eq!(earned, 20.0);
        // 2 orders over an 8-hour shift is under the 120.0 guarantee.
        assert_eq!(final_compensation(earned, 8.0, &config), 120.0);
    }

    #[test]
    fn zero_length_shift_pays_deliveries_only() {
        let config = PayConfig::default();
        assert_eq!(final_compensation(30.0, 0.0, &config), 30.0);
    }

    #[test]
    fn custom_rates_are_respected() {
        let config = PayConfig {
            pay_per_order: 7.5,
            guaranteed_hourly: 20.0,
        };
        assert_eq!(delivery_earnings(4, config.pay_per_order), 30.0);
        assert_eq!(final_compensation(30.0, 2.0, &config), 40.0);
    }
}
