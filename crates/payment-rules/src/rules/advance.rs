use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

use super::domain::AdvancePaymentSettings;

/// Currency minor-unit precision for advance amounts.
const DECIMAL_PLACES: u32 = 2;

/// Upfront payment the shopper must make before the order ships.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancePaymentRequirement {
    pub amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

/// Sizes the advance for `order_total`. Fixed advances never exceed the order value.
pub fn compute_advance(
    settings: &AdvancePaymentSettings,
    order_total: f64,
) -> AdvancePaymentRequirement {
    let total = to_decimal(order_total).max(Decimal::ZERO);

    match *settings {
        AdvancePaymentSettings::Percentage { percentage } => {
            let amount = total * to_decimal(percentage) / Decimal::ONE_HUNDRED;
            AdvancePaymentRequirement {
                amount: to_f64(amount),
                percentage: Some(percentage),
            }
        }
        AdvancePaymentSettings::Fixed { amount } => AdvancePaymentRequirement {
            amount: to_f64(to_decimal(amount).min(total)),
            percentage: None,
        },
    }
}

fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}
