use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::ids::VoucherId;
use crate::domain::voucher::{DiscountMode, Voucher};

/// Redemption counters for one (voucher, user) pair, read from the usage
/// store before applying the voucher to an order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    pub total_redemptions: u32,
    pub user_redemptions: u32,
}

/// Outcome of applying a voucher to an order total.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    pub voucher: VoucherId,
    pub amount: Decimal,
    pub order_total: Decimal,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RedemptionError {
    #[error("order amount {amount} is not a valid order total")]
    InvalidOrderAmount { amount: Decimal },
    #[error("voucher `{code}` is deactivated")]
    Inactive { code: String },
    #[error("voucher `{code}` is not valid on {as_of}")]
    OutsideWindow { code: String, as_of: NaiveDate },
    #[error("order amount {amount} is below the voucher minimum {minimum}")]
    BelowMinimumOrder { minimum: Decimal, amount: Decimal },
    #[error("voucher usage limit of {limit} reached")]
    UsageLimitReached { limit: u32 },
    #[error("per-user limit of {limit} reached")]
    PerUserLimitReached { limit: u32 },
}

/// Apply a voucher to an order total at checkout. This is the step where the
/// currency cap on percent vouchers binds and where usage limits are
/// enforced; the quote-time evaluator deliberately checks neither.
pub fn redeem(
    voucher: &Voucher,
    order_amount: Decimal,
    as_of: NaiveDate,
    usage: &UsageSnapshot,
) -> Result<AppliedDiscount, RedemptionError> {
    if order_amount < Decimal::ZERO {
        return Err(RedemptionError::InvalidOrderAmount { amount: order_amount });
    }

    if !voucher.is_active {
        return Err(RedemptionError::Inactive { code: voucher.code.clone() });
    }

    if as_of < voucher.starts_on || voucher.ends_on < as_of {
        return Err(RedemptionError::OutsideWindow { code: voucher.code.clone(), as_of });
    }

    if order_amount < voucher.min_order_amount {
        return Err(RedemptionError::BelowMinimumOrder {
            minimum: voucher.min_order_amount,
            amount: order_amount,
        });
    }

    if let Some(limit) = voucher.usage_limit {
        if usage.total_redemptions >= limit {
            return Err(RedemptionError::UsageLimitReached { limit });
        }
    }

    if usage.user_redemptions >= voucher.per_user_limit {
        return Err(RedemptionError::PerUserLimitReached { limit: voucher.per_user_limit });
    }

    let amount = match voucher.mode {
        DiscountMode::Percent => {
            let raw = order_amount * voucher.value / Decimal::ONE_HUNDRED;
            match voucher.max_discount {
                Some(cap) => raw.min(cap),
                None => raw,
            }
        }
        // A flat discount deeper than the order takes the order to zero,
        // never below.
        DiscountMode::Fixed => voucher.value.min(order_amount),
    };

    Ok(AppliedDiscount { voucher: voucher.id, amount, order_total: order_amount - amount })
}
