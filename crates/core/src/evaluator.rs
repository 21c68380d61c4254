use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ids::VoucherId;
use crate::domain::target::EvaluationTarget;
use crate::domain::voucher::{DiscountMode, Voucher};
use crate::errors::DomainError;

/// The best discount achievable for a target, independent of which voucher is
/// later redeemed. `winner` identifies the voucher that produced the maximum
/// so redemption can mark the right one as used.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscountQuote {
    /// Clamped to [0, 100]; a fixed voucher deeper than the price cannot push
    /// the final price negative.
    pub percentage: Decimal,
    pub final_price: Decimal,
    pub winner: Option<VoucherId>,
}

impl DiscountQuote {
    pub fn has_discount(&self) -> bool {
        self.percentage > Decimal::ZERO
    }

    fn none(price: Decimal) -> Self {
        Self { percentage: Decimal::ZERO, final_price: price, winner: None }
    }
}

pub trait DiscountEvaluator: Send + Sync {
    fn evaluate(
        &self,
        target: &EvaluationTarget,
        as_of: NaiveDate,
        candidates: &[Voucher],
    ) -> Result<DiscountQuote, DomainError>;
}

#[derive(Default)]
pub struct DeterministicDiscountEvaluator;

impl DiscountEvaluator for DeterministicDiscountEvaluator {
    fn evaluate(
        &self,
        target: &EvaluationTarget,
        as_of: NaiveDate,
        candidates: &[Voucher],
    ) -> Result<DiscountQuote, DomainError> {
        evaluate_target(target, as_of, candidates)
    }
}

/// The percentage a single voucher is worth against a price. The currency cap
/// on percent vouchers binds at redemption, not here; fixed vouchers convert
/// through the price and report 0 when the price is not positive.
pub fn effective_percentage(voucher: &Voucher, price: Decimal) -> Decimal {
    match voucher.mode {
        DiscountMode::Percent => voucher.value,
        DiscountMode::Fixed => {
            if price > Decimal::ZERO {
                voucher.value / price * Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            }
        }
    }
}

/// Best-discount quote across the candidate set. Candidates are re-filtered
/// for liveness and scope match so in-memory callers get the same semantics
/// as the pushed-down catalog query. No matching voucher is a 0% quote, not
/// an error.
pub fn evaluate_target(
    target: &EvaluationTarget,
    as_of: NaiveDate,
    candidates: &[Voucher],
) -> Result<DiscountQuote, DomainError> {
    if target.price < Decimal::ZERO {
        return Err(DomainError::NegativePrice { price: target.price });
    }

    let mut best: Option<(VoucherId, Decimal)> = None;
    for voucher in candidates {
        if !voucher.is_live(as_of)
            || !voucher.scope.matches(target.product_id, target.category_id, target.store_id)
        {
            continue;
        }

        let percentage = effective_percentage(voucher, target.price);
        if percentage <= Decimal::ZERO {
            continue;
        }
        // Strict comparison keeps the first voucher on ties.
        if best.map_or(true, |(_, current)| percentage > current) {
            best = Some((voucher.id, percentage));
        }
    }

    let Some((winner, raw)) = best else {
        return Ok(DiscountQuote::none(target.price));
    };

    let percentage = raw.min(Decimal::ONE_HUNDRED);
    let final_price = target.price * (Decimal::ONE - percentage / Decimal::ONE_HUNDRED);

    Ok(DiscountQuote { percentage, final_price, winner: Some(winner) })
}
