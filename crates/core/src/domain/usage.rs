use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ids::{OrderId, UserId, VoucherId};

/// A voucher saved by a user, with the running count of redemptions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherUsage {
    pub user_id: UserId,
    pub voucher_id: VoucherId,
    pub saved_at: DateTime<Utc>,
    pub used_count: u32,
}

impl VoucherUsage {
    pub fn can_use(&self, per_user_limit: u32) -> bool {
        self.used_count < per_user_limit
    }
}

/// The record of a voucher applied to an order, with the currency amount
/// actually taken off.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherRedemption {
    pub order_id: OrderId,
    pub voucher_id: VoucherId,
    pub amount: Decimal,
    pub applied_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use crate::domain::ids::{UserId, VoucherId};

    use super::VoucherUsage;

    #[test]
    fn usage_below_limit_can_use() {
        let usage = VoucherUsage {
            user_id: UserId(3),
            voucher_id: VoucherId(1),
            saved_at: Utc::now(),
            used_count: 0,
        };

        assert!(usage.can_use(1));
    }

    #[test]
    fn usage_at_limit_cannot_use() {
        let usage = VoucherUsage {
            user_id: UserId(3),
            voucher_id: VoucherId(1),
            saved_at: Utc::now(),
            used_count: 2,
        };

        assert!(!usage.can_use(2));
    }
}
