use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::ids::{CategoryId, ProductId, StoreId, VoucherId};
use crate::errors::DomainError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoucherKind {
    Platform,
    Seller,
}

impl VoucherKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Platform => "platform",
            Self::Seller => "seller",
        }
    }
}

impl std::str::FromStr for VoucherKind {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "platform" => Ok(Self::Platform),
            "seller" => Ok(Self::Seller),
            other => Err(DomainError::InvariantViolation(format!(
                "unknown voucher kind `{other}` (expected platform|seller)"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountMode {
    Percent,
    Fixed,
}

impl DiscountMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Percent => "percent",
            Self::Fixed => "fixed",
        }
    }
}

impl std::str::FromStr for DiscountMode {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "percent" => Ok(Self::Percent),
            "fixed" => Ok(Self::Fixed),
            other => Err(DomainError::InvariantViolation(format!(
                "unknown discount mode `{other}` (expected percent|fixed)"
            ))),
        }
    }
}

/// Applicability links narrowing where a voucher applies. Empty on all three
/// axes means the voucher is unscoped and applies everywhere.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoucherScope {
    pub products: Vec<ProductId>,
    pub categories: Vec<CategoryId>,
    pub stores: Vec<StoreId>,
}

impl VoucherScope {
    pub fn is_unscoped(&self) -> bool {
        self.products.is_empty() && self.categories.is_empty() && self.stores.is_empty()
    }

    /// Any single matching link qualifies the voucher; matching several does
    /// not count it twice.
    pub fn matches(&self, product: ProductId, category: CategoryId, store: StoreId) -> bool {
        self.is_unscoped()
            || self.products.contains(&product)
            || self.categories.contains(&category)
            || self.stores.contains(&store)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voucher {
    pub id: VoucherId,
    pub code: String,
    pub kind: VoucherKind,
    /// Owning store for seller vouchers; must be None for platform vouchers.
    pub seller_store: Option<StoreId>,
    pub mode: DiscountMode,
    /// Percentage for `Percent` mode, currency amount for `Fixed` mode.
    pub value: Decimal,
    pub min_order_amount: Decimal,
    /// Currency cap on the discount amount; `Percent` mode only.
    pub max_discount: Option<Decimal>,
    pub starts_on: NaiveDate,
    pub ends_on: NaiveDate,
    pub usage_limit: Option<u32>,
    pub per_user_limit: u32,
    pub is_active: bool,
    pub is_auto: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub scope: VoucherScope,
}

impl Voucher {
    /// Invariants enforced on every create/update path.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.code.trim().is_empty() {
            return Err(DomainError::InvariantViolation(
                "voucher code must not be empty".to_string(),
            ));
        }

        match (self.kind, self.seller_store) {
            (VoucherKind::Seller, None) => {
                return Err(DomainError::InvariantViolation(
                    "seller voucher requires an owning store".to_string(),
                ));
            }
            (VoucherKind::Platform, Some(_)) => {
                return Err(DomainError::InvariantViolation(
                    "platform voucher must not carry an owning store".to_string(),
                ));
            }
            _ => {}
        }

        if self.ends_on <= self.starts_on {
            return Err(DomainError::InvariantViolation(
                "voucher window must end after it starts".to_string(),
            ));
        }

        if self.mode == DiscountMode::Fixed && self.max_discount.is_some() {
            return Err(DomainError::InvariantViolation(
                "max discount cap only applies to percent vouchers".to_string(),
            ));
        }

        if self.value <= Decimal::ZERO {
            return Err(DomainError::InvariantViolation(
                "discount value must be positive".to_string(),
            ));
        }

        if self.min_order_amount < Decimal::ZERO {
            return Err(DomainError::InvariantViolation(
                "minimum order amount must not be negative".to_string(),
            ));
        }

        if let Some(cap) = self.max_discount {
            if cap <= Decimal::ZERO {
                return Err(DomainError::InvariantViolation(
                    "max discount cap must be positive".to_string(),
                ));
            }
        }

        if self.per_user_limit == 0 {
            return Err(DomainError::InvariantViolation(
                "per-user limit must be at least 1".to_string(),
            ));
        }

        if self.usage_limit == Some(0) {
            return Err(DomainError::InvariantViolation(
                "usage limit must be at least 1 when set".to_string(),
            ));
        }

        Ok(())
    }

    /// Active and inside the date window, both bounds inclusive.
    pub fn is_live(&self, as_of: NaiveDate) -> bool {
        self.is_active && self.starts_on <= as_of && as_of <= self.ends_on
    }
}
