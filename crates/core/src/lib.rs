pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod evaluator;
pub mod redemption;

pub use catalog::VoucherCatalog;
pub use domain::ids::{CategoryId, OrderId, ProductId, StoreId, UserId, VoucherId};
pub use domain::target::EvaluationTarget;
pub use domain::usage::{VoucherRedemption, VoucherUsage};
pub use domain::voucher::{DiscountMode, Voucher, VoucherKind, VoucherScope};
pub use errors::{ApplicationError, DomainError};
pub use evaluator::{
    effective_percentage, evaluate_target, DeterministicDiscountEvaluator, DiscountEvaluator,
    DiscountQuote,
};
pub use redemption::{redeem, AppliedDiscount, RedemptionError, UsageSnapshot};
