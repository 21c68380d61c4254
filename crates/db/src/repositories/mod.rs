use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use vouchery_core::domain::ids::{CategoryId, ProductId, StoreId, UserId, VoucherId};
use vouchery_core::domain::usage::{VoucherRedemption, VoucherUsage};
use vouchery_core::domain::voucher::Voucher;
use vouchery_core::redemption::UsageSnapshot;
use vouchery_core::DomainError;

pub mod memory;
pub mod usage;
pub mod voucher;

pub use memory::{InMemoryUsageRepository, InMemoryVoucherRepository};
pub use usage::SqlUsageRepository;
pub use voucher::SqlVoucherRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error(transparent)]
    Invalid(#[from] DomainError),
    #[error("voucher {0} not found")]
    NotFound(i64),
}

/// The voucher catalog as seen by the evaluator and by admin tooling.
/// `find_candidates` is the single pushed-down read the quote path uses:
/// active + window + scope-OR filters applied in one query.
#[async_trait]
pub trait VoucherRepository: Send + Sync {
    async fn find_by_id(&self, id: VoucherId) -> Result<Option<Voucher>, RepositoryError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<Voucher>, RepositoryError>;

    /// Newest first; `search` is a substring match over code, kind, and mode.
    async fn list(&self, search: Option<&str>) -> Result<Vec<Voucher>, RepositoryError>;

    async fn find_candidates(
        &self,
        product_id: ProductId,
        category_id: CategoryId,
        store_id: StoreId,
        as_of: NaiveDate,
    ) -> Result<Vec<Voucher>, RepositoryError>;

    /// Validates, then persists. The id on the incoming voucher is ignored;
    /// the assigned id is returned.
    async fn create(&self, voucher: Voucher) -> Result<VoucherId, RepositoryError>;

    /// Validates, then replaces the stored voucher and its scope links.
    async fn update(&self, voucher: Voucher) -> Result<(), RepositoryError>;
}

/// Redemption counters, kept apart from quoting on purpose: the evaluator
/// never consults usage, redemption always does.
#[async_trait]
pub trait UsageRepository: Send + Sync {
    async fn find_usage(
        &self,
        user_id: UserId,
        voucher_id: VoucherId,
    ) -> Result<Option<VoucherUsage>, RepositoryError>;

    async fn save_usage(&self, usage: VoucherUsage) -> Result<(), RepositoryError>;

    async fn total_redemptions(&self, voucher_id: VoucherId) -> Result<u32, RepositoryError>;

    async fn usage_snapshot(
        &self,
        user_id: UserId,
        voucher_id: VoucherId,
    ) -> Result<UsageSnapshot, RepositoryError>;

    /// Records the order application and bumps the user's counter together.
    async fn record_redemption(
        &self,
        user_id: UserId,
        redemption: VoucherRedemption,
    ) -> Result<(), RepositoryError>;
}
