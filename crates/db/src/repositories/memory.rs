use std::collections::HashMap;

use chrono::NaiveDate;
use tokio::sync::RwLock;

use vouchery_core::domain::ids::{CategoryId, ProductId, StoreId, UserId, VoucherId};
use vouchery_core::domain::usage::{VoucherRedemption, VoucherUsage};
use vouchery_core::domain::voucher::Voucher;
use vouchery_core::redemption::UsageSnapshot;

use super::{RepositoryError, UsageRepository, VoucherRepository};

/// Catalog backed by a map, for tests and embedded callers. Candidate
/// filtering reuses the domain predicates so the semantics match the SQL
/// pushed-down query exactly.
#[derive(Default)]
pub struct InMemoryVoucherRepository {
    vouchers: RwLock<HashMap<i64, Voucher>>,
}

#[async_trait::async_trait]
impl VoucherRepository for InMemoryVoucherRepository {
    async fn find_by_id(&self, id: VoucherId) -> Result<Option<Voucher>, RepositoryError> {
        let vouchers = self.vouchers.read().await;
        Ok(vouchers.get(&id.0).cloned())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Voucher>, RepositoryError> {
        let vouchers = self.vouchers.read().await;
        Ok(vouchers.values().find(|voucher| voucher.code == code).cloned())
    }

    async fn list(&self, search: Option<&str>) -> Result<Vec<Voucher>, RepositoryError> {
        let vouchers = self.vouchers.read().await;
        let mut listed: Vec<Voucher> = vouchers
            .values()
            .filter(|voucher| match search {
                Some(term) => {
                    let term = term.to_ascii_lowercase();
                    voucher.code.to_ascii_lowercase().contains(&term)
                        || voucher.kind.as_str().contains(&term)
                        || voucher.mode.as_str().contains(&term)
                }
                None => true,
            })
            .cloned()
            .collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.0.cmp(&a.id.0)));
        Ok(listed)
    }

    async fn find_candidates(
        &self,
        product_id: ProductId,
        category_id: CategoryId,
        store_id: StoreId,
        as_of: NaiveDate,
    ) -> Result<Vec<Voucher>, RepositoryError> {
        let vouchers = self.vouchers.read().await;
        let mut candidates: Vec<Voucher> = vouchers
            .values()
            .filter(|voucher| {
                voucher.is_live(as_of)
                    && voucher.scope.matches(product_id, category_id, store_id)
            })
            .cloned()
            .collect();
        candidates.sort_by_key(|voucher| voucher.id.0);
        Ok(candidates)
    }

    async fn create(&self, mut voucher: Voucher) -> Result<VoucherId, RepositoryError> {
        voucher.validate()?;

        let mut vouchers = self.vouchers.write().await;
        let id = vouchers.keys().max().map_or(1, |max| max + 1);
        voucher.id = VoucherId(id);
        vouchers.insert(id, voucher);
        Ok(VoucherId(id))
    }

    async fn update(&self, voucher: Voucher) -> Result<(), RepositoryError> {
        voucher.validate()?;

        let mut vouchers = self.vouchers.write().await;
        if !vouchers.contains_key(&voucher.id.0) {
            return Err(RepositoryError::NotFound(voucher.id.0));
        }
        vouchers.insert(voucher.id.0, voucher);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryUsageRepository {
    usages: RwLock<HashMap<(i64, i64), VoucherUsage>>,
    redemptions: RwLock<Vec<(UserId, VoucherRedemption)>>,
}

#[async_trait::async_trait]
impl UsageRepository for InMemoryUsageRepository {
    async fn find_usage(
        &self,
        user_id: UserId,
        voucher_id: VoucherId,
    ) -> Result<Option<VoucherUsage>, RepositoryError> {
        let usages = self.usages.read().await;
        Ok(usages.get(&(user_id.0, voucher_id.0)).cloned())
    }

    async fn save_usage(&self, usage: VoucherUsage) -> Result<(), RepositoryError> {
        let mut usages = self.usages.write().await;
        usages.insert((usage.user_id.0, usage.voucher_id.0), usage);
        Ok(())
    }

    async fn total_redemptions(&self, voucher_id: VoucherId) -> Result<u32, RepositoryError> {
        let redemptions = self.redemptions.read().await;
        let count =
            redemptions.iter().filter(|(_, r)| r.voucher_id == voucher_id).count();
        u32::try_from(count).map_err(|error| RepositoryError::Decode(error.to_string()))
    }

    async fn usage_snapshot(
        &self,
        user_id: UserId,
        voucher_id: VoucherId,
    ) -> Result<UsageSnapshot, RepositoryError> {
        let total_redemptions = self.total_redemptions(voucher_id).await?;
        let user_redemptions =
            self.find_usage(user_id, voucher_id).await?.map_or(0, |usage| usage.used_count);
        Ok(UsageSnapshot { total_redemptions, user_redemptions })
    }

    async fn record_redemption(
        &self,
        user_id: UserId,
        redemption: VoucherRedemption,
    ) -> Result<(), RepositoryError> {
        let mut usages = self.usages.write().await;
        let entry = usages.entry((user_id.0, redemption.voucher_id.0)).or_insert(VoucherUsage {
            user_id,
            voucher_id: redemption.voucher_id,
            saved_at: redemption.applied_at,
            used_count: 0,
        });
        entry.used_count += 1;

        let mut redemptions = self.redemptions.write().await;
        redemptions.push((user_id, redemption));
        Ok(())
    }
}
