use vouchery_core::domain::ids::{UserId, VoucherId};
use vouchery_core::domain::usage::{VoucherRedemption, VoucherUsage};
use vouchery_core::redemption::UsageSnapshot;

use super::{RepositoryError, UsageRepository};
use crate::DbPool;

pub struct SqlUsageRepository {
    pool: DbPool,
}

impl SqlUsageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl UsageRepository for SqlUsageRepository {
    async fn find_usage(
        &self,
        user_id: UserId,
        voucher_id: VoucherId,
    ) -> Result<Option<VoucherUsage>, RepositoryError> {
        let row = sqlx::query_as::<_, (i64, i64, chrono::DateTime<chrono::Utc>, i64)>(
            "SELECT user_id, voucher_id, saved_at, used_count
             FROM user_vouchers WHERE user_id = ?1 AND voucher_id = ?2",
        )
        .bind(user_id.0)
        .bind(voucher_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(user_id, voucher_id, saved_at, used_count)| {
            Ok(VoucherUsage {
                user_id: UserId(user_id),
                voucher_id: VoucherId(voucher_id),
                saved_at,
                used_count: decode_count(used_count)?,
            })
        })
        .transpose()
    }

    async fn save_usage(&self, usage: VoucherUsage) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO user_vouchers (user_id, voucher_id, saved_at, used_count)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id, voucher_id)
             DO UPDATE SET saved_at = excluded.saved_at, used_count = excluded.used_count",
        )
        .bind(usage.user_id.0)
        .bind(usage.voucher_id.0)
        .bind(usage.saved_at)
        .bind(i64::from(usage.used_count))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn total_redemptions(&self, voucher_id: VoucherId) -> Result<u32, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM order_vouchers WHERE voucher_id = ?1")
                .bind(voucher_id.0)
                .fetch_one(&self.pool)
                .await?;

        decode_count(count)
    }

    async fn usage_snapshot(
        &self,
        user_id: UserId,
        voucher_id: VoucherId,
    ) -> Result<UsageSnapshot, RepositoryError> {
        let total_redemptions = self.total_redemptions(voucher_id).await?;
        let user_redemptions = self
            .find_usage(user_id, voucher_id)
            .await?
            .map_or(0, |usage| usage.used_count);

        Ok(UsageSnapshot { total_redemptions, user_redemptions })
    }

    async fn record_redemption(
        &self,
        user_id: UserId,
        redemption: VoucherRedemption,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO order_vouchers (order_id, voucher_id, discount_amount, applied_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(redemption.order_id.0)
        .bind(redemption.voucher_id.0)
        .bind(redemption.amount.to_string())
        .bind(redemption.applied_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO user_vouchers (user_id, voucher_id, saved_at, used_count)
             VALUES (?1, ?2, ?3, 1)
             ON CONFLICT (user_id, voucher_id)
             DO UPDATE SET used_count = used_count + 1",
        )
        .bind(user_id.0)
        .bind(redemption.voucher_id.0)
        .bind(redemption.applied_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

fn decode_count(count: i64) -> Result<u32, RepositoryError> {
    u32::try_from(count).map_err(|error| RepositoryError::Decode(error.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;

    use vouchery_core::domain::ids::{OrderId, UserId, VoucherId};
    use vouchery_core::domain::usage::VoucherRedemption;

    use crate::repositories::UsageRepository;
    use crate::{connect_with_settings, migrations};

    use super::SqlUsageRepository;

    async fn repository_with_voucher() -> SqlUsageRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("run migrations");

        sqlx::query(
            "INSERT INTO vouchers (id, code, kind, discount_mode, discount_value,
                 min_order_amount, starts_on, ends_on, per_user_limit, is_active, is_auto,
                 created_at, updated_at)
             VALUES (1, 'LAUNCH15', 'platform', 'percent', '15', '0',
                 '2026-01-01', '2026-12-31', 2, 1, 0,
                 '2026-01-01T00:00:00+00:00', '2026-01-01T00:00:00+00:00')",
        )
        .execute(&pool)
        .await
        .expect("insert voucher");

        SqlUsageRepository::new(pool)
    }

    #[tokio::test]
    async fn snapshot_is_zero_before_any_redemption() {
        let repo = repository_with_voucher().await;

        let snapshot =
            repo.usage_snapshot(UserId(3), VoucherId(1)).await.expect("usage snapshot");

        assert_eq!(snapshot.total_redemptions, 0);
        assert_eq!(snapshot.user_redemptions, 0);
    }

    #[tokio::test]
    async fn recording_a_redemption_bumps_both_counters() {
        let repo = repository_with_voucher().await;

        repo.record_redemption(
            UserId(3),
            VoucherRedemption {
                order_id: OrderId(42),
                voucher_id: VoucherId(1),
                amount: Decimal::new(50_000, 0),
                applied_at: Utc::now(),
            },
        )
        .await
        .expect("record redemption");

        let snapshot =
            repo.usage_snapshot(UserId(3), VoucherId(1)).await.expect("usage snapshot");
        assert_eq!(snapshot.total_redemptions, 1);
        assert_eq!(snapshot.user_redemptions, 1);

        // A second user redeeming moves the total but not the first user's count.
        repo.record_redemption(
            UserId(4),
            VoucherRedemption {
                order_id: OrderId(43),
                voucher_id: VoucherId(1),
                amount: Decimal::new(50_000, 0),
                applied_at: Utc::now(),
            },
        )
        .await
        .expect("record second redemption");

        let snapshot =
            repo.usage_snapshot(UserId(3), VoucherId(1)).await.expect("usage snapshot");
        assert_eq!(snapshot.total_redemptions, 2);
        assert_eq!(snapshot.user_redemptions, 1);
    }

    #[tokio::test]
    async fn saved_usage_round_trips() {
        let repo = repository_with_voucher().await;

        let usage = vouchery_core::domain::usage::VoucherUsage {
            user_id: UserId(3),
            voucher_id: VoucherId(1),
            saved_at: Utc::now(),
            used_count: 0,
        };
        repo.save_usage(usage.clone()).await.expect("save usage");

        let found = repo.find_usage(UserId(3), VoucherId(1)).await.expect("find usage");
        assert_eq!(found.map(|u| u.used_count), Some(0));
    }
}
