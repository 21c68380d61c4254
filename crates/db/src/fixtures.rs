use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

/// Contract for the deterministic demo voucher catalog: one voucher per
/// interesting shape the quote path has to handle.
const SEED_VOUCHERS: &[SeedVoucherContract] = &[
    SeedVoucherContract {
        id: 9001,
        code: "LAUNCH15",
        kind: "platform",
        discount_mode: "percent",
        is_active: true,
        scope_links: 0,
        description: "Unscoped platform voucher, 15% everywhere",
    },
    SeedVoucherContract {
        id: 9002,
        code: "SNEAKER25",
        kind: "seller",
        discount_mode: "percent",
        is_active: true,
        scope_links: 1,
        description: "Seller voucher for store 7, 25% capped at 50k",
    },
    SeedVoucherContract {
        id: 9003,
        code: "FLAT50K",
        kind: "platform",
        discount_mode: "fixed",
        is_active: true,
        scope_links: 1,
        description: "Flat 50k off product 101",
    },
    SeedVoucherContract {
        id: 9004,
        code: "RETRO10",
        kind: "platform",
        discount_mode: "percent",
        is_active: true,
        scope_links: 1,
        description: "10% on category 10",
    },
    SeedVoucherContract {
        id: 9005,
        code: "EXPIRED10",
        kind: "platform",
        discount_mode: "percent",
        is_active: true,
        scope_links: 0,
        description: "Window closed in 2024; must never quote",
    },
    SeedVoucherContract {
        id: 9006,
        code: "PAUSED20",
        kind: "platform",
        discount_mode: "percent",
        is_active: false,
        scope_links: 0,
        description: "Deactivated; must never quote",
    },
];

/// Demo voucher catalog used by `vouchery seed` and the integration tests.
pub struct VoucherSeedDataset;

impl VoucherSeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/voucher_seed_data.sql");

    /// Load the seed catalog. Idempotent: reloading replaces the fixed-id rows.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        let vouchers_seeded = SEED_VOUCHERS
            .iter()
            .map(|voucher| SeedVoucherInfo {
                code: voucher.code,
                description: voucher.description,
            })
            .collect::<Vec<_>>();

        Ok(SeedResult { vouchers_seeded })
    }

    /// Verify the loaded catalog against the contract.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for voucher in SEED_VOUCHERS {
            let row_matches: i64 = sqlx::query_scalar(
                "SELECT EXISTS(
                     SELECT 1 FROM vouchers
                     WHERE id = ?1 AND code = ?2 AND kind = ?3
                       AND discount_mode = ?4 AND is_active = ?5)",
            )
            .bind(voucher.id)
            .bind(voucher.code)
            .bind(voucher.kind)
            .bind(voucher.discount_mode)
            .bind(voucher.is_active)
            .fetch_one(pool)
            .await?;
            checks.push((voucher.code, row_matches == 1));

            let link_count: i64 = sqlx::query_scalar(
                "SELECT (SELECT COUNT(*) FROM voucher_products WHERE voucher_id = ?1)
                      + (SELECT COUNT(*) FROM voucher_categories WHERE voucher_id = ?1)
                      + (SELECT COUNT(*) FROM voucher_stores WHERE voucher_id = ?1)",
            )
            .bind(voucher.id)
            .fetch_one(pool)
            .await?;
            checks.push((voucher.description, link_count == voucher.scope_links));
        }

        let all_present = checks.iter().all(|(_, exists)| *exists);
        Ok(VerificationResult { all_present, checks })
    }

    /// Remove the seeded rows; scope links and usage rows cascade.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let ids = SEED_VOUCHERS
            .iter()
            .map(|voucher| voucher.id.to_string())
            .collect::<Vec<_>>()
            .join(",");

        sqlx::query(&format!("DELETE FROM vouchers WHERE id IN ({ids})"))
            .execute(pool)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
struct SeedVoucherContract {
    id: i64,
    code: &'static str,
    kind: &'static str,
    discount_mode: &'static str,
    is_active: bool,
    scope_links: i64,
    description: &'static str,
}

#[derive(Debug)]
pub struct SeedResult {
    pub vouchers_seeded: Vec<SeedVoucherInfo>,
}

#[derive(Debug)]
pub struct SeedVoucherInfo {
    pub code: &'static str,
    pub description: &'static str,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
