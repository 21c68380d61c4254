use chrono::NaiveDate;
use rust_decimal::Decimal;

use chrono::Utc;

use vouchery_core::domain::ids::{CategoryId, OrderId, ProductId, StoreId, UserId};
use vouchery_core::domain::usage::VoucherRedemption;
use vouchery_core::evaluator::evaluate_target;
use vouchery_core::redemption::{redeem, RedemptionError};
use vouchery_core::EvaluationTarget;
use vouchery_db::{
    connect_with_settings, migrations, SqlUsageRepository, SqlVoucherRepository, UsageRepository,
    VoucherRepository, VoucherSeedDataset,
};

type SeedContractTestResult<T = ()> = Result<T, String>;

macro_rules! require {
    ($cond:expr) => {
        if !$cond {
            return Err(format!("assertion failed: `{}`", stringify!($cond)));
        }
    };
    ($cond:expr, $($arg:tt)*) => {
        if !$cond {
            return Err(format!($($arg)*));
        }
    };
}

const SEED_CODES: &[&str] =
    &["LAUNCH15", "SNEAKER25", "FLAT50K", "RETRO10", "EXPIRED10", "PAUSED20"];

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

async fn seeded_repository() -> SqlVoucherRepository {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("run migrations");
    VoucherSeedDataset::load(&pool).await.expect("load seed fixtures");
    SqlVoucherRepository::new(pool)
}

#[test]
fn seed_sql_fixture_covers_the_contract_codes() -> SeedContractTestResult {
    let fixture_sql = VoucherSeedDataset::SQL;

    for code in SEED_CODES {
        require!(
            fixture_sql.contains(&format!("'{code}'")),
            "seed SQL fixture should include voucher code {code}"
        );
    }

    // One scope link per axis so the candidate query has all three join
    // paths exercised by the demo catalog.
    require!(fixture_sql.contains("INSERT OR REPLACE INTO voucher_products"));
    require!(fixture_sql.contains("INSERT OR REPLACE INTO voucher_categories"));
    require!(fixture_sql.contains("INSERT OR REPLACE INTO voucher_stores"));
    Ok(())
}

#[tokio::test]
async fn seeded_catalog_quotes_the_expected_winner() {
    let repository = seeded_repository().await;

    let target = EvaluationTarget {
        product_id: ProductId(101),
        category_id: CategoryId(10),
        store_id: StoreId(7),
        price: Decimal::new(500_000, 0),
    };
    let as_of = date(2026, 6, 15);

    let candidates = repository
        .find_candidates(target.product_id, target.category_id, target.store_id, as_of)
        .await
        .expect("find candidates");

    let codes: Vec<&str> = candidates.iter().map(|voucher| voucher.code.as_str()).collect();
    assert!(codes.contains(&"LAUNCH15"), "unscoped voucher should be a candidate");
    assert!(codes.contains(&"SNEAKER25"), "store-scoped voucher should match store 7");
    assert!(codes.contains(&"FLAT50K"), "product-scoped voucher should match product 101");
    assert!(codes.contains(&"RETRO10"), "category-scoped voucher should match category 10");
    assert!(!codes.contains(&"EXPIRED10"), "expired voucher must never be a candidate");
    assert!(!codes.contains(&"PAUSED20"), "deactivated voucher must never be a candidate");

    let quote = evaluate_target(&target, as_of, &candidates).expect("evaluate");

    // SNEAKER25 wins: 25% beats 15%, 10%, and the flat 50k (10% of 500k).
    assert_eq!(quote.percentage, Decimal::new(25, 0));
    assert_eq!(quote.final_price, Decimal::new(375_000, 0));
    let winner = quote.winner.expect("winner identity is returned");
    let winner_code = candidates
        .iter()
        .find(|voucher| voucher.id == winner)
        .map(|voucher| voucher.code.as_str());
    assert_eq!(winner_code, Some("SNEAKER25"));
}

#[tokio::test]
async fn seeded_catalog_respects_scope_for_other_targets() {
    let repository = seeded_repository().await;

    // Different product, category, and store: only the unscoped voucher applies.
    let candidates = repository
        .find_candidates(ProductId(555), CategoryId(42), StoreId(3), date(2026, 6, 15))
        .await
        .expect("find candidates");

    let codes: Vec<&str> = candidates.iter().map(|voucher| voucher.code.as_str()).collect();
    assert_eq!(codes, vec!["LAUNCH15"]);
}

#[tokio::test]
async fn quoted_winner_redeems_until_the_per_user_limit() {
    let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
    migrations::run_pending(&pool).await.expect("run migrations");
    VoucherSeedDataset::load(&pool).await.expect("load seed fixtures");
    let vouchers = SqlVoucherRepository::new(pool.clone());
    let usage = SqlUsageRepository::new(pool);

    let as_of = date(2026, 6, 15);
    let user = UserId(3);
    let order_amount = Decimal::new(400_000, 0);

    // SNEAKER25: per_user_limit 2, 25% capped at 50k.
    let winner = vouchers
        .find_by_code("SNEAKER25")
        .await
        .expect("find voucher")
        .expect("seeded voucher exists");

    for order in [OrderId(1), OrderId(2)] {
        let snapshot =
            usage.usage_snapshot(user, winner.id).await.expect("usage snapshot");
        let applied = redeem(&winner, order_amount, as_of, &snapshot).expect("redeem");
        assert_eq!(applied.amount, Decimal::new(50_000, 0), "cap binds at redemption");

        usage
            .record_redemption(
                user,
                VoucherRedemption {
                    order_id: order,
                    voucher_id: winner.id,
                    amount: applied.amount,
                    applied_at: Utc::now(),
                },
            )
            .await
            .expect("record redemption");
    }

    let snapshot = usage.usage_snapshot(user, winner.id).await.expect("usage snapshot");
    let refused = redeem(&winner, order_amount, as_of, &snapshot)
        .expect_err("third redemption should be refused");
    assert_eq!(refused, RedemptionError::PerUserLimitReached { limit: 2 });
}

#[tokio::test]
async fn seeded_catalog_is_empty_outside_every_window() {
    let repository = seeded_repository().await;

    let candidates = repository
        .find_candidates(ProductId(101), CategoryId(10), StoreId(7), date(2031, 1, 1))
        .await
        .expect("find candidates");

    assert!(candidates.is_empty());
}
