use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

use vouchery_core::config::AppConfig;
use vouchery_core::domain::ids::{CategoryId, ProductId, StoreId};
use vouchery_core::{DeterministicDiscountEvaluator, DiscountEvaluator, EvaluationTarget};
use vouchery_db::{connect_with_settings, SqlVoucherRepository, VoucherRepository};

use crate::commands::CommandResult;

#[derive(Debug, Clone, Copy)]
pub struct QuoteArgs {
    pub product: i64,
    pub category: i64,
    pub store: i64,
    pub price: Decimal,
    pub as_of: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct QuotePayload {
    command: &'static str,
    status: &'static str,
    as_of: NaiveDate,
    base_price: Decimal,
    percentage: Decimal,
    final_price: Decimal,
    winner: Option<WinnerPayload>,
}

#[derive(Debug, Serialize)]
struct WinnerPayload {
    id: i64,
    code: String,
}

pub fn run(config: &AppConfig, args: QuoteArgs) -> CommandResult {
    // The evaluator takes an explicit date; defaulting to today happens only
    // here at the boundary.
    let as_of = args.as_of.unwrap_or_else(|| chrono::Local::now().date_naive());

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "quote",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        let repository = SqlVoucherRepository::new(pool.clone());
        let target = EvaluationTarget {
            product_id: ProductId(args.product),
            category_id: CategoryId(args.category),
            store_id: StoreId(args.store),
            price: args.price,
        };

        let candidates = repository
            .find_candidates(target.product_id, target.category_id, target.store_id, as_of)
            .await
            .map_err(|error| ("catalog_read", error.to_string(), 4u8))?;
        tracing::debug!(candidates = candidates.len(), as_of = %as_of, "candidate vouchers loaded");

        let quote = DeterministicDiscountEvaluator
            .evaluate(&target, as_of, &candidates)
            .map_err(|error| ("invalid_target", error.to_string(), 6u8))?;

        let winner = quote.winner.and_then(|id| {
            candidates
                .iter()
                .find(|voucher| voucher.id == id)
                .map(|voucher| WinnerPayload { id: id.0, code: voucher.code.clone() })
        });

        pool.close().await;
        Ok::<QuotePayload, (&'static str, String, u8)>(QuotePayload {
            command: "quote",
            status: "ok",
            as_of,
            base_price: target.price,
            percentage: quote.percentage,
            final_price: quote.final_price,
            winner,
        })
    });

    match result {
        Ok(payload) => match serde_json::to_string(&payload) {
            Ok(output) => CommandResult { exit_code: 0, output },
            Err(error) => CommandResult::failure("quote", "serialization", error.to_string(), 7),
        },
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("quote", error_class, message, exit_code)
        }
    }
}
