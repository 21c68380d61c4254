use vouchery_core::config::AppConfig;
use vouchery_db::{connect_with_settings, migrations, VoucherSeedDataset};

use crate::commands::CommandResult;

pub fn run(config: &AppConfig) -> CommandResult {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
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

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let seed_result = VoucherSeedDataset::load(&pool)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = VoucherSeedDataset::verify(&pool)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        let run_result: Result<SeedOutput, (&'static str, String, u8)> =
            if !verification.all_present {
                let failed_checks = verification
                    .checks
                    .iter()
                    .filter_map(|(check, passed)| (!passed).then_some(*check))
                    .collect::<Vec<_>>();
                let message = if failed_checks.is_empty() {
                    "Some seed data failed to load".to_string()
                } else {
                    format!("Seed verification failed for checks: {}", failed_checks.join(", "))
                };
                Err(("seed_verification", message, 6u8))
            } else {
                Ok(SeedOutput { vouchers: seed_result.vouchers_seeded })
            };

        pool.close().await;
        run_result
    });

    match result {
        Ok(output) => {
            let voucher_descriptions: Vec<String> = output
                .vouchers
                .iter()
                .map(|voucher| format!("  - {}: {}", voucher.code, voucher.description))
                .collect();
            let message = format!(
                "Demo voucher catalog loaded and verified:\n{}",
                voucher_descriptions.join("\n")
            );
            CommandResult::success("seed", message)
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}

struct SeedOutput {
    vouchers: Vec<vouchery_db::SeedVoucherInfo>,
}
