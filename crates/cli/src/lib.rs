pub mod commands;

use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use vouchery_core::config::{AppConfig, LoadOptions};

#[derive(Debug, Parser)]
#[command(
    name = "vouchery",
    about = "Vouchery operator CLI",
    long_about = "Operate the voucher catalog: migrations, demo fixtures, config inspection, \
                  and discount quotes for a purchasable target.",
    after_help = "Examples:\n  vouchery migrate\n  vouchery seed\n  vouchery quote --product 101 --category 10 --store 7 --price 500000"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo voucher catalog and verify it")]
    Seed,
    #[command(about = "Quote the best applicable discount for a purchasable target")]
    Quote {
        #[arg(long, help = "Product id of the line being priced")]
        product: i64,
        #[arg(long, help = "Category id of the product")]
        category: i64,
        #[arg(long, help = "Store id selling the product")]
        store: i64,
        #[arg(long, value_parser = parse_decimal, help = "Base price of the product")]
        price: Decimal,
        #[arg(
            long,
            value_parser = parse_date,
            help = "Evaluation date (YYYY-MM-DD); defaults to today"
        )]
        as_of: Option<NaiveDate>,
    },
    #[command(about = "Inspect effective configuration values")]
    Config,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            let result = commands::CommandResult::failure(
                "config",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
            println!("{}", result.output);
            return ExitCode::from(result.exit_code);
        }
    };
    init_logging(&config);

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(&config),
        Command::Seed => commands::seed::run(&config),
        Command::Quote { product, category, store, price, as_of } => commands::quote::run(
            &config,
            commands::quote::QuoteArgs { product, category, store, price, as_of },
        ),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run(&config) }
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use vouchery_core::config::LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            let _ = tracing_subscriber::fmt()
                .with_target(false)
                .with_max_level(log_level)
                .compact()
                .try_init();
        }
        Pretty => {
            let _ = tracing_subscriber::fmt()
                .with_target(false)
                .with_max_level(log_level)
                .pretty()
                .try_init();
        }
        Json => {
            let _ = tracing_subscriber::fmt()
                .with_target(false)
                .with_max_level(log_level)
                .json()
                .try_init();
        }
    }
}

fn parse_decimal(value: &str) -> Result<Decimal, String> {
    value.parse::<Decimal>().map_err(|error| format!("invalid decimal `{value}`: {error}"))
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|error| format!("invalid date `{value}` (expected YYYY-MM-DD): {error}"))
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::{parse_date, parse_decimal, Cli};

    #[test]
    fn cli_declaration_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn decimal_arguments_parse_plain_and_fractional_values() {
        assert!(parse_decimal("500000").is_ok());
        assert!(parse_decimal("15.5").is_ok());
        assert!(parse_decimal("not-a-number").is_err());
    }

    #[test]
    fn date_arguments_require_iso_format() {
        assert!(parse_date("2026-06-15").is_ok());
        assert!(parse_date("15/06/2026").is_err());
    }
}
