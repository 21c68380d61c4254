pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
pub use fixtures::{SeedResult, SeedVoucherInfo, VerificationResult, VoucherSeedDataset};
pub use repositories::{
    InMemoryUsageRepository, InMemoryVoucherRepository, RepositoryError, SqlUsageRepository,
    SqlVoucherRepository, UsageRepository, VoucherRepository,
};
