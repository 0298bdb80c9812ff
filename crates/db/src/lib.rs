pub mod connection;
pub mod fixtures;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_memory, connect_with_settings, DbPool};
pub use fixtures::{expected_seed_result, DemoSeedDataset, SeedResult, VerificationResult};
