pub mod database;
pub mod transfer_repository;

pub use database::Database;
pub use transfer_repository::{TransferFilter, TransferRepository, TransferStats};
