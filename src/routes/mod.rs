pub mod export;
pub mod reports;
