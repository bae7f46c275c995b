// Library root: re-exports all modules so integration tests and the binary
// can access the crate's public API.

pub mod config;
pub mod draft;
pub mod season;
pub mod sim;
pub mod strategy;
pub mod valuation;
