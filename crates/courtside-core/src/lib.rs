// Library root: player data, contract scoring, session table, analytics and
// the keyword query assistant. Re-exports all modules for the CLI crate and
// integration tests.

pub mod analytics;
pub mod config;
pub mod players;
pub mod query;
pub mod search;
pub mod table;
pub mod valuation;
