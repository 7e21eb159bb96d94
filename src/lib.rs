pub mod common;
pub mod config;
pub mod filter;
pub mod infra;
pub mod keys;
pub mod logging;
pub mod observability;
pub mod oracles;
pub mod pacing;
pub mod pipeline;
pub mod record_store;
pub mod stats;
