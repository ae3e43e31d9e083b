pub mod store;
pub mod glitch;
pub mod classify;
pub mod intervals;
pub mod analysis;
pub mod ingest;
pub mod traits;
pub mod report;
pub mod config;
