pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod job;
pub mod monitor;
pub mod provider;
pub mod simulator;
pub mod store;
