//! batchlens: batch LLM analysis of a codebase (library crate).
//!
//! Re-exports public modules for integration tests and external use.

pub mod aggregate;
pub mod analyzer;
pub mod artifacts;
pub mod batch;
pub mod client;
pub mod collect;
pub mod config;
pub mod constants;
pub mod env;
pub mod limiter;
pub mod models;
pub mod orchestrator;
pub mod progress;
pub mod providers;
pub mod session;
