#![doc(test(attr(deny(warnings))))]

//! Household Core keeps a shared household's monthly income and expense
//! rollup consistent with its transaction log, materializes recurring
//! templates, and hands every user action to a document backend as one
//! atomic write batch.

pub mod config;
pub mod core;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    utils::init_tracing();
}

/// Same as [`init`], using the configured log filter unless `RUST_LOG` is set.
/// Only the first initialization in a process takes effect.
pub fn init_with(config: &config::Config) {
    utils::init_tracing_with(&config.log_filter);
}
