mod concurrency;
mod execute;
mod failures;
mod fetch;
mod profiling;
mod scalar;
mod spy;
#[cfg(not(feature = "disable-transactions"))]
mod transactions;

use crate::{
    concurrency::concurrency, execute::execute, failures::failures, fetch::fetch,
    profiling::profiling, scalar::scalar,
};
use cistern_core::Database;
use log::LevelFilter;
use std::env;
#[cfg(not(feature = "disable-transactions"))]
use transactions::transactions;

pub use spy::*;

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Runs every suite against `db`. The suites create and drop their own tables.
pub fn execute_tests(db: &Database) {
    scalar(db);
    fetch(db);
    execute(db);
    silent_logs! {
        failures(db);
    }
    #[cfg(not(feature = "disable-transactions"))]
    transactions(db);
    concurrency(db);
    silent_logs! {
        profiling(db);
    }
}
