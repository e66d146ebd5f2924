mod as_value;
mod command;
mod connection;
mod database;
mod driver;
mod error;
mod executor;
mod profiler;
mod properties;
mod query;
mod registry;
mod row;
mod schema;
mod settings;
mod sql_writer;
mod statement;
mod transaction;
mod util;
mod value;

pub use ::anyhow::Context;
pub use ::log;
pub use as_value::*;
pub use command::*;
pub use connection::*;
pub use database::*;
pub use driver::*;
pub use error::{
    ArgumentError, ConfigError, DataError, DriverError, ErrorContext, set_wrap_errors,
    wrap_errors,
};
pub use profiler::*;
pub use properties::*;
pub use query::*;
pub use registry::*;
pub use row::*;
pub use schema::*;
pub use settings::*;
pub use sql_writer::*;
pub use statement::*;
pub use transaction::*;
pub use util::*;
pub use value::*;

pub type Result<T> = anyhow::Result<T>;
pub type Error = anyhow::Error;
