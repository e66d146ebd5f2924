//! Error taxonomy.
//!
//! Every fallible operation returns [`Result`](crate::Result), an
//! `anyhow::Result`. The typed errors below travel inside `anyhow::Error` and
//! can be recovered with `downcast_ref`:
//!
//! - [`ArgumentError`]: a required input is missing or unusable. Raised before
//!   any resource is touched, never wrapped.
//! - [`ConfigError`]: unknown driver or named connection, unset connection
//!   string. Raised when a [`Database`](crate::Database) is created.
//! - [`DriverError`]: a physical database operation failed.
//! - [`DataError`]: the generic wrapper used when [`wrap_errors`] is on. Its
//!   `source()` is the original error.

use crate::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

static WRAP_ERRORS: AtomicBool = AtomicBool::new(false);

/// Wrap execution failures into [`DataError`] from now on (`true`), or let
/// them surface unchanged (`false`, the default).
pub fn set_wrap_errors(wrap: bool) {
    WRAP_ERRORS.store(wrap, Ordering::SeqCst);
}

pub fn wrap_errors() -> bool {
    WRAP_ERRORS.load(Ordering::SeqCst)
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid argument `{argument}`: {reason}")]
pub struct ArgumentError {
    pub argument: &'static str,
    pub reason: String,
}

impl ArgumentError {
    pub fn new(argument: &'static str, reason: impl Into<String>) -> Self {
        Self {
            argument,
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("No such driver: `{0}`")]
    NoSuchDriver(String),
    #[error("No connection named `{0}` is configured")]
    UnknownConnection(String),
    #[error("The connection string for `{0}` is not set")]
    MissingConnectionString(String),
    #[error("Cannot determine the driver of connection string `{0}`")]
    UnresolvedDriver(String),
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
}

/// Failure reported by the database itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (code {code})")]
pub struct DriverError {
    /// Native error code of the provider.
    pub code: i32,
    pub message: String,
}

impl DriverError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Generic data access failure wrapping the original error.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct DataError {
    pub message: String,
    #[source]
    pub source: Error,
}

impl DataError {
    pub fn new(message: impl Into<String>, source: Error) -> Self {
        Self {
            message: message.into(),
            source,
        }
    }
}

/// What an error callback receives when an execution fails.
///
/// Setting `handled` makes the call return the default result of its shape
/// instead of failing. `message` becomes the message of the [`DataError`] when
/// the failure is not handled and errors are wrapped.
#[derive(Debug)]
pub struct ErrorContext<'e> {
    pub error: &'e Error,
    pub handled: bool,
    pub message: String,
}

impl<'e> ErrorContext<'e> {
    pub fn new(error: &'e Error) -> Self {
        Self {
            error,
            handled: false,
            message: format!("Error while executing the command: {}", error),
        }
    }

    /// Lowest level error of the chain, usually a [`DriverError`].
    pub fn root_cause(&self) -> &(dyn std::error::Error + 'static) {
        self.error.root_cause()
    }
}

/// The choke point: every execution failure that is not handled goes through here.
pub(crate) fn raise(error: Error, message: String) -> Error {
    if wrap_errors() {
        DataError::new(message, error).into()
    } else {
        error
    }
}
