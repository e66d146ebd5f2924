mod cbox;
mod connection;
mod driver;
mod extract;
mod prepared;
mod reader;
mod schema;
mod sql_writer;

use cistern_core::{DriverError, Error};
use libsqlite3_sys::{sqlite3, sqlite3_errmsg, sqlite3_extended_errcode};
use std::{
    ffi::{CStr, c_char, c_int},
    ptr,
};

pub(crate) use cbox::*;
pub use connection::*;
pub use driver::*;
pub use reader::*;
pub use schema::*;
pub use sql_writer::*;

pub(crate) fn error_message_from_ptr(ptr: &'_ *const c_char) -> &'_ str {
    unsafe {
        if *ptr != ptr::null() {
            CStr::from_ptr(*ptr)
                .to_str()
                .unwrap_or("Unknown error (the error message was not a valid C string)")
        } else {
            "Unknown error (could not extract the error message)"
        }
    }
}

/// The last error of `db` as a [`DriverError`], `rc` is used when the handle
/// is not available.
pub(crate) fn sqlite_error(db: *mut sqlite3, rc: c_int) -> Error {
    unsafe {
        if db.is_null() {
            return DriverError::new(rc, "Could not allocate the SQLite connection").into();
        }
        DriverError::new(
            sqlite3_extended_errcode(db),
            error_message_from_ptr(&sqlite3_errmsg(db)),
        )
        .into()
    }
}
