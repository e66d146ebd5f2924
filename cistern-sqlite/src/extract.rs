use cistern_core::{AsValue, Error, Result, Value};
use libsqlite3_sys::*;
use std::{
    ffi::{CStr, c_int},
    slice,
};

unsafe fn column_bytes<'s>(
    ptr: *const u8,
    statement: *mut sqlite3_stmt,
    index: c_int,
) -> &'s [u8] {
    unsafe {
        let len = sqlite3_column_bytes(statement, index) as usize;
        if ptr.is_null() || len == 0 {
            &[]
        } else {
            slice::from_raw_parts(ptr, len)
        }
    }
}

/// Value of the column at `index` of the current row. SQLite reports the
/// storage class only, so integers come out as `Int64` and strings as `Varchar`.
pub(crate) fn extract_value(statement: *mut sqlite3_stmt, index: c_int) -> Result<Value> {
    unsafe {
        let column_type = sqlite3_column_type(statement, index);
        Ok(match column_type {
            SQLITE_NULL => Value::Null,
            SQLITE_INTEGER => sqlite3_column_int64(statement, index).as_value(),
            SQLITE_FLOAT => sqlite3_column_double(statement, index).as_value(),
            SQLITE_BLOB => {
                let ptr = sqlite3_column_blob(statement, index) as *const u8;
                Value::Blob(Some(column_bytes(ptr, statement, index).into()))
            }
            SQLITE_TEXT => {
                let ptr = sqlite3_column_text(statement, index);
                String::from_utf8(column_bytes(ptr, statement, index).to_vec())
                    .map_err(|e| Error::new(e).context("The column text is not valid UTF-8"))?
                    .as_value()
            }
            _ => {
                return Err(Error::msg(format!("Unexpected column type {}", column_type)));
            }
        })
    }
}

pub(crate) fn extract_name(statement: *mut sqlite3_stmt, index: c_int) -> Result<String> {
    unsafe {
        let name = sqlite3_column_name(statement, index);
        if name.is_null() {
            return Err(Error::msg(format!("Column {} has no name", index)));
        }
        Ok(CStr::from_ptr(name).to_str()?.into())
    }
}
