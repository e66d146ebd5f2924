use crate::{CBox, sqlite_error};
use cistern_core::{Error, Parameter, ParameterDirection, Result, Value, truncate_long};
use libsqlite3_sys::*;
use rust_decimal::prelude::ToPrimitive;
use std::{
    ffi::{CStr, CString, c_int},
    os::raw::{c_char, c_void},
};

/// A prepared SQLite statement, finalized on drop.
pub(crate) struct SqlitePrepared {
    pub(crate) statement: CBox<*mut sqlite3_stmt>,
}

impl SqlitePrepared {
    pub(crate) fn new(statement: CBox<*mut sqlite3_stmt>) -> Self {
        Self { statement }
    }

    fn sql(&self) -> String {
        unsafe {
            let sql = sqlite3_sql(*self.statement);
            if sql.is_null() {
                return String::new();
            }
            CStr::from_ptr(sql).to_string_lossy().into_owned()
        }
    }

    /// Binds the parameters of a command.
    ///
    /// Parameters named `?N`, `:name`, `@name` or `$name` are bound to the
    /// placeholder with that name, the others by position. When `strict` is
    /// false a named parameter the statement does not declare is skipped,
    /// which is how the statements of a script share one parameter list.
    pub(crate) fn bind_parameters(&mut self, parameters: &[Parameter], strict: bool) -> Result<()> {
        let count = unsafe { sqlite3_bind_parameter_count(*self.statement) };
        for (position, parameter) in parameters.iter().enumerate() {
            if parameter.direction != ParameterDirection::Input {
                return Err(Error::msg(format!(
                    "SQLite supports only input parameters, `{}` is {:?}",
                    parameter.name, parameter.direction
                )));
            }
            let index = if is_named(&parameter.name) {
                let name = CString::new(parameter.name.as_str())?;
                unsafe { sqlite3_bind_parameter_index(*self.statement, name.as_ptr()) }
            } else {
                position as c_int + 1
            };
            if index == 0 || index > count {
                if strict {
                    return Err(Error::msg(format!(
                        "The statement has no parameter `{}`:\n{}",
                        if parameter.name.is_empty() {
                            format!("#{}", position + 1)
                        } else {
                            parameter.name.clone()
                        },
                        truncate_long!(self.sql())
                    )));
                }
                continue;
            }
            self.bind_index(&parameter.value, index)?;
        }
        Ok(())
    }

    pub(crate) fn bind_index(&mut self, value: &Value, index: c_int) -> Result<()> {
        unsafe {
            let rc = match value {
                v if v.is_null() => sqlite3_bind_null(*self.statement, index),
                Value::Boolean(Some(v)) => sqlite3_bind_int(*self.statement, index, *v as c_int),
                Value::Int32(Some(v)) => sqlite3_bind_int(*self.statement, index, *v),
                Value::Int64(Some(v)) => sqlite3_bind_int64(*self.statement, index, *v),
                Value::Float64(Some(v)) => sqlite3_bind_double(*self.statement, index, *v),
                Value::Decimal(Some(v)) => sqlite3_bind_double(
                    *self.statement,
                    index,
                    v.to_f64().ok_or_else(|| {
                        Error::msg(format!("Cannot convert the Decimal value `{}` to f64", v))
                    })?,
                ),
                Value::Varchar(Some(v)) => self.bind_text(index, v),
                Value::Blob(Some(v)) => sqlite3_bind_blob(
                    *self.statement,
                    index,
                    v.as_ptr() as *const c_void,
                    v.len() as c_int,
                    SQLITE_TRANSIENT(),
                ),
                Value::Date(..) | Value::Time(..) | Value::Timestamp(..) | Value::Uuid(..) => {
                    let text = value.to_canonical_text().ok_or_else(|| {
                        Error::msg(format!("Cannot format {:?} as text", value))
                    })?;
                    self.bind_text(index, &text)
                }
                _ => {
                    let error =
                        Error::msg(format!("Cannot use a {:?} as a query parameter", value));
                    log::error!("{:#}", error);
                    return Err(error);
                }
            };
            if rc != SQLITE_OK {
                let db = sqlite3_db_handle(*self.statement);
                let error = sqlite_error(db, rc).context(format!(
                    "Cannot bind parameter {} to query:\n{}",
                    index,
                    truncate_long!(self.sql())
                ));
                log::error!("{:#}", error);
                return Err(error);
            }
            Ok(())
        }
    }

    fn bind_text(&mut self, index: c_int, value: &str) -> c_int {
        unsafe {
            sqlite3_bind_text(
                *self.statement,
                index,
                value.as_ptr() as *const c_char,
                value.len() as c_int,
                SQLITE_TRANSIENT(),
            )
        }
    }
}

fn is_named(name: &str) -> bool {
    name.len() > 1 && name.starts_with([':', '@', '$', '?'])
}

#[cfg(test)]
mod tests {
    use super::is_named;

    #[test]
    fn named_parameters() {
        assert!(is_named("?1"));
        assert!(is_named(":id"));
        assert!(is_named("@id"));
        assert!(is_named("$id"));
        assert!(!is_named("?"));
        assert!(!is_named(""));
        assert!(!is_named("id"));
    }
}
