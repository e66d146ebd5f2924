use crate::{
    CBox, SqliteReader, prepared::SqlitePrepared, sql_writer::SqliteSqlWriter, sqlite_error,
};
use cistern_core::{
    ArgumentError, CommandKind, Connection, ConnectionState, Context, Error, Result, RowReader,
    RowsAffected, SqlWriter, Statement, Value, has_more_statements, truncate_long,
};
use libsqlite3_sys::*;
use std::{
    borrow::Cow,
    ffi::{CStr, CString, c_char, c_int},
    ptr,
    time::Duration,
};

/// Busy timeout applied when the statement does not carry one.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A connection to a SQLite database file.
///
/// Accepted connection strings: `sqlite://path?query` (the query parameters
/// are passed to SQLite as URI parameters, for example `mode=ro`), a `file:`
/// URI, or a plain path.
pub struct SqliteConnection {
    filename: CString,
    connection: Option<CBox<*mut sqlite3>>,
}

impl SqliteConnection {
    pub fn new(connection_string: &str) -> Result<Self> {
        let filename = filename(connection_string)?;
        let filename = CString::new(filename.as_ref()).with_context(|| {
            format!(
                "Error while decoding connection string: `{}`",
                connection_string
            )
        })?;
        Ok(Self {
            filename,
            connection: None,
        })
    }

    fn handle(&self) -> Result<*mut sqlite3> {
        match &self.connection {
            Some(connection) => Ok(**connection),
            None => Err(Error::msg("The SQLite connection is not open")),
        }
    }

    /// Prepares the first statement of `sql`, returns it with the number of
    /// bytes consumed. The statement is null for text holding only comments.
    fn prepare(&self, sql: &CStr) -> Result<(SqlitePrepared, usize)> {
        let db = self.handle()?;
        unsafe {
            let mut statement = CBox::new(ptr::null_mut(), |p| {
                sqlite3_finalize(p);
            });
            let mut tail: *const c_char = ptr::null();
            let rc = sqlite3_prepare_v2(db, sql.as_ptr(), -1, &mut *statement, &mut tail);
            if rc != SQLITE_OK {
                return Err(sqlite_error(db, rc).context(format!(
                    "While preparing the query:\n{}",
                    truncate_long!(sql.to_string_lossy())
                )));
            }
            let consumed = if tail.is_null() {
                sql.to_bytes().len()
            } else {
                tail.offset_from(sql.as_ptr()) as usize
            };
            Ok((SqlitePrepared::new(statement), consumed))
        }
    }

    /// Prepares a statement that must be alone in the command.
    fn prepare_single(&mut self, statement: &Statement) -> Result<SqlitePrepared> {
        self.apply_timeout(statement)?;
        let sql = command_text(statement)?;
        let (mut prepared, consumed) = self.prepare(&sql)?;
        let rest = String::from_utf8_lossy(&sql.to_bytes()[consumed..]);
        if has_more_statements(&rest) {
            return Err(Error::msg("Cannot prepare more than one statement at a time")
                .context(format!("While preparing the query:\n{}", statement)));
        }
        if prepared.statement.is_null() {
            return Err(Error::msg("The command does not contain any statement"));
        }
        prepared.bind_parameters(&statement.parameters, true)?;
        Ok(prepared)
    }

    fn apply_timeout(&mut self, statement: &Statement) -> Result<()> {
        let db = self.handle()?;
        let timeout = statement.timeout.unwrap_or(DEFAULT_BUSY_TIMEOUT);
        unsafe {
            sqlite3_busy_timeout(db, timeout.as_millis().min(c_int::MAX as u128) as c_int);
        }
        Ok(())
    }

    fn run_script(&mut self, statement: &Statement) -> Result<RowsAffected> {
        self.apply_timeout(statement)?;
        let db = self.handle()?;
        let sql = command_text(statement)?;
        let mut rows_affected = 0u64;
        let mut offset = 0;
        loop {
            let rest = &sql.to_bytes_with_nul()[offset..];
            let rest = CStr::from_bytes_with_nul(rest)?;
            if !has_more_statements(&rest.to_string_lossy()) {
                break;
            }
            let (mut prepared, consumed) = self.prepare(rest)?;
            offset += consumed;
            if prepared.statement.is_null() {
                if consumed == 0 {
                    break;
                }
                continue;
            }
            prepared.bind_parameters(&statement.parameters, false)?;
            let before = unsafe { sqlite3_total_changes64(db) };
            loop {
                match unsafe { sqlite3_step(*prepared.statement) } {
                    SQLITE_ROW => continue,
                    SQLITE_DONE => break,
                    rc => {
                        return Err(sqlite_error(db, rc).context(format!(
                            "While executing the query:\n{}",
                            statement
                        )));
                    }
                }
            }
            // The changes counter is only updated by INSERT, UPDATE and DELETE
            // and does not count rows written by triggers
            unsafe {
                if sqlite3_total_changes64(db) != before {
                    rows_affected += sqlite3_changes64(db).max(0) as u64;
                }
            }
        }
        unsafe {
            Ok(RowsAffected {
                rows_affected,
                last_affected_id: if rows_affected > 0 {
                    Some(sqlite3_last_insert_rowid(db))
                } else {
                    None
                },
            })
        }
    }
}

impl Connection for SqliteConnection {
    fn state(&self) -> ConnectionState {
        if self.connection.is_some() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    fn open(&mut self) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }
        unsafe {
            let mut connection = CBox::new(ptr::null_mut(), |p| {
                sqlite3_close(p);
            });
            let rc = sqlite3_open_v2(
                self.filename.as_ptr(),
                &mut *connection,
                SQLITE_OPEN_READWRITE | SQLITE_OPEN_CREATE | SQLITE_OPEN_URI,
                ptr::null(),
            );
            if rc != SQLITE_OK {
                let error = sqlite_error(*connection, rc).context(format!(
                    "Could not open the database `{}`",
                    self.filename.to_string_lossy()
                ));
                log::error!("{:#}", error);
                return Err(error);
            }
            sqlite3_extended_result_codes(*connection, 1);
            self.connection = Some(connection);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.connection = None;
        Ok(())
    }

    fn begin(&mut self) -> Result<()> {
        self.run_script(&Statement::text("BEGIN")).map(|_| ())
    }

    fn commit(&mut self) -> Result<()> {
        self.run_script(&Statement::text("COMMIT")).map(|_| ())
    }

    fn rollback(&mut self) -> Result<()> {
        self.run_script(&Statement::text("ROLLBACK")).map(|_| ())
    }

    fn in_transaction(&self) -> bool {
        match self.handle() {
            Ok(db) => unsafe { sqlite3_get_autocommit(db) == 0 },
            Err(..) => false,
        }
    }

    fn query<'c>(&'c mut self, statement: &Statement) -> Result<Box<dyn RowReader + 'c>> {
        let prepared = self.prepare_single(statement)?;
        let reader = SqliteReader::new(prepared)
            .with_context(|| format!("While executing the query:\n{}", statement))?;
        Ok(Box::new(reader))
    }

    fn query_scalar(&mut self, statement: &Statement) -> Result<Value> {
        let mut reader = SqliteReader::new(self.prepare_single(statement)?)
            .with_context(|| format!("While executing the query:\n{}", statement))?;
        Ok(reader
            .next_row()?
            .and_then(|row| row.values.into_iter().next())
            .unwrap_or(Value::Null))
    }

    fn execute(&mut self, statement: &Statement) -> Result<RowsAffected> {
        self.run_script(statement)
    }
}

/// SQL text to prepare for `statement`, according to its kind.
fn command_text(statement: &Statement) -> Result<CString> {
    let text = match statement.kind {
        CommandKind::Text | CommandKind::Script => Cow::Borrowed(statement.text.as_str()),
        CommandKind::TableDirect => {
            let mut sql = String::from("SELECT * FROM ");
            SqliteSqlWriter.write_identifier_quoted(&mut sql, statement.text.trim());
            Cow::Owned(sql)
        }
        CommandKind::StoredProcedure => {
            return Err(Error::msg("SQLite does not support stored procedures"));
        }
    };
    CString::new(text.as_ref())
        .with_context(|| format!("Could not create a CString from the query:\n{}", statement))
}

fn filename(connection_string: &str) -> Result<Cow<'_, str>> {
    let Some(rest) = connection_string.strip_prefix("sqlite://") else {
        if connection_string.contains("://") {
            return Err(ArgumentError::new(
                "connection_string",
                format!(
                    "expected a sqlite connection string, found `{}`",
                    connection_string
                ),
            )
            .into());
        }
        return Ok(Cow::Borrowed(connection_string));
    };
    let (path, query) = match rest.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (rest, None),
    };
    let path = urlencoding::decode(path)
        .with_context(|| format!("Could not decode the path of `{}`", connection_string))?;
    Ok(match query {
        Some(query) if !query.is_empty() => Cow::Owned(format!("file:{}?{}", path, query)),
        _ => path,
    })
}

#[cfg(test)]
mod tests {
    use super::{SqliteConnection, filename};
    use cistern_core::{Connection, DriverError, Value};
    use libsqlite3_sys::SQLITE_RANGE;
    use std::ffi::CString;

    #[test]
    fn bind_failure_is_a_driver_error() {
        let mut connection = SqliteConnection::new(":memory:").unwrap();
        connection.open().unwrap();
        let sql = CString::new("SELECT ?1").unwrap();
        let (mut prepared, _) = connection.prepare(&sql).unwrap();
        let error = prepared
            .bind_index(&Value::Int64(Some(1)), 5)
            .unwrap_err();
        let driver = error
            .root_cause()
            .downcast_ref::<DriverError>()
            .expect("The root cause should be a DriverError");
        assert_eq!(driver.code, SQLITE_RANGE);
    }

    #[test]
    fn connection_strings() {
        assert_eq!(filename("sqlite://data.db").unwrap(), "data.db");
        assert_eq!(filename("sqlite:///tmp/data.db").unwrap(), "/tmp/data.db");
        assert_eq!(
            filename("sqlite://my%20data.db?mode=ro").unwrap(),
            "file:my data.db?mode=ro"
        );
        assert_eq!(filename("sqlite://:memory:").unwrap(), ":memory:");
        assert_eq!(filename("file:data.db?mode=rwc").unwrap(), "file:data.db?mode=rwc");
        assert_eq!(filename("/var/lib/app.sqlite").unwrap(), "/var/lib/app.sqlite");
        assert!(filename("postgres://localhost/app").is_err());
    }
}
