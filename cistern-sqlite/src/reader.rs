use crate::{
    SqliteConnection,
    extract::{extract_name, extract_value},
    prepared::SqlitePrepared,
    sqlite_error,
};
use cistern_core::{Result, Row, RowNames, RowReader};
use libsqlite3_sys::{SQLITE_DONE, SQLITE_ROW, sqlite3_column_count, sqlite3_db_handle, sqlite3_step};
use std::marker::PhantomData;

/// Forward only reader over the rows of a statement. The statement is
/// finalized when the reader is dropped.
///
/// The statement is stepped once on creation, so it runs (and fails) before
/// the reader is handed out. The first row is kept until it is pulled.
pub struct SqliteReader<'c> {
    prepared: SqlitePrepared,
    labels: RowNames,
    first: Option<Row>,
    done: bool,
    _connection: PhantomData<&'c mut SqliteConnection>,
}

impl<'c> SqliteReader<'c> {
    pub(crate) fn new(prepared: SqlitePrepared) -> Result<Self> {
        let labels = unsafe {
            let count = sqlite3_column_count(*prepared.statement);
            (0..count)
                .map(|i| extract_name(*prepared.statement, i))
                .collect::<Result<RowNames>>()?
        };
        let mut reader = Self {
            prepared,
            labels,
            first: None,
            done: false,
            _connection: PhantomData,
        };
        reader.first = reader.step()?;
        Ok(reader)
    }

    fn step(&mut self) -> Result<Option<Row>> {
        if self.done {
            return Ok(None);
        }
        let statement = *self.prepared.statement;
        unsafe {
            match sqlite3_step(statement) {
                SQLITE_ROW => {
                    let values = (0..self.labels.len() as i32)
                        .map(|i| extract_value(statement, i))
                        .collect::<Result<Box<[_]>>>()?;
                    Ok(Some(Row::new(self.labels.clone(), values)))
                }
                SQLITE_DONE => {
                    self.done = true;
                    Ok(None)
                }
                rc => {
                    self.done = true;
                    Err(sqlite_error(sqlite3_db_handle(statement), rc))
                }
            }
        }
    }
}

impl<'c> RowReader for SqliteReader<'c> {
    fn labels(&self) -> &RowNames {
        &self.labels
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        match self.first.take() {
            Some(row) => Ok(Some(row)),
            None => self.step(),
        }
    }
}
