use crate::{Result, Row, RowNames, RowsAffected, Statement, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Closed,
    Open,
}

/// A physical link to a database.
///
/// Connections start closed. The execution engine opens a closed connection
/// right before executing and closes it right after, but only when it opened
/// it itself. A connection is not safe for simultaneous use: callers sharing
/// one across threads must serialize access.
pub trait Connection: Send {
    fn state(&self) -> ConnectionState;

    fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    fn open(&mut self) -> Result<()>;

    /// Closing a closed connection does nothing.
    fn close(&mut self) -> Result<()>;

    /// Start the native transaction.
    fn begin(&mut self) -> Result<()>;

    fn commit(&mut self) -> Result<()>;

    fn rollback(&mut self) -> Result<()>;

    /// True while a native transaction is active on this connection.
    fn in_transaction(&self) -> bool;

    /// Execute and return a reader over the resulting rows.
    fn query<'c>(&'c mut self, statement: &Statement) -> Result<Box<dyn RowReader + 'c>>;

    /// Execute and return the first column of the first row, `Value::Null`
    /// when there are no rows.
    fn query_scalar(&mut self, statement: &Statement) -> Result<Value>;

    /// Execute and return the number of affected rows.
    fn execute(&mut self, statement: &Statement) -> Result<RowsAffected>;
}

/// Forward only reader over the rows of an execution.
///
/// Dropping the reader releases it.
pub trait RowReader {
    fn labels(&self) -> &RowNames;
    /// `Ok(None)` once the rows are exhausted.
    fn next_row(&mut self) -> Result<Option<Row>>;
}

/// Lazy cursor over the rows produced by an execution.
///
/// It is finite and cannot be restarted: once it returns `None` (or an error)
/// it keeps returning `None`.
pub struct Rows<'r> {
    reader: Box<dyn RowReader + 'r>,
    done: bool,
    fetched: u64,
}

impl<'r> Rows<'r> {
    pub fn new(reader: Box<dyn RowReader + 'r>) -> Self {
        Self {
            reader,
            done: false,
            fetched: 0,
        }
    }
    pub fn labels(&self) -> &RowNames {
        self.reader.labels()
    }
    /// Rows pulled so far.
    pub fn fetched(&self) -> u64 {
        self.fetched
    }
    pub fn is_done(&self) -> bool {
        self.done
    }
}

impl<'r> Iterator for Rows<'r> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_row() {
            Ok(Some(row)) => {
                self.fetched += 1;
                Some(Ok(row))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl<'r> std::iter::FusedIterator for Rows<'r> {}

/// Reader over rows already in memory. Useful for drivers that buffer, and for tests.
pub struct BufferedReader {
    labels: RowNames,
    rows: std::vec::IntoIter<Result<Row>>,
}

impl BufferedReader {
    pub fn new(labels: RowNames, rows: Vec<Result<Row>>) -> Self {
        Self {
            labels,
            rows: rows.into_iter(),
        }
    }
}

impl RowReader for BufferedReader {
    fn labels(&self) -> &RowNames {
        &self.labels
    }
    fn next_row(&mut self) -> Result<Option<Row>> {
        self.rows.next().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    fn row(v: i64) -> Row {
        Row::new(["v".to_string()].into(), [Value::Int64(Some(v))].into())
    }

    #[test]
    fn rows_are_not_restartable() {
        let reader = BufferedReader::new(["v".to_string()].into(), vec![Ok(row(1)), Ok(row(2))]);
        let mut rows = Rows::new(Box::new(reader));
        assert_eq!(rows.labels().len(), 1);
        assert_eq!(rows.next().unwrap().unwrap(), row(1));
        assert_eq!(rows.next().unwrap().unwrap(), row(2));
        assert!(rows.next().is_none());
        assert!(rows.next().is_none());
        assert!(rows.is_done());
        assert_eq!(rows.fetched(), 2);
    }

    #[test]
    fn rows_stop_after_error() {
        let reader = BufferedReader::new(
            ["v".to_string()].into(),
            vec![Ok(row(1)), Err(Error::msg("broken")), Ok(row(3))],
        );
        let rows = Rows::new(Box::new(reader));
        let collected = rows.collect::<Vec<_>>();
        assert_eq!(collected.len(), 2);
        assert!(collected[1].is_err());
    }
}
