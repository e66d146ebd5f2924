//! The execution engine.
//!
//! Every routine resolves its input into a [`Command`], then goes through the
//! same sequence: open the connection when closed, begin the profile
//! record, execute, release the reader, close the connection if this call
//! opened it, end the profile record. Failures are funnelled through a single
//! choke point which, depending on [`wrap_errors`](crate::wrap_errors), wraps
//! them into a [`DataError`](crate::DataError) or lets them through unchanged.
//!
//! The `try_` variants accept an error callback. When it sets
//! [`ErrorContext::handled`], the call returns the default result of its shape
//! instead of failing. An error returned by the callback itself propagates as
//! it is.

use crate::{
    Command, Connection, Context, Database, Error, ErrorContext, IntoCommand, Result, Row, Rows,
    RowsAffected, Statement, Value, error::raise,
};

impl Database {
    /// The single execution routine shared by every result shape.
    ///
    /// `action` receives the connection, open, and the statement. Any reader
    /// it creates must be dropped before it returns.
    fn run<T>(
        &self,
        command: &mut Command<'_>,
        action: impl FnOnce(&mut dyn Connection, &Statement) -> Result<T>,
    ) -> Result<T> {
        let (statement, connection) = command.parts();
        let opened = if connection.is_open() {
            false
        } else {
            connection
                .open()
                .with_context(|| format!("While opening a connection to `{}`", self.name()))?;
            true
        };
        let profile = self.active_profiler().map(|profiler| {
            let token = profiler.begin_execution(
                self.name(),
                &statement.text,
                &statement.parameter_values(),
            );
            (profiler, token)
        });
        log::debug!("[{}] {}", self.name(), statement);
        let result = action(&mut *connection, statement);
        if opened {
            if let Err(e) = connection.close() {
                log::warn!("Could not close the connection to `{}`: {:#}", self.name(), e);
            }
        }
        if let Some((profiler, token)) = profile {
            profiler.end_execution(token);
        }
        result
    }

    /// Propagate mode of the choke point.
    fn fail(&self, error: Error) -> Error {
        let message = ErrorContext::new(&error).message;
        log::error!("[{}] {:#}", self.name(), error);
        raise(error, message)
    }

    /// Callback-veto mode of the choke point.
    fn recover<T>(
        &self,
        error: Error,
        on_error: &mut impl FnMut(&mut ErrorContext) -> Result<()>,
        default: impl FnOnce() -> T,
    ) -> Result<T> {
        let mut context = ErrorContext::new(&error);
        on_error(&mut context)?;
        if context.handled {
            log::warn!("[{}] Handled error: {:#}", self.name(), error);
            return Ok(default());
        }
        let message = context.message;
        log::error!("[{}] {:#}", self.name(), error);
        Err(raise(error, message))
    }

    fn fetch_rows<T>(
        &self,
        command: &mut Command<'_>,
        f: impl FnOnce(&mut Rows) -> Result<T>,
    ) -> Result<T> {
        self.run(command, |connection, statement| {
            let mut rows = Rows::new(connection.query(statement)?);
            f(&mut rows)
        })
    }

    /// Executes the command and hands the rows to `f`, returning what it
    /// returns. The rows are released before this returns, also on failure.
    pub fn fetch<'c, T>(
        &self,
        command: impl IntoCommand<'c>,
        f: impl FnOnce(&mut Rows) -> Result<T>,
    ) -> Result<T> {
        let mut command = command.into_command(self)?;
        self.fetch_rows(&mut command, f).map_err(|e| self.fail(e))
    }

    /// Like [`fetch`](Self::fetch), passing a caller owned context to `f`.
    pub fn fetch_with<'c, C, T>(
        &self,
        command: impl IntoCommand<'c>,
        context: &mut C,
        f: impl FnOnce(&mut C, &mut Rows) -> Result<T>,
    ) -> Result<T> {
        self.fetch(command, |rows| f(context, rows))
    }

    /// Calls `f` for every row, returns the number of rows.
    pub fn fetch_each<'c>(
        &self,
        command: impl IntoCommand<'c>,
        mut f: impl FnMut(Row) -> Result<()>,
    ) -> Result<u64> {
        self.fetch(command, |rows| {
            for row in rows.by_ref() {
                f(row?)?;
            }
            Ok(rows.fetched())
        })
    }

    pub fn fetch_all<'c>(&self, command: impl IntoCommand<'c>) -> Result<Vec<Row>> {
        self.fetch(command, |rows| rows.collect())
    }

    /// First column of the first row, [`Value::Null`] when there are no rows.
    pub fn scalar<'c>(&self, command: impl IntoCommand<'c>) -> Result<Value> {
        let mut command = command.into_command(self)?;
        self.run(&mut command, |connection, statement| connection.query_scalar(statement))
            .map_err(|e| self.fail(e))
    }

    /// Executes a statement not returning rows.
    pub fn execute<'c>(&self, command: impl IntoCommand<'c>) -> Result<RowsAffected> {
        let mut command = command.into_command(self)?;
        self.run(&mut command, |connection, statement| connection.execute(statement))
            .map_err(|e| self.fail(e))
    }

    /// [`fetch`](Self::fetch) returning `None` when `on_error` handles the failure.
    pub fn try_fetch<'c, T>(
        &self,
        command: impl IntoCommand<'c>,
        f: impl FnOnce(&mut Rows) -> Result<T>,
        mut on_error: impl FnMut(&mut ErrorContext) -> Result<()>,
    ) -> Result<Option<T>> {
        let mut command = command.into_command(self)?;
        match self.fetch_rows(&mut command, f) {
            Ok(v) => Ok(Some(v)),
            Err(e) => self.recover(e, &mut on_error, || None),
        }
    }

    /// [`scalar`](Self::scalar) returning [`Value::Null`] when `on_error`
    /// handles the failure.
    pub fn try_scalar<'c>(
        &self,
        command: impl IntoCommand<'c>,
        mut on_error: impl FnMut(&mut ErrorContext) -> Result<()>,
    ) -> Result<Value> {
        let mut command = command.into_command(self)?;
        match self.run(&mut command, |connection, statement| connection.query_scalar(statement)) {
            Ok(v) => Ok(v),
            Err(e) => self.recover(e, &mut on_error, || Value::Null),
        }
    }

    /// [`execute`](Self::execute) returning zero affected rows when
    /// `on_error` handles the failure.
    pub fn try_execute<'c>(
        &self,
        command: impl IntoCommand<'c>,
        mut on_error: impl FnMut(&mut ErrorContext) -> Result<()>,
    ) -> Result<RowsAffected> {
        let mut command = command.into_command(self)?;
        match self.run(&mut command, |connection, statement| connection.execute(statement)) {
            Ok(v) => Ok(v),
            Err(e) => self.recover(e, &mut on_error, RowsAffected::default),
        }
    }
}
