use crate::{
    ArgumentError, Command, CommandConnection, Connection, Database, ErrorContext, IntoStatement,
    Result, Row, Rows, RowsAffected, Value, logged,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    Active,
    Committed,
    RolledBack,
}

/// A native transaction together with the connection it runs on.
///
/// If the connection was closed when the transaction started, the transaction
/// opened it and closes it when disposed. Disposing a transaction that is
/// still active rolls it back. Dropping a transaction disposes it.
///
/// ```no_run
/// # fn run(db: &cistern_core::Database) -> cistern_core::Result<()> {
/// let mut transaction = db.begin_transaction()?;
/// transaction.execute("INSERT INTO items (name) VALUES ('hammer')")?;
/// transaction.commit()?;
/// # Ok(())
/// # }
/// ```
pub struct Transaction<'c> {
    database: Database,
    connection: CommandConnection<'c>,
    opened_connection: bool,
    state: TransactionState,
    disposed: bool,
}

impl<'c> Transaction<'c> {
    /// Begins a transaction on a caller supplied connection.
    pub fn begin(database: &Database, connection: &'c mut dyn Connection) -> Result<Self> {
        Self::start(database.clone(), CommandConnection::Borrowed(connection))
    }

    pub(crate) fn start(database: Database, mut connection: CommandConnection<'c>) -> Result<Self> {
        let opened_connection = if connection.get().is_open() {
            false
        } else {
            connection.get().open()?;
            true
        };
        if let Err(e) = connection.get().begin() {
            if opened_connection {
                if let Err(closed) = connection.get().close() {
                    log::warn!(
                        "[{}] Could not close the connection after a failed begin: {:#}",
                        database.name(),
                        closed
                    );
                }
            }
            return Err(logged!(e.context("Could not begin the transaction")));
        }
        log::debug!("[{}] Transaction started", database.name());
        Ok(Self {
            database,
            connection,
            opened_connection,
            state: TransactionState::Active,
            disposed: false,
        })
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }
    pub fn database(&self) -> &Database {
        &self.database
    }
    /// Whether the transaction opened its connection, and will close it.
    pub fn opened_connection(&self) -> bool {
        self.opened_connection
    }

    fn ensure_active(&self) -> Result<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => {
                Err(ArgumentError::new("transaction", "the transaction is already committed").into())
            }
            TransactionState::RolledBack => Err(ArgumentError::new(
                "transaction",
                "the transaction is already rolled back",
            )
            .into()),
        }
    }

    pub fn commit(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.connection
            .get()
            .commit()
            .map_err(|e| logged!(e.context("Could not commit the transaction")))?;
        self.state = TransactionState::Committed;
        log::debug!("[{}] Transaction committed", self.database.name());
        Ok(())
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.ensure_active()?;
        self.connection
            .get()
            .rollback()
            .map_err(|e| logged!(e.context("Could not roll back the transaction")))?;
        self.state = TransactionState::RolledBack;
        log::debug!("[{}] Transaction rolled back", self.database.name());
        Ok(())
    }

    /// Rolls back if not committed and the native transaction is still live,
    /// then closes the connection if the transaction opened it. Calling it
    /// again does nothing.
    pub fn dispose(&mut self) -> Result<()> {
        if self.disposed {
            return Ok(());
        }
        self.disposed = true;
        let connection = self.connection.get();
        let mut result = Ok(());
        if self.state != TransactionState::Committed && connection.in_transaction() {
            log::debug!("[{}] Rolling back the transaction", self.database.name());
            result = connection.rollback();
        }
        if self.state == TransactionState::Active {
            self.state = TransactionState::RolledBack;
        }
        if self.opened_connection && connection.is_open() {
            let closed = connection.close();
            if result.is_ok() {
                result = closed;
            }
        }
        result
    }

    /// Command bound to the transaction's connection.
    pub fn command(&mut self, input: impl IntoStatement) -> Result<Command<'_>> {
        self.ensure_active()?;
        let statement = self.database.statement(input)?;
        Command::bound(
            statement,
            CommandConnection::Borrowed(self.connection.get()),
            true,
        )
    }

    pub fn fetch<T>(
        &mut self,
        input: impl IntoStatement,
        f: impl FnOnce(&mut Rows) -> Result<T>,
    ) -> Result<T> {
        let database = self.database.clone();
        database.fetch(self.command(input)?, f)
    }

    pub fn fetch_all(&mut self, input: impl IntoStatement) -> Result<Vec<Row>> {
        let database = self.database.clone();
        database.fetch_all(self.command(input)?)
    }

    pub fn scalar(&mut self, input: impl IntoStatement) -> Result<Value> {
        let database = self.database.clone();
        database.scalar(self.command(input)?)
    }

    pub fn execute(&mut self, input: impl IntoStatement) -> Result<RowsAffected> {
        let database = self.database.clone();
        database.execute(self.command(input)?)
    }

    pub fn try_fetch<T>(
        &mut self,
        input: impl IntoStatement,
        f: impl FnOnce(&mut Rows) -> Result<T>,
        on_error: impl FnMut(&mut ErrorContext) -> Result<()>,
    ) -> Result<Option<T>> {
        let database = self.database.clone();
        database.try_fetch(self.command(input)?, f, on_error)
    }

    pub fn try_scalar(
        &mut self,
        input: impl IntoStatement,
        on_error: impl FnMut(&mut ErrorContext) -> Result<()>,
    ) -> Result<Value> {
        let database = self.database.clone();
        database.try_scalar(self.command(input)?, on_error)
    }

    pub fn try_execute(
        &mut self,
        input: impl IntoStatement,
        on_error: impl FnMut(&mut ErrorContext) -> Result<()>,
    ) -> Result<RowsAffected> {
        let database = self.database.clone();
        database.try_execute(self.command(input)?, on_error)
    }
}

impl<'c> Drop for Transaction<'c> {
    fn drop(&mut self) {
        if let Err(e) = self.dispose() {
            log::warn!("Could not dispose the transaction: {:#}", e);
        }
    }
}
