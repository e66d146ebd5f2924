use crate::{
    ArgumentError, CommandKind, Connection, Database, Query, Result, SqlWriter, Statement,
    StatementSink,
};
use std::fmt::{self, Debug};

/// The connection a [`Command`] runs on.
pub enum CommandConnection<'c> {
    /// Created for this command: released together with it.
    Owned(Box<dyn Connection>),
    /// Supplied by the caller (or a transaction), left as found.
    Borrowed(&'c mut dyn Connection),
}

impl<'c> CommandConnection<'c> {
    pub fn owns_connection(&self) -> bool {
        matches!(self, CommandConnection::Owned(..))
    }
    pub fn get(&mut self) -> &mut dyn Connection {
        match self {
            CommandConnection::Owned(connection) => connection.as_mut(),
            CommandConnection::Borrowed(connection) => &mut **connection,
        }
    }
}

/// A fully bound unit of execution: statement plus connection.
///
/// A command owning its connection closes it when dropped.
pub struct Command<'c> {
    statement: Statement,
    connection: CommandConnection<'c>,
    in_transaction: bool,
}

impl<'c> Command<'c> {
    /// Command over a caller supplied connection, open or not.
    pub fn new(statement: Statement, connection: &'c mut dyn Connection) -> Result<Self> {
        Self::bound(statement, CommandConnection::Borrowed(connection), false)
    }

    pub(crate) fn bound(
        statement: Statement,
        connection: CommandConnection<'c>,
        in_transaction: bool,
    ) -> Result<Self> {
        if statement.text.trim().is_empty() {
            return Err(ArgumentError::new("command", "the command text is empty").into());
        }
        Ok(Self {
            statement,
            connection,
            in_transaction,
        })
    }

    pub fn statement(&self) -> &Statement {
        &self.statement
    }
    pub fn statement_mut(&mut self) -> &mut Statement {
        &mut self.statement
    }
    pub fn owns_connection(&self) -> bool {
        self.connection.owns_connection()
    }
    /// Whether the command is bound to a transaction.
    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }
    pub fn connection(&mut self) -> &mut dyn Connection {
        self.connection.get()
    }
    /// Statement and connection, borrowed at the same time.
    pub(crate) fn parts(&mut self) -> (&Statement, &mut dyn Connection) {
        (&self.statement, self.connection.get())
    }
}

impl<'c> Drop for Command<'c> {
    fn drop(&mut self) {
        if let CommandConnection::Owned(connection) = &mut self.connection {
            if connection.is_open() {
                if let Err(e) = connection.close() {
                    log::warn!("Could not close the connection of a command: {:#}", e);
                }
            }
        }
    }
}

impl<'c> Debug for Command<'c> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("statement", &self.statement)
            .field("owns_connection", &self.owns_connection())
            .field("in_transaction", &self.in_transaction)
            .finish()
    }
}

/// Anything that can be turned into a [`Statement`] by a provider's writer:
/// SQL text, `(text, kind)`, a ready statement, or a [`Query`].
pub trait IntoStatement {
    fn into_statement(self, writer: &dyn SqlWriter) -> Result<Statement>;
}

fn text_statement(text: String, kind: CommandKind) -> Result<Statement> {
    if text.trim().is_empty() {
        return Err(ArgumentError::new("sql", "the SQL text is empty").into());
    }
    Ok(Statement::new(text, kind))
}

impl IntoStatement for &str {
    fn into_statement(self, _writer: &dyn SqlWriter) -> Result<Statement> {
        text_statement(self.to_string(), CommandKind::Text)
    }
}

impl IntoStatement for String {
    fn into_statement(self, _writer: &dyn SqlWriter) -> Result<Statement> {
        text_statement(self, CommandKind::Text)
    }
}

impl IntoStatement for (&str, CommandKind) {
    fn into_statement(self, _writer: &dyn SqlWriter) -> Result<Statement> {
        text_statement(self.0.to_string(), self.1)
    }
}

impl IntoStatement for Statement {
    fn into_statement(self, _writer: &dyn SqlWriter) -> Result<Statement> {
        if self.text.trim().is_empty() {
            return Err(ArgumentError::new("statement", "the statement text is empty").into());
        }
        Ok(self)
    }
}

impl<Q: Query> IntoStatement for &Q {
    fn into_statement(self, writer: &dyn SqlWriter) -> Result<Statement> {
        render_query(self, writer)
    }
}

/// Renders `query` with `writer` and materializes its parameters, in the
/// order the writer declared them.
pub fn render_query<Q: Query + ?Sized>(query: &Q, writer: &dyn SqlWriter) -> Result<Statement> {
    let mut sink = StatementSink::new();
    query.build_statement(&mut sink)?;
    if sink.is_empty() {
        return Err(ArgumentError::new("query", "the query produced no statement").into());
    }
    let kind = query.command_kind();
    let rendered = writer.render(&sink, kind)?;
    let mut statement = Statement::new(rendered.text, kind);
    for (index, descriptor) in rendered.parameters.iter().enumerate() {
        let mut parameter = writer.create_command_parameter(index, descriptor)?;
        writer.populate_parameter(&mut parameter, descriptor)?;
        statement.parameters.push(parameter);
    }
    if statement.text.trim().is_empty() {
        return Err(ArgumentError::new("query", "the query rendered an empty text").into());
    }
    Ok(statement)
}

/// Input accepted by the execution routines of [`Database`].
///
/// Statements and queries get a new connection owned by the command; a
/// [`Command`] is used as it is.
pub trait IntoCommand<'c> {
    fn into_command(self, database: &Database) -> Result<Command<'c>>;
}

impl<S: IntoStatement> IntoCommand<'static> for S {
    fn into_command(self, database: &Database) -> Result<Command<'static>> {
        database.command(self)
    }
}

impl<'c> IntoCommand<'c> for Command<'c> {
    fn into_command(self, _database: &Database) -> Result<Command<'c>> {
        Ok(self)
    }
}
