use cistern_core::{
    BufferedReader, Connection, ConnectionState, DataType, DatabaseProperties, Driver,
    DriverError, Feature, GenericSqlWriter, ParameterStyle, ProfileToken, Profiler,
    PropertiesCache, Result, Row, RowNames, RowReader, RowsAffected, SchemaObject,
    SchemaProvider, SqlWriter, Statement, TopStyle, Value,
};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicU64, Ordering},
};

/// What happened to the connections of a [`SpyDriver`], in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpyEvent {
    Open,
    Close,
    Begin,
    Commit,
    Rollback,
    Query(String),
    Scalar(String),
    Execute(String),
    ReaderDropped,
    ProfileBegin(String),
    ProfileEnd,
}

#[derive(Default)]
struct SpyState {
    events: Mutex<Vec<SpyEvent>>,
    rows: Mutex<Vec<Vec<Value>>>,
    opens: AtomicU64,
    closes: AtomicU64,
    fail_open: AtomicBool,
    fail_begin: AtomicBool,
    fail_rollback: AtomicBool,
}

impl SpyState {
    fn push(&self, event: SpyEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event);
    }
}

/// In memory driver recording every connection operation.
///
/// Every query returns the rows given to [`SpyDriver::set_rows`] (one `value`
/// column). Statements mentioning [`SpyDriver::FAILING_TABLE`] fail with a
/// [`DriverError`].
#[derive(Clone)]
pub struct SpyDriver {
    name: String,
    state: Arc<SpyState>,
    properties: Arc<PropertiesCache>,
}

impl SpyDriver {
    pub const FAILING_TABLE: &'static str = "missing_table";

    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Default::default(),
            properties: Default::default(),
        }
    }

    pub fn set_rows(&self, rows: Vec<Value>) {
        *self.state.rows.lock().unwrap_or_else(|e| e.into_inner()) =
            rows.into_iter().map(|v| vec![v]).collect();
    }

    /// Make every following `open` fail.
    pub fn fail_open(&self, fail: bool) {
        self.state.fail_open.store(fail, Ordering::SeqCst);
    }

    /// Make the next `begin` fail.
    pub fn fail_next_begin(&self) {
        self.state.fail_begin.store(true, Ordering::SeqCst);
    }

    /// Make the next `rollback` fail, leaving the transaction live.
    pub fn fail_next_rollback(&self) {
        self.state.fail_rollback.store(true, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<SpyEvent> {
        self.state
            .events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn clear_events(&self) {
        self.state
            .events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn opens(&self) -> u64 {
        self.state.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> u64 {
        self.state.closes.load(Ordering::SeqCst)
    }

    /// Connections opened and not closed yet.
    pub fn open_connections(&self) -> u64 {
        self.opens() - self.closes()
    }

    /// A profiler writing into the event log of this driver.
    pub fn profiler(&self) -> SpyProfiler {
        SpyProfiler {
            state: self.state.clone(),
            next: AtomicU64::new(0),
        }
    }
}

impl Driver for SpyDriver {
    fn name(&self) -> &str {
        &self.name
    }
    fn connect(&self, _connection_string: &str) -> Result<Box<dyn Connection>> {
        Ok(Box::new(SpyConnection {
            state: self.state.clone(),
            open: false,
            transaction: false,
        }))
    }
    fn sql_writer(&self) -> &dyn SqlWriter {
        &GenericSqlWriter
    }
    fn schema_provider(&self) -> &dyn SchemaProvider {
        &SpySchema
    }
    fn properties(&self, connection_string: &str) -> Result<Arc<DatabaseProperties>> {
        self.properties.get_or_discover(connection_string, || {
            Ok(DatabaseProperties {
                product_name: "spy".into(),
                product_version: "1".into(),
                case_sensitive_identifiers: false,
                parameter_style: ParameterStyle::Numbered('$'),
                top_styles: vec![TopStyle::FetchFirst],
                max_parameters: None,
                features: vec![Feature::Transactions],
            })
        })
    }
}

struct SpySchema;

impl SchemaProvider for SpySchema {
    fn check_supports(&self, object: SchemaObject) -> bool {
        object == SchemaObject::Table
    }
    fn check_supports_data_type(&self, data_type: DataType) -> bool {
        data_type != DataType::Unknown
    }
    fn table_names(&self, _connection: &mut dyn Connection) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

pub struct SpyConnection {
    state: Arc<SpyState>,
    open: bool,
    transaction: bool,
}

impl SpyConnection {
    fn check(&self, statement: &Statement) -> Result<()> {
        if !self.open {
            return Err(DriverError::new(21, "the connection is closed").into());
        }
        if statement.text.contains(SpyDriver::FAILING_TABLE) {
            return Err(DriverError::new(
                1,
                format!("no such table: {}", SpyDriver::FAILING_TABLE),
            )
            .into());
        }
        Ok(())
    }
}

impl Connection for SpyConnection {
    fn state(&self) -> ConnectionState {
        if self.open {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }
    fn open(&mut self) -> Result<()> {
        if self.state.fail_open.load(Ordering::SeqCst) {
            return Err(DriverError::new(14, "unable to open database file").into());
        }
        self.open = true;
        self.state.opens.fetch_add(1, Ordering::SeqCst);
        self.state.push(SpyEvent::Open);
        Ok(())
    }
    fn close(&mut self) -> Result<()> {
        if self.open {
            self.open = false;
            self.transaction = false;
            self.state.closes.fetch_add(1, Ordering::SeqCst);
            self.state.push(SpyEvent::Close);
        }
        Ok(())
    }
    fn begin(&mut self) -> Result<()> {
        if self.state.fail_begin.swap(false, Ordering::SeqCst) {
            return Err(DriverError::new(5, "database is locked").into());
        }
        self.transaction = true;
        self.state.push(SpyEvent::Begin);
        Ok(())
    }
    fn commit(&mut self) -> Result<()> {
        self.transaction = false;
        self.state.push(SpyEvent::Commit);
        Ok(())
    }
    fn rollback(&mut self) -> Result<()> {
        if self.state.fail_rollback.swap(false, Ordering::SeqCst) {
            return Err(DriverError::new(5, "cannot rollback, database is busy").into());
        }
        self.transaction = false;
        self.state.push(SpyEvent::Rollback);
        Ok(())
    }
    fn in_transaction(&self) -> bool {
        self.transaction
    }
    fn query<'c>(&'c mut self, statement: &Statement) -> Result<Box<dyn RowReader + 'c>> {
        self.state.push(SpyEvent::Query(statement.text.clone()));
        self.check(statement)?;
        let labels: RowNames = ["value".to_string()].into();
        let rows = self
            .state
            .rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|v| Ok(Row::new(labels.clone(), v.clone().into_boxed_slice())))
            .collect();
        Ok(Box::new(SpyReader {
            inner: BufferedReader::new(labels, rows),
            state: self.state.clone(),
        }))
    }
    fn query_scalar(&mut self, statement: &Statement) -> Result<Value> {
        self.state.push(SpyEvent::Scalar(statement.text.clone()));
        self.check(statement)?;
        Ok(self
            .state
            .rows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .first()
            .and_then(|v| v.first().cloned())
            .unwrap_or(Value::Null))
    }
    fn execute(&mut self, statement: &Statement) -> Result<RowsAffected> {
        self.state.push(SpyEvent::Execute(statement.text.clone()));
        self.check(statement)?;
        Ok(RowsAffected {
            rows_affected: 1,
            last_affected_id: None,
        })
    }
}

struct SpyReader {
    inner: BufferedReader,
    state: Arc<SpyState>,
}

impl RowReader for SpyReader {
    fn labels(&self) -> &RowNames {
        self.inner.labels()
    }
    fn next_row(&mut self) -> Result<Option<Row>> {
        self.inner.next_row()
    }
}

impl Drop for SpyReader {
    fn drop(&mut self) {
        self.state.push(SpyEvent::ReaderDropped);
    }
}

/// Profiler recording begin and end in the log of its [`SpyDriver`].
pub struct SpyProfiler {
    state: Arc<SpyState>,
    next: AtomicU64,
}

impl Profiler for SpyProfiler {
    fn begin_execution(&self, _db_name: &str, sql: &str, _params: &[Value]) -> ProfileToken {
        self.state.push(SpyEvent::ProfileBegin(sql.to_string()));
        ProfileToken::start(self.next.fetch_add(1, Ordering::SeqCst))
    }
    fn end_execution(&self, _token: ProfileToken) {
        self.state.push(SpyEvent::ProfileEnd);
    }
    fn dump_execution_summary(&self) -> String {
        String::new()
    }
}
