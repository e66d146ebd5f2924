use crate::{
    Command, CommandConnection, ConfigError, Connection, DatabaseProperties, Driver,
    DriverRegistry, ExecutionProfiler, Feature, IntoStatement, Profiler, Result, Settings,
    Statement, Transaction,
};
use std::{
    fmt::{self, Debug},
    sync::{
        Arc, OnceLock, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};
use url::Url;

struct DatabaseInner {
    name: Option<String>,
    connection_string: String,
    driver: Arc<dyn Driver>,
    properties: OnceLock<Arc<DatabaseProperties>>,
    profiler: RwLock<Option<Arc<dyn Profiler>>>,
    profiling: AtomicBool,
}

/// One logical target database.
///
/// The handle never keeps a physical connection open: every execution creates
/// (or is given) its own. It is cheap to clone and can be shared between
/// threads.
#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
}

impl Database {
    /// Handle over `connection_string`, served by the driver registered as
    /// `driver_name`. Fails immediately when the driver is unknown or the
    /// connection string is empty.
    pub fn new(
        registry: &DriverRegistry,
        connection_string: impl Into<String>,
        driver_name: &str,
    ) -> Result<Self> {
        let connection_string = connection_string.into();
        if connection_string.trim().is_empty() {
            return Err(ConfigError::MissingConnectionString(driver_name.to_string()).into());
        }
        let driver = registry.get(driver_name)?;
        Ok(Self::with_driver(driver, connection_string))
    }

    /// Handle whose driver is the scheme of `url`, for example `sqlite://data.db`.
    pub fn from_url(registry: &DriverRegistry, url: &str) -> Result<Self> {
        let scheme = driver_from_url(url)?;
        Self::new(registry, url, &scheme)
    }

    /// Handle over the connection called `name` in `settings`.
    pub fn from_settings(registry: &DriverRegistry, settings: &Settings, name: &str) -> Result<Self> {
        let connection = settings.connection(name)?;
        if connection.connection_string.trim().is_empty() {
            return Err(ConfigError::MissingConnectionString(name.to_string()).into());
        }
        let driver = match &connection.driver {
            Some(driver) => driver.clone(),
            None => driver_from_url(&connection.connection_string)?,
        };
        let database = Self::new(registry, connection.connection_string.clone(), &driver)?
            .with_name(connection.display_name.as_deref().unwrap_or(name));
        if connection.profile {
            database.attach_profiler(Arc::new(ExecutionProfiler::new()));
            database.start_profiling();
        }
        Ok(database)
    }

    /// Handle over an already resolved driver.
    pub fn with_driver(driver: Arc<dyn Driver>, connection_string: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                name: None,
                connection_string: connection_string.into(),
                driver,
                properties: OnceLock::new(),
                profiler: RwLock::new(None),
                profiling: AtomicBool::new(false),
            }),
        }
    }

    /// A handle with the same target and a display name, used in logs and by
    /// the profiler. The profiler state is not carried over.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(DatabaseInner {
                name: Some(name.into()),
                connection_string: self.inner.connection_string.clone(),
                driver: self.inner.driver.clone(),
                properties: self
                    .inner
                    .properties
                    .get()
                    .cloned()
                    .map(OnceLock::from)
                    .unwrap_or_default(),
                profiler: RwLock::new(None),
                profiling: AtomicBool::new(false),
            }),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name.as_deref().unwrap_or(self.inner.driver.name())
    }
    pub fn connection_string(&self) -> &str {
        &self.inner.connection_string
    }
    pub fn driver(&self) -> &dyn Driver {
        self.inner.driver.as_ref()
    }

    /// Capabilities of the target, discovered on first use and kept for the
    /// lifetime of the handle.
    pub fn properties(&self) -> Result<Arc<DatabaseProperties>> {
        if let Some(properties) = self.inner.properties.get() {
            return Ok(properties.clone());
        }
        let properties = self.inner.driver.properties(&self.inner.connection_string)?;
        Ok(self.inner.properties.get_or_init(|| properties).clone())
    }

    pub fn supports(&self, feature: Feature) -> Result<bool> {
        Ok(self.properties()?.supports(feature))
    }

    /// A new connection, not opened yet. The caller owns it.
    pub fn create_connection(&self) -> Result<Box<dyn Connection>> {
        self.inner.driver.connect(&self.inner.connection_string)
    }

    /// Renders the input with the driver's statement builder.
    pub fn statement(&self, input: impl IntoStatement) -> Result<Statement> {
        input.into_statement(self.inner.driver.sql_writer())
    }

    /// Command over a new connection, closed when the command is dropped.
    pub fn command(&self, input: impl IntoStatement) -> Result<Command<'static>> {
        let statement = self.statement(input)?;
        let connection = self.create_connection()?;
        Command::bound(statement, CommandConnection::Owned(connection), false)
    }

    /// Command over a caller supplied connection, left as found.
    pub fn command_on<'c>(
        &self,
        input: impl IntoStatement,
        connection: &'c mut dyn Connection,
    ) -> Result<Command<'c>> {
        let statement = self.statement(input)?;
        let in_transaction = connection.in_transaction();
        Command::bound(
            statement,
            CommandConnection::Borrowed(connection),
            in_transaction,
        )
    }

    /// Transaction over a new connection, owned by the transaction.
    pub fn begin_transaction(&self) -> Result<Transaction<'static>> {
        let connection = self.create_connection()?;
        Transaction::start(self.clone(), CommandConnection::Owned(connection))
    }

    pub fn attach_profiler(&self, profiler: Arc<dyn Profiler>) {
        *self.inner.profiler.write().unwrap_or_else(|e| e.into_inner()) = Some(profiler);
    }
    pub fn detach_profiler(&self) -> Option<Arc<dyn Profiler>> {
        self.inner
            .profiler
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }
    pub fn profiler(&self) -> Option<Arc<dyn Profiler>> {
        self.inner
            .profiler
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
    pub fn start_profiling(&self) {
        self.inner.profiling.store(true, Ordering::SeqCst);
    }
    pub fn stop_profiling(&self) {
        self.inner.profiling.store(false, Ordering::SeqCst);
    }
    /// True when a profiler is attached and profiling was started.
    pub fn is_profiling(&self) -> bool {
        self.active_profiler().is_some()
    }

    pub(crate) fn active_profiler(&self) -> Option<Arc<dyn Profiler>> {
        if !self.inner.profiling.load(Ordering::SeqCst) {
            return None;
        }
        self.profiler()
    }
}

impl Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name())
            .field("driver", &self.inner.driver.name())
            .field("connection_string", &self.inner.connection_string)
            .field("profiling", &self.is_profiling())
            .finish()
    }
}

fn driver_from_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|_| ConfigError::UnresolvedDriver(url.to_string()))?;
    Ok(parsed.scheme().to_string())
}
