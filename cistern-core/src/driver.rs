use crate::{Connection, DatabaseProperties, Result, SchemaProvider, SqlWriter};
use std::sync::Arc;

/// A provider implementation: the factory of everything engine specific.
///
/// Drivers are registered in a [`DriverRegistry`](crate::DriverRegistry) and
/// shared between threads, so they must be stateless apart from caches.
pub trait Driver: Send + Sync {
    /// Identifier used for the registry lookup, for example `sqlite`.
    fn name(&self) -> &str;

    /// A new, not yet opened, connection.
    fn connect(&self, connection_string: &str) -> Result<Box<dyn Connection>>;

    fn sql_writer(&self) -> &dyn SqlWriter;

    fn schema_provider(&self) -> &dyn SchemaProvider;

    /// Capabilities of the server behind `connection_string`. Implementations
    /// memoize them per connection string, see
    /// [`PropertiesCache`](crate::PropertiesCache).
    fn properties(&self, connection_string: &str) -> Result<Arc<DatabaseProperties>>;
}
