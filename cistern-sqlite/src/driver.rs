use crate::{SqliteConnection, SqliteSchemaProvider, SqliteSqlWriter};
use cistern_core::{
    AsValue, Connection, DatabaseProperties, Driver, Feature, ParameterStyle, PropertiesCache,
    Result, SchemaProvider, SqlWriter, Statement, TopStyle,
};
use std::sync::Arc;

/// The SQLite provider, backed by the bundled library.
#[derive(Debug, Default)]
pub struct SqliteDriver {
    writer: SqliteSqlWriter,
    schema: SqliteSchemaProvider,
    properties: PropertiesCache,
}

impl SqliteDriver {
    pub const NAME: &'static str = "sqlite";

    pub fn new() -> Self {
        Self::default()
    }
}

impl Driver for SqliteDriver {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn connect(&self, connection_string: &str) -> Result<Box<dyn Connection>> {
        Ok(Box::new(SqliteConnection::new(connection_string)?))
    }

    fn sql_writer(&self) -> &dyn SqlWriter {
        self.writer.as_dyn()
    }

    fn schema_provider(&self) -> &dyn SchemaProvider {
        &self.schema
    }

    fn properties(&self, connection_string: &str) -> Result<Arc<DatabaseProperties>> {
        self.properties.get_or_discover(connection_string, || {
            let mut connection = SqliteConnection::new(connection_string)?;
            connection.open()?;
            let version = connection.query_scalar(&Statement::text("SELECT sqlite_version()"));
            if let Err(e) = connection.close() {
                log::warn!("Could not close the discovery connection: {:#}", e);
            }
            Ok(DatabaseProperties {
                product_name: "SQLite".into(),
                product_version: String::try_from_value(version?)?,
                case_sensitive_identifiers: false,
                parameter_style: ParameterStyle::Numbered('?'),
                top_styles: vec![TopStyle::Limit],
                max_parameters: Some(32766),
                features: vec![
                    Feature::MultipleStatements,
                    Feature::TableDirect,
                    Feature::Transactions,
                    Feature::NamedParameters,
                ],
            })
        })
    }
}
