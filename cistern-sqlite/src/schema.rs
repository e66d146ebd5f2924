use cistern_core::{
    Connection, DataType, Result, SchemaObject, SchemaOperation, SchemaProvider,
    Statement,
};

/// Capabilities of the SQLite schema and the catalog queries.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteSchemaProvider;

impl SchemaProvider for SqliteSchemaProvider {
    fn check_supports(&self, object: SchemaObject) -> bool {
        matches!(
            object,
            SchemaObject::Table | SchemaObject::View | SchemaObject::Index | SchemaObject::Trigger
        )
    }

    fn check_supports_operation(&self, object: SchemaObject, operation: SchemaOperation) -> bool {
        match operation {
            // ALTER TABLE only
            SchemaOperation::Alter => object == SchemaObject::Table,
            _ => self.check_supports(object),
        }
    }

    fn check_supports_data_type(&self, data_type: DataType) -> bool {
        !matches!(data_type, DataType::Decimal | DataType::Unknown)
    }

    fn table_names(&self, connection: &mut dyn Connection) -> Result<Vec<String>> {
        let statement = Statement::text(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        );
        let mut reader = connection.query(&statement)?;
        let mut names = Vec::new();
        while let Some(row) = reader.next_row()? {
            names.push(row.get::<String>(0)?);
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteSchemaProvider;
    use cistern_core::{DataType, SchemaObject, SchemaOperation, SchemaProvider};

    #[test]
    fn capabilities() {
        let schema = SqliteSchemaProvider;
        assert!(schema.check_supports(SchemaObject::Trigger));
        assert!(!schema.check_supports(SchemaObject::StoredProcedure));
        assert!(!schema.check_supports(SchemaObject::Schema));
        assert!(schema.check_supports_operation(SchemaObject::Table, SchemaOperation::Alter));
        assert!(!schema.check_supports_operation(SchemaObject::View, SchemaOperation::Alter));
        assert!(schema.check_supports_operation(SchemaObject::Index, SchemaOperation::Drop));
        assert!(schema.check_supports_data_type(DataType::Uuid));
        assert!(!schema.check_supports_data_type(DataType::Decimal));
    }
}
