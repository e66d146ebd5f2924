use crate::{Connection, DataType, Result};

/// Kinds of schema objects a provider may or may not have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaObject {
    Schema,
    Table,
    View,
    Index,
    Trigger,
    Sequence,
    StoredProcedure,
    Function,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaOperation {
    Create,
    Alter,
    Drop,
}

/// Introspection and capability queries of a provider.
pub trait SchemaProvider: Send + Sync {
    fn check_supports(&self, object: SchemaObject) -> bool;

    fn check_supports_operation(&self, object: SchemaObject, operation: SchemaOperation) -> bool {
        self.check_supports(object) && operation != SchemaOperation::Alter
    }

    fn check_supports_data_type(&self, data_type: DataType) -> bool;

    /// Names of the user tables, sorted. The connection must be open.
    fn table_names(&self, connection: &mut dyn Connection) -> Result<Vec<String>>;
}
