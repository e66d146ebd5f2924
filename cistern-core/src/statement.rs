use crate::{DataType, Value, truncate_long};
use std::{
    fmt::{self, Display},
    time::Duration,
};

/// How the text of a statement must be interpreted.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    /// Plain SQL text.
    #[default]
    Text,
    /// The text is the name of a stored procedure to call.
    StoredProcedure,
    /// The text is the name of a table to read entirely.
    TableDirect,
    /// Several statements, separated by `;`. Check
    /// [`Feature::MultipleStatements`](crate::Feature) before relying on it.
    Script,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterDirection {
    #[default]
    Input,
    Output,
    InputOutput,
    ReturnValue,
}

/// Provider neutral parameter, as emitted by a [`Query`](crate::Query).
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// Generic name, without any provider prefix.
    pub name: String,
    pub value: Value,
    pub direction: ParameterDirection,
    pub data_type: DataType,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            data_type: value.data_type(),
            value,
            direction: ParameterDirection::Input,
        }
    }
    pub fn with_direction(mut self, direction: ParameterDirection) -> Self {
        self.direction = direction;
        self
    }
}

/// Native parameter attached to a [`Statement`].
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Name in the provider syntax (`?1`, `:id`, `@id`), empty when positional.
    pub name: String,
    pub value: Value,
    pub direction: ParameterDirection,
    pub data_type: DataType,
}

impl Parameter {
    pub fn new(name: impl Into<String>, value: impl Into<Value>) -> Self {
        let value = value.into();
        Self {
            name: name.into(),
            data_type: value.data_type(),
            value,
            direction: ParameterDirection::Input,
        }
    }
    /// A parameter bound by position.
    pub fn positional(value: impl Into<Value>) -> Self {
        Self::new("", value)
    }
}

/// Rendered, provider ready text together with its native parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    pub text: String,
    pub kind: CommandKind,
    pub parameters: Vec<Parameter>,
    /// Forwarded to the driver, when it supports one.
    pub timeout: Option<Duration>,
}

impl Statement {
    pub fn new(text: impl Into<String>, kind: CommandKind) -> Self {
        Self {
            text: text.into(),
            kind,
            parameters: Vec::new(),
            timeout: None,
        }
    }
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(text, CommandKind::Text)
    }
    pub fn bind(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }
    /// Flattened parameter values, in binding order.
    pub fn parameter_values(&self) -> Vec<Value> {
        self.parameters.iter().map(|p| p.value.clone()).collect()
    }
}

impl Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", truncate_long!(self.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_type_follows_value() {
        let d = ParameterDescriptor::new("id", 5i64);
        assert_eq!(d.data_type, DataType::Int64);
        assert_eq!(d.direction, ParameterDirection::Input);
        let d = d.with_direction(ParameterDirection::Output);
        assert_eq!(d.direction, ParameterDirection::Output);
    }

    #[test]
    fn statement_values() {
        let statement = Statement::text("SELECT ?1, ?2")
            .bind(Parameter::new("?1", 1i64))
            .bind(Parameter::new("?2", "two"));
        assert!(statement.has_parameters());
        assert_eq!(
            statement.parameter_values(),
            vec![Value::Int64(Some(1)), Value::Varchar(Some("two".into()))]
        );
        assert_eq!(statement.to_string(), "SELECT ?1, ?2");
    }
}
