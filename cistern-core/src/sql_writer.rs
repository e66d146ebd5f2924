use crate::{
    ArgumentError, CommandKind, Error, Fragment, Parameter, ParameterDescriptor, Result,
    StatementSink, write_escaped,
};
use std::fmt::Write;

/// Output of [`SqlWriter::render`]: final text plus the parameter
/// descriptors, in the order the writer declared them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedStatement {
    pub text: String,
    pub parameters: Vec<ParameterDescriptor>,
}

impl RenderedStatement {
    pub fn has_parameters(&self) -> bool {
        !self.parameters.is_empty()
    }
}

/// The statement builder of a provider.
///
/// Every method has a default, ANSI flavoured implementation; providers
/// override the hooks where their dialect differs (quoting, placeholder
/// syntax, row limiting).
pub trait SqlWriter: Send + Sync {
    fn as_dyn(&self) -> &dyn SqlWriter;

    fn write_escaped(&self, out: &mut String, value: &str, search: char, replace: &str) {
        write_escaped(out, value, search, replace);
    }

    fn write_identifier_quoted(&self, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(out, value, '"', r#""""#);
        out.push('"');
    }

    fn write_identifier(&self, out: &mut String, parts: &[String]) {
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            self.write_identifier_quoted(out, part);
        }
    }

    /// Writes the placeholder of the parameter at `index` (from 0).
    fn write_parameter_marker(&self, out: &mut String, index: usize, _name: &str) {
        let _ = write!(out, "${}", index + 1);
    }

    /// Name of the native parameter bound to the placeholder at `index`.
    fn parameter_name(&self, index: usize, _name: &str) -> String {
        format!("${}", index + 1)
    }

    fn write_limit(&self, out: &mut String, limit: u64) {
        let _ = write!(out, " FETCH FIRST {} ROWS ONLY", limit);
    }

    /// Renders the sink into text and parameter descriptors.
    ///
    /// A generic parameter name used more than once maps to a single
    /// placeholder and a single descriptor.
    fn render(&self, sink: &StatementSink, _kind: CommandKind) -> Result<RenderedStatement> {
        let mut result = RenderedStatement::default();
        for fragment in sink.fragments() {
            match fragment {
                Fragment::Text(v) => result.text.push_str(v),
                Fragment::Identifier(v) => {
                    if v.is_empty() || v.iter().any(String::is_empty) {
                        return Err(ArgumentError::new(
                            "identifier",
                            format!("`{}` contains an empty part", v.join(".")),
                        )
                        .into());
                    }
                    self.write_identifier(&mut result.text, v);
                }
                Fragment::Parameter(v) => {
                    let existing = if v.name.is_empty() {
                        None
                    } else {
                        result.parameters.iter().position(|p| p.name == v.name)
                    };
                    let index = match existing {
                        Some(index) => {
                            if result.parameters[index].value != v.value {
                                return Err(Error::msg(format!(
                                    "Parameter `{}` is used with two different values",
                                    v.name
                                )));
                            }
                            index
                        }
                        None => {
                            result.parameters.push(v.clone());
                            result.parameters.len() - 1
                        }
                    };
                    self.write_parameter_marker(&mut result.text, index, &v.name);
                }
                Fragment::Limit(v) => self.write_limit(&mut result.text, *v),
            }
        }
        Ok(result)
    }

    /// Creates the native parameter for the descriptor at `index`.
    fn create_command_parameter(
        &self,
        index: usize,
        descriptor: &ParameterDescriptor,
    ) -> Result<Parameter> {
        Ok(Parameter {
            name: self.parameter_name(index, &descriptor.name),
            value: Default::default(),
            direction: descriptor.direction,
            data_type: descriptor.data_type,
        })
    }

    /// Copies the value of the descriptor into the native parameter.
    fn populate_parameter(
        &self,
        parameter: &mut Parameter,
        descriptor: &ParameterDescriptor,
    ) -> Result<()> {
        parameter.value = descriptor.value.clone();
        parameter.data_type = descriptor.data_type;
        Ok(())
    }
}

/// Writer using the default implementation of every method.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericSqlWriter;

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataType, Query, Sql, Value};

    fn render(query: &Sql) -> RenderedStatement {
        let mut sink = StatementSink::new();
        query.build_statement(&mut sink).unwrap();
        GenericSqlWriter.render(&sink, query.command_kind()).unwrap()
    }

    #[test]
    fn quoting_and_markers() {
        let rendered = render(
            &Sql::new("SELECT * FROM ")
                .qualified("sales", r#"odd"name"#)
                .push(" WHERE a = ")
                .param("a", 1i64)
                .push(" AND b = ")
                .param("b", "x")
                .limit(10),
        );
        assert_eq!(
            rendered.text,
            r#"SELECT * FROM "sales"."odd""name" WHERE a = $1 AND b = $2 FETCH FIRST 10 ROWS ONLY"#
        );
        assert_eq!(rendered.parameters.len(), 2);
        assert_eq!(rendered.parameters[1].data_type, DataType::Varchar);
    }

    #[test]
    fn repeated_names_share_a_marker() {
        let rendered = render(
            &Sql::new("SELECT ")
                .param("v", 2i64)
                .push(" + ")
                .param("v", 2i64),
        );
        assert_eq!(rendered.text, "SELECT $1 + $1");
        assert_eq!(rendered.parameters.len(), 1);
    }

    #[test]
    fn conflicting_values_are_rejected() {
        let mut sink = StatementSink::new();
        Sql::new("SELECT ")
            .param("v", 1i64)
            .push(", ")
            .param("v", 2i64)
            .build_statement(&mut sink)
            .unwrap();
        assert!(GenericSqlWriter.render(&sink, CommandKind::Text).is_err());
    }

    #[test]
    fn empty_identifier() {
        let mut sink = StatementSink::new();
        sink.push_identifier(["main", ""]);
        let error = GenericSqlWriter
            .render(&sink, CommandKind::Text)
            .unwrap_err();
        assert!(error.downcast_ref::<ArgumentError>().is_some());
    }

    #[test]
    fn parameters() {
        let descriptor = ParameterDescriptor::new("id", 9i64);
        let mut parameter = GenericSqlWriter
            .create_command_parameter(0, &descriptor)
            .unwrap();
        assert_eq!(parameter.name, "$1");
        assert_eq!(parameter.value, Value::Null);
        GenericSqlWriter
            .populate_parameter(&mut parameter, &descriptor)
            .unwrap();
        assert_eq!(parameter.value, Value::Int64(Some(9)));
    }
}
