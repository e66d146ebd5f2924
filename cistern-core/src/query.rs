use crate::{CommandKind, ParameterDescriptor, ParameterDirection, Result, Value};

/// Something that can describe itself as a statement: the query builder side.
///
/// Implementations write dialect neutral instructions into a
/// [`StatementSink`]; a provider's [`SqlWriter`](crate::SqlWriter) turns them
/// into the final text and parameter list.
pub trait Query {
    fn build_statement(&self, sink: &mut StatementSink) -> Result<()>;
    fn command_kind(&self) -> CommandKind {
        CommandKind::Text
    }
}

/// A dialect neutral rendering instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    /// Verbatim SQL text.
    Text(String),
    /// An identifier, possibly qualified (`schema.table`), quoted by the writer.
    Identifier(Vec<String>),
    /// A placeholder bound to a value.
    Parameter(ParameterDescriptor),
    /// Restrict the number of rows returned (top-N).
    Limit(u64),
}

/// Accumulates the fragments emitted by a [`Query`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatementSink {
    fragments: Vec<Fragment>,
}

impl StatementSink {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn push_text(&mut self, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if let Some(Fragment::Text(last)) = self.fragments.last_mut() {
            last.push_str(&text);
        } else if !text.is_empty() {
            self.fragments.push(Fragment::Text(text));
        }
        self
    }
    pub fn push_identifier<S: Into<String>>(
        &mut self,
        parts: impl IntoIterator<Item = S>,
    ) -> &mut Self {
        self.fragments.push(Fragment::Identifier(
            parts.into_iter().map(Into::into).collect(),
        ));
        self
    }
    pub fn push_parameter(&mut self, parameter: ParameterDescriptor) -> &mut Self {
        self.fragments.push(Fragment::Parameter(parameter));
        self
    }
    pub fn push_limit(&mut self, limit: u64) -> &mut Self {
        self.fragments.push(Fragment::Limit(limit));
        self
    }
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }
}

/// A small fluent query: text interleaved with identifiers and named parameters.
///
/// ```rust
/// use cistern_core::{Query, Sql, StatementSink};
/// let query = Sql::new("SELECT * FROM ")
///     .identifier("users")
///     .push(" WHERE id = ")
///     .param("id", 7i64);
/// let mut sink = StatementSink::new();
/// query.build_statement(&mut sink).unwrap();
/// assert_eq!(sink.fragments().len(), 4);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sql {
    sink: StatementSink,
    kind: CommandKind,
}

impl Sql {
    pub fn new(text: impl Into<String>) -> Self {
        let mut sink = StatementSink::new();
        sink.push_text(text);
        Self {
            sink,
            kind: CommandKind::Text,
        }
    }
    pub fn push(mut self, text: impl Into<String>) -> Self {
        self.sink.push_text(text);
        self
    }
    pub fn identifier(mut self, name: impl Into<String>) -> Self {
        self.sink.push_identifier([name]);
        self
    }
    pub fn qualified(mut self, schema: impl Into<String>, name: impl Into<String>) -> Self {
        self.sink.push_identifier([schema.into(), name.into()]);
        self
    }
    /// Placeholder named `name`; using the same name twice binds the same value.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.sink
            .push_parameter(ParameterDescriptor::new(name, value));
        self
    }
    pub fn param_with_direction(
        mut self,
        name: impl Into<String>,
        value: impl Into<Value>,
        direction: ParameterDirection,
    ) -> Self {
        self.sink
            .push_parameter(ParameterDescriptor::new(name, value).with_direction(direction));
        self
    }
    pub fn limit(mut self, limit: u64) -> Self {
        self.sink.push_limit(limit);
        self
    }
    pub fn kind(mut self, kind: CommandKind) -> Self {
        self.kind = kind;
        self
    }
}

impl Query for Sql {
    fn build_statement(&self, sink: &mut StatementSink) -> Result<()> {
        for fragment in self.sink.fragments() {
            match fragment {
                Fragment::Text(v) => sink.push_text(v.as_str()),
                Fragment::Identifier(v) => sink.push_identifier(v.iter().cloned()),
                Fragment::Parameter(v) => sink.push_parameter(v.clone()),
                Fragment::Limit(v) => sink.push_limit(*v),
            };
        }
        Ok(())
    }
    fn command_kind(&self) -> CommandKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_text_is_merged() {
        let query = Sql::new("SELECT ").push("1");
        let mut sink = StatementSink::new();
        query.build_statement(&mut sink).unwrap();
        assert_eq!(sink.fragments(), &[Fragment::Text("SELECT 1".into())]);
    }

    #[test]
    fn fragments_in_order() {
        let query = Sql::new("DELETE FROM ")
            .qualified("main", "users")
            .push(" WHERE id = ")
            .param("id", 3i64)
            .kind(CommandKind::Text);
        let mut sink = StatementSink::new();
        query.build_statement(&mut sink).unwrap();
        assert_eq!(
            sink.fragments(),
            &[
                Fragment::Text("DELETE FROM ".into()),
                Fragment::Identifier(vec!["main".into(), "users".into()]),
                Fragment::Text(" WHERE id = ".into()),
                Fragment::Parameter(ParameterDescriptor::new("id", 3i64)),
            ]
        );
    }
}
