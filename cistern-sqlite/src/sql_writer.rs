use cistern_core::SqlWriter;
use std::fmt::Write;

/// SQLite dialect: numbered `?N` placeholders and `LIMIT`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteSqlWriter;

impl SqlWriter for SqliteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_parameter_marker(&self, out: &mut String, index: usize, _name: &str) {
        let _ = write!(out, "?{}", index + 1);
    }

    fn parameter_name(&self, index: usize, _name: &str) -> String {
        format!("?{}", index + 1)
    }

    fn write_limit(&self, out: &mut String, limit: u64) {
        let _ = write!(out, " LIMIT {}", limit);
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteSqlWriter;
    use cistern_core::{Query, Sql, SqlWriter, StatementSink};

    #[test]
    fn markers_and_limit() {
        let query = Sql::new("SELECT * FROM ")
            .qualified("main", "books")
            .push(" WHERE author = ")
            .param("author", "Le Guin")
            .push(" OR editor = ")
            .param("author", "Le Guin")
            .push(" AND year > ")
            .param("year", 1970i64)
            .limit(10);
        let mut sink = StatementSink::new();
        query.build_statement(&mut sink).unwrap();
        let rendered = SqliteSqlWriter
            .render(&sink, query.command_kind())
            .unwrap();
        assert_eq!(
            rendered.text,
            r#"SELECT * FROM "main"."books" WHERE author = ?1 OR editor = ?1 AND year > ?2 LIMIT 10"#
        );
        assert_eq!(rendered.parameters.len(), 2);
        let parameter = SqliteSqlWriter
            .create_command_parameter(1, &rendered.parameters[1])
            .unwrap();
        assert_eq!(parameter.name, "?2");
    }
}
