#[cfg(test)]
mod tests {
    use cistern::{CommandKind, Database, Feature, Row, Sql, Value};
    use cistern_tests::init_logs;
    use indoc::indoc;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use time::{Date, Month, PrimitiveDateTime, Time};
    use uuid::Uuid;

    fn database(dir: &tempfile::TempDir, file: &str) -> Database {
        init_logs();
        Database::from_url(
            cistern::registry(),
            &format!("sqlite://{}?mode=rwc", dir.path().join(file).display()),
        )
        .expect("The sqlite driver should be registered")
    }

    #[test]
    fn registered() {
        assert!(cistern::registry().contains("sqlite"));
        assert!(cistern::registry().contains("SQLite"));
    }

    #[test]
    fn typed_values() {
        let dir = tempfile::tempdir().unwrap();
        let db = database(&dir, "typed.sqlite");
        assert!(db.supports(Feature::MultipleStatements).unwrap());
        db.execute(indoc! {"
            CREATE TABLE events (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                day TEXT,
                at TEXT,
                starts TEXT,
                tag TEXT,
                price REAL,
                payload BLOB,
                confirmed INTEGER
            );
        "})
        .unwrap();

        let day = Date::from_calendar_date(2025, Month::March, 14).unwrap();
        let starts = Time::from_hms(9, 30, 0).unwrap();
        let at = PrimitiveDateTime::new(day, starts);
        let tag = Uuid::from_str("a1a2a3a4-b1b2-c1c2-d1d2-d3d4d5d6d7d8").unwrap();
        let insert = Sql::new(
            "INSERT INTO events (name, day, at, starts, tag, price, payload, confirmed) VALUES (",
        )
        .param("name", "launch")
        .push(", ")
        .param("day", day)
        .push(", ")
        .param("at", at)
        .push(", ")
        .param("starts", starts)
        .push(", ")
        .param("tag", tag)
        .push(", ")
        .param("price", Decimal::from_str("19.5").unwrap())
        .push(", ")
        .param("payload", vec![0u8, 159, 146, 150])
        .push(", ")
        .param("confirmed", true)
        .push(")");
        let affected = db.execute(&insert).unwrap();
        assert_eq!(affected.rows_affected, 1);
        assert_eq!(affected.last_affected_id, Some(1));

        let row: Row = db
            .fetch_all(&Sql::new("SELECT * FROM ").identifier("events").limit(1))
            .unwrap()
            .remove(0);
        assert_eq!(row.get_named::<String>("name").unwrap(), "launch");
        assert_eq!(row.get_named::<Date>("day").unwrap(), day);
        assert_eq!(row.get_named::<PrimitiveDateTime>("at").unwrap(), at);
        assert_eq!(row.get_named::<Time>("starts").unwrap(), starts);
        assert_eq!(row.get_named::<Uuid>("tag").unwrap(), tag);
        assert_eq!(row.get_named::<f64>("price").unwrap(), 19.5);
        assert_eq!(
            row.get_named::<Vec<u8>>("payload").unwrap(),
            [0u8, 159, 146, 150]
        );
        assert!(row.get_named::<bool>("confirmed").unwrap());

        let names = db.fetch_all(("events", CommandKind::TableDirect)).unwrap();
        assert_eq!(names.len(), 1);
        assert_eq!(
            db.scalar(&Sql::new("SELECT id FROM events WHERE name = ").param("name", "nothing"))
                .unwrap(),
            Value::Null
        );
    }

    #[test]
    fn script_with_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let db = database(&dir, "script.sqlite");
        db.execute("CREATE TABLE kv (k TEXT PRIMARY KEY, v INTEGER)")
            .unwrap();
        let script = Sql::new("INSERT INTO kv VALUES ('a', ")
            .param("v", 1i64)
            .push("); INSERT INTO kv VALUES ('b', ")
            .param("v", 1i64)
            .push(" + 1);")
            .kind(CommandKind::Script);
        assert_eq!(db.execute(&script).unwrap().rows_affected, 2);
        assert_eq!(
            db.scalar("SELECT SUM(v) FROM kv").unwrap(),
            Value::Int64(Some(3))
        );
    }
}
