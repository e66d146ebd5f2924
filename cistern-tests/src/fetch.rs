use cistern_core::{Database, Row, Sql};
use indoc::indoc;

#[derive(Debug, PartialEq)]
struct Book {
    title: String,
    year: i32,
    isbn: Option<String>,
}

impl TryFrom<Row> for Book {
    type Error = cistern_core::Error;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Ok(Self {
            title: row.get_named("title")?,
            year: row.get_named("year")?,
            isbn: row.get_named("isbn")?,
        })
    }
}

pub fn fetch(db: &Database) {
    db.execute("DROP TABLE IF EXISTS fetch_books")
        .expect("Could not drop fetch_books");
    db.execute(indoc! {"
        CREATE TABLE fetch_books (
            title VARCHAR(128) PRIMARY KEY,
            year INTEGER NOT NULL,
            isbn VARCHAR(20)
        )
    "})
    .expect("Could not create fetch_books");
    for (title, year, isbn) in [
        ("The Hobbit", 1937, Some("978-0261102217")),
        ("Dune", 1965, None),
        ("Neuromancer", 1984, Some("978-0441569595")),
    ] {
        let inserted = db
            .execute(
                &Sql::new("INSERT INTO fetch_books (title, year, isbn) VALUES (")
                    .param("title", title)
                    .push(", ")
                    .param("year", year)
                    .push(", ")
                    .param("isbn", isbn.map(String::from))
                    .push(")"),
            )
            .expect("Could not insert into fetch_books");
        assert_eq!(inserted.rows_affected, 1);
    }

    // Text, pulling the rows through the cursor
    let books = db
        .fetch("SELECT title, year, isbn FROM fetch_books ORDER BY year", |rows| {
            assert_eq!(&rows.labels()[..], ["title", "year", "isbn"]);
            rows.map(|row| Book::try_from(row?)).collect::<Result<Vec<_>, _>>()
        })
        .expect("Could not fetch the books");
    assert_eq!(
        books,
        [
            Book {
                title: "The Hobbit".into(),
                year: 1937,
                isbn: Some("978-0261102217".into()),
            },
            Book {
                title: "Dune".into(),
                year: 1965,
                isbn: None,
            },
            Book {
                title: "Neuromancer".into(),
                year: 1984,
                isbn: Some("978-0441569595".into()),
            },
        ]
    );

    // Query, reading only the first row: the rest is released with the reader
    let first = db
        .fetch(
            &Sql::new("SELECT title FROM fetch_books WHERE year > ")
                .param("year", 1950)
                .push(" ORDER BY year DESC"),
            |rows| rows.next().transpose(),
        )
        .expect("Could not fetch the first book");
    assert_eq!(
        first.map(|v| v.get::<String>(0).unwrap()),
        Some("Neuromancer".to_string())
    );

    // Command, with a caller owned context
    let mut connection = db.create_connection().expect("Could not create a connection");
    let command = db
        .command_on("SELECT year FROM fetch_books", connection.as_mut())
        .expect("Could not create the command");
    let mut years = Vec::new();
    db.fetch_with(command, &mut years, |years, rows| {
        for row in rows {
            years.push(row?.get::<i32>(0)?);
        }
        Ok(())
    })
    .expect("Could not fetch the years");
    years.sort();
    assert_eq!(years, [1937, 1965, 1984]);
    assert!(!connection.is_open());

    // Row by row
    let mut titles = Vec::new();
    let count = db
        .fetch_each("SELECT title FROM fetch_books ORDER BY title", |row| {
            titles.push(row.get::<String>(0)?);
            Ok(())
        })
        .expect("Could not fetch each title");
    assert_eq!(count, 3);
    assert_eq!(titles, ["Dune", "Neuromancer", "The Hobbit"]);

    // Zero rows, for every input shape
    let rows = db
        .fetch_all("SELECT * FROM fetch_books WHERE year < 0")
        .expect("A query without rows must not fail");
    assert!(rows.is_empty());
    let rows = db
        .fetch_all(&Sql::new("SELECT * FROM fetch_books WHERE title = ").param("title", "?"))
        .expect("A query without rows must not fail");
    assert!(rows.is_empty());
    let mut connection = db.create_connection().expect("Could not create a connection");
    connection.open().expect("Could not open the connection");
    let command = db
        .command_on("SELECT * FROM fetch_books WHERE 1 = 0", connection.as_mut())
        .expect("Could not create the command");
    let count = db
        .fetch_each(command, |_| panic!("No row expected"))
        .expect("A query without rows must not fail");
    assert_eq!(count, 0);
    assert!(connection.is_open());
}
