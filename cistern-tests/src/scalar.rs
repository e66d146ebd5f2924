use cistern_core::{Database, DriverError, Sql, Value};
use indoc::indoc;

pub fn scalar(db: &Database) {
    db.execute("DROP TABLE IF EXISTS scalar_items")
        .expect("Could not drop scalar_items");
    db.execute(indoc! {"
        CREATE TABLE scalar_items (
            id INTEGER PRIMARY KEY,
            name VARCHAR(64) NOT NULL,
            price DOUBLE PRECISION
        )
    "})
    .expect("Could not create scalar_items");
    for (id, name, price) in [
        (1, "hammer", 12.5),
        (2, "saw", 20.0),
        (3, "drill", 79.9),
        (4, "tape", 3.25),
    ] {
        db.execute(
            &Sql::new("INSERT INTO scalar_items (id, name, price) VALUES (")
                .param("id", id as i64)
                .push(", ")
                .param("name", name)
                .push(", ")
                .param("price", price)
                .push(")"),
        )
        .expect("Could not insert into scalar_items");
    }

    // Text
    let count = db
        .scalar("SELECT COUNT(*) FROM scalar_items")
        .expect("Could not count the items");
    assert_eq!(count, Value::Int64(Some(4)));

    // Query
    let name = db
        .scalar(
            &Sql::new("SELECT name FROM ")
                .identifier("scalar_items")
                .push(" WHERE id = ")
                .param("id", 3i64),
        )
        .expect("Could not read the name");
    assert_eq!(name, Value::Varchar(Some("drill".into())));

    // Command over an already open connection, left open
    let mut connection = db.create_connection().expect("Could not create a connection");
    connection.open().expect("Could not open the connection");
    let command = db
        .command_on(
            "SELECT SUM(price) FROM scalar_items WHERE price > 10",
            connection.as_mut(),
        )
        .expect("Could not create the command");
    assert!(!command.owns_connection());
    let total = db.scalar(command).expect("Could not sum the prices");
    assert!(connection.is_open());
    let total: f64 = cistern_core::AsValue::try_from_value(total).expect("Not a number");
    assert!((total - 112.4).abs() < 1e-9);
    connection.close().expect("Could not close the connection");

    // Command over a closed connection, opened and closed by the call
    let mut connection = db.create_connection().expect("Could not create a connection");
    let command = db
        .command_on("SELECT MAX(id) FROM scalar_items", connection.as_mut())
        .expect("Could not create the command");
    assert_eq!(db.scalar(command).unwrap(), Value::Int64(Some(4)));
    assert!(!connection.is_open());

    // Zero rows
    let none = db
        .scalar("SELECT name FROM scalar_items WHERE id = 100")
        .expect("A query without rows must not fail");
    assert!(none.is_null());
    let mut connection = db.create_connection().expect("Could not create a connection");
    let command = db
        .command_on(
            &Sql::new("SELECT name FROM scalar_items WHERE id = ").param("id", -1i64),
            connection.as_mut(),
        )
        .expect("Could not create the command");
    assert!(db.scalar(command).unwrap().is_null());

    // Nonexistent table
    let error = db
        .scalar("SELECT COUNT(*) FROM scalar_missing")
        .expect_err("Counting a missing table must fail");
    assert!(
        error.root_cause().downcast_ref::<DriverError>().is_some(),
        "Unexpected error: {:#}",
        error
    );
    let mut handled = false;
    let value = db
        .try_scalar("SELECT COUNT(*) FROM scalar_missing", |context| {
            handled = true;
            context.handled = true;
            Ok(())
        })
        .expect("A handled error must not surface");
    assert!(handled);
    assert_eq!(value, Value::Null);
}
