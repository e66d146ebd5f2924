use cistern_core::{CommandKind, Database, Feature, Sql, Statement, Value};
use indoc::indoc;

pub fn execute(db: &Database) {
    db.execute("DROP TABLE IF EXISTS execute_orders")
        .expect("Could not drop execute_orders");
    let created = db
        .execute(indoc! {"
            CREATE TABLE execute_orders (
                id INTEGER PRIMARY KEY,
                customer VARCHAR(64) NOT NULL,
                quantity INTEGER NOT NULL
            )
        "})
        .expect("Could not create execute_orders");
    assert_eq!(created.rows_affected, 0);

    // Text
    let inserted = db
        .execute(indoc! {"
            INSERT INTO execute_orders (id, customer, quantity) VALUES
                (1, 'alice', 2),
                (2, 'bob', 1),
                (3, 'alice', 7)
        "})
        .expect("Could not insert the orders");
    assert_eq!(inserted.rows_affected, 3);

    // Query
    let updated = db
        .execute(
            &Sql::new("UPDATE execute_orders SET quantity = quantity + ")
                .param("delta", 10i64)
                .push(" WHERE customer = ")
                .param("customer", "alice"),
        )
        .expect("Could not update the orders");
    assert_eq!(updated.rows_affected, 2);

    // Command over an open connection
    let mut connection = db.create_connection().expect("Could not create a connection");
    connection.open().expect("Could not open the connection");
    let command = db
        .command_on(
            "DELETE FROM execute_orders WHERE customer = 'nobody'",
            connection.as_mut(),
        )
        .expect("Could not create the command");
    let deleted = db.execute(command).expect("Could not delete");
    assert_eq!(deleted.rows_affected, 0);
    assert!(connection.is_open());
    let command = db
        .command_on("DELETE FROM execute_orders WHERE id = 2", connection.as_mut())
        .expect("Could not create the command");
    assert_eq!(db.execute(command).unwrap().rows_affected, 1);
    connection.close().expect("Could not close the connection");

    assert_eq!(
        db.scalar("SELECT SUM(quantity) FROM execute_orders").unwrap(),
        Value::Int64(Some(29))
    );

    // Empty text is an argument error, reported before anything is opened
    let error = db.execute("   ").expect_err("Empty text must be rejected");
    assert!(
        error
            .downcast_ref::<cistern_core::ArgumentError>()
            .is_some()
    );
    assert!(db.execute(Statement::default()).is_err());

    // Several statements in one command
    if db.supports(Feature::MultipleStatements).unwrap_or(false) {
        let result = db
            .execute((
                indoc! {"
                    INSERT INTO execute_orders (id, customer, quantity) VALUES (10, 'carol', 1);
                    INSERT INTO execute_orders (id, customer, quantity) VALUES (11, 'carol', 2);
                    UPDATE execute_orders SET quantity = 0 WHERE customer = 'carol';
                "},
                CommandKind::Script,
            ))
            .expect("Could not run the script");
        assert_eq!(result.rows_affected, 4);
        assert_eq!(
            db.scalar("SELECT COUNT(*) FROM execute_orders WHERE customer = 'carol' AND quantity = 0")
                .unwrap(),
            Value::Int64(Some(2))
        );
    }
}
