use cistern_core::{DataError, Database, DriverError, Error, Sql, Value, wrap_errors};

const MISSING: &str = "SELECT * FROM failures_missing";

/// The driver error, wrapped or not depending on the global policy.
fn is_driver_error(error: &Error) -> bool {
    error.root_cause().downcast_ref::<DriverError>().is_some()
        && wrap_errors() == error.downcast_ref::<DataError>().is_some()
}

pub fn failures(db: &Database) {
    // Propagate
    let error = db.fetch_all(MISSING).expect_err("fetch must fail");
    assert!(is_driver_error(&error), "Unexpected error: {:#}", error);
    let error = db.scalar(MISSING).expect_err("scalar must fail");
    assert!(is_driver_error(&error), "Unexpected error: {:#}", error);
    let error = db
        .execute("DELETE FROM failures_missing")
        .expect_err("execute must fail");
    assert!(is_driver_error(&error), "Unexpected error: {:#}", error);

    // The connection opened by the call is closed also on failure
    let mut connection = db.create_connection().expect("Could not create a connection");
    let command = db
        .command_on(MISSING, connection.as_mut())
        .expect("Could not create the command");
    assert!(db.fetch(command, |rows| Ok(rows.count())).is_err());
    assert!(!connection.is_open());

    // A caller connection stays open
    connection.open().expect("Could not open the connection");
    let command = db
        .command_on("UPDATE failures_missing SET a = 1", connection.as_mut())
        .expect("Could not create the command");
    assert!(db.execute(command).is_err());
    assert!(connection.is_open());
    connection.close().expect("Could not close the connection");

    // Handled
    let mut called = 0;
    let fetched = db
        .try_fetch(
            MISSING,
            |rows| Ok(rows.count()),
            |context| {
                called += 1;
                assert!(context.root_cause().is::<DriverError>());
                context.handled = true;
                Ok(())
            },
        )
        .expect("A handled error must not surface");
    assert_eq!(fetched, None);
    let scalar = db
        .try_scalar(&Sql::new(MISSING).push(" WHERE id = ").param("id", 1), |context| {
            called += 1;
            context.handled = true;
            Ok(())
        })
        .expect("A handled error must not surface");
    assert_eq!(scalar, Value::Null);
    let affected = db
        .try_execute("DELETE FROM failures_missing", |context| {
            called += 1;
            context.handled = true;
            Ok(())
        })
        .expect("A handled error must not surface");
    assert_eq!(affected.rows_affected, 0);
    assert_eq!(called, 3);

    // Not handled
    let error = db
        .try_scalar(MISSING, |context| {
            context.message = "Could not read the missing table".into();
            Ok(())
        })
        .expect_err("An unhandled error must surface");
    assert!(is_driver_error(&error), "Unexpected error: {:#}", error);
    if let Some(data_error) = error.downcast_ref::<DataError>() {
        assert_eq!(data_error.message, "Could not read the missing table");
    }
    let error = db
        .try_fetch(MISSING, |rows| Ok(rows.count()), |_| Ok(()))
        .expect_err("An unhandled error must surface");
    assert!(is_driver_error(&error), "Unexpected error: {:#}", error);
    let error = db
        .try_execute("DELETE FROM failures_missing", |_| Ok(()))
        .expect_err("An unhandled error must surface");
    assert!(is_driver_error(&error), "Unexpected error: {:#}", error);

    // An error raised by the callback surfaces unmodified
    let error = db
        .try_execute("DELETE FROM failures_missing", |_| {
            Err(Error::msg("this should never fail"))
        })
        .expect_err("The callback error must surface");
    assert!(error.downcast_ref::<DataError>().is_none());
    assert_eq!(error.to_string(), "this should never fail");

    // Successful calls never reach the callback
    let value = db
        .try_scalar("SELECT 1", |_| panic!("Unexpected failure"))
        .expect("SELECT 1 must succeed");
    assert_eq!(value.to_string(), "1");
}
