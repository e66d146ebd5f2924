use cistern_core::{ArgumentError, Database, Sql, Transaction, TransactionState, Value};
use indoc::indoc;

fn count(db: &Database) -> i64 {
    db.scalar("SELECT COUNT(*) FROM transaction_accounts")
        .and_then(cistern_core::AsValue::try_from_value)
        .expect("Could not count the accounts")
}

pub fn transactions(db: &Database) {
    db.execute("DROP TABLE IF EXISTS transaction_accounts")
        .expect("Could not drop transaction_accounts");
    db.execute(indoc! {"
        CREATE TABLE transaction_accounts (
            id INTEGER PRIMARY KEY,
            owner VARCHAR(64) NOT NULL,
            balance INTEGER NOT NULL
        )
    "})
    .expect("Could not create transaction_accounts");

    // Dropped without commit: rolled back
    {
        let mut transaction = db
            .begin_transaction()
            .expect("Could not begin a transaction");
        assert!(transaction.opened_connection());
        let inserted = transaction
            .execute("INSERT INTO transaction_accounts (id, owner, balance) VALUES (1, 'alice', 100)")
            .expect("Could not insert inside the transaction");
        assert_eq!(inserted.rows_affected, 1);
        assert_eq!(
            transaction
                .scalar("SELECT COUNT(*) FROM transaction_accounts")
                .unwrap(),
            Value::Int64(Some(1))
        );
    }
    assert_eq!(count(db), 0);

    // Committed: persisted
    let mut transaction = db
        .begin_transaction()
        .expect("Could not begin a transaction");
    for (id, owner, balance) in [(1, "alice", 100), (2, "bob", 50)] {
        transaction
            .execute(
                &Sql::new("INSERT INTO transaction_accounts (id, owner, balance) VALUES (")
                    .param("id", id)
                    .push(", ")
                    .param("owner", owner)
                    .push(", ")
                    .param("balance", balance)
                    .push(")"),
            )
            .expect("Could not insert inside the transaction");
    }
    transaction.commit().expect("Could not commit");
    assert_eq!(transaction.state(), TransactionState::Committed);
    transaction.dispose().expect("Dispose after commit must succeed");
    transaction.dispose().expect("Dispose must be idempotent");
    drop(transaction);
    assert_eq!(count(db), 2);

    // Explicit rollback, then dispose twice
    let mut transaction = db
        .begin_transaction()
        .expect("Could not begin a transaction");
    transaction
        .execute("UPDATE transaction_accounts SET balance = 0")
        .expect("Could not update inside the transaction");
    let rows = transaction
        .fetch_all("SELECT balance FROM transaction_accounts")
        .expect("Could not read inside the transaction");
    assert!(rows.iter().all(|v| v.get::<i64>(0).unwrap() == 0));
    transaction.rollback().expect("Could not roll back");
    assert_eq!(transaction.state(), TransactionState::RolledBack);
    transaction.dispose().unwrap();
    transaction.dispose().unwrap();
    assert_eq!(
        db.scalar("SELECT SUM(balance) FROM transaction_accounts")
            .unwrap(),
        Value::Int64(Some(150))
    );

    // A finished transaction rejects commands
    let error = transaction
        .execute("DELETE FROM transaction_accounts")
        .expect_err("A rolled back transaction must reject commands");
    assert!(error.downcast_ref::<ArgumentError>().is_some());
    assert!(transaction.commit().is_err());
    drop(transaction);

    // Disposed while active: rolled back once
    let mut transaction = db
        .begin_transaction()
        .expect("Could not begin a transaction");
    transaction
        .execute("DELETE FROM transaction_accounts WHERE owner = 'bob'")
        .expect("Could not delete inside the transaction");
    transaction.dispose().expect("Could not dispose");
    assert_eq!(transaction.state(), TransactionState::RolledBack);
    transaction.dispose().expect("Dispose must be idempotent");
    drop(transaction);
    assert_eq!(count(db), 2);

    // Failures inside a transaction go through the same error handling
    let mut transaction = db
        .begin_transaction()
        .expect("Could not begin a transaction");
    let value = transaction
        .try_scalar("SELECT COUNT(*) FROM transaction_missing", |context| {
            context.handled = true;
            Ok(())
        })
        .expect("A handled error must not surface");
    assert!(value.is_null());
    transaction.commit().expect("Could not commit");

    // On a caller connection: the transaction does not close a connection it did not open
    let mut connection = db.create_connection().expect("Could not create a connection");
    connection.open().expect("Could not open the connection");
    {
        let mut transaction = Transaction::begin(db, connection.as_mut())
            .expect("Could not begin a transaction");
        assert!(!transaction.opened_connection());
        transaction
            .execute("INSERT INTO transaction_accounts (id, owner, balance) VALUES (3, 'carol', 1)")
            .expect("Could not insert inside the transaction");
    }
    assert!(connection.is_open());
    assert!(!connection.in_transaction());
    connection.close().expect("Could not close the connection");
    assert_eq!(count(db), 2);

    // On a closed caller connection: opened and closed by the transaction
    let mut connection = db.create_connection().expect("Could not create a connection");
    {
        let mut transaction = Transaction::begin(db, connection.as_mut())
            .expect("Could not begin a transaction");
        assert!(transaction.opened_connection());
        transaction
            .execute("INSERT INTO transaction_accounts (id, owner, balance) VALUES (3, 'carol', 1)")
            .expect("Could not insert inside the transaction");
        transaction.commit().expect("Could not commit");
    }
    assert!(!connection.is_open());
    assert_eq!(count(db), 3);
}
