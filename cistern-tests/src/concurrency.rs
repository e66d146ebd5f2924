use cistern_core::{AsValue, Database, Sql};
use std::thread;

pub fn concurrency(db: &Database) {
    db.execute("DROP TABLE IF EXISTS concurrency_numbers")
        .expect("Could not drop concurrency_numbers");
    db.execute("CREATE TABLE concurrency_numbers (n INTEGER NOT NULL)")
        .expect("Could not create concurrency_numbers");
    let mut transaction = db
        .begin_transaction()
        .expect("Could not begin a transaction");
    for n in 1..=100 {
        transaction
            .execute(
                &Sql::new("INSERT INTO concurrency_numbers (n) VALUES (")
                    .param("n", n)
                    .push(")"),
            )
            .expect("Could not insert a number");
    }
    transaction.commit().expect("Could not commit");
    drop(transaction);

    // Every call gets its own connection, the handle is shared
    thread::scope(|scope| {
        let workers = (0..8)
            .map(|worker| {
                let db = db.clone();
                scope.spawn(move || {
                    let mut total = 0;
                    for _ in 0..10 {
                        let sum = db
                            .scalar(
                                &Sql::new("SELECT SUM(n) FROM concurrency_numbers WHERE n % 8 = ")
                                    .param("worker", worker as i64),
                            )
                            .and_then(i64::try_from_value)
                            .expect("Could not sum the numbers");
                        total += sum;
                    }
                    total
                })
            })
            .collect::<Vec<_>>();
        let total: i64 = workers
            .into_iter()
            .map(|v| v.join().expect("A worker panicked"))
            .sum();
        assert_eq!(total, 10 * 5050);
    });
}
