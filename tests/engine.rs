#[cfg(test)]
mod tests {
    use cistern::{
        ArgumentError, ConfigError, Database, DriverError, DriverRegistry, Error, Settings, Sql,
        Transaction, TransactionState, Value,
    };
    use cistern_tests::{SpyDriver, SpyEvent, init_logs, silent_logs};
    use std::sync::Arc;

    fn spy_database() -> (SpyDriver, Database) {
        init_logs();
        let driver = SpyDriver::new("spy");
        let db = Database::with_driver(Arc::new(driver.clone()), "spy://engine");
        (driver, db)
    }

    fn driver_code(error: &Error) -> Option<i32> {
        error
            .root_cause()
            .downcast_ref::<DriverError>()
            .map(|e| e.code)
    }

    #[test]
    fn release_order() {
        let (driver, db) = spy_database();
        driver.set_rows(vec![Value::Int64(Some(1)), Value::Int64(Some(2))]);
        db.attach_profiler(Arc::new(driver.profiler()));
        db.start_profiling();
        let rows = db.fetch_all("SELECT value FROM numbers").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            driver.events(),
            [
                SpyEvent::Open,
                SpyEvent::ProfileBegin("SELECT value FROM numbers".into()),
                SpyEvent::Query("SELECT value FROM numbers".into()),
                SpyEvent::ReaderDropped,
                SpyEvent::Close,
                SpyEvent::ProfileEnd,
            ]
        );
        assert_eq!(driver.open_connections(), 0);
    }

    #[test]
    fn released_after_failures() {
        let (driver, db) = spy_database();
        silent_logs! {
            let error = db
                .fetch(format!("SELECT * FROM {}", SpyDriver::FAILING_TABLE), |_| Ok(()))
                .unwrap_err();
            assert_eq!(driver_code(&error), Some(1));
            assert_eq!(driver.open_connections(), 0);

            driver.clear_events();
            let error = db
                .fetch("SELECT value FROM numbers", |_| -> cistern::Result<()> {
                    Err(Error::msg("row callback failed"))
                })
                .unwrap_err();
            assert!(format!("{:#}", error).contains("row callback failed"));
            assert_eq!(
                driver.events(),
                [
                    SpyEvent::Open,
                    SpyEvent::Query("SELECT value FROM numbers".into()),
                    SpyEvent::ReaderDropped,
                    SpyEvent::Close,
                ]
            );
        }
    }

    #[test]
    fn open_failure() {
        let (driver, db) = spy_database();
        db.attach_profiler(Arc::new(driver.profiler()));
        db.start_profiling();
        driver.fail_open(true);
        silent_logs! {
            let error = db.scalar("SELECT 1").unwrap_err();
            assert_eq!(driver_code(&error), Some(14));
            let value = db
                .try_scalar("SELECT 1", |context| {
                    context.handled = true;
                    Ok(())
                })
                .unwrap();
            assert_eq!(value, Value::Null);
        }
        assert!(driver.events().is_empty(), "Nothing runs without a connection");
    }

    #[test]
    fn caller_connection_left_as_found() {
        let (driver, db) = spy_database();
        driver.set_rows(vec![Value::Int64(Some(9))]);
        let mut connection = db.create_connection().unwrap();
        connection.open().unwrap();
        driver.clear_events();
        let command = db.command_on("SELECT value", connection.as_mut()).unwrap();
        assert_eq!(db.scalar(command).unwrap(), Value::Int64(Some(9)));
        assert!(connection.is_open());
        assert_eq!(driver.events(), [SpyEvent::Scalar("SELECT value".into())]);

        connection.close().unwrap();
        driver.clear_events();
        let command = db.command_on("DELETE FROM t", connection.as_mut()).unwrap();
        assert_eq!(db.execute(command).unwrap().rows_affected, 1);
        assert!(!connection.is_open());
        assert_eq!(
            driver.events(),
            [
                SpyEvent::Open,
                SpyEvent::Execute("DELETE FROM t".into()),
                SpyEvent::Close,
            ]
        );
    }

    #[test]
    fn argument_errors_come_first() {
        let (driver, db) = spy_database();
        let error = db.execute("   ").unwrap_err();
        assert!(error.downcast_ref::<ArgumentError>().is_some());
        let error = db.fetch_all(&Sql::new("")).unwrap_err();
        assert!(error.downcast_ref::<ArgumentError>().is_some());
        let error = db
            .try_scalar("", |_| panic!("The callback is only for execution failures"))
            .unwrap_err();
        assert!(error.downcast_ref::<ArgumentError>().is_some());
        assert_eq!(driver.opens(), 0);
    }

    #[test]
    fn transaction_rolls_back_when_dropped() {
        let (driver, db) = spy_database();
        {
            let mut transaction = db.begin_transaction().unwrap();
            transaction.execute("UPDATE accounts SET balance = 0").unwrap();
        }
        assert_eq!(
            driver.events(),
            [
                SpyEvent::Open,
                SpyEvent::Begin,
                SpyEvent::Execute("UPDATE accounts SET balance = 0".into()),
                SpyEvent::Rollback,
                SpyEvent::Close,
            ]
        );
        driver.clear_events();
        let mut transaction = db.begin_transaction().unwrap();
        transaction.commit().unwrap();
        transaction.dispose().unwrap();
        transaction.dispose().unwrap();
        assert_eq!(
            driver.events(),
            [SpyEvent::Open, SpyEvent::Begin, SpyEvent::Commit, SpyEvent::Close]
        );
    }

    #[test]
    fn failed_rollback_is_retried_on_dispose() {
        let (driver, db) = spy_database();
        let mut transaction = db.begin_transaction().unwrap();
        driver.fail_next_rollback();
        silent_logs! {
            let error = transaction.rollback().unwrap_err();
            assert_eq!(driver_code(&error), Some(5));
        }
        assert_eq!(transaction.state(), TransactionState::Active);
        transaction.dispose().unwrap();
        assert_eq!(transaction.state(), TransactionState::RolledBack);
        assert_eq!(
            driver.events(),
            [SpyEvent::Open, SpyEvent::Begin, SpyEvent::Rollback, SpyEvent::Close]
        );

        let mut connection = db.create_connection().unwrap();
        connection.open().unwrap();
        driver.clear_events();
        {
            let mut transaction = Transaction::begin(&db, connection.as_mut()).unwrap();
            driver.fail_next_rollback();
            silent_logs! {
                assert!(transaction.rollback().is_err());
            }
        }
        assert!(!connection.in_transaction());
        assert!(connection.is_open());
        assert_eq!(driver.events(), [SpyEvent::Begin, SpyEvent::Rollback]);
    }

    #[test]
    fn failed_begin_closes_the_connection() {
        let (driver, db) = spy_database();
        driver.fail_next_begin();
        silent_logs! {
            let error = db.begin_transaction().err().unwrap();
            assert_eq!(driver_code(&error), Some(5));
        }
        assert_eq!(driver.open_connections(), 0);
        assert_eq!(driver.events(), [SpyEvent::Open, SpyEvent::Close]);
        let mut transaction = db.begin_transaction().unwrap();
        transaction.commit().unwrap();
    }

    #[test]
    fn registry_lookup() {
        init_logs();
        let registry = DriverRegistry::new();
        let first = SpyDriver::new("spy");
        let second = SpyDriver::new("SPY");
        assert!(registry.register(Arc::new(first.clone())).is_none());
        assert!(registry.register(Arc::new(second.clone())).is_some());
        assert_eq!(registry.names(), ["spy"]);

        let db = Database::new(&registry, "spy://replaced", "Spy").unwrap();
        db.scalar("SELECT 1").unwrap();
        assert_eq!(first.opens(), 0);
        assert_eq!(second.opens(), 1);

        let db = Database::from_url(&registry, "spy://from-url").unwrap();
        assert_eq!(db.connection_string(), "spy://from-url");
        assert_eq!(db.name(), "SPY");

        let error = Database::new(&registry, "x", "mystery").unwrap_err();
        assert_eq!(
            error.downcast_ref::<ConfigError>(),
            Some(&ConfigError::NoSuchDriver("mystery".into()))
        );
        let error = Database::new(&registry, " ", "spy").unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingConnectionString(..))
        ));
        let error = Database::from_url(&registry, "no scheme here").unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ConfigError>(),
            Some(ConfigError::UnresolvedDriver(..))
        ));
    }

    #[test]
    fn from_settings() {
        init_logs();
        let registry = DriverRegistry::new();
        registry.register(Arc::new(SpyDriver::new("spy")));
        let settings = Settings::from_json(
            r#"{
                "connections": {
                    "main": {
                        "connection_string": "spy://main",
                        "display_name": "Main",
                        "profile": true
                    },
                    "plain": { "connection_string": "main.db", "driver": "spy" },
                    "guess": { "connection_string": "main.db" },
                    "empty": { "driver": "spy" }
                }
            }"#,
        )
        .unwrap();

        let main = Database::from_settings(&registry, &settings, "main").unwrap();
        assert_eq!(main.name(), "Main");
        assert!(main.is_profiling());

        let plain = Database::from_settings(&registry, &settings, "plain").unwrap();
        assert_eq!(plain.connection_string(), "main.db");
        assert!(!plain.is_profiling());

        let error = Database::from_settings(&registry, &settings, "guess").unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ConfigError>(),
            Some(ConfigError::UnresolvedDriver(..))
        ));
        let error = Database::from_settings(&registry, &settings, "empty").unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ConfigError>(),
            Some(ConfigError::MissingConnectionString(..))
        ));
        let error = Database::from_settings(&registry, &settings, "missing").unwrap_err();
        assert_eq!(
            error.downcast_ref::<ConfigError>(),
            Some(&ConfigError::UnknownConnection("missing".into()))
        );
        let error = Settings::from_json(r#"{"connectons": {}}"#).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<ConfigError>(),
            Some(ConfigError::InvalidSettings(..))
        ));
    }
}
