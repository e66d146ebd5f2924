#[cfg(test)]
mod tests {
    use cistern::{Database, DataError, DriverError, set_wrap_errors, wrap_errors};
    use cistern_tests::{SpyDriver, init_logs, silent_logs};
    use std::sync::Arc;

    // One test only, the flag is process wide
    #[test]
    fn wrapped_errors() {
        init_logs();
        let driver = SpyDriver::new("spy");
        let db = Database::with_driver(Arc::new(driver.clone()), "spy://wrap");
        let failing = format!("SELECT * FROM {}", SpyDriver::FAILING_TABLE);
        assert!(!wrap_errors());

        set_wrap_errors(true);
        silent_logs! {
            let error = db.scalar(failing.as_str()).unwrap_err();
            let wrapped = error
                .downcast_ref::<DataError>()
                .expect("The failure should be a DataError");
            assert_eq!(
                wrapped.message,
                format!(
                    "Error while executing the command: {}",
                    DriverError::new(1, format!("no such table: {}", SpyDriver::FAILING_TABLE))
                )
            );
            assert!(wrapped.source.downcast_ref::<DriverError>().is_some());

            let wrapped_driver_error = |error: cistern::Error| {
                assert!(error.downcast_ref::<DataError>().is_some(), "{:#}", error);
                assert!(error.root_cause().downcast_ref::<DriverError>().is_some());
            };
            wrapped_driver_error(db.fetch(failing.as_str(), |_| Ok(())).unwrap_err());
            wrapped_driver_error(db.fetch_all(failing.as_str()).unwrap_err());
            wrapped_driver_error(db.execute(failing.as_str()).unwrap_err());
            wrapped_driver_error(
                db.try_fetch(failing.as_str(), |_| Ok(()), |_| Ok(()))
                    .unwrap_err(),
            );

            let error = db
                .try_execute(failing.as_str(), |context| {
                    context.message = "Could not clean the table".into();
                    Ok(())
                })
                .unwrap_err();
            assert_eq!(
                error.downcast_ref::<DataError>().map(|e| e.message.as_str()),
                Some("Could not clean the table")
            );

            let error = db
                .try_execute(failing.as_str(), |_| Err(cistern::Error::msg("vetoed")))
                .unwrap_err();
            assert!(error.downcast_ref::<DataError>().is_none());
            assert_eq!(error.to_string(), "vetoed");
        }
        assert_eq!(driver.open_connections(), 0);

        set_wrap_errors(false);
        silent_logs! {
            let error = db.scalar(failing.as_str()).unwrap_err();
            assert!(error.downcast_ref::<DataError>().is_none());
            assert!(error.downcast_ref::<DriverError>().is_some());
        }
    }
}
