use crate::{ConfigError, Driver, Result};
use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

/// Table of the known drivers, keyed by case insensitive name.
///
/// A registry is an ordinary value: create one, register drivers and hand it
/// to whatever creates [`Database`](crate::Database) handles. The `cistern`
/// crate also offers a process wide one holding the built-in drivers.
#[derive(Default)]
pub struct DriverRegistry {
    drivers: RwLock<BTreeMap<String, Arc<dyn Driver>>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `driver` under its name. A driver previously registered
    /// under the same name is replaced and returned.
    pub fn register(&self, driver: Arc<dyn Driver>) -> Option<Arc<dyn Driver>> {
        let key = driver.name().to_lowercase();
        log::debug!("Registering driver `{}`", key);
        self.drivers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, driver)
    }

    pub fn unregister(&self, name: &str) -> Option<Arc<dyn Driver>> {
        self.drivers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&name.to_lowercase())
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn Driver>> {
        self.drivers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&name.to_lowercase())
            .cloned()
            .ok_or_else(|| ConfigError::NoSuchDriver(name.to_string()).into())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.drivers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&name.to_lowercase())
    }

    /// Registered names, lowercase and sorted.
    pub fn names(&self) -> Vec<String> {
        self.drivers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect()
    }
}
