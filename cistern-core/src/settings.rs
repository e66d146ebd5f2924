use crate::{ConfigError, Result, set_wrap_errors};
use serde::Deserialize;
use std::collections::BTreeMap;

/// One named connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConnectionSettings {
    pub connection_string: String,
    /// Driver name, taken from the scheme of the connection string when absent.
    pub driver: Option<String>,
    pub display_name: Option<String>,
    /// Attach an [`ExecutionProfiler`](crate::ExecutionProfiler) and start profiling.
    pub profile: bool,
}

/// Named connections plus the process wide error policy.
///
/// ```
/// use cistern_core::Settings;
///
/// let settings = Settings::from_json(r#"{
///     "wrap_errors": true,
///     "connections": {
///         "main": { "connection_string": "sqlite://data.db", "profile": true }
///     }
/// }"#)
/// .unwrap();
/// assert!(settings.wrap_errors);
/// assert!(settings.connection("main").unwrap().profile);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub wrap_errors: bool,
    pub connections: BTreeMap<String, ConnectionSettings>,
}

impl Settings {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ConfigError::InvalidSettings(e.to_string()).into())
    }

    /// Publishes the error policy of these settings.
    pub fn apply(&self) {
        set_wrap_errors(self.wrap_errors);
    }

    pub fn connection(&self, name: &str) -> Result<&ConnectionSettings> {
        self.connections
            .get(name)
            .ok_or_else(|| ConfigError::UnknownConnection(name.to_string()).into())
    }
}
