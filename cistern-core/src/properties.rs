use crate::Result;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

/// Optional capabilities a caller may want to check before relying on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Several `;` separated statements in one command.
    MultipleStatements,
    StoredProcedures,
    TableDirect,
    Schemas,
    Transactions,
    NamedParameters,
    OutputParameters,
}

/// How placeholders look in the provider's SQL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterStyle {
    /// `?`
    Positional,
    /// `?1`, `$1`
    Numbered(char),
    /// `:name`, `@name`
    Named(char),
}

/// Ways a provider can restrict the number of returned rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopStyle {
    /// `... LIMIT n`
    Limit,
    /// `SELECT TOP n ...`
    Top,
    /// `... FETCH FIRST n ROWS ONLY`
    FetchFirst,
}

/// Immutable snapshot of what a database server can do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseProperties {
    pub product_name: String,
    pub product_version: String,
    /// Whether unquoted identifiers are case sensitive.
    pub case_sensitive_identifiers: bool,
    pub parameter_style: ParameterStyle,
    pub top_styles: Vec<TopStyle>,
    /// Maximum number of parameters in a single statement.
    pub max_parameters: Option<usize>,
    pub features: Vec<Feature>,
}

impl DatabaseProperties {
    pub fn supports(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }
    pub fn supports_top(&self, style: TopStyle) -> bool {
        self.top_styles.contains(&style)
    }
}

/// Memo of discovered properties, keyed by connection string.
///
/// Two threads discovering the same connection string at the same time may
/// both run the discovery; the last one stored wins, which only costs a round
/// trip.
#[derive(Debug, Default)]
pub struct PropertiesCache {
    entries: Mutex<HashMap<String, Arc<DatabaseProperties>>>,
}

impl PropertiesCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, connection_string: &str) -> Option<Arc<DatabaseProperties>> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(connection_string)
            .cloned()
    }

    pub fn get_or_discover<F>(
        &self,
        connection_string: &str,
        discover: F,
    ) -> Result<Arc<DatabaseProperties>>
    where
        F: FnOnce() -> Result<DatabaseProperties>,
    {
        if let Some(properties) = self.get(connection_string) {
            return Ok(properties);
        }
        // Not holding the lock while discovering, it performs I/O
        let properties = Arc::new(discover()?);
        log::debug!(
            "Discovered {} {} for `{}`",
            properties.product_name,
            properties.product_version,
            connection_string
        );
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(connection_string.to_string(), properties.clone());
        Ok(properties)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::Cell;

    fn properties(version: &str) -> DatabaseProperties {
        DatabaseProperties {
            product_name: "test".into(),
            product_version: version.into(),
            case_sensitive_identifiers: false,
            parameter_style: ParameterStyle::Positional,
            top_styles: vec![TopStyle::Limit],
            max_parameters: None,
            features: vec![Feature::Transactions],
        }
    }

    #[test]
    fn discovers_once_per_connection_string() {
        let cache = PropertiesCache::new();
        let calls = Cell::new(0);
        let discover = || {
            calls.set(calls.get() + 1);
            Ok(properties("1.0"))
        };
        cache.get_or_discover("a", discover).unwrap();
        cache.get_or_discover("a", discover).unwrap();
        cache.get_or_discover("b", discover).unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_discovery_is_not_cached() {
        let cache = PropertiesCache::new();
        assert!(
            cache
                .get_or_discover("a", || Err(Error::msg("unreachable")))
                .is_err()
        );
        assert!(cache.is_empty());
        let found = cache.get_or_discover("a", || Ok(properties("2.0"))).unwrap();
        assert_eq!(found.product_version, "2.0");
    }

    #[test]
    fn supports() {
        let p = properties("1.0");
        assert!(p.supports(Feature::Transactions));
        assert!(!p.supports(Feature::StoredProcedures));
        assert!(p.supports_top(TopStyle::Limit));
        assert!(!p.supports_top(TopStyle::Top));
    }
}
