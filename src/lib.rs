//! Synchronous data access over pluggable database drivers.
//!
//! ```rust,no_run
//! use cistern::{Database, Result};
//!
//! fn main() -> Result<()> {
//!     let db = Database::from_url(cistern::registry(), "sqlite://app.sqlite?mode=rwc")?;
//!     db.execute("CREATE TABLE IF NOT EXISTS notes (body TEXT)")?;
//!     let count = db.scalar("SELECT COUNT(*) FROM notes")?;
//!     println!("{} notes", count);
//!     Ok(())
//! }
//! ```

pub use cistern_core::*;
#[cfg(feature = "sqlite")]
pub use cistern_sqlite as sqlite;

use std::sync::LazyLock;

static REGISTRY: LazyLock<DriverRegistry> = LazyLock::new(|| {
    let registry = DriverRegistry::new();
    #[cfg(feature = "sqlite")]
    registry.register(std::sync::Arc::new(cistern_sqlite::SqliteDriver::new()));
    log::debug!("Built-in drivers: {:?}", registry.names());
    registry
});

/// Process wide registry, preloaded with the drivers enabled by the crate
/// features. Further drivers can be registered at any time.
pub fn registry() -> &'static DriverRegistry {
    &REGISTRY
}
