//! Applies file-based SQL migrations through Diesel's migration harness.
//!
//! Schema ownership stays in the `migrations/` directory; this helper only
//! connects and replays whatever is pending.

use std::path::Path;

use diesel::Connection;
use diesel::pg::PgConnection;
use diesel_migrations::{FileBasedMigrations, MigrationHarness};

/// Error raised while applying migrations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to apply migrations from {path}: {message}")]
pub struct MigrationError {
    path: String,
    message: String,
}

impl MigrationError {
    fn new(path: &Path, message: impl ToString) -> Self {
        Self {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }
}

/// Connect to `database_url` and run every pending migration found in
/// `migrations_dir`.
pub fn run_migrations(database_url: &str, migrations_dir: &Path) -> Result<(), MigrationError> {
    let mut connection = PgConnection::establish(database_url)
        .map_err(|error| MigrationError::new(migrations_dir, error))?;
    let migrations = FileBasedMigrations::from_path(migrations_dir)
        .map_err(|error| MigrationError::new(migrations_dir, error))?;
    connection
        .run_pending_migrations(migrations)
        .map_err(|error| MigrationError::new(migrations_dir, error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rstest::rstest;

    use super::*;

    #[rstest]
    fn error_display_names_the_migrations_path() {
        let error = MigrationError::new(&PathBuf::from("migrations"), "connection refused");

        assert!(error.to_string().contains("migrations"));
        assert!(error.to_string().contains("connection refused"));
    }

    #[rstest]
    fn missing_directory_is_reported() {
        let missing = PathBuf::from("/nonexistent/migrations");
        let error = FileBasedMigrations::from_path(&missing)
            .map(|_| ())
            .expect_err("missing directory");

        let wrapped = MigrationError::new(&missing, error);
        assert!(wrapped.to_string().contains("/nonexistent/migrations"));
    }
}
