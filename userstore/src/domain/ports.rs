//! Repository ports and the shared persistence error taxonomy.
//!
//! Adapters receive their connection pool at construction and are injected
//! wherever data access is needed; domain records stay plain data.

use async_trait::async_trait;

use super::criteria::{FieldError, ProfileCriteria, ProfileUpdate, UserCriteria, UserUpdate};
use super::profile::{NewProfile, Profile, ProfileDraft, ProfileId};
use super::user::{NewUser, User, UserId};

/// Persistence errors surfaced by repository adapters.
///
/// Not-found and unknown-field conditions are domain errors; everything else
/// carries the driver message unchanged after the transaction has rolled
/// back. No retries happen at this layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// A connection could not be established or checked out.
    #[error("failed to reach the database: {message}")]
    Connection {
        /// Driver or pool message.
        message: String,
    },
    /// A query or mutation failed during execution.
    #[error("database operation failed: {message}")]
    Query {
        /// Driver message.
        message: String,
    },
    /// No row with the given id exists in the table.
    #[error("no row with id {id} in table {table}")]
    NotFound {
        /// Table the lookup ran against.
        table: String,
        /// The missing id.
        id: String,
    },
    /// A dynamic field map named a column the table does not have.
    #[error("table {table} has no column named \"{field}\"")]
    UnknownField {
        /// Table the lookup ran against.
        table: String,
        /// The rejected column name.
        field: String,
    },
    /// A single-row lookup matched more than one row.
    #[error("criteria matched {matched} rows in table {table}, expected at most one")]
    AmbiguousCriteria {
        /// Table the lookup ran against.
        table: String,
        /// How many rows matched.
        matched: usize,
    },
}

impl RepositoryError {
    /// Create a connection error with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with the given message.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    /// Create a not-found error for the given table and id.
    pub fn not_found(table: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            table: table.into(),
            id: id.into(),
        }
    }

    /// Create an unknown-field error for the given table and column.
    pub fn unknown_field(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            table: table.into(),
            field: field.into(),
        }
    }

    /// Create an ambiguous-criteria error for the given table.
    pub fn ambiguous_criteria(table: impl Into<String>, matched: usize) -> Self {
        Self::AmbiguousCriteria {
            table: table.into(),
            matched,
        }
    }
}

impl From<FieldError> for RepositoryError {
    fn from(error: FieldError) -> Self {
        match error {
            FieldError::Unknown { table, field } => Self::unknown_field(table, field),
            FieldError::Invalid {
                table,
                field,
                message,
            } => Self::query(format!("invalid value for {table}.{field}: {message}")),
        }
    }
}

/// Generic CRUD contract shared by every entity repository.
///
/// Each operation checks out its own pooled connection; multi-statement
/// operations run inside a transaction that rolls back on any error and
/// releases the connection on every exit path.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// Primary-key type.
    type Id: Send;
    /// Stored record type.
    type Record: Send;
    /// Validated insert draft.
    type Draft: Send;
    /// Typed equality filter.
    type Criteria: Send;
    /// Typed field-update descriptor set.
    type Update: Send;

    /// Return the single row matching `criteria`, `None` when nothing
    /// matches, or [`RepositoryError::AmbiguousCriteria`] when several do.
    async fn find(&self, criteria: Self::Criteria)
    -> Result<Option<Self::Record>, RepositoryError>;

    /// Return every row matching `criteria`, in storage order.
    async fn find_all_by(
        &self,
        criteria: Self::Criteria,
    ) -> Result<Vec<Self::Record>, RepositoryError>;

    /// Return every row in the table.
    async fn find_all(&self) -> Result<Vec<Self::Record>, RepositoryError>;

    /// Insert one row and return it with its generated id and timestamps.
    async fn create(&self, draft: Self::Draft) -> Result<Self::Record, RepositoryError>;

    /// Insert a batch of rows, all-or-nothing.
    async fn create_many(
        &self,
        drafts: Vec<Self::Draft>,
    ) -> Result<Vec<Self::Record>, RepositoryError>;

    /// Lock the row for update, apply only the fields whose new value
    /// differs from the stored one, refresh `updated_at`, and return the
    /// result. Fails with [`RepositoryError::NotFound`] when the id is
    /// absent; a no-op update set leaves the row untouched.
    async fn update(
        &self,
        id: Self::Id,
        update: Self::Update,
    ) -> Result<Self::Record, RepositoryError>;

    /// Delete by id. Returns `true` when a row was removed, `false` when
    /// the id was absent.
    async fn delete(&self, id: Self::Id) -> Result<bool, RepositoryError>;
}

/// User repository port.
#[async_trait]
pub trait UserRepository:
    EntityRepository<
        Id = UserId,
        Record = User,
        Draft = NewUser,
        Criteria = UserCriteria,
        Update = UserUpdate,
    >
{
    /// Insert a user and its profile in one transaction: the user row is
    /// written first, the profile row then references the generated id, and
    /// a failure of either insert persists neither.
    async fn create_with_profile(
        &self,
        user: NewUser,
        profile: ProfileDraft,
    ) -> Result<(User, Profile), RepositoryError>;
}

/// Profile repository port.
pub trait ProfileRepository:
    EntityRepository<
        Id = ProfileId,
        Record = Profile,
        Draft = NewProfile,
        Criteria = ProfileCriteria,
        Update = ProfileUpdate,
    >
{
}

#[cfg(test)]
mod tests {
    //! Regression coverage for the error taxonomy.
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn not_found_names_table_and_id() {
        let error = RepositoryError::not_found("users", "abc");
        assert_eq!(error.to_string(), "no row with id abc in table users");
    }

    #[rstest]
    fn unknown_field_error_converts_from_field_error() {
        let field_error = FieldError::Unknown {
            table: "users",
            field: "nickname".to_owned(),
        };
        let error = RepositoryError::from(field_error);

        assert_eq!(
            error,
            RepositoryError::UnknownField {
                table: "users".to_owned(),
                field: "nickname".to_owned(),
            }
        );
    }

    #[rstest]
    fn invalid_field_error_converts_to_query_error() {
        let field_error = FieldError::Invalid {
            table: "users",
            field: "role".to_owned(),
            message: "unrecognised role value: admin".to_owned(),
        };
        let error = RepositoryError::from(field_error);

        assert!(matches!(error, RepositoryError::Query { .. }));
        assert!(error.to_string().contains("users.role"));
    }

    #[rstest]
    fn ambiguous_criteria_reports_the_match_count() {
        let error = RepositoryError::ambiguous_criteria("users", 3);
        assert!(error.to_string().contains("matched 3 rows"));
    }
}
