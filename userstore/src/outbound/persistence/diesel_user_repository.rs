//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! This adapter implements the generic CRUD port for user rows plus the
//! composite user-with-profile insert. Multi-statement operations run in a
//! transaction that rolls back on any error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::criteria::{UserCriteria, UserUpdate};
use crate::domain::ports::{EntityRepository, RepositoryError, UserRepository};
use crate::domain::profile::{NewProfile, Profile, ProfileDraft};
use crate::domain::role::Role;
use crate::domain::user::{Email, NewUser, User, UserId, Username};

use super::diesel_profile_repository::{new_profile_row, row_to_profile};
use super::error_map::{map_diesel_error, map_pool_error};
use super::models::{NewUserRow, ProfileRow, UserChangeset, UserRow};
use super::pool::DbPool;
use super::schema::{profiles, users};

const TABLE: &str = "users";

/// Diesel-backed implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Decode a stored role value, falling back to demo on unknown input.
fn decode_role(value: &str, user_id: Uuid) -> Role {
    value.parse().unwrap_or_else(|_| {
        tracing::warn!(
            value,
            user_id = %user_id,
            "unrecognised role value, defaulting to demo"
        );
        Role::Demo
    })
}

/// Convert a database row into a validated domain user.
fn row_to_user(row: UserRow) -> Result<User, RepositoryError> {
    let UserRow {
        id,
        username,
        password,
        email,
        role,
        created_at,
        updated_at,
    } = row;

    let role = decode_role(&role, id);
    let username =
        Username::new(username).map_err(|err| RepositoryError::query(err.to_string()))?;
    let email = Email::new(email).map_err(|err| RepositoryError::query(err.to_string()))?;

    Ok(User::new(
        UserId::from_uuid(id),
        username,
        password,
        email,
        role,
        created_at,
        updated_at,
    ))
}

/// Build an insertable row from a validated draft, generating the id.
fn new_user_row(draft: &NewUser) -> NewUserRow<'_> {
    NewUserRow {
        id: Uuid::new_v4(),
        username: draft.username.as_ref(),
        password: draft.password.as_str(),
        email: draft.email.as_ref(),
        role: draft.role.as_str(),
    }
}

/// Apply the equality criteria to a boxed users query.
fn apply_criteria(
    mut query: users::BoxedQuery<'static, Pg>,
    criteria: UserCriteria,
) -> users::BoxedQuery<'static, Pg> {
    if let Some(id) = criteria.id {
        query = query.filter(users::id.eq(*id.as_uuid()));
    }
    if let Some(username) = criteria.username {
        query = query.filter(users::username.eq(username));
    }
    if let Some(email) = criteria.email {
        query = query.filter(users::email.eq(email));
    }
    if let Some(role) = criteria.role {
        query = query.filter(users::role.eq(role.as_str()));
    }
    query
}

/// Compute the changeset of fields whose new value differs from the stored
/// row. Returns `None` when nothing would change.
fn user_changeset<'a>(
    current: &UserRow,
    update: &'a UserUpdate,
    now: DateTime<Utc>,
) -> Option<UserChangeset<'a>> {
    let username = match &update.username {
        Some(new) if new.as_ref() != current.username => Some(new.as_ref()),
        _ => None,
    };
    let password = match &update.password {
        Some(new) if *new != current.password => Some(new.as_str()),
        _ => None,
    };
    let email = match &update.email {
        Some(new) if new.as_ref() != current.email => Some(new.as_ref()),
        _ => None,
    };
    let role = match update.role {
        Some(new) if new.as_str() != current.role => Some(new.as_str()),
        _ => None,
    };

    if username.is_none() && password.is_none() && email.is_none() && role.is_none() {
        return None;
    }

    Some(UserChangeset {
        username,
        password,
        email,
        role,
        updated_at: now,
    })
}

#[async_trait]
impl EntityRepository for DieselUserRepository {
    type Id = UserId;
    type Record = User;
    type Draft = NewUser;
    type Criteria = UserCriteria;
    type Update = UserUpdate;

    async fn find(&self, criteria: UserCriteria) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<UserRow> = apply_criteria(users::table.into_boxed(), criteria)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if rows.len() > 1 {
            return Err(RepositoryError::ambiguous_criteria(TABLE, rows.len()));
        }
        rows.into_iter().next().map(row_to_user).transpose()
    }

    async fn find_all_by(&self, criteria: UserCriteria) -> Result<Vec<User>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<UserRow> = apply_criteria(users::table.into_boxed(), criteria)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_user).collect()
    }

    async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<UserRow> = users::table
            .select(UserRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_user).collect()
    }

    async fn create(&self, draft: NewUser) -> Result<User, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: UserRow = diesel::insert_into(users::table)
            .values(&new_user_row(&draft))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        row_to_user(row)
    }

    async fn create_many(&self, drafts: Vec<NewUser>) -> Result<Vec<User>, RepositoryError> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_rows: Vec<NewUserRow<'_>> = drafts.iter().map(new_user_row).collect();
        let rows: Vec<UserRow> = diesel::insert_into(users::table)
            .values(&new_rows)
            .returning(UserRow::as_returning())
            .get_results(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        rows.into_iter().map(row_to_user).collect()
    }

    async fn update(&self, id: UserId, update: UserUpdate) -> Result<User, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = conn
            .transaction::<UserRow, RepositoryError, _>(|conn| {
                async move {
                    let current: Option<UserRow> = users::table
                        .filter(users::id.eq(*id.as_uuid()))
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;

                    let Some(current) = current else {
                        return Err(RepositoryError::not_found(TABLE, id.to_string()));
                    };

                    match user_changeset(&current, &update, Utc::now()) {
                        None => Ok(current),
                        Some(changeset) => Ok(diesel::update(
                            users::table.filter(users::id.eq(*id.as_uuid())),
                        )
                        .set(&changeset)
                        .returning(UserRow::as_returning())
                        .get_result(conn)
                        .await?),
                    }
                }
                .scope_boxed()
            })
            .await?;

        row_to_user(row)
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(users::table.filter(users::id.eq(*id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create_with_profile(
        &self,
        user: NewUser,
        profile: ProfileDraft,
    ) -> Result<(User, Profile), RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let (user_row, profile_row) = conn
            .transaction(|conn| {
                async move {
                    let user_row: UserRow = diesel::insert_into(users::table)
                        .values(&new_user_row(&user))
                        .returning(UserRow::as_returning())
                        .get_result(conn)
                        .await?;

                    let draft = NewProfile::new(UserId::from_uuid(user_row.id), profile);
                    let profile_row: ProfileRow = diesel::insert_into(profiles::table)
                        .values(&new_profile_row(&draft))
                        .returning(ProfileRow::as_returning())
                        .get_result(conn)
                        .await?;

                    Ok::<_, RepositoryError>((user_row, profile_row))
                }
                .scope_boxed()
            })
            .await?;

        Ok((row_to_user(user_row)?, row_to_profile(profile_row)))
    }
}
