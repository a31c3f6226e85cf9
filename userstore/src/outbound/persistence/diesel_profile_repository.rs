//! PostgreSQL-backed `ProfileRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::criteria::{ProfileCriteria, ProfileUpdate};
use crate::domain::ports::{EntityRepository, ProfileRepository, RepositoryError};
use crate::domain::profile::{NewProfile, Profile, ProfileId, ProfileParts};
use crate::domain::user::UserId;

use super::error_map::{map_diesel_error, map_pool_error};
use super::models::{NewProfileRow, ProfileChangeset, ProfileRow};
use super::pool::DbPool;
use super::schema::profiles;

const TABLE: &str = "profiles";

/// Diesel-backed implementation of the profile repository port.
#[derive(Clone)]
pub struct DieselProfileRepository {
    pool: DbPool,
}

impl DieselProfileRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Convert a database row into a domain profile.
pub(crate) fn row_to_profile(row: ProfileRow) -> Profile {
    let ProfileRow {
        id,
        user_id,
        phone,
        name,
        surname,
        about,
        date_of_birth,
        created_at,
        updated_at,
    } = row;

    Profile::new(ProfileParts {
        id: ProfileId::from_uuid(id),
        user_id: UserId::from_uuid(user_id),
        phone,
        name,
        surname,
        about,
        date_of_birth,
        created_at,
        updated_at,
    })
}

/// Build an insertable row from a bound draft, generating the id.
pub(crate) fn new_profile_row(draft: &NewProfile) -> NewProfileRow<'_> {
    NewProfileRow {
        id: Uuid::new_v4(),
        user_id: *draft.user_id.as_uuid(),
        phone: draft.phone.as_deref(),
        name: draft.name.as_deref(),
        surname: draft.surname.as_deref(),
        about: draft.about.as_deref(),
        date_of_birth: draft.date_of_birth,
    }
}

/// Apply the equality criteria to a boxed profiles query.
fn apply_criteria(
    mut query: profiles::BoxedQuery<'static, Pg>,
    criteria: ProfileCriteria,
) -> profiles::BoxedQuery<'static, Pg> {
    if let Some(id) = criteria.id {
        query = query.filter(profiles::id.eq(*id.as_uuid()));
    }
    if let Some(user_id) = criteria.user_id {
        query = query.filter(profiles::user_id.eq(*user_id.as_uuid()));
    }
    if let Some(phone) = criteria.phone {
        query = query.filter(profiles::phone.eq(phone));
    }
    if let Some(name) = criteria.name {
        query = query.filter(profiles::name.eq(name));
    }
    if let Some(surname) = criteria.surname {
        query = query.filter(profiles::surname.eq(surname));
    }
    query
}

/// Compute the changeset of fields whose new value differs from the stored
/// row. Returns `None` when nothing would change.
fn profile_changeset<'a>(
    current: &ProfileRow,
    update: &'a ProfileUpdate,
    now: DateTime<Utc>,
) -> Option<ProfileChangeset<'a>> {
    fn diff<'a>(
        touched: &'a Option<Option<String>>,
        current: &Option<String>,
    ) -> Option<Option<&'a str>> {
        match touched {
            Some(new) if new.as_deref() != current.as_deref() => Some(new.as_deref()),
            _ => None,
        }
    }

    let phone = diff(&update.phone, &current.phone);
    let name = diff(&update.name, &current.name);
    let surname = diff(&update.surname, &current.surname);
    let about = diff(&update.about, &current.about);
    let date_of_birth = match update.date_of_birth {
        Some(new) if new != current.date_of_birth => Some(new),
        _ => None,
    };

    if phone.is_none()
        && name.is_none()
        && surname.is_none()
        && about.is_none()
        && date_of_birth.is_none()
    {
        return None;
    }

    Some(ProfileChangeset {
        phone,
        name,
        surname,
        about,
        date_of_birth,
        updated_at: now,
    })
}

#[async_trait]
impl EntityRepository for DieselProfileRepository {
    type Id = ProfileId;
    type Record = Profile;
    type Draft = NewProfile;
    type Criteria = ProfileCriteria;
    type Update = ProfileUpdate;

    async fn find(&self, criteria: ProfileCriteria) -> Result<Option<Profile>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ProfileRow> = apply_criteria(profiles::table.into_boxed(), criteria)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        if rows.len() > 1 {
            return Err(RepositoryError::ambiguous_criteria(TABLE, rows.len()));
        }
        Ok(rows.into_iter().next().map(row_to_profile))
    }

    async fn find_all_by(
        &self,
        criteria: ProfileCriteria,
    ) -> Result<Vec<Profile>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ProfileRow> = apply_criteria(profiles::table.into_boxed(), criteria)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_profile).collect())
    }

    async fn find_all(&self) -> Result<Vec<Profile>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let rows: Vec<ProfileRow> = profiles::table
            .select(ProfileRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_profile).collect())
    }

    async fn create(&self, draft: NewProfile) -> Result<Profile, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row: ProfileRow = diesel::insert_into(profiles::table)
            .values(&new_profile_row(&draft))
            .returning(ProfileRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(row_to_profile(row))
    }

    async fn create_many(&self, drafts: Vec<NewProfile>) -> Result<Vec<Profile>, RepositoryError> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let new_rows: Vec<NewProfileRow<'_>> = drafts.iter().map(new_profile_row).collect();
        let rows: Vec<ProfileRow> = diesel::insert_into(profiles::table)
            .values(&new_rows)
            .returning(ProfileRow::as_returning())
            .get_results(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(row_to_profile).collect())
    }

    async fn update(
        &self,
        id: ProfileId,
        update: ProfileUpdate,
    ) -> Result<Profile, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let row = conn
            .transaction::<ProfileRow, RepositoryError, _>(|conn| {
                async move {
                    let current: Option<ProfileRow> = profiles::table
                        .filter(profiles::id.eq(*id.as_uuid()))
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?;

                    let Some(current) = current else {
                        return Err(RepositoryError::not_found(TABLE, id.to_string()));
                    };

                    match profile_changeset(&current, &update, Utc::now()) {
                        None => Ok(current),
                        Some(changeset) => Ok(diesel::update(
                            profiles::table.filter(profiles::id.eq(*id.as_uuid())),
                        )
                        .set(&changeset)
                        .returning(ProfileRow::as_returning())
                        .get_result(conn)
                        .await?),
                    }
                }
                .scope_boxed()
            })
            .await?;

        Ok(row_to_profile(row))
    }

    async fn delete(&self, id: ProfileId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;

        let deleted = diesel::delete(profiles::table.filter(profiles::id.eq(*id.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(deleted > 0)
    }
}

impl ProfileRepository for DieselProfileRepository {}

#[cfg(test)]
mod tests {
    //! Coverage for row conversion and nullable changed-field logic.
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn stored_row() -> ProfileRow {
        let now = Utc::now();
        ProfileRow {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            phone: Some("+123".to_owned()),
            name: Some("Ann".to_owned()),
            surname: None,
            about: None,
            date_of_birth: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    fn row_conversion_preserves_optional_columns(stored_row: ProfileRow) {
        let user_id = stored_row.user_id;
        let profile = row_to_profile(stored_row);

        assert_eq!(profile.user_id().as_uuid(), &user_id);
        assert_eq!(profile.phone(), Some("+123"));
        assert!(profile.surname().is_none());
    }

    #[rstest]
    fn insert_rows_get_fresh_ids_per_call() {
        let draft = NewProfile::new(UserId::random(), Default::default());

        let first = new_profile_row(&draft);
        let second = new_profile_row(&draft);
        assert_ne!(first.id, second.id);
        assert_eq!(first.user_id, *draft.user_id.as_uuid());
    }

    #[rstest]
    fn changeset_clears_a_column_when_asked(stored_row: ProfileRow) {
        let update = ProfileUpdate::default().with_phone(None);

        let changeset =
            profile_changeset(&stored_row, &update, Utc::now()).expect("phone differs");
        assert_eq!(changeset.phone, Some(None));
        assert!(changeset.name.is_none());
    }

    #[rstest]
    fn changeset_skips_fields_equal_to_the_stored_value(stored_row: ProfileRow) {
        let update = ProfileUpdate::default()
            .with_phone(Some("+123".to_owned()))
            .with_surname(Some("Smith".to_owned()));

        let changeset =
            profile_changeset(&stored_row, &update, Utc::now()).expect("surname differs");
        assert!(changeset.phone.is_none());
        assert_eq!(changeset.surname, Some(Some("Smith")));
    }

    #[rstest]
    fn changeset_is_none_when_nothing_differs(stored_row: ProfileRow) {
        let update = ProfileUpdate::default()
            .with_phone(Some("+123".to_owned()))
            .with_about(None);

        assert!(profile_changeset(&stored_row, &update, Utc::now()).is_none());
    }
}
