//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{profiles, users};

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub password: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new user rows.
///
/// Timestamps are omitted so the database defaults populate them.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub password: &'a str,
    pub email: &'a str,
    pub role: &'a str,
}

/// Changeset carrying only the user fields that actually differ from the
/// stored row; `None` fields are left untouched by Diesel.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserChangeset<'a> {
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
    pub email: Option<&'a str>,
    pub role: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading from the profiles table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProfileRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub about: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new profile rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = profiles)]
pub(crate) struct NewProfileRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub phone: Option<&'a str>,
    pub name: Option<&'a str>,
    pub surname: Option<&'a str>,
    pub about: Option<&'a str>,
    pub date_of_birth: Option<DateTime<Utc>>,
}

/// Changeset for profile updates. The outer `Option` marks a field as
/// touched; the inner value may be `None` to set the column to NULL.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = profiles)]
pub(crate) struct ProfileChangeset<'a> {
    pub phone: Option<Option<&'a str>>,
    pub name: Option<Option<&'a str>>,
    pub surname: Option<Option<&'a str>>,
    pub about: Option<Option<&'a str>>,
    pub date_of_birth: Option<Option<DateTime<Utc>>>,
    pub updated_at: DateTime<Utc>,
}
