//! Typed equality criteria and field-update descriptors.
//!
//! These types replace free-form column/value maps: filters and updates are
//! spelled out per entity, and a dynamic map is parsed against the known
//! column set before any database work, so an unrecognised name surfaces as
//! a typed error instead of leaking into SQL.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::profile::ProfileId;
use super::role::Role;
use super::user::{Email, UserId, Username};

const USERS: &str = "users";
const PROFILES: &str = "profiles";

/// Errors raised while building criteria or update sets from dynamic maps.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// The named column does not exist on the table.
    #[error("table {table} has no column named \"{field}\"")]
    Unknown {
        /// Table the lookup ran against.
        table: &'static str,
        /// The rejected column name.
        field: String,
    },
    /// The named column exists but the value (or the attempt to change it)
    /// is not acceptable.
    #[error("invalid value for column {table}.{field}: {message}")]
    Invalid {
        /// Table the lookup ran against.
        table: &'static str,
        /// Column the value was destined for.
        field: String,
        /// What was wrong with it.
        message: String,
    },
}

impl FieldError {
    fn unknown(table: &'static str, field: impl Into<String>) -> Self {
        Self::Unknown {
            table,
            field: field.into(),
        }
    }

    fn invalid(table: &'static str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            table,
            field: field.into(),
            message: message.into(),
        }
    }
}

fn expect_string(
    table: &'static str,
    field: &str,
    value: &Value,
) -> Result<String, FieldError> {
    value.as_str().map(str::to_owned).ok_or_else(|| {
        FieldError::invalid(table, field, format!("expected a string, got {value}"))
    })
}

fn parse_uuid(table: &'static str, field: &str, value: &Value) -> Result<Uuid, FieldError> {
    let raw = expect_string(table, field, value)?;
    Uuid::parse_str(&raw).map_err(|error| FieldError::invalid(table, field, error.to_string()))
}

fn parse_role(table: &'static str, value: &Value) -> Result<Role, FieldError> {
    let raw = expect_string(table, "role", value)?;
    raw.parse()
        .map_err(|error: super::role::ParseRoleError| {
            FieldError::invalid(table, "role", error.to_string())
        })
}

fn parse_timestamp(
    table: &'static str,
    field: &str,
    value: &Value,
) -> Result<DateTime<Utc>, FieldError> {
    let raw = expect_string(table, field, value)?;
    raw.parse()
        .map_err(|error: chrono::ParseError| FieldError::invalid(table, field, error.to_string()))
}

/// Equality filter over user columns; unset fields do not constrain.
#[derive(Debug, Clone, Default)]
pub struct UserCriteria {
    /// Match on the primary key.
    pub id: Option<UserId>,
    /// Match on the exact username.
    pub username: Option<String>,
    /// Match on the exact email.
    pub email: Option<String>,
    /// Match on the subscription role.
    pub role: Option<Role>,
}

impl UserCriteria {
    /// Constrain the primary key.
    #[must_use]
    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = Some(id);
        self
    }

    /// Constrain the username.
    #[must_use]
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Constrain the email.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Constrain the subscription role.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// True when no field constrains the filter.
    pub const fn is_empty(&self) -> bool {
        self.id.is_none() && self.username.is_none() && self.email.is_none() && self.role.is_none()
    }

    /// Build criteria from a dynamic column/value map.
    pub fn from_map(fields: &Map<String, Value>) -> Result<Self, FieldError> {
        let mut criteria = Self::default();
        for (key, value) in fields {
            match key.as_str() {
                "id" => {
                    criteria.id = Some(UserId::from_uuid(parse_uuid(USERS, "id", value)?));
                }
                "username" => criteria.username = Some(expect_string(USERS, "username", value)?),
                "email" => criteria.email = Some(expect_string(USERS, "email", value)?),
                "role" => criteria.role = Some(parse_role(USERS, value)?),
                other => return Err(FieldError::unknown(USERS, other)),
            }
        }
        Ok(criteria)
    }
}

/// Field updates to apply to a user row; unset fields stay untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// Replacement username.
    pub username: Option<Username>,
    /// Replacement password.
    pub password: Option<String>,
    /// Replacement email.
    pub email: Option<Email>,
    /// Replacement role.
    pub role: Option<Role>,
}

impl UserUpdate {
    /// Replace the username.
    #[must_use]
    pub fn with_username(mut self, username: Username) -> Self {
        self.username = Some(username);
        self
    }

    /// Replace the password.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Replace the email.
    #[must_use]
    pub fn with_email(mut self, email: Email) -> Self {
        self.email = Some(email);
        self
    }

    /// Replace the role.
    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = Some(role);
        self
    }

    /// True when no field is set.
    pub const fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.password.is_none()
            && self.email.is_none()
            && self.role.is_none()
    }

    /// Build an update set from a dynamic column/value map.
    ///
    /// Unknown column names are rejected before any database work, as are
    /// attempts to touch immutable columns.
    pub fn from_map(fields: &Map<String, Value>) -> Result<Self, FieldError> {
        let mut update = Self::default();
        for (key, value) in fields {
            match key.as_str() {
                "username" => {
                    let raw = expect_string(USERS, "username", value)?;
                    update.username = Some(Username::new(raw).map_err(|error| {
                        FieldError::invalid(USERS, "username", error.to_string())
                    })?);
                }
                "password" => update.password = Some(expect_string(USERS, "password", value)?),
                "email" => {
                    let raw = expect_string(USERS, "email", value)?;
                    update.email = Some(Email::new(raw).map_err(|error| {
                        FieldError::invalid(USERS, "email", error.to_string())
                    })?);
                }
                "role" => update.role = Some(parse_role(USERS, value)?),
                immutable @ ("id" | "created_at" | "updated_at") => {
                    return Err(FieldError::invalid(USERS, immutable, "column is not updatable"));
                }
                other => return Err(FieldError::unknown(USERS, other)),
            }
        }
        Ok(update)
    }
}

/// Equality filter over profile columns; unset fields do not constrain.
#[derive(Debug, Clone, Default)]
pub struct ProfileCriteria {
    /// Match on the primary key.
    pub id: Option<ProfileId>,
    /// Match on the owning user.
    pub user_id: Option<UserId>,
    /// Match on the exact phone number.
    pub phone: Option<String>,
    /// Match on the exact given name.
    pub name: Option<String>,
    /// Match on the exact family name.
    pub surname: Option<String>,
}

impl ProfileCriteria {
    /// Constrain the primary key.
    #[must_use]
    pub fn with_id(mut self, id: ProfileId) -> Self {
        self.id = Some(id);
        self
    }

    /// Constrain the owning user.
    #[must_use]
    pub fn with_user_id(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    /// Constrain the phone number.
    #[must_use]
    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    /// Constrain the given name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Constrain the family name.
    #[must_use]
    pub fn with_surname(mut self, surname: impl Into<String>) -> Self {
        self.surname = Some(surname.into());
        self
    }

    /// True when no field constrains the filter.
    pub const fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.user_id.is_none()
            && self.phone.is_none()
            && self.name.is_none()
            && self.surname.is_none()
    }

    /// Build criteria from a dynamic column/value map.
    pub fn from_map(fields: &Map<String, Value>) -> Result<Self, FieldError> {
        let mut criteria = Self::default();
        for (key, value) in fields {
            match key.as_str() {
                "id" => {
                    criteria.id = Some(ProfileId::from_uuid(parse_uuid(
                        PROFILES, "id", value,
                    )?));
                }
                "user_id" => {
                    criteria.user_id =
                        Some(UserId::from_uuid(parse_uuid(PROFILES, "user_id", value)?));
                }
                "phone" => criteria.phone = Some(expect_string(PROFILES, "phone", value)?),
                "name" => criteria.name = Some(expect_string(PROFILES, "name", value)?),
                "surname" => criteria.surname = Some(expect_string(PROFILES, "surname", value)?),
                other => return Err(FieldError::unknown(PROFILES, other)),
            }
        }
        Ok(criteria)
    }
}

/// Field updates to apply to a profile row.
///
/// Every profile column is nullable, so each field distinguishes "leave
/// untouched" (`None`) from "set to this value or to null" (`Some(...)`).
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    /// Replacement phone number, or `Some(None)` to clear it.
    pub phone: Option<Option<String>>,
    /// Replacement given name, or `Some(None)` to clear it.
    pub name: Option<Option<String>>,
    /// Replacement family name, or `Some(None)` to clear it.
    pub surname: Option<Option<String>>,
    /// Replacement description, or `Some(None)` to clear it.
    pub about: Option<Option<String>>,
    /// Replacement date of birth, or `Some(None)` to clear it.
    pub date_of_birth: Option<Option<DateTime<Utc>>>,
}

impl ProfileUpdate {
    /// Replace or clear the phone number.
    #[must_use]
    pub fn with_phone(mut self, phone: Option<String>) -> Self {
        self.phone = Some(phone);
        self
    }

    /// Replace or clear the given name.
    #[must_use]
    pub fn with_name(mut self, name: Option<String>) -> Self {
        self.name = Some(name);
        self
    }

    /// Replace or clear the family name.
    #[must_use]
    pub fn with_surname(mut self, surname: Option<String>) -> Self {
        self.surname = Some(surname);
        self
    }

    /// Replace or clear the description.
    #[must_use]
    pub fn with_about(mut self, about: Option<String>) -> Self {
        self.about = Some(about);
        self
    }

    /// Replace or clear the date of birth.
    #[must_use]
    pub fn with_date_of_birth(mut self, date_of_birth: Option<DateTime<Utc>>) -> Self {
        self.date_of_birth = Some(date_of_birth);
        self
    }

    /// True when no field is set.
    pub const fn is_empty(&self) -> bool {
        self.phone.is_none()
            && self.name.is_none()
            && self.surname.is_none()
            && self.about.is_none()
            && self.date_of_birth.is_none()
    }

    /// Build an update set from a dynamic column/value map.
    ///
    /// A JSON `null` clears the column; unknown and immutable column names
    /// are rejected before any database work.
    pub fn from_map(fields: &Map<String, Value>) -> Result<Self, FieldError> {
        fn nullable_string(
            field: &str,
            value: &Value,
        ) -> Result<Option<String>, FieldError> {
            if value.is_null() {
                Ok(None)
            } else {
                expect_string(PROFILES, field, value).map(Some)
            }
        }

        let mut update = Self::default();
        for (key, value) in fields {
            match key.as_str() {
                "phone" => update.phone = Some(nullable_string("phone", value)?),
                "name" => update.name = Some(nullable_string("name", value)?),
                "surname" => update.surname = Some(nullable_string("surname", value)?),
                "about" => update.about = Some(nullable_string("about", value)?),
                "date_of_birth" => {
                    update.date_of_birth = Some(if value.is_null() {
                        None
                    } else {
                        Some(parse_timestamp(PROFILES, "date_of_birth", value)?)
                    });
                }
                immutable @ ("id" | "user_id" | "created_at" | "updated_at") => {
                    return Err(FieldError::invalid(
                        PROFILES,
                        immutable,
                        "column is not updatable",
                    ));
                }
                other => return Err(FieldError::unknown(PROFILES, other)),
            }
        }
        Ok(update)
    }
}

#[cfg(test)]
mod tests {
    //! Coverage for dynamic-map parsing and the typed builders.
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object payload")
    }

    #[rstest]
    fn user_criteria_builders_compose() {
        let criteria = UserCriteria::default()
            .with_username("ann")
            .with_role(Role::Pro);

        assert_eq!(criteria.username.as_deref(), Some("ann"));
        assert_eq!(criteria.role, Some(Role::Pro));
        assert!(criteria.email.is_none());
        assert!(!criteria.is_empty());
    }

    #[rstest]
    fn user_criteria_parse_from_dynamic_map() {
        let criteria = UserCriteria::from_map(&as_map(json!({
            "username": "ann",
            "role": "basic",
        })))
        .expect("known columns");

        assert_eq!(criteria.username.as_deref(), Some("ann"));
        assert_eq!(criteria.role, Some(Role::Basic));
    }

    #[rstest]
    fn user_criteria_reject_unknown_column() {
        let error = UserCriteria::from_map(&as_map(json!({ "nickname": "ann" })))
            .expect_err("unknown column");

        assert_eq!(
            error,
            FieldError::Unknown {
                table: "users",
                field: "nickname".to_owned(),
            }
        );
    }

    #[rstest]
    fn user_update_rejects_unknown_column() {
        let error = UserUpdate::from_map(&as_map(json!({
            "email": "a@b.com",
            "nickname": "ann",
        })))
        .expect_err("unknown column");

        assert!(matches!(error, FieldError::Unknown { field, .. } if field == "nickname"));
    }

    #[rstest]
    #[case("id")]
    #[case("created_at")]
    #[case("updated_at")]
    fn user_update_rejects_immutable_columns(#[case] column: &str) {
        let error = UserUpdate::from_map(&as_map(json!({ column: "x" })))
            .expect_err("immutable column");

        assert!(matches!(error, FieldError::Invalid { field, .. } if field == column));
    }

    #[rstest]
    fn user_update_validates_values_while_parsing() {
        let error = UserUpdate::from_map(&as_map(json!({ "email": "not-an-email" })))
            .expect_err("invalid email");

        assert!(matches!(error, FieldError::Invalid { field, .. } if field == "email"));
    }

    #[rstest]
    fn user_update_parses_known_columns() {
        let update = UserUpdate::from_map(&as_map(json!({
            "username": "ann.smith",
            "role": "pro",
        })))
        .expect("valid update");

        assert_eq!(
            update.username.as_ref().map(AsRef::as_ref),
            Some("ann.smith")
        );
        assert_eq!(update.role, Some(Role::Pro));
        assert!(update.password.is_none());
        assert!(!update.is_empty());
    }

    #[rstest]
    fn profile_update_distinguishes_clear_from_untouched() {
        let update = ProfileUpdate::from_map(&as_map(json!({
            "phone": null,
            "name": "Ann",
        })))
        .expect("valid update");

        assert_eq!(update.phone, Some(None));
        assert_eq!(update.name, Some(Some("Ann".to_owned())));
        assert!(update.surname.is_none());
    }

    #[rstest]
    fn profile_update_rejects_foreign_key_change() {
        let error = ProfileUpdate::from_map(&as_map(json!({
            "user_id": "3fa85f64-5717-4562-b3fc-2c963f66afa6",
        })))
        .expect_err("immutable column");

        assert!(matches!(error, FieldError::Invalid { field, .. } if field == "user_id"));
    }

    #[rstest]
    fn profile_criteria_parse_uuid_values() {
        let user_id = uuid::Uuid::new_v4();
        let criteria = ProfileCriteria::from_map(&as_map(json!({
            "user_id": user_id.to_string(),
        })))
        .expect("valid criteria");

        assert_eq!(
            criteria.user_id.map(|id| *id.as_uuid()),
            Some(user_id)
        );
    }

    #[rstest]
    fn non_string_values_are_rejected_with_the_column_name() {
        let error =
            UserCriteria::from_map(&as_map(json!({ "username": 42 }))).expect_err("wrong type");

        assert!(matches!(error, FieldError::Invalid { field, .. } if field == "username"));
    }
}
