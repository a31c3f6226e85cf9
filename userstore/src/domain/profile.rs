//! Profile record owned one-to-one by a user.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::user::UserId;

/// Stable profile identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProfileId(Uuid);

impl ProfileId {
    /// Generate a new random [`ProfileId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap an existing UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stored profile record.
///
/// ## Invariants
/// - `user_id` references an existing user row; the database cascades the
///   delete when that user is removed.
/// - Exactly one profile exists per user.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    id: ProfileId,
    user_id: UserId,
    phone: Option<String>,
    name: Option<String>,
    surname: Option<String>,
    about: Option<String>,
    date_of_birth: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Column values for constructing a [`Profile`].
#[derive(Debug, Clone)]
pub struct ProfileParts {
    /// Stable profile identifier.
    pub id: ProfileId,
    /// Owning user.
    pub user_id: UserId,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Given name.
    pub name: Option<String>,
    /// Family name.
    pub surname: Option<String>,
    /// Free-form description.
    pub about: Option<String>,
    /// Date of birth.
    pub date_of_birth: Option<DateTime<Utc>>,
    /// Insert timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-modification timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Build a [`Profile`] from stored column values.
    pub fn new(parts: ProfileParts) -> Self {
        let ProfileParts {
            id,
            user_id,
            phone,
            name,
            surname,
            about,
            date_of_birth,
            created_at,
            updated_at,
        } = parts;
        Self {
            id,
            user_id,
            phone,
            name,
            surname,
            about,
            date_of_birth,
            created_at,
            updated_at,
        }
    }

    /// Stable profile identifier.
    pub const fn id(&self) -> &ProfileId {
        &self.id
    }

    /// Owning user.
    pub const fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Contact phone number.
    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    /// Given name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Family name.
    pub fn surname(&self) -> Option<&str> {
        self.surname.as_deref()
    }

    /// Free-form description.
    pub fn about(&self) -> Option<&str> {
        self.about.as_deref()
    }

    /// Date of birth.
    pub const fn date_of_birth(&self) -> Option<DateTime<Utc>> {
        self.date_of_birth
    }

    /// Insert timestamp.
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Last-modification timestamp.
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Project every stored column into a map keyed by column name.
    pub fn to_map(&self) -> Map<String, Value> {
        fn optional(value: Option<&str>) -> Value {
            value.map_or(Value::Null, |v| Value::String(v.to_owned()))
        }

        let mut map = Map::new();
        map.insert("id".to_owned(), Value::String(self.id.to_string()));
        map.insert("user_id".to_owned(), Value::String(self.user_id.to_string()));
        map.insert("phone".to_owned(), optional(self.phone()));
        map.insert("name".to_owned(), optional(self.name()));
        map.insert("surname".to_owned(), optional(self.surname()));
        map.insert("about".to_owned(), optional(self.about()));
        map.insert(
            "date_of_birth".to_owned(),
            self.date_of_birth
                .map_or(Value::Null, |v| Value::String(v.to_rfc3339())),
        );
        map.insert(
            "created_at".to_owned(),
            Value::String(self.created_at.to_rfc3339()),
        );
        map.insert(
            "updated_at".to_owned(),
            Value::String(self.updated_at.to_rfc3339()),
        );
        map
    }
}

/// Permissive nested profile payload; every field may be absent or null.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProfileDraft {
    /// Contact phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// Given name.
    #[serde(default)]
    pub name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub surname: Option<String>,
    /// Free-form description.
    #[serde(default)]
    pub about: Option<String>,
    /// Date of birth.
    #[serde(default)]
    pub date_of_birth: Option<DateTime<Utc>>,
}

/// Draft for inserting a profile row bound to its owning user.
#[derive(Debug, Clone)]
pub struct NewProfile {
    /// Owning user.
    pub user_id: UserId,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Given name.
    pub name: Option<String>,
    /// Family name.
    pub surname: Option<String>,
    /// Free-form description.
    pub about: Option<String>,
    /// Date of birth.
    pub date_of_birth: Option<DateTime<Utc>>,
}

impl NewProfile {
    /// Bind a nested payload to the user that will own the profile row.
    pub fn new(user_id: UserId, draft: ProfileDraft) -> Self {
        let ProfileDraft {
            phone,
            name,
            surname,
            about,
            date_of_birth,
        } = draft;
        Self {
            user_id,
            phone,
            name,
            surname,
            about,
            date_of_birth,
        }
    }
}

#[cfg(test)]
mod tests {
    //! Coverage for the permissive profile schema and column projection.
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn empty_payload_deserialises_to_default_draft() {
        let draft: ProfileDraft = serde_json::from_value(json!({})).expect("deserialise draft");
        assert_eq!(draft, ProfileDraft::default());
    }

    #[rstest]
    fn null_fields_are_accepted() {
        let draft: ProfileDraft = serde_json::from_value(json!({
            "phone": null,
            "name": "Ann",
            "date_of_birth": null,
        }))
        .expect("deserialise draft");

        assert!(draft.phone.is_none());
        assert_eq!(draft.name.as_deref(), Some("Ann"));
        assert!(draft.date_of_birth.is_none());
    }

    #[rstest]
    fn to_map_renders_missing_fields_as_null() {
        let now = Utc::now();
        let profile = Profile::new(ProfileParts {
            id: ProfileId::random(),
            user_id: UserId::random(),
            phone: Some("+123".to_owned()),
            name: None,
            surname: None,
            about: None,
            date_of_birth: None,
            created_at: now,
            updated_at: now,
        });

        let map = profile.to_map();
        assert_eq!(map.len(), 9);
        assert_eq!(map["phone"], json!("+123"));
        assert_eq!(map["name"], Value::Null);
        assert_eq!(map["date_of_birth"], Value::Null);
    }

    #[rstest]
    fn new_profile_carries_the_owning_user() {
        let user_id = UserId::random();
        let draft = ProfileDraft {
            phone: Some("+123".to_owned()),
            ..ProfileDraft::default()
        };

        let new_profile = NewProfile::new(user_id, draft);
        assert_eq!(new_profile.user_id, user_id);
        assert_eq!(new_profile.phone.as_deref(), Some("+123"));
        assert!(new_profile.surname.is_none());
    }
}
